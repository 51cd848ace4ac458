//! Read-only lookups over a cached grammar AST
//!
//! Tokens and nonterminals live in separate namespaces that may collide. Lookups
//! always check token declarations before rules, so a name declared as both
//! resolves to the token.

use crate::engine::ast::{Declaration, GrammarAst, Location, NameDeclaration, Rule};
use crate::position::is_identifier_char;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Token,
    Rule,
}

/// Where a name is declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDeclaration<'a> {
    pub name: &'a str,
    pub kind: SymbolKind,
    pub location: Option<Location>,
}

pub struct SymbolIndex<'a> {
    ast: &'a GrammarAst,
}

impl<'a> SymbolIndex<'a> {
    pub fn new(ast: &'a GrammarAst) -> Self {
        Self { ast }
    }

    /// `%token` declarations in source order
    pub fn token_declarations(&self) -> impl Iterator<Item = &'a NameDeclaration> + 'a {
        self.ast.declarations.iter().filter_map(|decl| match decl {
            Declaration::Token(token) => Some(token),
            _ => None,
        })
    }

    /// `%type` declarations in source order
    pub fn type_declarations(&self) -> impl Iterator<Item = &'a NameDeclaration> + 'a {
        self.ast.declarations.iter().filter_map(|decl| match decl {
            Declaration::Type(ty) => Some(ty),
            _ => None,
        })
    }

    pub fn rules(&self) -> impl Iterator<Item = &'a Rule> + 'a {
        self.ast.rules.iter()
    }

    /// All declared token names, in declaration order
    pub fn token_names(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.token_declarations()
            .flat_map(|decl| decl.names.iter().map(String::as_str))
    }

    pub fn token(&self, name: &str) -> Option<&'a NameDeclaration> {
        self.token_declarations()
            .find(|decl| decl.names.iter().any(|n| n == name))
    }

    pub fn rule(&self, name: &str) -> Option<&'a Rule> {
        self.ast.rules.iter().find(|rule| rule.name == name)
    }

    pub fn is_token(&self, name: &str) -> bool {
        self.token(name).is_some()
    }

    /// `%type` tag attached to `name`, from either its `%token` or a `%type` declaration
    pub fn type_of(&self, name: &str) -> Option<&'a str> {
        self.token_declarations()
            .chain(self.type_declarations())
            .filter(|decl| decl.names.iter().any(|n| n == name))
            .find_map(|decl| decl.type_tag.as_deref())
    }

    /// Declaration of `name`: first matching token, otherwise the rule of that name
    pub fn declaration(&self, name: &str) -> Option<SymbolDeclaration<'a>> {
        if let Some(token) = self.token(name) {
            let name = token
                .names
                .iter()
                .find(|n| *n == name)
                .map(String::as_str)?;
            return Some(SymbolDeclaration {
                name,
                kind: SymbolKind::Token,
                location: token.location,
            });
        }

        self.rule(name).map(|rule| SymbolDeclaration {
            name: rule.name.as_str(),
            kind: SymbolKind::Rule,
            location: rule.location,
        })
    }

    /// Editor-facing location of the declaration of `name`.
    ///
    /// A `%token` line declares several names under one location, so the name itself
    /// is looked up on that line.
    pub fn declaration_location(&self, text: &str, name: &str) -> Option<Location> {
        let declaration = self.declaration(name)?;
        let location = declaration.location?;
        Some(match declaration.kind {
            SymbolKind::Token => name_location(text, name, location),
            SymbolKind::Rule => location,
        })
    }

    /// Whole-word matches of `name` inside rule bodies.
    ///
    /// The AST keeps one location per rule, not per symbol, so this scans the text
    /// from each rule's line up to the first line holding a `;`. Approximate: a `;`
    /// inside an action ends the body early, text between rules is never searched.
    pub fn occurrences(&self, text: &str, name: &str) -> Vec<Location> {
        let lines: Vec<&str> = text.lines().collect();
        let mut locations = Vec::new();

        for rule in &self.ast.rules {
            let Some(location) = rule.location else {
                continue;
            };
            let start = location.line.saturating_sub(1) as usize;
            if start >= lines.len() {
                continue;
            }
            let end = rule_body_end(&lines, start);

            for (line_idx, line) in lines.iter().enumerate().take(end + 1).skip(start) {
                for column in whole_word_matches(line, name) {
                    locations.push(Location::new(line_idx as u32 + 1, column as u32 + 1));
                }
            }
        }

        locations
    }
}

/// Position of `name` on the line of a multi-name declaration: the first whole-word
/// match at or after the declaration's column, else the declaration location itself
pub fn name_location(text: &str, name: &str, location: Location) -> Location {
    let Some(line) = text.lines().nth(location.line.saturating_sub(1) as usize) else {
        return location;
    };
    let from = location.column.saturating_sub(1) as usize;

    whole_word_matches(line, name)
        .into_iter()
        .find(|&column| column >= from)
        .map_or(location, |column| {
            Location::new(location.line, column as u32 + 1)
        })
}

/// Index of the first line at or after `start` containing `;`, or the last line
pub fn rule_body_end(lines: &[&str], start: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, line)| line.contains(';'))
        .map(|(idx, _)| idx)
        .unwrap_or_else(|| lines.len().saturating_sub(1))
}

/// 0-based char columns where `word` appears with no identifier character on
/// either side
pub fn whole_word_matches(line: &str, word: &str) -> Vec<usize> {
    let chars: Vec<char> = line.chars().collect();
    let needle: Vec<char> = word.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return Vec::new();
    }

    (0..=chars.len() - needle.len())
        .filter(|&pos| chars[pos..pos + needle.len()] == needle[..])
        .filter(|&pos| pos == 0 || !is_identifier_char(chars[pos - 1]))
        .filter(|&pos| {
            chars
                .get(pos + needle.len())
                .is_none_or(|c| !is_identifier_char(*c))
        })
        .collect()
}
