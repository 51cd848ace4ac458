use std::collections::HashSet;

use tower_lsp::lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokens,
    SemanticTokensLegend,
};

use crate::handlers::DocumentSnapshot;
use crate::handlers::completion::GRAMMAR_DIRECTIVES;
use crate::position::is_identifier_char;
use crate::symbols::SymbolIndex;

/// Legend order; a token's type is its index in this list
pub const TOKEN_TYPES: [&str; 22] = [
    "namespace",
    "type",
    "class",
    "enum",
    "interface",
    "struct",
    "typeParameter",
    "parameter",
    "variable",
    "property",
    "enumMember",
    "event",
    "function",
    "method",
    "macro",
    "keyword",
    "modifier",
    "comment",
    "string",
    "number",
    "regexp",
    "operator",
];

pub const TOKEN_MODIFIERS: [&str; 10] = [
    "declaration",
    "definition",
    "readonly",
    "static",
    "deprecated",
    "abstract",
    "async",
    "modification",
    "documentation",
    "defaultLibrary",
];

const VARIABLE: u32 = 8;
const ENUM_MEMBER: u32 = 10;
const FUNCTION: u32 = 12;
const KEYWORD: u32 = 15;
const COMMENT: u32 = 17;
const STRING: u32 = 18;
const OPERATOR: u32 = 21;

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TOKEN_TYPES.into_iter().map(SemanticTokenType::new).collect(),
        token_modifiers: TOKEN_MODIFIERS
            .into_iter()
            .map(SemanticTokenModifier::new)
            .collect(),
    }
}

/// Token in absolute 0-based coordinates, columns counted in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken {
    pub line: u32,
    pub start: u32,
    pub length: u32,
    pub token_type: u32,
}

/// Declared names, collected once per request for identifier classification
#[derive(Debug, Default)]
pub struct DeclaredNames<'a> {
    tokens: HashSet<&'a str>,
    rules: HashSet<&'a str>,
}

impl<'a> DeclaredNames<'a> {
    pub fn new(index: &SymbolIndex<'a>) -> Self {
        Self {
            tokens: index.token_names().collect(),
            rules: index.rules().map(|rule| rule.name.as_str()).collect(),
        }
    }

    fn classify(&self, word: &str) -> u32 {
        if self.tokens.contains(word) {
            ENUM_MEMBER
        } else if self.rules.contains(word) {
            FUNCTION
        } else {
            VARIABLE
        }
    }
}

pub fn semantic_tokens(doc: &DocumentSnapshot) -> SemanticTokens {
    let data = match doc.index() {
        Some(index) => {
            let names = DeclaredNames::new(&index);
            let tokens = doc
                .text()
                .lines()
                .enumerate()
                .flat_map(|(line, text)| tokenize_line(line as u32, text, &names))
                .collect();
            encode_tokens(tokens)
        }
        None => Vec::new(),
    };

    SemanticTokens {
        result_id: None,
        data,
    }
}

pub fn tokenize_line(line: u32, text: &str, names: &DeclaredNames) -> Vec<RawToken> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    let mut push = |start: usize, end: usize, token_type: u32| {
        tokens.push(RawToken {
            line,
            start: start as u32,
            length: (end - start) as u32,
            token_type,
        });
    };

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c == '%' {
            let end = scan_while(&chars, pos + 1, |c| c.is_ascii_lowercase());
            if end > pos + 1 {
                let word: String = chars[pos..end].iter().collect();
                if GRAMMAR_DIRECTIVES.contains(&word.as_str()) {
                    push(pos, end, KEYWORD);
                    pos = end;
                    continue;
                }
            }
            pos += 1;
            continue;
        }

        if c == '/' && chars.get(pos + 1) == Some(&'/') {
            push(pos, chars.len(), COMMENT);
            break;
        }

        if c == '/' && chars.get(pos + 1) == Some(&'*') {
            match find_comment_close(&chars, pos + 2) {
                Some(end) => {
                    push(pos, end, COMMENT);
                    pos = end;
                }
                None => pos += 1,
            }
            continue;
        }

        if c == '"' || c == '\'' {
            match find_string_end(&chars, pos) {
                Some(end) => {
                    push(pos, end, STRING);
                    pos = end;
                    continue;
                }
                None => break,
            }
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let end = scan_while(&chars, pos, is_identifier_char);
            let word: String = chars[pos..end].iter().collect();
            push(pos, end, names.classify(&word));
            pos = end;
            continue;
        }

        if matches!(c, '{' | '}' | ':' | ';' | '|') {
            push(pos, pos + 1, OPERATOR);
        }
        pos += 1;
    }

    tokens
}

/// Relative encoding: 5 integers per token, sorted by position, no modifiers
pub fn encode_tokens(mut tokens: Vec<RawToken>) -> Vec<SemanticToken> {
    tokens.sort_by_key(|token| (token.line, token.start));

    let mut prev_line = 0;
    let mut prev_start = 0;
    tokens
        .into_iter()
        .map(|token| {
            let delta_line = token.line - prev_line;
            let delta_start = if delta_line == 0 {
                token.start - prev_start
            } else {
                token.start
            };
            prev_line = token.line;
            prev_start = token.start;

            SemanticToken {
                delta_line,
                delta_start,
                length: token.length,
                token_type: token.token_type,
                token_modifiers_bitset: 0,
            }
        })
        .collect()
}

fn scan_while(chars: &[char], from: usize, pred: impl Fn(char) -> bool) -> usize {
    chars[from.min(chars.len())..]
        .iter()
        .position(|c| !pred(*c))
        .map_or(chars.len(), |offset| from + offset)
}

/// Index just past `*/`, searching from `from`
fn find_comment_close(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1))
        .find(|&i| chars[i] == '*' && chars[i + 1] == '/')
        .map(|i| i + 2)
}

/// Index just past the closing quote matching the one at `start`
fn find_string_end(chars: &[char], start: usize) -> Option<usize> {
    let quote = chars[start];
    let mut pos = start + 1;
    while pos < chars.len() {
        match chars[pos] {
            '\\' => pos += 2,
            c if c == quote => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{
        SAMPLE_GRAMMAR, record, sample_ast, sample_record, sample_uri,
    };
    use crate::engine::ast::{GrammarAst, Location};
    use crate::handlers::test_support::token_decl;
    use rstest::rstest;

    fn kinds(tokens: &[RawToken]) -> Vec<(u32, u32, u32)> {
        tokens
            .iter()
            .map(|t| (t.start, t.length, t.token_type))
            .collect()
    }

    #[test]
    fn legend_lists_all_types_and_modifiers() {
        let legend = legend();

        assert_eq!(legend.token_types.len(), 22);
        assert_eq!(legend.token_modifiers.len(), 10);
        assert_eq!(legend.token_types[KEYWORD as usize].as_str(), "keyword");
        assert_eq!(legend.token_types[OPERATOR as usize].as_str(), "operator");
        assert_eq!(legend.token_modifiers[9].as_str(), "defaultLibrary");
    }

    #[test]
    fn classifies_tokens_rules_and_other_identifiers() {
        let ast = sample_ast();
        let names = DeclaredNames::new(&SymbolIndex::new(&ast));

        let tokens = tokenize_line(6, "expr: expr PLUS NUMBER other", &names);

        assert_eq!(
            kinds(&tokens),
            vec![
                (0, 4, FUNCTION),
                (4, 1, OPERATOR),
                (6, 4, FUNCTION),
                // PLUS is only a precedence token, not a declared one
                (11, 4, VARIABLE),
                (16, 6, ENUM_MEMBER),
                (23, 5, VARIABLE),
            ]
        );
        assert!(tokens.iter().all(|t| t.line == 6));
    }

    #[rstest]
    #[case("%token NUMBER", vec![(0, 6, KEYWORD), (7, 6, ENUM_MEMBER)])]
    #[case("%%", vec![])]
    #[case("%foo", vec![(1, 3, VARIABLE)])]
    #[case("x // trailing { }", vec![(0, 1, VARIABLE), (2, 15, COMMENT)])]
    #[case("/* note */ ;", vec![(0, 10, COMMENT), (11, 1, OPERATOR)])]
    #[case("/* open", vec![(3, 4, VARIABLE)])]
    #[case(r#"'+' "a\"b" |"#, vec![(0, 3, STRING), (4, 6, STRING), (11, 1, OPERATOR)])]
    #[case(r#"a "unterminated ;"#, vec![(0, 1, VARIABLE)])]
    #[case("{ $$ = 1; }", vec![(0, 1, OPERATOR), (8, 1, OPERATOR), (10, 1, OPERATOR)])]
    fn tokenize_line_cases(#[case] line: &str, #[case] expected: Vec<(u32, u32, u32)>) {
        let ast = sample_ast();
        let names = DeclaredNames::new(&SymbolIndex::new(&ast));

        assert_eq!(kinds(&tokenize_line(0, line, &names)), expected);
    }

    #[test]
    fn token_declaration_wins_over_rule_of_same_name() {
        let ast = GrammarAst {
            declarations: vec![token_decl(&["expr"], None, Location::new(1, 8))],
            rules: sample_ast().rules,
            ..Default::default()
        };
        let names = DeclaredNames::new(&SymbolIndex::new(&ast));

        assert_eq!(
            kinds(&tokenize_line(0, "expr program", &names)),
            vec![(0, 4, ENUM_MEMBER), (5, 7, FUNCTION)]
        );
        assert_eq!(
            kinds(&tokenize_line(0, "expr", &DeclaredNames::default())),
            vec![(0, 4, VARIABLE)]
        );
    }

    #[test]
    fn encode_tokens_is_relative_and_sorted() {
        let raw = |line, start, length, token_type| RawToken {
            line,
            start,
            length,
            token_type,
        };
        let tokens = vec![
            raw(3, 7, 6, ENUM_MEMBER),
            raw(2, 0, 6, KEYWORD),
            raw(3, 0, 4, FUNCTION),
        ];

        let encoded = encode_tokens(tokens);
        let flat: Vec<u32> = encoded
            .iter()
            .flat_map(|t| {
                [
                    t.delta_line,
                    t.delta_start,
                    t.length,
                    t.token_type,
                    t.token_modifiers_bitset,
                ]
            })
            .collect();

        assert_eq!(
            flat,
            vec![2, 0, 6, KEYWORD, 0, 1, 0, 4, FUNCTION, 0, 0, 7, 6, ENUM_MEMBER, 0]
        );
    }

    #[test]
    fn semantic_tokens_cover_whole_document() {
        let uri = sample_uri();
        let record = sample_record();
        let doc = DocumentSnapshot::new(&uri, &record);

        let tokens = semantic_tokens(&doc);

        // First token is `%token` on line 0
        assert_eq!(tokens.data[0].delta_line, 0);
        assert_eq!(tokens.data[0].token_type, KEYWORD);
        assert!(tokens.data.iter().any(|t| t.token_type == FUNCTION));
    }

    #[test]
    fn semantic_tokens_empty_without_ast() {
        let uri = sample_uri();
        let record = record(SAMPLE_GRAMMAR, None);
        let doc = DocumentSnapshot::new(&uri, &record);

        assert!(semantic_tokens(&doc).data.is_empty());
    }
}
