use tower_lsp::lsp_types::{DocumentSymbol, SymbolKind};

use crate::engine::ast::{Declaration, GrammarAst, Location, Rule};
use crate::handlers::DocumentSnapshot;
use crate::position::name_range;
use crate::symbols::name_location;

/// Outline: tokens, types, precedence tokens, then rules with their alternatives
/// as children. Entries without a location are left out.
pub fn document_symbols(doc: &DocumentSnapshot) -> Vec<DocumentSymbol> {
    match doc.record.ast.as_deref() {
        Some(ast) => build_document_symbols(doc.text(), ast),
        None => Vec::new(),
    }
}

/// Declared names are placed where they appear on their declaration line in `text`
pub fn build_document_symbols(text: &str, ast: &GrammarAst) -> Vec<DocumentSymbol> {
    let mut tokens = Vec::new();
    let mut types = Vec::new();
    let mut precedences = Vec::new();

    for declaration in &ast.declarations {
        let Some(location) = declaration.location() else {
            continue;
        };
        let declared = |name: &str, kind: SymbolKind, detail: String| {
            create_symbol(
                name,
                kind,
                name_location(text, name, location),
                Some(detail),
                Vec::new(),
            )
        };
        match declaration {
            Declaration::Token(decl) => tokens.extend(
                decl.names
                    .iter()
                    .map(|name| declared(name, SymbolKind::CONSTANT, "Token".into())),
            ),
            Declaration::Type(decl) => types.extend(
                decl.names
                    .iter()
                    .map(|name| declared(name, SymbolKind::CLASS, "Type".into())),
            ),
            Declaration::Precedence(decl) => {
                let detail = format!("{} precedence", decl.associativity.label());
                precedences.extend(
                    decl.tokens
                        .iter()
                        .map(|token| declared(token, SymbolKind::ENUM_MEMBER, detail.clone())),
                )
            }
        }
    }

    let rules = ast.rules.iter().filter_map(rule_symbol);

    tokens
        .into_iter()
        .chain(types)
        .chain(precedences)
        .chain(rules)
        .collect()
}

fn rule_symbol(rule: &Rule) -> Option<DocumentSymbol> {
    let location = rule.location?;

    let children = rule
        .alternatives
        .iter()
        .enumerate()
        .filter_map(|(idx, alternative)| {
            let location = alternative.location?;
            let detail = if alternative.symbols.is_empty() {
                "ε".to_string()
            } else {
                alternative
                    .symbols
                    .iter()
                    .map(|symbol| symbol.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            Some(create_symbol(
                &format!("Alternative {}", idx + 1),
                SymbolKind::METHOD,
                location,
                Some(detail),
                Vec::new(),
            ))
        })
        .collect();

    Some(create_symbol(
        &rule.name,
        SymbolKind::FUNCTION,
        location,
        Some(format!(
            "Grammar rule ({} alternatives)",
            rule.alternatives.len()
        )),
        children,
    ))
}

#[allow(deprecated)]
fn create_symbol(
    name: &str,
    kind: SymbolKind,
    location: Location,
    detail: Option<String>,
    children: Vec<DocumentSymbol>,
) -> DocumentSymbol {
    let range = name_range(location, name);
    DocumentSymbol {
        name: name.to_string(),
        detail,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range: range,
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
    }
}
