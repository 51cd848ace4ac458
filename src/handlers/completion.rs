use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Documentation};

use crate::handlers::DocumentSnapshot;
use crate::symbols::SymbolIndex;

/// Directives offered after `%`
pub const GRAMMAR_DIRECTIVES: [&str; 8] = [
    "%token",
    "%type",
    "%left",
    "%right",
    "%nonassoc",
    "%prec",
    "%union",
    "%start",
];

/// Declared tokens, nonterminals and grammar directives. The cursor position is not
/// used; clients filter the list themselves.
pub fn completion(doc: &DocumentSnapshot) -> Vec<CompletionItem> {
    let Some(index) = doc.index() else {
        return Vec::new();
    };

    let mut items = symbol_completions(&index);
    items.extend(GRAMMAR_DIRECTIVES.iter().map(|directive| CompletionItem {
        label: directive.to_string(),
        kind: Some(CompletionItemKind::KEYWORD),
        detail: Some("Grammar directive".to_string()),
        ..Default::default()
    }));
    items
}

pub fn symbol_completions(index: &SymbolIndex) -> Vec<CompletionItem> {
    let tokens = index.token_names().map(|name| CompletionItem {
        label: name.to_string(),
        kind: Some(CompletionItemKind::KEYWORD),
        detail: Some(format!("Token: {}", name)),
        documentation: Some(Documentation::String("Declared token".to_string())),
        ..Default::default()
    });

    let rules = index.rules().map(|rule| CompletionItem {
        label: rule.name.clone(),
        kind: Some(CompletionItemKind::CLASS),
        detail: Some(format!("Nonterminal: {}", rule.name)),
        documentation: Some(Documentation::String("Grammar rule".to_string())),
        ..Default::default()
    });

    tokens.chain(rules).collect()
}
