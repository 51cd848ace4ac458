use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::handlers::DocumentSnapshot;
use crate::position::word_range_at;
use crate::symbols::{SymbolIndex, SymbolKind};

pub fn hover(doc: &DocumentSnapshot, position: Position) -> Option<Hover> {
    let index = doc.index()?;
    let (symbol, range) = word_range_at(doc.text(), position)?;
    let value = hover_markdown(&index, &symbol)?;

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(range),
    })
}

/// Markdown describing a token or nonterminal, `None` for unknown names
pub fn hover_markdown(index: &SymbolIndex, symbol: &str) -> Option<String> {
    let declaration = index.declaration(symbol)?;

    match declaration.kind {
        SymbolKind::Token => Some(format!(
            "**Token**: `{}`\n\nType: `{}`",
            symbol,
            index.type_of(symbol).unwrap_or("none")
        )),
        SymbolKind::Rule => {
            let alternatives = index.rule(symbol).map_or(0, |rule| rule.alternatives.len());
            let mut value = format!(
                "**Nonterminal**: `{}`\n\n{} alternative(s)",
                symbol, alternatives
            );
            if let Some(tag) = index.type_of(symbol) {
                value.push_str(&format!("\n\nType: `{}`", tag));
            }
            Some(value)
        }
    }
}
