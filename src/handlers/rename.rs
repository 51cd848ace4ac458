use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::{Position, TextEdit, WorkspaceEdit};

use crate::handlers::DocumentSnapshot;
use crate::handlers::references::symbol_references;
use crate::position::{name_range, word_at};
use crate::symbols::SymbolIndex;

static TOKEN_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").ok());

static NONTERMINAL_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").ok());

fn matches(pattern: &LazyLock<Option<Regex>>, name: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(name))
}

/// Tokens must stay UPPER_CASE, everything else lower_case
pub fn valid_name(old_name: &str, new_name: &str, index: &SymbolIndex) -> bool {
    if new_name.is_empty() {
        return false;
    }

    if index.is_token(old_name) {
        matches(&TOKEN_NAME, new_name)
    } else {
        matches(&NONTERMINAL_NAME, new_name)
    }
}

/// Edit replacing the declaration and every occurrence of the name under the
/// cursor. Invalid names produce no edit.
pub fn rename(doc: &DocumentSnapshot, position: Position, new_name: &str) -> Option<WorkspaceEdit> {
    let index = doc.index()?;
    let symbol = word_at(doc.text(), position)?;

    if !valid_name(&symbol, new_name, &index) {
        return None;
    }

    let edits: Vec<TextEdit> = symbol_references(&index, doc.text(), &symbol, true)
        .into_iter()
        .map(|location| TextEdit::new(name_range(location, &symbol), new_name.to_string()))
        .collect();

    Some(WorkspaceEdit {
        changes: Some(HashMap::from([(doc.uri.clone(), edits)])),
        ..Default::default()
    })
}
