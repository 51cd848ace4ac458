use std::collections::HashMap;

use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Diagnostic, Range, TextEdit, WorkspaceEdit,
};

use crate::config::uri_to_filename;
use crate::engine::GrammarEngine;
use crate::handlers::DocumentSnapshot;
use crate::position::full_document_range;

pub const FIX_ALL_TITLE: &str = "Fix all auto-correctable offenses";

/// Stored diagnostics whose lines fall inside `range`. Only lines are compared.
pub fn diagnostics_in_range<'a>(diagnostics: &'a [Diagnostic], range: &Range) -> Vec<&'a Diagnostic> {
    diagnostics
        .iter()
        .filter(|diagnostic| {
            diagnostic.range.start.line >= range.start.line
                && diagnostic.range.end.line <= range.end.line
        })
        .collect()
}

/// A single `source.fixAll` action replacing the document with the engine's
/// autocorrected text, offered when any diagnostic lies in `range`.
pub fn code_actions(
    doc: &DocumentSnapshot,
    range: &Range,
    engine: &dyn GrammarEngine,
) -> Vec<CodeActionOrCommand> {
    let matched = diagnostics_in_range(&doc.record.diagnostics, range);
    if matched.is_empty() {
        return Vec::new();
    }

    let corrected = engine.autocorrect(doc.text(), &uri_to_filename(doc.uri));
    let edit = TextEdit::new(full_document_range(doc.text()), corrected);

    let action = CodeAction {
        title: FIX_ALL_TITLE.to_string(),
        kind: Some(CodeActionKind::SOURCE_FIX_ALL),
        diagnostics: Some(matched.into_iter().cloned().collect()),
        edit: Some(WorkspaceEdit {
            changes: Some(HashMap::from([(doc.uri.clone(), vec![edit])])),
            ..Default::default()
        }),
        ..Default::default()
    };

    vec![CodeActionOrCommand::CodeAction(action)]
}
