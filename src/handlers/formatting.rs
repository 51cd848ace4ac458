use tower_lsp::lsp_types::TextEdit;
use tracing::warn;

use crate::config::uri_to_filename;
use crate::engine::GrammarEngine;
use crate::handlers::DocumentSnapshot;
use crate::position::full_document_range;

/// `None` when the engine cannot format the document, an empty list when the
/// text is already formatted, otherwise one edit over the whole document.
pub fn formatting(doc: &DocumentSnapshot, engine: &dyn GrammarEngine) -> Option<Vec<TextEdit>> {
    let formatted = match engine.format(doc.text(), &uri_to_filename(doc.uri)) {
        Ok(formatted) => formatted?,
        Err(e) => {
            warn!("Formatting failed for {}: {}", doc.uri, e);
            return None;
        }
    };

    if formatted == doc.text() {
        return Some(Vec::new());
    }

    Some(vec![TextEdit::new(full_document_range(doc.text()), formatted)])
}
