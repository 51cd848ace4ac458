//! Feature handlers
//!
//! Each handler is a pure function of a document snapshot and the request
//! parameters. Engine-backed handlers (`code_action`, `formatting`) also take the
//! engine; nothing here touches the document store.

pub mod code_action;
pub mod completion;
pub mod definition;
pub mod document_symbol;
pub mod folding_range;
pub mod formatting;
pub mod hover;
pub mod references;
pub mod rename;
pub mod semantic_tokens;
pub mod workspace_symbol;

use tower_lsp::lsp_types::Url;

use crate::document::DocumentRecord;
use crate::symbols::SymbolIndex;

/// Read-only view of one open document
#[derive(Clone, Copy)]
pub struct DocumentSnapshot<'a> {
    pub uri: &'a Url,
    pub record: &'a DocumentRecord,
}

impl<'a> DocumentSnapshot<'a> {
    pub fn new(uri: &'a Url, record: &'a DocumentRecord) -> Self {
        Self { uri, record }
    }

    pub fn text(&self) -> &'a str {
        &self.record.text
    }

    /// Symbol index over the cached AST, if the document has one
    pub fn index(&self) -> Option<SymbolIndex<'a>> {
        self.record.ast.as_deref().map(SymbolIndex::new)
    }
}
