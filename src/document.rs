//! In-memory store of open documents
//!
//! Every mutator ignores unknown URIs: edit notifications can race with close
//! notifications in a real client, so a missing record is not an error.

use std::sync::Arc;

use indexmap::IndexMap;
use tower_lsp::lsp_types::{Diagnostic, Url};
use tracing::debug;

use crate::engine::GrammarAst;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub text: String,
    pub version: i32,
    /// Only present when parsed from the current `text`
    pub ast: Option<Arc<GrammarAst>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Open documents keyed by URI, kept in open order
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: IndexMap<Url, DocumentRecord>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, uri: Url, text: String, version: i32) {
        self.documents.insert(
            uri,
            DocumentRecord {
                text,
                version,
                ast: None,
                diagnostics: Vec::new(),
            },
        );
    }

    /// Replaces text and version and drops the cached AST.
    ///
    /// Returns `false` when nothing was applied: the URI is unknown, or `version` is
    /// older than the stored one.
    pub fn change(&mut self, uri: &Url, text: String, version: i32) -> bool {
        let Some(record) = self.documents.get_mut(uri) else {
            return false;
        };

        if version < record.version {
            debug!(
                "Ignoring stale change for {} (version {} < {})",
                uri, version, record.version
            );
            return false;
        }

        record.text = text;
        record.version = version;
        record.ast = None;
        true
    }

    pub fn get(&self, uri: &Url) -> Option<&DocumentRecord> {
        self.documents.get(uri)
    }

    pub fn close(&mut self, uri: &Url) {
        self.documents.shift_remove(uri);
    }

    pub fn update_ast(&mut self, uri: &Url, ast: Arc<GrammarAst>) {
        if let Some(record) = self.documents.get_mut(uri) {
            record.ast = Some(ast);
        }
    }

    pub fn update_diagnostics(&mut self, uri: &Url, diagnostics: Vec<Diagnostic>) {
        if let Some(record) = self.documents.get_mut(uri) {
            record.diagnostics = diagnostics;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Url, &DocumentRecord)> {
        self.documents.iter()
    }
}
