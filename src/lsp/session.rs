use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::InitializeParams;

use crate::engine::GrammarEngine;

/// State fixed at `initialize`: where the workspace lives and the engine bound to it
pub struct Session {
    workspace_root: Option<PathBuf>,
    engine: Box<dyn GrammarEngine>,
}

impl Session {
    pub fn new(workspace_root: Option<PathBuf>, engine: Box<dyn GrammarEngine>) -> Self {
        Self {
            workspace_root,
            engine,
        }
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    pub fn engine(&self) -> &dyn GrammarEngine {
        self.engine.as_ref()
    }
}

/// `rootUri` as a path, falling back to the first workspace folder
#[allow(deprecated)]
pub fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    let root_uri = params.root_uri.as_ref().or_else(|| {
        params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| &folder.uri)
    })?;

    root_uri.to_file_path().ok()
}
