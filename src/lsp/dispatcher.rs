//! Method table and per-message execution
//!
//! `Dispatcher::dispatch` runs one message to completion, engine calls included.
//! The backend serializes calls, so handlers never overlap.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tower_lsp::lsp_types::{
    CodeActionOrCommand, CodeActionParams, CompletionItem, CompletionParams, Diagnostic,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, DocumentFormattingParams, DocumentSymbol, DocumentSymbolParams,
    FoldingRange, FoldingRangeParams, GotoDefinitionParams, Hover, HoverParams,
    InitializeParams, Location, ReferenceParams, RenameParams, SemanticTokens,
    SemanticTokensParams, SymbolInformation, TextEdit, Url, WorkspaceEdit,
    WorkspaceSymbolParams,
};
use tracing::{debug, info, warn};

use crate::config::uri_to_filename;
use crate::document::DocumentStore;
use crate::engine::GrammarEngine;
use crate::handlers::{
    DocumentSnapshot, code_action, completion, definition, document_symbol, folding_range,
    formatting, hover, references, rename, semantic_tokens, workspace_symbol,
};
use crate::lsp::diagnostics::lint_document;
use crate::lsp::session::{Session, workspace_root};

/// Builds the engine for a workspace root at `initialize`
pub type EngineFactory = Box<dyn Fn(Option<&Path>) -> Box<dyn GrammarEngine> + Send>;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Server has not been initialized")]
    NotInitialized,

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

/// One consumed LSP message
#[derive(Debug)]
pub enum Request {
    Initialize(InitializeParams),
    Initialized,
    Shutdown,
    DidOpen(DidOpenTextDocumentParams),
    DidChange(DidChangeTextDocumentParams),
    DidSave(DidSaveTextDocumentParams),
    DidClose(DidCloseTextDocumentParams),
    Formatting(DocumentFormattingParams),
    CodeAction(CodeActionParams),
    Hover(HoverParams),
    Completion(CompletionParams),
    Definition(GotoDefinitionParams),
    References(ReferenceParams),
    DocumentSymbol(DocumentSymbolParams),
    Rename(RenameParams),
    SemanticTokensFull(SemanticTokensParams),
    FoldingRange(FoldingRangeParams),
    WorkspaceSymbol(WorkspaceSymbolParams),
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::Initialize(_) => "initialize",
            Request::Initialized => "initialized",
            Request::Shutdown => "shutdown",
            Request::DidOpen(_) => "textDocument/didOpen",
            Request::DidChange(_) => "textDocument/didChange",
            Request::DidSave(_) => "textDocument/didSave",
            Request::DidClose(_) => "textDocument/didClose",
            Request::Formatting(_) => "textDocument/formatting",
            Request::CodeAction(_) => "textDocument/codeAction",
            Request::Hover(_) => "textDocument/hover",
            Request::Completion(_) => "textDocument/completion",
            Request::Definition(_) => "textDocument/definition",
            Request::References(_) => "textDocument/references",
            Request::DocumentSymbol(_) => "textDocument/documentSymbol",
            Request::Rename(_) => "textDocument/rename",
            Request::SemanticTokensFull(_) => "textDocument/semanticTokens/full",
            Request::FoldingRange(_) => "textDocument/foldingRange",
            Request::WorkspaceSymbol(_) => "workspace/symbol",
        }
    }
}

/// Handler result, before it is wrapped in the protocol response type
#[derive(Debug, PartialEq)]
pub enum Reply {
    /// Notifications, `initialize` and `shutdown`
    Empty,
    Formatting(Option<Vec<TextEdit>>),
    CodeAction(Vec<CodeActionOrCommand>),
    Hover(Option<Hover>),
    Completion(Vec<CompletionItem>),
    Definition(Option<Location>),
    References(Vec<Location>),
    DocumentSymbol(Vec<DocumentSymbol>),
    Rename(Option<WorkspaceEdit>),
    SemanticTokens(SemanticTokens),
    FoldingRange(Vec<FoldingRange>),
    WorkspaceSymbol(Vec<SymbolInformation>),
}

/// Server-to-client messages produced while handling a request
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PublishDiagnostics {
        uri: Url,
        diagnostics: Vec<Diagnostic>,
        version: Option<i32>,
    },
}

#[derive(Debug, PartialEq)]
pub struct Outcome {
    pub reply: Reply,
    pub notifications: Vec<Notification>,
}

impl Outcome {
    fn reply(reply: Reply) -> Self {
        Self {
            reply,
            notifications: Vec::new(),
        }
    }

    fn empty() -> Self {
        Self::reply(Reply::Empty)
    }

    fn notify(notifications: Vec<Notification>) -> Self {
        Self {
            reply: Reply::Empty,
            notifications,
        }
    }
}

pub struct Dispatcher {
    store: DocumentStore,
    session: Option<Session>,
    engine_factory: EngineFactory,
}

impl Dispatcher {
    pub fn new(engine_factory: EngineFactory) -> Self {
        Self {
            store: DocumentStore::new(),
            session: None,
            engine_factory,
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn dispatch(&mut self, request: Request) -> Result<Outcome, HandlerError> {
        debug!("Dispatching {}", request.method());

        match request {
            Request::Initialize(params) => {
                self.initialize(&params);
                Ok(Outcome::empty())
            }
            Request::Initialized | Request::Shutdown => Ok(Outcome::empty()),
            Request::DidOpen(params) => {
                let document = params.text_document;
                self.store
                    .open(document.uri.clone(), document.text, document.version);
                self.analyze(&document.uri).map(Outcome::notify)
            }
            Request::DidChange(params) => self.did_change(params),
            Request::DidSave(params) => self.did_save(params),
            Request::DidClose(params) => {
                let uri = params.text_document.uri;
                self.store.close(&uri);
                Ok(Outcome::notify(vec![Notification::PublishDiagnostics {
                    uri,
                    diagnostics: Vec::new(),
                    version: None,
                }]))
            }
            Request::Formatting(params) => {
                let engine = self.engine()?;
                let uri = &params.text_document.uri;
                let edits = self
                    .snapshot(uri)
                    .and_then(|doc| formatting::formatting(&doc, engine));
                Ok(Outcome::reply(Reply::Formatting(edits)))
            }
            Request::CodeAction(params) => {
                let engine = self.engine()?;
                let uri = &params.text_document.uri;
                let actions = self
                    .snapshot(uri)
                    .map(|doc| code_action::code_actions(&doc, &params.range, engine))
                    .unwrap_or_default();
                Ok(Outcome::reply(Reply::CodeAction(actions)))
            }
            Request::Hover(params) => {
                let position = params.text_document_position_params;
                let uri = &position.text_document.uri;
                self.ensure_ast(uri)?;
                let hover = self
                    .snapshot(uri)
                    .and_then(|doc| hover::hover(&doc, position.position));
                Ok(Outcome::reply(Reply::Hover(hover)))
            }
            Request::Completion(params) => {
                let uri = &params.text_document_position.text_document.uri;
                self.ensure_ast(uri)?;
                let items = self
                    .snapshot(uri)
                    .map(|doc| completion::completion(&doc))
                    .unwrap_or_default();
                Ok(Outcome::reply(Reply::Completion(items)))
            }
            Request::Definition(params) => {
                let position = params.text_document_position_params;
                let uri = &position.text_document.uri;
                self.ensure_ast(uri)?;
                let location = self
                    .snapshot(uri)
                    .and_then(|doc| definition::definition(&doc, position.position));
                Ok(Outcome::reply(Reply::Definition(location)))
            }
            Request::References(params) => {
                let position = params.text_document_position;
                let uri = &position.text_document.uri;
                self.ensure_ast(uri)?;
                let include_declaration = params.context.include_declaration;
                let locations = self
                    .snapshot(uri)
                    .map(|doc| references::references(&doc, position.position, include_declaration))
                    .unwrap_or_default();
                Ok(Outcome::reply(Reply::References(locations)))
            }
            Request::DocumentSymbol(params) => {
                let uri = &params.text_document.uri;
                self.ensure_ast(uri)?;
                let symbols = self
                    .snapshot(uri)
                    .map(|doc| document_symbol::document_symbols(&doc))
                    .unwrap_or_default();
                Ok(Outcome::reply(Reply::DocumentSymbol(symbols)))
            }
            Request::Rename(params) => {
                let position = params.text_document_position;
                let uri = &position.text_document.uri;
                self.ensure_ast(uri)?;
                let edit = self
                    .snapshot(uri)
                    .and_then(|doc| rename::rename(&doc, position.position, &params.new_name));
                Ok(Outcome::reply(Reply::Rename(edit)))
            }
            Request::SemanticTokensFull(params) => {
                let uri = &params.text_document.uri;
                self.ensure_ast(uri)?;
                let tokens = self
                    .snapshot(uri)
                    .map(|doc| semantic_tokens::semantic_tokens(&doc))
                    .unwrap_or_default();
                Ok(Outcome::reply(Reply::SemanticTokens(tokens)))
            }
            Request::FoldingRange(params) => {
                let uri = &params.text_document.uri;
                self.ensure_ast(uri)?;
                let ranges = self
                    .snapshot(uri)
                    .map(|doc| folding_range::folding_ranges(&doc))
                    .unwrap_or_default();
                Ok(Outcome::reply(Reply::FoldingRange(ranges)))
            }
            Request::WorkspaceSymbol(params) => {
                let symbols = workspace_symbol::search_symbols(&params.query, &self.store);
                Ok(Outcome::reply(Reply::WorkspaceSymbol(symbols)))
            }
        }
    }

    fn initialize(&mut self, params: &InitializeParams) {
        if let Some(session) = &self.session {
            warn!(
                "Ignoring repeated initialize request, keeping workspace root {:?}",
                session.workspace_root()
            );
            return;
        }

        let root = workspace_root(params);
        let engine = (self.engine_factory)(root.as_deref());
        info!("Session initialized with workspace root {:?}", root);
        self.session = Some(Session::new(root, engine));
    }

    /// Applies the last content change as the whole document text
    fn did_change(&mut self, params: DidChangeTextDocumentParams) -> Result<Outcome, HandlerError> {
        let document = params.text_document;
        let Some(change) = params.content_changes.into_iter().last() else {
            return Ok(Outcome::empty());
        };

        if !self.store.change(&document.uri, change.text, document.version) {
            return Ok(Outcome::empty());
        }
        self.analyze(&document.uri).map(Outcome::notify)
    }

    fn did_save(&mut self, params: DidSaveTextDocumentParams) -> Result<Outcome, HandlerError> {
        let uri = params.text_document.uri;
        let Some(version) = self.store.get(&uri).map(|record| record.version) else {
            return Ok(Outcome::empty());
        };

        if let Some(text) = params.text {
            self.store.change(&uri, text, version);
        }
        self.analyze(&uri).map(Outcome::notify)
    }

    /// Lints the stored text and records the diagnostics. Engine failures keep the
    /// previous diagnostics and publish nothing.
    fn analyze(&mut self, uri: &Url) -> Result<Vec<Notification>, HandlerError> {
        let session = self.session.as_ref().ok_or(HandlerError::NotInitialized)?;
        let Some(record) = self.store.get(uri) else {
            return Ok(Vec::new());
        };

        let version = record.version;
        let Some(diagnostics) = lint_document(session.engine(), uri, &record.text) else {
            return Ok(Vec::new());
        };

        self.store.update_diagnostics(uri, diagnostics.clone());
        Ok(vec![Notification::PublishDiagnostics {
            uri: uri.clone(),
            diagnostics,
            version: Some(version),
        }])
    }

    /// Parses the document when it has no AST for its current text. A failed parse
    /// leaves it without one; the next read request tries again.
    fn ensure_ast(&mut self, uri: &Url) -> Result<(), HandlerError> {
        let session = self.session.as_ref().ok_or(HandlerError::NotInitialized)?;
        let Some(record) = self.store.get(uri) else {
            return Ok(());
        };
        if record.ast.is_some() {
            return Ok(());
        }

        let parsed = session.engine().parse(&record.text, &uri_to_filename(uri));
        match parsed {
            Ok(ast) => self.store.update_ast(uri, Arc::new(ast)),
            Err(e) => warn!("Parse failed for {}: {}", uri, e),
        }
        Ok(())
    }

    fn engine(&self) -> Result<&dyn GrammarEngine, HandlerError> {
        self.session
            .as_ref()
            .map(Session::engine)
            .ok_or(HandlerError::NotInitialized)
    }

    fn snapshot<'a>(&'a self, uri: &'a Url) -> Option<DocumentSnapshot<'a>> {
        self.store
            .get(uri)
            .map(|record| DocumentSnapshot::new(uri, record))
    }
}
