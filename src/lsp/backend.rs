use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::engine::{GrammarEngine, ProcessEngine};
use crate::handlers::semantic_tokens;
use crate::lsp::dispatcher::{Dispatcher, EngineFactory, HandlerError, Notification, Reply, Request};

pub const SERVER_NAME: &str = "collie-lsp";

pub struct Backend {
    client: Client,
    dispatcher: Arc<Mutex<Dispatcher>>,
}

impl Backend {
    pub fn new(client: Client, config: &ServerConfig) -> Self {
        let command = config.engine_command.clone();
        Self::build(
            client,
            Box::new(move |root: Option<&Path>| {
                Box::new(ProcessEngine::new(&command, root)) as Box<dyn GrammarEngine>
            }),
        )
    }

    /// Backend whose engine comes from `engine_factory`
    pub fn build(client: Client, engine_factory: EngineFactory) -> Self {
        Self {
            client,
            dispatcher: Arc::new(Mutex::new(Dispatcher::new(engine_factory))),
        }
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(true),
                    })),
                    ..Default::default()
                },
            )),
            document_formatting_provider: Some(OneOf::Left(true)),
            code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(vec!["%".to_string(), "$".to_string()]),
                ..Default::default()
            }),
            definition_provider: Some(OneOf::Left(true)),
            references_provider: Some(OneOf::Left(true)),
            document_symbol_provider: Some(OneOf::Left(true)),
            rename_provider: Some(OneOf::Left(true)),
            semantic_tokens_provider: Some(
                SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                    legend: semantic_tokens::legend(),
                    range: None,
                    full: Some(SemanticTokensFullOptions::Bool(true)),
                }),
            ),
            workspace_symbol_provider: Some(OneOf::Left(true)),
            folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
            ..Default::default()
        }
    }

    /// Runs one message on the blocking pool while holding the dispatcher, then
    /// forwards its notifications. Panics surface as `HandlerError::Panicked`.
    async fn dispatch(&self, request: Request) -> std::result::Result<Reply, HandlerError> {
        let method = request.method();
        let dispatcher = Arc::clone(&self.dispatcher);

        let result = tokio::task::spawn_blocking(move || {
            let mut dispatcher = dispatcher.lock().unwrap_or_else(PoisonError::into_inner);
            dispatcher.dispatch(request)
        })
        .await
        .unwrap_or_else(|e| Err(HandlerError::Panicked(e.to_string())));

        match result {
            Ok(outcome) => {
                self.publish(outcome.notifications).await;
                Ok(outcome.reply)
            }
            Err(e) => {
                error!("Handler for {} failed: {}", method, e);
                Err(e)
            }
        }
    }

    async fn request(&self, request: Request) -> Result<Reply> {
        self.dispatch(request)
            .await
            .map_err(|e| Error {
                message: e.to_string().into(),
                ..Error::internal_error()
            })
    }

    async fn notify(&self, request: Request) {
        // Failures are already logged; notifications have no reply to carry them
        let _ = self.dispatch(request).await;
    }

    async fn publish(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::PublishDiagnostics {
                    uri,
                    diagnostics,
                    version,
                } => {
                    self.client
                        .publish_diagnostics(uri, diagnostics, version)
                        .await;
                }
            }
        }
    }
}

fn unexpected_reply(method: &str, reply: Reply) -> Error {
    error!("Unexpected reply for {}: {:?}", method, reply);
    Error::internal_error()
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.client
            .log_message(MessageType::INFO, "LSP server initializing")
            .await;
        self.request(Request::Initialize(params)).await?;

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;
        self.notify(Request::Initialized).await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutdown requested");
        self.client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        self.request(Request::Shutdown).await?;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.notify(Request::DidOpen(params)).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.notify(Request::DidChange(params)).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.notify(Request::DidSave(params)).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.notify(Request::DidClose(params)).await;
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        match self.request(Request::Formatting(params)).await? {
            Reply::Formatting(edits) => Ok(edits),
            other => Err(unexpected_reply("textDocument/formatting", other)),
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        match self.request(Request::CodeAction(params)).await? {
            Reply::CodeAction(actions) => Ok(Some(actions)),
            other => Err(unexpected_reply("textDocument/codeAction", other)),
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        match self.request(Request::Hover(params)).await? {
            Reply::Hover(hover) => Ok(hover),
            other => Err(unexpected_reply("textDocument/hover", other)),
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        match self.request(Request::Completion(params)).await? {
            Reply::Completion(items) => Ok(Some(CompletionResponse::Array(items))),
            other => Err(unexpected_reply("textDocument/completion", other)),
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        match self.request(Request::Definition(params)).await? {
            Reply::Definition(location) => Ok(location.map(GotoDefinitionResponse::Scalar)),
            other => Err(unexpected_reply("textDocument/definition", other)),
        }
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        match self.request(Request::References(params)).await? {
            Reply::References(locations) => Ok(Some(locations)),
            other => Err(unexpected_reply("textDocument/references", other)),
        }
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        match self.request(Request::DocumentSymbol(params)).await? {
            Reply::DocumentSymbol(symbols) => Ok(Some(DocumentSymbolResponse::Nested(symbols))),
            other => Err(unexpected_reply("textDocument/documentSymbol", other)),
        }
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        match self.request(Request::Rename(params)).await? {
            Reply::Rename(edit) => Ok(edit),
            other => Err(unexpected_reply("textDocument/rename", other)),
        }
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        match self.request(Request::SemanticTokensFull(params)).await? {
            Reply::SemanticTokens(tokens) => Ok(Some(SemanticTokensResult::Tokens(tokens))),
            other => Err(unexpected_reply("textDocument/semanticTokens/full", other)),
        }
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        match self.request(Request::FoldingRange(params)).await? {
            Reply::FoldingRange(ranges) => Ok(Some(ranges)),
            other => Err(unexpected_reply("textDocument/foldingRange", other)),
        }
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        match self.request(Request::WorkspaceSymbol(params)).await? {
            Reply::WorkspaceSymbol(symbols) => Ok(Some(symbols)),
            other => Err(unexpected_reply("workspace/symbol", other)),
        }
    }
}
