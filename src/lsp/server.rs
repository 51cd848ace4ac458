use tower_lsp::{LspService, Server};
use tracing::info;

use crate::config::ServerConfig;
use crate::lsp::backend::{Backend, SERVER_NAME};

/// Serves LSP over stdio until the client sends `exit`
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    info!(
        "Starting {} server (engine: {})",
        SERVER_NAME, config.engine_command
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::new(client, &config));
    Server::new(stdin, stdout, socket)
        .concurrency_level(1)
        .serve(service)
        .await;

    info!("{} server stopped", SERVER_NAME);
    Ok(())
}
