use std::path::PathBuf;

use clap::Parser;

use collie_lsp::config::ServerConfig;
use collie_lsp::log;
use collie_lsp::lsp::server::run_server;

#[derive(Parser, Debug)]
#[command(name = "collie-lsp", version)]
#[command(about = "Language server for yacc/bison grammar files (stdio)")]
struct Args {
    /// Append server logs to this file (defaults to $COLLIE_LSP_LOG)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Grammar engine command (defaults to $COLLIE_ENGINE, then `collie`)
    #[arg(long = "engine")]
    engine: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ServerConfig::resolve(args.log_file, args.engine);

    let _guard = log::init(config.log_path.as_deref())?;

    run_server(config).await
}
