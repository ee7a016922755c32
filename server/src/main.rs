//! Bookmarker LSP Server Entry Point
//!
//! Serves the bookmark backend over stdio for the editor extension. The
//! extension's tree view, decorations and canvas webview all talk to this
//! process through LSP requests and custom notifications.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bookmarker-lsp")]
#[command(about = "Bookmark manager language server")]
#[command(version)]
struct Args {
    /// Run over stdio (default, kept for compatibility)
    #[arg(long)]
    stdio: bool,

    /// Workspace root to use when the client reports no workspace folders
    #[arg(long)]
    workspace: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookmarker_lsp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    use bookmarker_lsp::BookmarkBackend;
    use tower_lsp::{LspService, Server};

    tracing::info!("Starting Bookmarker LSP server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(move |client| BookmarkBackend::with_fallback_root(client, args.workspace));

    Server::new(stdin, stdout, socket).serve(service).await;
}
