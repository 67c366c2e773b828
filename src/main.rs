use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ledgerscope::config::Config;
use ledgerscope::http::{self, AppState};
use ledgerscope::store::Store;

#[derive(Debug, Parser)]
#[command(name = "ledgerscope", about = "Analytical back end for a personal-finance ledger")]
struct Args {
    /// Path to the YAML config file (spec.md §6).
    #[arg(long, default_value = "ledgerscope.yaml")]
    config: std::path::PathBuf,

    /// Address the JSON HTTP surface binds to.
    #[arg(long, default_value = "127.0.0.1:8787")]
    listen: std::net::SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)?;
    tracing::info!(path = %args.config.display(), "loaded config");

    let store = Store::open(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), postings = store.snapshot().postings.len(), "opened store");

    let state = AppState {
        store: Arc::new(store),
        config: Arc::new(config),
    };

    let router = http::router(state);
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!(addr = %args.listen, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
