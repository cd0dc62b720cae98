//! Local trigger host over an in-memory store.
//!
//! Reads its settings from flags or `REAL_*` environment variables, runs the
//! trigger worker until Ctrl-C, then drains queued events and exits.

use std::sync::Arc;

use clap::Parser;
use real_core::SystemClock;
use real_functions::service::serve;
use real_functions::storage::engines::MemoryDocumentStore;
use real_functions::FunctionsConfig;

#[derive(Debug, Parser)]
#[command(name = "test-server", about = "Run the document triggers against an in-memory store")]
struct Cli {
    #[command(flatten)]
    config: FunctionsConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { config } = Cli::parse();

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
        }
    };
    serve(
        &config,
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(SystemClock),
        shutdown,
    )
    .await?;
    Ok(())
}
