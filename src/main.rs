use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conveyor::cli::Cli;
use conveyor::config::Config;
use conveyor::poller::Poller;
use conveyor::processor::WorkerPoolProcessor;
use conveyor::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.apply(Config::load_from(&cli.config)?);

    let store = Arc::new(MemoryStore::new());
    store.start_generator(config.generator.clone())?;

    let processor = Arc::new(WorkerPoolProcessor::new(
        store.clone(),
        config.max_processing_secs,
    ));
    let poller = Poller::new(processor, config.poll_interval())?;
    poller.start()?;

    info!("processor running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    poller.stop().await?;
    store.stop_generator().await;
    info!("shutdown complete");
    Ok(())
}
