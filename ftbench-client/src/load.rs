use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use ftbench::{client::RedisConnection, config::Settings, loader};
use tracing::info;

use crate::DEFAULT_DATASET;

#[derive(Args)]
pub struct LoadArgs {
    /// Newline-delimited JSON dataset to load
    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: PathBuf,
}

pub async fn run(args: LoadArgs, settings: &Settings) -> anyhow::Result<()> {
    info!(primary = ?settings.primary, "connecting to the primary store");

    let mut primary = RedisConnection::connect(&settings.primary)
        .await
        .context("failed to connect to the primary store")?;

    let loaded = loader::load(&args.dataset, &mut primary)
        .await
        .with_context(|| format!("failed to load {:?}", args.dataset))?;

    println!("loaded {loaded} documents into {:?}", settings.primary.addrs);

    Ok(())
}
