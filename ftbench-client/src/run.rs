use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Args;
use ftbench::{
    Corpus, LoadProfile, QuerySampler,
    client::RedisConnection,
    config::Settings,
    runner::{self, RunOptions},
};
use tracing::info;

use crate::DEFAULT_DATASET;

#[derive(Args)]
pub struct RunArgs {
    /// Newline-delimited JSON dataset the query words are taken from
    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: PathBuf,

    /// Comma-separated `<duration>:<target>` stages
    #[arg(long, default_value_t = LoadProfile::default())]
    pub stages: LoadProfile,

    /// Seed for the query sampling, random when not given
    #[arg(long)]
    pub seed: Option<u64>,

    /// How long in-flight queries may take to finish after the last stage
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub graceful_stop: Duration,

    /// How often the number of virtual users is adjusted
    #[arg(long, value_parser = humantime::parse_duration, default_value = "100ms")]
    pub tick: Duration,
}

pub async fn run(args: RunArgs, settings: &Settings) -> anyhow::Result<()> {
    let corpus = Corpus::from_path(&args.dataset)
        .with_context(|| format!("failed to build the corpus from {:?}", args.dataset))?;
    let sampler = QuerySampler::new(Arc::new(corpus))?;

    // the primary store only matters for `load`
    info!(search = ?settings.search, "connecting to the search service");

    let search = RedisConnection::connect(&settings.search)
        .await
        .context("failed to connect to the search service")?;

    let options = RunOptions {
        profile: args.stages,
        tick: args.tick,
        graceful_stop: args.graceful_stop,
        seed: args.seed,
    };

    let report = runner::run(sampler, search, &options).await?;

    println!("{report}");

    Ok(())
}
