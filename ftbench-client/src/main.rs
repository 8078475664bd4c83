mod load;
mod run;

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use ftbench::config::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_DATASET: &str = "test_data/News_Category_Dataset_v3.json";

#[derive(Subcommand)]
enum Command {
    /// Send random two-word FT.SEARCH queries following the load profile
    Run(run::RunArgs),
    /// Flush the primary store and load every dataset record into it as a hash
    Load(load::LoadArgs),
}

/// Load test for an FT.SEARCH endpoint.
///
/// Endpoints come from REDIS_ADDRS/REDIS_PASSWORD (primary) and
/// REDISEARCH_ADDRS/REDISEARCH_PASSWORD (search).
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_thread_names(true)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    match log_file {
        Some(path) => builder.pretty().with_writer(File::create(path)?).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref())?;

    let settings = Settings::from_env();

    match cli.command {
        Command::Run(args) => run::run(args, &settings).await,
        Command::Load(args) => load::run(args, &settings).await,
    }
}
