use std::path::PathBuf;
use std::process::ExitCode;

mod checkpoint;
mod config;
mod db;
mod error;
mod extract;
mod feed;
mod models;
mod pipeline;

use checkpoint::CheckpointStore;
use config::Config;
use db::Repository;
use feed::FeedFetcher;
use pipeline::{Phase, Pipeline};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging (progress at INFO, per-unit soft failures at WARN)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut phase: Option<Phase> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--phase" if i + 1 < args.len() => {
                match Phase::parse(&args[i + 1]) {
                    Some(p) => phase = Some(p),
                    None => {
                        eprintln!("Unknown phase: {} (expected probe, discover or harvest)", args[i + 1]);
                        return ExitCode::FAILURE;
                    }
                }
                i += 2;
            }
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!("Usage: review-harvester [--config <path>] [--phase probe|discover|harvest]");
                return ExitCode::FAILURE;
            }
        }
    }

    match run(config_path, phase).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Pipeline failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: Option<PathBuf>, phase: Option<Phase>) -> error::Result<()> {
    let config = Config::load(config_path.as_deref())?;

    // All collaborators are built once here and handed to the pipeline.
    let repository = Repository::new(&config.db_path).await?;
    let checkpoints = CheckpointStore::new(&config.checkpoint_dir)?;
    let fetcher = FeedFetcher::new(&config);
    let pipeline = Pipeline::new(config, repository, checkpoints, fetcher);

    match phase {
        Some(phase) => pipeline.run_phase(phase).await,
        None => pipeline.run().await,
    }
}
