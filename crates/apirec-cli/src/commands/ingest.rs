//! Catalog ingestion command.

use crate::{bootstrap, render};
use apirec_core::Config;
use apirec_recommender::{BatchPolicy, IngestMode};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Ingest command arguments.
#[derive(Args)]
pub struct IngestArgs {
    /// Catalog file (JSON array or JSON Lines)
    pub catalog: PathBuf,

    /// Delete and recreate the index before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Records per upsert batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause between batches, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Concurrent embedding calls within a batch
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl IngestArgs {
    /// Batch policy from config, overridden by flags.
    pub fn policy(&self, config: &Config) -> BatchPolicy {
        let mut policy = BatchPolicy::from(&config.ingest);
        if let Some(batch_size) = self.batch_size {
            policy = policy.with_batch_size(batch_size);
        }
        if let Some(delay_ms) = self.delay_ms {
            policy = policy.with_delay(Duration::from_millis(delay_ms));
        }
        if let Some(concurrency) = self.concurrency {
            policy = policy.with_concurrency(concurrency);
        }
        policy
    }

    fn mode(&self) -> IngestMode {
        if self.reset {
            IngestMode::Reset
        } else {
            IngestMode::Incremental
        }
    }
}

/// Run the ingest command.
pub async fn run(args: IngestArgs, config: &Config) -> anyhow::Result<()> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} batches {msg}")?
            .progress_chars("=> "),
    );

    let progress_bar = bar.clone();
    let pipeline = bootstrap::ingestion_pipeline(config)?
        .with_policy(args.policy(config))
        .with_progress(move |progress| {
            progress_bar.set_length(progress.total_batches as u64);
            progress_bar.set_position(progress.batch as u64);
            if progress.failed {
                progress_bar.set_message(format!("batch {} failed", progress.batch));
            } else {
                progress_bar.set_message(format!("{} upserted", progress.upserted));
            }
        });

    let result = pipeline.run_path(&args.catalog, args.mode()).await;
    bar.finish_and_clear();

    let report = result?;
    render::render_ingest_report(&report);
    Ok(())
}
