//! Binary entry point for swapwatch.
//!
//! Wires the configuration, feed client, and notifier together and drives
//! the pipeline on a fixed cadence. Cycles never overlap: each tick awaits
//! the previous cycle before the next one starts.

#![allow(clippy::print_stderr)]

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use swapwatch::classify::PriceExtractor;
use swapwatch::notify::LogNotifier;
use swapwatch::observability;
use swapwatch::{
    CycleReport, FeedSource, Notifier, Pipeline, PipelineContext, RedditFeed, SlackNotifier,
    WatchConfig,
};
use tokio::time::MissedTickBehavior;

/// Swapwatch - watches a listing board and forwards pattern matches.
#[derive(Parser)]
#[command(name = "swapwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Board to watch.
    #[arg(short, long)]
    board: Option<String>,

    /// Search query; omit to watch all newest posts.
    #[arg(short, long)]
    query: Option<String>,

    /// Seconds between polls.
    #[arg(short, long)]
    interval: Option<u64>,

    /// Items requested per poll.
    #[arg(short, long)]
    page_size: Option<usize>,

    /// Run a single cycle against a cold cache and exit (for cron-style use).
    /// Skips the warm-up pass, so every admitted listing counts as new.
    #[arg(long)]
    once: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load secrets from a .env file when present.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    observability::init(cli.verbose);

    let mut config = WatchConfig::from_env();
    if let Some(board) = cli.board {
        config = config.with_board(board);
    }
    if let Some(query) = cli.query {
        config = config.with_query(query);
    }
    if let Some(secs) = cli.interval {
        config = config.with_poll_interval(Duration::from_secs(secs));
    }
    if let Some(page_size) = cli.page_size {
        config = config.with_page_size(page_size);
    }

    match run(config, cli.once).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("swapwatch: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: WatchConfig, once: bool) -> anyhow::Result<()> {
    // A malformed pattern list is the one startup error worth dying for.
    let ctx = PipelineContext::new(&config).context("compiling classifier patterns")?;
    let prices =
        PriceExtractor::compile(&config.price_patterns).context("compiling price patterns")?;

    let feed = RedditFeed::new(&config.board, &config.user_agent, config.page_size);
    tracing::info!(
        board = %config.board,
        query = %config.query,
        capacity = config.cache_capacity(),
        interval_secs = config.poll_interval.as_secs(),
        "starting watcher"
    );

    match config.webhook_url.clone() {
        Some(url) => {
            let notifier = SlackNotifier::new(url, prices);
            drive(
                Pipeline::new(ctx, feed, notifier, config.query.clone()),
                config.poll_interval,
                once,
            )
            .await;
        }
        None => {
            tracing::warn!("no webhook configured, matches will only be logged");
            let notifier = LogNotifier;
            drive(
                Pipeline::new(ctx, feed, notifier, config.query.clone()),
                config.poll_interval,
                once,
            )
            .await;
        }
    }
    Ok(())
}

/// Drives the pipeline until interrupted.
///
/// The ticker queues a missed tick rather than firing concurrently, and
/// each cycle is awaited to completion, so cycles never overlap.
async fn drive<F: FeedSource, N: Notifier>(
    mut pipeline: Pipeline<F, N>,
    interval: Duration,
    once: bool,
) {
    if once {
        let report = pipeline.run_cycle().await;
        log_report(&report);
        return;
    }

    // Populate the dedup window first so only posts newer than process
    // start trigger notifications.
    if let Err(e) = pipeline.prime().await {
        tracing::warn!(error = %e, "warm-up fetch failed, starting with an empty window");
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the warm-up pass already
    // covered it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = pipeline.run_cycle().await;
                log_report(&report);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, shutting down");
                break;
            }
        }
    }
}

fn log_report(report: &CycleReport) {
    if report.completed() {
        tracing::info!(
            fetched = report.fetched,
            admitted = report.admitted,
            fresh = report.fresh,
            coarse = report.coarse,
            fine = report.fine,
            "cycle complete"
        );
    } else if let Some(stage) = report.reached {
        tracing::warn!(stage = %stage, "cycle abandoned");
    }
}
