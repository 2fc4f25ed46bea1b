//! vaultview CLI - drives the console core against a fixture provider.

mod config;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vaultview_browse::{BrowseMode, BrowserSession, LoadState};
use vaultview_core::{BrowsePurpose, TaskId, TaskSnapshot};
use vaultview_progress::ProgressEstimator;
use vaultview_provider::MemoryProvider;
use vaultview_watch::{Step, TaskWatchCoordinator};

use crate::config::ConsoleConfig;

#[derive(Parser)]
#[command(name = "vaultview")]
#[command(about = "Backup console core: task progress and hierarchy browsing", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch tasks, printing the task lists after every poll
    Watch {
        /// Fixture describing the task manager
        #[arg(long)]
        fixture: PathBuf,
        /// Polls to run before exiting
        #[arg(long, default_value = "5")]
        ticks: usize,
        /// Poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Descend through a hierarchy, printing each level
    Browse {
        /// Fixture describing the task manager
        #[arg(long)]
        fixture: PathBuf,
        /// What to browse
        #[arg(long, value_enum, default_value = "backup")]
        purpose: PurposeArg,
        /// Task whose content is browsed (with `--purpose content`)
        #[arg(long)]
        task: Option<String>,
        /// Hide files
        #[arg(long)]
        only_dirs: bool,
        /// Entry names to descend into, in order
        segments: Vec<String>,
    },
    /// Feed a JSON array of snapshots through an estimator
    Estimate {
        /// Snapshot file
        #[arg(long)]
        snapshots: PathBuf,
        /// Print each view as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PurposeArg {
    /// Backup target picker
    Backup,
    /// Restore target picker
    Restore,
    /// Content of one task
    Content,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::load_or_default(cli.config.as_deref()).await?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Watch {
            fixture,
            ticks,
            interval_ms,
        } => {
            if let Some(ms) = interval_ms {
                config.poll_interval_ms = ms;
            }
            watch(&config, &fixture, ticks).await
        }
        Commands::Browse {
            fixture,
            purpose,
            task,
            only_dirs,
            segments,
        } => {
            config.only_directories |= only_dirs;
            let mode = browse_mode(purpose, task)?;
            browse(&config, &fixture, mode, &segments).await
        }
        Commands::Estimate { snapshots, json } => estimate(&snapshots, json).await,
    }
}

async fn load_provider(fixture: &Path) -> Result<Arc<MemoryProvider>> {
    let provider = MemoryProvider::from_json_file(fixture)
        .await
        .with_context(|| format!("Failed to load fixture {}", fixture.display()))?;
    Ok(Arc::new(provider))
}

async fn watch(config: &ConsoleConfig, fixture: &Path, ticks: usize) -> Result<()> {
    let provider = load_provider(fixture).await?;
    let mut coordinator = TaskWatchCoordinator::new(provider, config.watch_config());
    let incomplete = coordinator.incomplete_tasks();
    let completed = coordinator.completed_tasks();
    let consumption = coordinator.consumption();

    coordinator.start().await;

    let mut ticked = 0;
    while ticked < ticks {
        match coordinator.step().await? {
            Step::Tick(summary) => {
                ticked += 1;
                println!(
                    "== tick {} (polled {}, still out {})",
                    ticked, summary.polled, summary.skipped
                );
                render::print_rows("Incomplete", &incomplete.borrow());
            }
            Step::Polled { task_id, ok } => debug!("Poll of {} answered (ok: {})", task_id, ok),
            Step::Event(kind) => info!("Handled {}", kind),
            Step::Closed => break,
        }
    }

    render::print_rows("Completed", &completed.borrow());
    render::print_consumption(&consumption.borrow());
    coordinator.stop();
    Ok(())
}

fn browse_mode(purpose: PurposeArg, task: Option<String>) -> Result<BrowseMode> {
    Ok(match (purpose, task) {
        (PurposeArg::Backup, _) => BrowseMode::Target(BrowsePurpose::BackupTarget),
        (PurposeArg::Restore, _) => BrowseMode::Target(BrowsePurpose::RestoreTarget),
        (PurposeArg::Content, Some(task)) => BrowseMode::TaskContent(TaskId::new(task)),
        (PurposeArg::Content, None) => bail!("--purpose content needs --task"),
    })
}

async fn browse(config: &ConsoleConfig, fixture: &Path, mode: BrowseMode, segments: &[String]) -> Result<()> {
    let provider = load_provider(fixture).await?;
    let mut session = BrowserSession::new(provider, mode, config.browser_config());
    let view = session.subscribe();

    session.open();
    session.settle().await;
    render::print_browser(&view.borrow());

    for segment in segments {
        if session.browser().state() == LoadState::Error {
            bail!("Cannot continue below {}", session.browser().tip().display_path());
        }

        let Some(entry) = session.browser().listing().entry(segment).cloned() else {
            bail!(
                "No entry '{}' under {}",
                segment,
                session.browser().tip().display_path()
            );
        };

        debug!("Descending into {}", entry.name);
        session.descend(&entry)?;
        session.settle().await;
        println!();
        render::print_browser(&view.borrow());
    }

    if let Some(target) = session.browser().selected_target() {
        println!();
        println!("Selected: {}", target);
    }
    Ok(())
}

async fn estimate(path: &Path, json: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshots: Vec<TaskSnapshot> =
        serde_json::from_str(&content).with_context(|| format!("Invalid snapshots in {}", path.display()))?;

    let mut estimator = ProgressEstimator::new();
    for snapshot in snapshots {
        let at = Duration::from_millis(snapshot.observed_at_epoch_ms.max(0) as u64);
        estimator.update(snapshot);

        let Some(view) = estimator.view() else {
            continue;
        };
        if json {
            println!("{}", serde_json::to_string(&view)?);
        } else {
            println!("t={:>6.1}s {} | {}", at.as_secs_f64(), view.state, render::progress_line(&view));
        }
    }
    Ok(())
}
