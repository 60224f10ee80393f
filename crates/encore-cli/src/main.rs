mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use encore_core::app::{
    BulkRescheduler, CycleRunner, FailedTaskOps, FutureTaskGenerator, HealthReporter,
    ManualPostOps, MissedTaskDetector, ReconciliationEngine, RescheduleMode, next_trigger_after,
};
use encore_core::config::Config;
use encore_core::domain::RetryPolicy;
use encore_core::impls::{EnvCredentials, HttpPublisher};
use encore_core::ports::{Clock, ContentPool, Publisher, SystemClock, TaskStore};

use crate::store::{JsonFileStore, LineFilePool};

/// Environment variable holding the publisher bearer token.
const TOKEN_VAR: &str = "ENCORE_ACCESS_TOKEN";

#[derive(Parser)]
#[command(name = "encore", about = "Scheduled post reconciliation and remediation")]
struct Cli {
    /// TOML config file; defaults are used when it does not exist.
    #[arg(long, default_value = "encore.toml")]
    config: PathBuf,

    /// JSON task store.
    #[arg(long, default_value = "tasks.json")]
    tasks: PathBuf,

    /// Link pool, one link per line.
    #[arg(long, default_value = "links.txt")]
    links: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Arm the daily trigger and run one cycle per day, indefinitely.
    Run,

    /// Run one reconciliation cycle now.
    Cycle,

    /// Print the task census.
    Health,

    /// List failed and retrying tasks.
    ListFailed {
        /// Run missed-task detection first.
        #[arg(long)]
        detect: bool,
    },

    /// Spread failed tasks over future days and reset them to pending.
    Reschedule {
        /// Days from today for the first slot.
        #[arg(long, default_value_t = 1)]
        start_days: i64,

        /// Days between successive slots.
        #[arg(long, default_value_t = 1)]
        interval_days: i64,

        /// Keep each task's original time-of-day instead of the trigger time.
        #[arg(long)]
        preserve_time: bool,
    },

    /// Reset every failed and retrying task to pending.
    ResetFailed,

    /// Post failed tasks immediately, stopping after --max successes.
    PostNow {
        #[arg(long, default_value_t = 5)]
        max: usize,
    },

    /// Re-attempt every failed and retrying task immediately.
    RetryNow,
}

/// Wired components over one store/pool/config.
struct App {
    store: Arc<dyn TaskStore>,
    pool: Arc<dyn ContentPool>,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl App {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        Ok(Self {
            store: Arc::new(JsonFileStore::open(&cli.tasks)?),
            pool: Arc::new(LineFilePool::new(&cli.links)),
            clock: Arc::new(SystemClock),
            config: load_config(&cli.config)?,
        })
    }

    fn generator(&self) -> FutureTaskGenerator {
        FutureTaskGenerator::new(Arc::clone(&self.store), Arc::clone(&self.pool), &self.config)
    }

    fn publisher(&self) -> anyhow::Result<Arc<dyn Publisher>> {
        let endpoint = self
            .config
            .publisher
            .endpoint
            .clone()
            .context("publisher.endpoint is not configured")?;
        let timeout = self
            .config
            .publisher
            .timeout_secs
            .map(std::time::Duration::from_secs);
        Ok(Arc::new(HttpPublisher::new(
            endpoint,
            Arc::new(EnvCredentials::new(TOKEN_VAR)),
            timeout,
        )))
    }

    fn detector(&self) -> MissedTaskDetector {
        MissedTaskDetector::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    fn runner(&self) -> anyhow::Result<CycleRunner> {
        let engine = ReconciliationEngine::new(
            Arc::clone(&self.store),
            self.publisher()?,
            self.generator(),
            RetryPolicy::from_config(&self.config.retry),
            Arc::clone(&self.clock),
            &self.config,
        );
        Ok(CycleRunner::new(
            self.detector(),
            engine,
            self.config.attempt_missed_before_failing,
        ))
    }

    fn ops(&self) -> FailedTaskOps {
        FailedTaskOps::new(Arc::clone(&self.store))
    }

    fn manual_ops(&self) -> anyhow::Result<ManualPostOps> {
        Ok(ManualPostOps::new(
            Arc::clone(&self.store),
            self.publisher()?,
            self.generator(),
        ))
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config: Config = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("malformed config: {}", path.display()))?
    } else {
        Config::default()
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let app = App::open(&cli)?;

    match cli.command {
        Command::Run => run_loop(&app).await,
        Command::Cycle => {
            let summary = app.runner()?.run_once().await?;
            println!(
                "posted: {}  failed: {}  skipped: {}",
                summary.posted, summary.failed, summary.skipped
            );
            Ok(())
        }
        Command::Health => {
            let report = HealthReporter::new(Arc::clone(&app.store), Arc::clone(&app.clock))
                .report()
                .await?;
            println!("total:     {}", report.total);
            println!("posted:    {}", report.posted);
            println!("upcoming:  {}", report.upcoming);
            println!("pending:   {}", report.pending);
            println!("failed:    {}", report.failed);
            println!("retrying:  {}", report.retrying);
            println!("missed:    {}", report.missed);
            if report.needs_attention() {
                println!();
                println!("attention needed; consider `list-failed --detect` and `reschedule`");
            }
            Ok(())
        }
        Command::ListFailed { detect } => {
            if detect {
                let marked = app.detector().run().await?;
                println!("missed tasks newly marked failed: {marked}");
            }
            let views = app.ops().list().await?;
            if views.is_empty() {
                println!("no failed or retrying tasks");
                return Ok(());
            }
            for view in views {
                let when = view
                    .scheduled_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{}  {}  {}  retries={}  {}",
                    view.id,
                    when,
                    view.status,
                    view.retry_count,
                    view.error_message.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        Command::Reschedule {
            start_days,
            interval_days,
            preserve_time,
        } => {
            let mode = if preserve_time {
                RescheduleMode::PreserveOriginalTime
            } else {
                RescheduleMode::AtTriggerTime
            };
            let moves = BulkRescheduler::new(
                Arc::clone(&app.store),
                Arc::clone(&app.clock),
                &app.config,
            )
            .reschedule(start_days, interval_days, mode)
            .await?;
            for m in &moves {
                println!(
                    "{}  {}  ->  {}",
                    m.id,
                    m.from.format("%Y-%m-%d %H:%M"),
                    m.to.format("%Y-%m-%d %H:%M")
                );
            }
            println!("rescheduled: {}", moves.len());
            Ok(())
        }
        Command::ResetFailed => {
            let reset = app.ops().reset().await?;
            println!("reset to pending: {reset}");
            Ok(())
        }
        Command::PostNow { max } => {
            let summary = app.manual_ops()?.post_now(max).await?;
            println!(
                "attempted: {}  posted: {}  failed: {}",
                summary.attempted, summary.posted, summary.failed
            );
            Ok(())
        }
        Command::RetryNow => {
            let summary = app.manual_ops()?.retry_now().await?;
            println!(
                "attempted: {}  posted: {}  failed: {}",
                summary.attempted, summary.posted, summary.failed
            );
            Ok(())
        }
    }
}

/// Daily trigger loop: sleep until the configured wall-clock time, run one
/// cycle, re-arm for the next day. Single-flight by construction.
async fn run_loop(app: &App) -> anyhow::Result<()> {
    let runner = app.runner()?;
    let trigger = app
        .config
        .schedule
        .trigger_time()
        .context("invalid trigger time")?;

    loop {
        let now = Utc::now();
        let next = next_trigger_after(now, trigger);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next, "armed for next cycle");
        tokio::time::sleep(wait).await;

        let summary = runner.run_once().await?;
        info!(
            posted = summary.posted,
            failed = summary.failed,
            skipped = summary.skipped,
            "cycle finished"
        );
    }
}
