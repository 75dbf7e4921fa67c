use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use renewal_core::app::{PassReport, ReconcilerBuilder, RenewalReconciler, SchedulerHandle};
use renewal_core::config::RenewalConfig;
use renewal_core::domain::LicenseType;
use renewal_core::impls::{InMemoryBackend, Snapshot};
use renewal_core::ports::{Clock, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "renewal",
    about = "Create renewal tasks for alcohol and tobacco licenses nearing expiry",
    version,
    propagate_version = true
)]
struct Cli {
    /// JSON config file (defaults apply when omitted)
    #[arg(long, global = true, env = "RENEWAL_CONFIG")]
    config: Option<PathBuf>,

    /// JSON snapshot with locations, users and tasks
    #[arg(long, global = true, env = "RENEWAL_DATA")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass now and print its report
    Run {
        /// Write created tasks back to the snapshot
        #[arg(long)]
        write: bool,

        /// Limit this run to the given license types (repeatable)
        #[arg(long = "license", value_name = "TYPE")]
        licenses: Vec<LicenseType>,
    },

    /// Run the daily scheduler until Ctrl-C
    Serve {
        /// Also run a pass immediately at startup
        #[arg(long)]
        run_now: bool,

        /// Write the snapshot back on shutdown
        #[arg(long)]
        write: bool,
    },

    /// Print the next scheduled fire time
    NextRun,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(false)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config =
        RenewalConfig::load_or_default(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Commands::Run { write, licenses } => {
            let mut config = config;
            if !licenses.is_empty() {
                config.license_types = licenses;
            }
            let backend = load_backend(cli.data.as_deref())?;
            let reconciler = build_reconciler(&config, &backend)?;

            let report = reconciler.run_reconciliation().await;
            print_report(&report)?;

            if write {
                save_backend(cli.data.as_deref(), &backend).await?;
            }
            Ok(())
        }
        Commands::Serve { run_now, write } => {
            let backend = load_backend(cli.data.as_deref())?;
            let reconciler = Arc::new(build_reconciler(&config, &backend)?);
            let handle = SchedulerHandle::spawn(reconciler, config.scheduler_settings());
            info!(
                run_at = %config.schedule.run_at,
                enabled = config.schedule.enabled,
                "renewal scheduler started"
            );

            if run_now {
                let report = handle
                    .trigger_now()
                    .await
                    .context("startup pass was not run")?;
                print_report(&report)?;
            }

            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("shutdown requested");

            let status = handle.status().await;
            handle.shutdown_and_join().await;
            info!(
                scheduled_runs = status.scheduled_runs,
                manual_runs = status.manual_runs,
                "renewal scheduler exited"
            );

            if write {
                save_backend(cli.data.as_deref(), &backend).await?;
            }
            Ok(())
        }
        Commands::NextRun => {
            match config.daily_schedule() {
                Some(schedule) => {
                    let next = schedule.next_run_after(SystemClock.local_now());
                    println!("{next}");
                }
                None => println!("schedule disabled"),
            }
            Ok(())
        }
    }
}

/// `RUST_LOG` when set and valid, INFO otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn load_backend(data: Option<&Path>) -> anyhow::Result<InMemoryBackend> {
    let snapshot = match data {
        Some(path) => Snapshot::load(path).context("failed to load snapshot")?,
        None => {
            warn!("no --data snapshot given; starting from an empty directory");
            Snapshot::default()
        }
    };
    Ok(snapshot.into_backend())
}

async fn save_backend(data: Option<&Path>, backend: &InMemoryBackend) -> anyhow::Result<()> {
    let Some(path) = data else {
        anyhow::bail!("--write needs a --data snapshot path");
    };
    backend
        .snapshot()
        .await
        .save(path)
        .context("failed to write snapshot")?;
    info!(path = %path.display(), "snapshot written");
    Ok(())
}

fn build_reconciler(
    config: &RenewalConfig,
    backend: &InMemoryBackend,
) -> anyhow::Result<RenewalReconciler> {
    ReconcilerBuilder::from_config(config)
        .locations(Arc::new(backend.locations.clone()))
        .tasks(Arc::new(backend.tasks.clone()))
        .users(Arc::new(backend.users.clone()))
        .build()
        .context("failed to wire reconciler")
}

fn print_report(report: &PassReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to encode report")?;
    println!("{json}");
    Ok(())
}
