use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, ensure};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use linkpilot::config::{self as cfg, Config};
use linkpilot::control::{self, HostCommand};
use linkpilot::executor::pacing::MAX_SCALE;
use linkpilot::executor::{PacingModel, TaskScheduler, TaskState};
use linkpilot::page::ScriptedPage;
use linkpilot::server::{self, AppState};
use linkpilot::sync::{BackendSync, HttpSync, LogSync};

/// Used when `--config` is not given; a missing file means built-in defaults.
const DEFAULT_CONFIG: &str = "config/linkpilot.json";

/// Linkpilot CLI
#[derive(Debug, Parser)]
#[command(
    name = linkpilot::PKG_NAME,
    version = linkpilot::PKG_VERSION,
    about = "Paced automation orchestrator for a professional-network page"
)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the enabled automations against a scripted page
    Run {
        /// Page fixture (JSON) to automate
        #[arg(long = "page")]
        page: PathBuf,

        /// Log backend reports instead of sending them
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Multiply every delay by this factor (overrides pacing.scale)
        #[arg(long = "pace-scale")]
        pace_scale: Option<f64>,

        /// Do not read host commands from stdin
        #[arg(long = "no-stdin")]
        no_stdin: bool,
    },
    /// Run the backend sink
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long = "bind")]
        bind: Option<String>,
    },
    /// Print the backend's activity counters
    Stats,
    /// Print the JSON Schema for the configuration and exit
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    linkpilot::init_tracing(args.log_level.as_deref());

    match args.command {
        Command::Schema => {
            cfg::write_schema_to_writer(std::io::stdout().lock())?;
            println!();
            Ok(())
        }
        Command::Stats => {
            let config = load_config(args.config.as_deref()).await?;
            let stats = HttpSync::from_config(&config.backend)?
                .stats()
                .await
                .with_context(|| format!("Failed to fetch stats from {}", config.backend.url))?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Command::Serve { bind } => {
            let config = load_config(args.config.as_deref()).await?;
            let bind = bind.unwrap_or(config.server.bind);
            server::serve(&bind, AppState::new(), async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down");
            })
            .await
        }
        Command::Run {
            page,
            dry_run,
            pace_scale,
            no_stdin,
        } => {
            let config = load_config(args.config.as_deref()).await?;
            run(config, &page, dry_run, pace_scale, no_stdin).await
        }
    }
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => cfg::load_from_path_async(path).await?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            cfg::load_from_path_async(DEFAULT_CONFIG).await?
        }
        None => {
            debug!("No config at {DEFAULT_CONFIG}; using defaults");
            Config::default()
        }
    };
    debug!(target: "linkpilot", "Configuration loaded successfully");
    Ok(config)
}

async fn run(
    config: Config,
    page: &Path,
    dry_run: bool,
    pace_scale: Option<f64>,
    no_stdin: bool,
) -> anyhow::Result<()> {
    let scale = pace_scale.unwrap_or(config.pacing.scale);
    ensure!(
        (0.0..=MAX_SCALE).contains(&scale),
        "--pace-scale must be between 0 and {MAX_SCALE} (got {scale})"
    );

    info!(
        version = linkpilot::PKG_VERSION,
        page = %page.display(),
        dry_run,
        scale,
        "Starting Linkpilot"
    );

    let page = Arc::new(ScriptedPage::from_path(page)?);
    let sync: Arc<dyn BackendSync> = if dry_run {
        Arc::new(LogSync)
    } else {
        Arc::new(HttpSync::from_config(&config.backend)?)
    };
    let scheduler = TaskScheduler::builder(page, sync)
        .pacing(PacingModel::scaled(scale))
        .build();

    for settings in config.automations.enabled() {
        let kind = settings.kind();
        if let Err(err) = scheduler.start(settings) {
            error!(%kind, error = %err, "Failed to start automation");
        }
    }
    if scheduler
        .snapshot()
        .values()
        .all(|state| *state == TaskState::Idle)
    {
        warn!("No automation running. Start one with a host command, or Ctrl+C to exit.");
    }

    let (tx, mut rx) = mpsc::channel::<HostCommand>(64);

    // Main loop: handle host commands or Ctrl+C
    tokio::select! {
        _ = async {
            if no_stdin {
                std::future::pending::<()>().await;
            }
            let _reader = control::spawn_stdin_commands(tx);
            while let Some(command) = rx.recv().await {
                let reply = control::dispatch(&scheduler, command);
                match serde_json::to_string(&reply) {
                    Ok(line) => println!("{line}"),
                    Err(err) => error!(error = %err, "Failed to encode reply"),
                }
            }
        } => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    scheduler.shutdown().await;
    info!("Linkpilot exited");
    Ok(())
}
