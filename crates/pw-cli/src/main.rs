//! CLI entry point for pathwatch.
//!
//! Watches a single file or directory and prints its path every time it is
//! created, written, moved or removed.
//!
//! # Usage
//!
//! ```bash
//! pathwatch [OPTIONS] <COMMAND>
//!
//! # Watch a file, polling twice a second
//! pathwatch watch /etc/app/config.json --interval-ms 500
//!
//! # Show the effective configuration
//! pathwatch --config pathwatch.json config
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use pw_core::Config;
use pw_watcher::{ErrorReporter, PathWatcher};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Watch a path and report every change to it.
#[derive(Parser)]
#[command(name = "pathwatch", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file.
    #[arg(short, long, global = true, env = "PATHWATCH_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Watch a file or directory until interrupted.
    Watch {
        /// Path to watch.
        path: Utf8PathBuf,

        /// Poll interval in milliseconds (overrides the config file).
        #[arg(short, long, env = "PATHWATCH_INTERVAL_MS")]
        interval_ms: Option<u64>,

        /// Track directory contents recursively.
        #[arg(short, long)]
        recursive: bool,
    },

    /// Print the effective configuration as JSON.
    Config,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise uses
/// `debug` if `--verbose` is set, or the configured level.
fn init_tracing(level: &str, verbose: bool, ansi: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { level };
        EnvFilter::new(format!("{level},notify=warn"))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(ansi))
        .with(filter)
        .init();
}

/// Loads the configuration file, or defaults when none is given.
fn load_config(path: Option<&Utf8Path>) -> color_eyre::Result<Config> {
    match path {
        Some(path) => Config::from_json_file(path)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config {}: {}", path, e)),
        None => Ok(Config::default()),
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Watches `path` and prints each handled path until Ctrl-C or SIGTERM.
async fn run_watch(config: &Config, path: Utf8PathBuf) -> color_eyre::Result<()> {
    info!(
        path = %path,
        interval = ?config.watch.poll_interval,
        recursive = config.watch.recursive,
        "Starting watch"
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let watcher = PathWatcher::start(path, tx, &config.watch, ErrorReporter::default()).await?;

    let stdout = std::io::stdout();
    let print = |changed: &Utf8Path| {
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{changed}");
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                Some(changed) = rx.recv() => print(changed.as_path()),
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl-C, shutting down");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        loop {
            tokio::select! {
                Some(changed) = rx.recv() => print(changed.as_path()),
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl-C, shutting down");
                    break;
                }
            }
        }
    }

    info!(path = %watcher.watch_path(), "Watch ended");
    Ok(())
}

/// Prints the effective configuration.
fn run_config(config: &Config) -> color_eyre::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{json}")?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments and load configuration
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    // 3. Initialize tracing (handles --no-color and NO_COLOR)
    let ansi = config.log.ansi && !cli.no_color && std::env::var("NO_COLOR").is_err();
    init_tracing(&config.log.level, cli.verbose, ansi);

    // 4. Route to appropriate command
    match cli.command {
        Commands::Watch {
            path,
            interval_ms,
            recursive,
        } => {
            if let Some(ms) = interval_ms {
                config.watch = config.watch.with_poll_interval(Duration::from_millis(ms));
            }
            config.watch.recursive |= recursive;
            run_watch(&config, path).await
        }
        Commands::Config => run_config(&config),
    }
}
