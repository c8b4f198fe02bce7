use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tracktime_cli::clock::SystemClock;
use tracktime_cli::commands::{list, report, start, status, util};
use tracktime_cli::{Cli, Commands, Config};

/// Opens the session log, creating it and its parent directory if needed.
fn open_database(path: &Path) -> Result<tracktime_db::Database> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("failed to create log directory")?;
    }

    let existed = path.exists();
    let db = tracktime_db::Database::open(path)
        .with_context(|| format!("failed to open session log {}", path.display()))?;
    if existed {
        tracing::info!(path = %path.display(), "session log loaded");
    } else {
        tracing::info!(path = %path.display(), "session log created");
    }
    Ok(db)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let database_path: PathBuf = cli
        .log_file
        .clone()
        .unwrap_or_else(|| config.database_path.clone());

    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Start { autosave }) => {
            let db = open_database(&database_path)?;
            let period = autosave.map_or_else(
                || config.autosave_period(),
                |minutes| Duration::from_secs(minutes.saturating_mul(60)),
            );

            // Stdin reads cannot be cancelled, so the runtime is shut down
            // in the background rather than waiting on a pending read.
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            let result = runtime.block_on(start::run(
                &mut stdout,
                db,
                Arc::new(SystemClock),
                period,
                start::wait_for_stop(),
            ));
            runtime.shutdown_background();
            result?;
        }
        Some(Commands::List { by_day, json }) => {
            let db = open_database(&database_path)?;
            list::run(&mut stdout, &db, *by_day, *json)?;
        }
        Some(Commands::Report { from, to, json }) => {
            let db = open_database(&database_path)?;
            let today = Local::now().date_naive();
            let from = from
                .as_deref()
                .map(|s| util::parse_date(s, today))
                .transpose()?;
            let to = to
                .as_deref()
                .map(|s| util::parse_date(s, today))
                .transpose()?;
            report::run(&mut stdout, &db, from, to, *json)?;
        }
        Some(Commands::Status) => {
            let db = open_database(&database_path)?;
            status::run(&mut stdout, &db, &database_path)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
