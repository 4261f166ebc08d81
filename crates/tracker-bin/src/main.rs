//! `mpt-sync` — sync Mythic+ run history from a WoW SavedVariables file
//! into SQLite, with an optional per-character spreadsheet export.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use tracker_database::{ConflictPolicy, Database};
use tracker_export::export_workbook;
use tracker_sync::sync_file;

/// mpt-sync command-line interface.
#[derive(Parser)]
#[command(name = "mpt-sync")]
#[command(about = "Sync Mythic+ run history from a SavedVariables file into SQLite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// SavedVariables file to sync from
    #[arg(short = 'i', long, env = "MPT_SAVEDVARS", global = true)]
    savedvars: Option<PathBuf>,

    /// SQLite database path
    #[arg(short, long, env = "MPT_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Conflict policy for already-stored runs (update, skip)
    #[arg(long, env = "MPT_ON_CONFLICT", global = true)]
    on_conflict: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "MPT_LOG_LEVEL", default_value = config::DEFAULT_LOG_LEVEL, global = true)]
    log_level: String,

    /// JSON config file
    #[arg(short, long, env = "MPT_CONFIG", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync runs into the database (the default action)
    Sync {
        /// Also write the spreadsheet after syncing
        #[arg(short, long, value_name = "XLSX")]
        export: Option<PathBuf>,
    },
    /// Write the per-character spreadsheet from the database
    Export {
        /// Output .xlsx path
        #[arg(short, long, value_name = "XLSX")]
        output: Option<PathBuf>,

        /// Tracked character (repeatable); defaults to the config list,
        /// else every recorded character
        #[arg(short = 'C', long = "character", value_name = "NAME")]
        characters: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(err) = run(cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let database_path = cli.database.unwrap_or_else(|| config.database_path.clone());
    let policy = ConflictPolicy::from_str(
        cli.on_conflict.as_deref().unwrap_or(&config.on_conflict),
    );

    let mut db = Database::open_with_retry(&database_path, config.open_attempts)
        .with_context(|| format!("opening database {}", database_path.display()))?;

    match cli.command {
        Some(Commands::Export { output, characters }) => {
            let output = output
                .or_else(|| config.export_path.clone())
                .unwrap_or_else(|| PathBuf::from(config::DEFAULT_EXPORT_PATH));
            let characters = if characters.is_empty() {
                None
            } else {
                Some(characters)
            };
            export(&db, &config, characters, &output)?;
        }
        Some(Commands::Sync { export: export_to }) => {
            sync(&mut db, &config, cli.savedvars, policy, export_to)?;
        }
        None => {
            sync(&mut db, &config, cli.savedvars, policy, None)?;
        }
    }

    Ok(())
}

fn sync(
    db: &mut Database,
    config: &Config,
    savedvars: Option<PathBuf>,
    policy: ConflictPolicy,
    export_to: Option<PathBuf>,
) -> anyhow::Result<()> {
    let savedvars = savedvars
        .or_else(|| config.savedvars_path.clone())
        .context("no SavedVariables file given (use --savedvars or the config file)")?;

    let report = sync_file(&savedvars, &config.primary_global, db, policy)
        .with_context(|| format!("syncing {}", savedvars.display()))?;
    if report.failed > 0 {
        info!(failed = report.failed, "some runs were dropped; re-run with -l debug for details");
    }

    if let Some(output) = export_to.or_else(|| config.export_path.clone()) {
        export(db, config, None, &output)?;
    }
    Ok(())
}

fn export(
    db: &Database,
    config: &Config,
    characters: Option<Vec<String>>,
    output: &Path,
) -> anyhow::Result<()> {
    let characters = match characters {
        Some(list) => list,
        None if !config.tracked_characters.is_empty() => config.tracked_characters.clone(),
        None => db.characters()?,
    };
    if characters.is_empty() {
        bail!("no characters to export: none tracked and the database is empty");
    }
    let sheets = export_workbook(db, &characters, output)?;
    info!(sheets, path = %output.display(), "spreadsheet written");
    Ok(())
}
