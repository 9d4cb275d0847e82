use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ttr_cli::commands::{backup, day, entry, export, report, status, task, track, util};
use ttr_cli::{Cli, Commands, Config, EntryAction, TaskAction};
use ttr_db::{Database, SessionController};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(cli: &Cli) -> Result<(Database, Config)> {
    let mut config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(db_path) = &cli.db {
        config.database_path.clone_from(db_path);
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn load_controller(db: &Database, config: &Config) -> Result<SessionController> {
    SessionController::load(db, config.active_policy())
        .context("failed to scan for open sessions")
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Task { action }) => {
            let (db, _config) = open_database(&cli)?;
            match action {
                TaskAction::Add {
                    name,
                    category,
                    important,
                } => task::add(&db, name, category.as_deref(), *important)?,
                TaskAction::List => task::list(&mut stdout, &db)?,
                TaskAction::Mark { task, unset } => task::mark(&db, task, *unset)?,
                TaskAction::Rm { task } => task::remove(&db, task)?,
            }
        }
        Some(Commands::Start { task }) => {
            let (mut db, config) = open_database(&cli)?;
            let mut controller = load_controller(&db, &config)?;
            track::start(&mut db, &mut controller, task, util::now())?;
        }
        Some(Commands::Stop { task }) => {
            let (mut db, config) = open_database(&cli)?;
            let mut controller = load_controller(&db, &config)?;
            track::stop(&mut db, &mut controller, task.as_deref(), util::now())?;
        }
        Some(Commands::Pause) => {
            let (mut db, config) = open_database(&cli)?;
            let mut controller = load_controller(&db, &config)?;
            track::pause(&mut db, &mut controller, util::now())?;
        }
        Some(Commands::Status) => {
            let (db, _config) = open_database(&cli)?;
            status::run(&mut stdout, &db, util::today(), util::now())?;
        }
        Some(Commands::Day { date }) => {
            let (db, _config) = open_database(&cli)?;
            day::run(&mut stdout, &db, util::date_or_today(*date), util::now())?;
        }
        Some(Commands::Report { date, json }) => {
            let (db, _config) = open_database(&cli)?;
            report::run(&mut stdout, &db, util::date_or_today(*date), *json)?;
        }
        Some(Commands::Export {
            date,
            out,
            important_only,
        }) => {
            let (db, _config) = open_database(&cli)?;
            export::run(
                &db,
                util::date_or_today(*date),
                out.as_deref(),
                *important_only,
            )?;
        }
        Some(Commands::Entry { action }) => {
            let (db, _config) = open_database(&cli)?;
            match action {
                EntryAction::Edit {
                    id,
                    start,
                    end,
                    task,
                } => entry::edit(&db, *id, start, end, task.as_deref())?,
                EntryAction::Del { id } => entry::delete(&db, *id)?,
                EntryAction::AddEmpty { task, date } => {
                    entry::add_empty(&db, task, util::date_or_today(*date))?;
                }
            }
        }
        Some(Commands::Backup { dir, max_age_days }) => {
            let (_db, config) = open_database(&cli)?;
            let backup_dir: &Path = dir.as_deref().unwrap_or(&config.backup_dir);
            match backup::run(
                &config.database_path,
                backup_dir,
                *max_age_days,
                util::now(),
            )? {
                Some(dest) => writeln!(stdout, "Backup created: {}", dest.display())?,
                None => writeln!(stdout, "Backup skipped: a recent one exists.")?,
            }
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
