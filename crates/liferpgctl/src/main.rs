//! LifeRPG Control - CLI for LifeRPG
//!
//! Without a subcommand it starts the interactive quest menu.

use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use liferpg_common::{Config, ProgressionEngine};
use tracing::debug;

use liferpgctl::cli::{Cli, Commands};
use liferpgctl::errors::{exit_code_for, EXIT_SUCCESS};
use liferpgctl::{commands, display, logging, menu};

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            eprintln!("{}", display::error_line(&err));
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }
    logging::init(cli.verbose, &config.logging.level);

    let db_path = config.database.resolved_path();
    debug!("Using database {}", db_path.display());
    let mut engine = ProgressionEngine::open(&config)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => {
            let stdin = io::stdin();
            menu::run(&mut engine, stdin.lock(), &mut out, now)?;
        }
        Commands::Init { name } => commands::init(&mut engine, &name, now(), &mut out)?,
        Commands::Status { json } => commands::status(&engine, json, &mut out)?,
        Commands::Skills { json } => commands::skills(&engine, json, &mut out)?,
        Commands::Quests { json } => commands::quests(&mut engine, now(), json, &mut out)?,
        Commands::Complete { variant, id, json } => {
            commands::complete(&mut engine, variant, id, now(), json, &mut out)?
        }
    }
    out.flush()?;
    Ok(())
}
