// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mailroom - file reservations, contact policy, and messaging for coding
//! agents sharing one codebase.
//!
//! This is the binary entry point. Results go to stdout as JSON; logs and
//! errors go to stderr.

mod backup;
mod cli;
mod commands;
mod doctor;

use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands};
use mailroom_config::MailroomConfig;
use mailroom_coord::Coordinator;
use mailroom_core::MailroomError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(errors) => {
            mailroom_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli, config).await {
        eprintln!("mailroom: {e}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<MailroomConfig, Vec<mailroom_config::ConfigError>> {
    let mut config = match &cli.config {
        Some(path) => mailroom_config::load_and_validate_path(path)?,
        None => mailroom_config::load_and_validate()?,
    };
    if let Some(db) = &cli.db {
        config.storage.database_path = db.display().to_string();
    }
    Ok(config)
}

async fn run(cli: Cli, config: MailroomConfig) -> Result<(), MailroomError> {
    match cli.command {
        Commands::Doctor { deep, plain } => {
            doctor::run_doctor(&config, cli.config.as_deref(), deep, plain).await
        }
        Commands::Config => {
            let rendered = mailroom_config::to_toml(&config)
                .map_err(|e| MailroomError::Config(e.to_string()))?;
            print!("{rendered}");
            Ok(())
        }
        Commands::Backup { path } => backup::run_backup(&config.storage.database_path, &path),
        Commands::Restore { path } => backup::run_restore(&config.storage.database_path, &path),
        command => {
            debug!(database = %config.storage.database_path, "opening coordinator");
            let coordinator = Coordinator::open(config).await?;
            let result = commands::execute(&coordinator, command).await;
            coordinator.shutdown().await?;
            result
        }
    }
}

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins over `[logging].level` when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mailroom={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
