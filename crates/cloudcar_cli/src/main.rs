//! Operator CLI for the CloudCar store.
//!
//! # Responsibility
//! - Apply schema migrations as an explicit step before serving.
//! - Report schema status and crate version for quick sanity checks.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use cloudcar_core::db::migrations::latest_version;
use cloudcar_core::db::{migrate_db, schema_version};
use cloudcar_core::{core_version, default_log_level, init_logging};
use log::{error, info};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cloudcar", version, about = "CloudCar store maintenance")]
struct Cli {
    /// trace|debug|info|warn|error; defaults by build profile.
    #[arg(long, global = true, env = "CLOUDCAR_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate {
        #[arg(long, env = "CLOUDCAR_DB", default_value = "cloudcar.sqlite3")]
        db: PathBuf,
    },
    /// Print the current and latest schema versions.
    Status {
        #[arg(long, env = "CLOUDCAR_DB", default_value = "cloudcar.sqlite3")]
        db: PathBuf,
    },
    /// Print the core crate version.
    Version,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Migrate { .. } => "migrate",
            Self::Status { .. } => "status",
            Self::Version => "version",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, None).map_err(|err| anyhow!(err))?;

    println!("{}", run(cli.command)?);
    Ok(())
}

fn run(command: Command) -> anyhow::Result<String> {
    let name = command.name();
    info!("event=cli_command module=cli status=start command={name}");
    let outcome = execute(command);
    match &outcome {
        Ok(_) => info!("event=cli_command module=cli status=ok command={name}"),
        Err(err) => {
            error!("event=cli_command module=cli status=error command={name} error={err:#}")
        }
    }
    outcome
}

fn execute(command: Command) -> anyhow::Result<String> {
    match command {
        Command::Migrate { db } => {
            let report = migrate_db(&db)
                .with_context(|| format!("failed to migrate {}", db.display()))?;
            if report.applied_any() {
                Ok(format!(
                    "migrated {}: {} -> {}",
                    db.display(),
                    report.from_version,
                    report.to_version
                ))
            } else {
                Ok(format!(
                    "{} is up to date at version {}",
                    db.display(),
                    report.to_version
                ))
            }
        }
        Command::Status { db } => {
            let current = schema_version(&db)
                .with_context(|| format!("failed to read {}", db.display()))?;
            let latest = latest_version();
            let state = match current.cmp(&latest) {
                std::cmp::Ordering::Less => "pending migrations",
                std::cmp::Ordering::Equal => "current",
                std::cmp::Ordering::Greater => "newer than this build",
            };
            Ok(format!("schema version {current} of {latest} ({state})"))
        }
        Command::Version => Ok(format!("cloudcar_core version={}", core_version())),
    }
}

#[cfg(test)]
mod tests {
    use super::{run, Cli, Command};
    use clap::Parser;

    #[test]
    fn migrate_then_status_reports_current() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");

        let first = run(Command::Migrate { db: db.clone() }).unwrap();
        assert!(first.starts_with("migrated"));
        assert!(first.contains("0 -> "));

        let second = run(Command::Migrate { db: db.clone() }).unwrap();
        assert!(second.contains("up to date"));

        let status = run(Command::Status { db }).unwrap();
        assert!(status.ends_with("(current)"));
    }

    #[test]
    fn status_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(Command::Status {
            db: dir.path().join("missing.db")
        })
        .is_err());
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["cloudcar", "migrate", "--db", "/tmp/x.db"]);
        assert!(matches!(cli.command, Command::Migrate { .. }));
        let cli = Cli::parse_from(["cloudcar", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn commands_report_their_log_name() {
        let cli = Cli::parse_from(["cloudcar", "status", "--db", "/tmp/x.db"]);
        assert_eq!(cli.command.name(), "status");
        assert_eq!(Command::Version.name(), "version");

        let version = run(Command::Version).unwrap();
        assert!(version.starts_with("cloudcar_core version="));
    }
}
