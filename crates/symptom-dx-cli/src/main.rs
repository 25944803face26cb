//! symptom-dx command-line entry point.
//!
//! Decides which knowledge phase runs: `build` derives a snapshot from a
//! case dataset, every other command loads one.

mod commands;
mod config;
mod logging;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use symptom_dx_core::HistoryPolicy;

use crate::commands::AdapterChoice;
use crate::config::Config;
use crate::logging::LogLevel;

#[derive(Parser)]
#[command(name = "symptom-dx")]
#[command(about = "Symptom intake and differential-diagnosis ranking", version)]
struct Cli {
    /// Log level when SYMPTOM_DX_LOG is unset
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Knowledge snapshot path (overrides SYMPTOM_DX_SNAPSHOT)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// SQLite database path (overrides SYMPTOM_DX_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a knowledge snapshot from a CSV or JSON case dataset
    Build {
        /// Case dataset (`.json` for JSON, anything else is read as CSV)
        dataset: PathBuf,

        /// Output path (defaults to the configured snapshot path)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Report symptoms listed as both primary and secondary
    Audit {
        /// Snapshot to audit (defaults to the configured snapshot path)
        path: Option<PathBuf>,
    },

    /// List known symptoms, or the closest matches to a query
    Symptoms {
        #[arg(long)]
        like: Option<String>,

        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Import patient histories from a JSON file (one object or an array)
    ImportHistory { file: PathBuf },

    /// Rank a differential diagnosis and print the report as JSON
    Diagnose {
        #[arg(long)]
        patient: String,

        /// Comma-separated primary symptoms
        #[arg(long, value_delimiter = ',')]
        primary: Vec<String>,

        /// Comma-separated secondary symptoms
        #[arg(long, value_delimiter = ',')]
        secondary: Vec<String>,

        /// Skip external analysis and score locally
        #[arg(long, conflicts_with = "canned_response")]
        offline: bool,

        /// Use a recorded model response instead of calling Gemini
        #[arg(long)]
        canned_response: Option<PathBuf>,

        /// Refuse to rank for patients without a stored history
        #[arg(long)]
        require_history: bool,
    },

    /// Show a patient's stored history and past diagnoses, or list patients
    History {
        #[arg(long)]
        patient: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_logging(cli.log_level);

    let mut config = Config::from_env()?.with_overrides(cli.snapshot, cli.db);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Build { dataset, out } => {
            commands::build(&config, &dataset, out.as_deref(), &mut stdout)?;
        }
        Commands::Audit { path } => {
            commands::audit(&config, path.as_deref(), &mut stdout)?;
        }
        Commands::Symptoms { like, limit } => {
            commands::symptoms(&config, like.as_deref(), limit, &mut stdout)?;
        }
        Commands::ImportHistory { file } => {
            commands::import_history(&config, &file, &mut stdout)?;
        }
        Commands::Diagnose {
            patient,
            primary,
            secondary,
            offline,
            canned_response,
            require_history,
        } => {
            if require_history {
                config.history_policy = HistoryPolicy::Required;
            }
            let adapter = match (offline, canned_response) {
                (true, _) => AdapterChoice::Offline,
                (false, Some(path)) => AdapterChoice::Canned(path),
                (false, None) => AdapterChoice::Configured,
            };
            commands::diagnose(&config, &patient, &primary, &secondary, adapter, &mut stdout)
                .await?;
        }
        Commands::History { patient } => match patient {
            Some(patient) => commands::history(&config, &patient, &mut stdout)?,
            None => commands::list_patients(&config, &mut stdout)?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_diagnose() {
        let cli = Cli::try_parse_from([
            "symptom-dx",
            "--db",
            "dx.db",
            "diagnose",
            "--patient",
            "P001",
            "--primary",
            "fever,cough",
            "--secondary",
            "fatigue",
            "--offline",
        ])
        .unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("dx.db")));
        match cli.command {
            Commands::Diagnose {
                patient,
                primary,
                secondary,
                offline,
                ..
            } => {
                assert_eq!(patient, "P001");
                assert_eq!(primary, vec!["fever", "cough"]);
                assert_eq!(secondary, vec!["fatigue"]);
                assert!(offline);
            }
            _ => panic!("expected diagnose"),
        }
    }

    #[test]
    fn test_offline_conflicts_with_canned() {
        let result = Cli::try_parse_from([
            "symptom-dx",
            "diagnose",
            "--patient",
            "P001",
            "--offline",
            "--canned-response",
            "reply.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "symptom-dx",
            "symptoms",
            "--like",
            "fevr",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
    }
}
