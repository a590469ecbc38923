//! notesweep CLI entry point.
//!
//! # Responsibility
//! - Load environment configuration and wire the collaborators.
//! - Run one sweep and map the outcome to a process exit code.
//!
//! # Invariants
//! - Configuration and discovery failures are fatal; everything else is
//!   narrated and the run continues.

use log::error;
use notesweep_core::db::open_db;
use notesweep_core::{
    default_log_level, init_logging, ClaudeClassifier, NotionTaskStore, SqliteNoteStore,
    SweepConfig, SweepService,
};
use std::path::PathBuf;
use std::process::ExitCode;

const ENV_DB_PATH: &str = "NOTESWEEP_DB";
const ENV_LOG_DIR: &str = "NOTESWEEP_LOG_DIR";
const DEFAULT_DB_FILE: &str = "notesweep.sqlite3";

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let log_dir = std::env::var(ENV_LOG_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("notesweep-logs"));
    // Narration goes to stdout through the logger; file logs keep the
    // detailed format.
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy(), true) {
        eprintln!("logging setup failed: {err}");
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = SweepConfig::from_env().map_err(|err| format!("configuration error: {err}"))?;

    let db_path = std::env::var(ENV_DB_PATH).unwrap_or_else(|_| DEFAULT_DB_FILE.to_string());
    let conn = open_db(&db_path)
        .map_err(|err| format!("failed to open note store `{db_path}`: {err}"))?;
    let note_store = SqliteNoteStore::new(&conn);

    let classifier = ClaudeClassifier::from_config(&config).map_err(|err| err.to_string())?;
    let task_store = NotionTaskStore::from_config(&config).map_err(|err| err.to_string())?;

    let service = SweepService::new(&config, &note_store, &task_store, &classifier);
    service
        .run()
        .map(|_| ())
        .map_err(|err| format!("sweep failed: {err}"))
}
