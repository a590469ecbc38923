//! Remote collaborator contracts and HTTP implementations.
//!
//! # Responsibility
//! - Define the task-persistence contract the sweep pipeline consumes.
//! - Host the blocking HTTP adapters for the classification and task
//!   services.
//!
//! # Invariants
//! - One `create_task` call per record, independent of other calls; no
//!   batching, no transaction spanning multiple tasks.
//! - Adapters are constructed from explicit configuration, never from
//!   ambient globals.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod claude;
pub mod notion;

/// Write request for one task destined for the remote task store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Task text, already trimmed and marker-stripped.
    pub text: String,
    /// Final category from the closed set.
    pub category: String,
    /// Due date in `YYYY-MM-DD` form.
    pub due_date: String,
    /// Initial workflow status label.
    pub status: String,
}

/// Error from a single task-persistence call.
#[derive(Debug)]
pub enum TaskStoreError {
    /// Request could not be sent or the response not read.
    Transport(String),
    /// Store answered with a non-success status.
    Rejected { status: u16, message: String },
}

impl Display for TaskStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "task store transport error: {message}"),
            Self::Rejected { status, message } => {
                write!(f, "task store rejected with status {status}: {message}")
            }
        }
    }
}

impl Error for TaskStoreError {}

/// Task persistence collaborator contract.
pub trait TaskStore {
    fn create_task(&self, task: &NewTask) -> Result<(), TaskStoreError>;
}

/// Startup failure while constructing a remote adapter.
#[derive(Debug)]
pub struct ProviderInitError {
    pub message: String,
}

impl Display for ProviderInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "provider setup failed: {}", self.message)
    }
}

impl Error for ProviderInitError {}

pub(crate) fn build_http_client(
    timeout_secs: u64,
) -> Result<reqwest::blocking::Client, ProviderInitError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|err| ProviderInitError {
            message: format!("HTTP client error: {err}"),
        })
}
