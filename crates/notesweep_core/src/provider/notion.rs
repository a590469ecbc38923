//! Notion task database adapter.
//!
//! # Responsibility
//! - Implement the [`TaskStore`] contract as one `pages.create` call per
//!   task record.
//!
//! # Invariants
//! - Property names (`Task`, `Due Date`, `Type`, `Status`) match the
//!   destination database schema.
//! - A non-success response is a typed rejection, never a panic.

use crate::config::SweepConfig;
use crate::provider::{build_http_client, NewTask, ProviderInitError, TaskStore, TaskStoreError};
use log::debug;
use serde_json::json;

const PAGES_URL: &str = "https://api.notion.com/v1/pages";
const API_VERSION: &str = "2022-06-28";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Blocking HTTP task store over the Notion pages API.
pub struct NotionTaskStore {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: String,
    database_id: String,
}

impl NotionTaskStore {
    pub fn from_config(config: &SweepConfig) -> Result<Self, ProviderInitError> {
        Ok(Self {
            client: build_http_client(REQUEST_TIMEOUT_SECS)?,
            endpoint: PAGES_URL.to_string(),
            token: config.notion_token.clone(),
            database_id: config.tasks_database_id.clone(),
        })
    }

    /// Overrides the service endpoint; used by integration tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl TaskStore for NotionTaskStore {
    fn create_task(&self, task: &NewTask) -> Result<(), TaskStoreError> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": {
                "Task": {
                    "title": [{ "text": { "content": task.text } }]
                },
                "Due Date": {
                    "date": { "start": task.due_date }
                },
                "Type": {
                    "select": { "name": task.category }
                },
                "Status": {
                    "status": { "name": task.status }
                }
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .json(&body)
            .send()
            .map_err(|err| TaskStoreError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(TaskStoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!("event=task_create module=provider status=ok");
        Ok(())
    }
}
