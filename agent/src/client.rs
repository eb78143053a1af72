//! HTTP client for the orchestrator's worker protocol

use std::time::Duration;

use reqwest::StatusCode;
use shared_types::{Task, TaskReport, PATH_INTERNAL_TASK};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection refused, timeout, broken body: worth retrying.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    http: reqwest::Client,
    task_url: String,
}

impl OrchestratorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            task_url: format!("{}{PATH_INTERNAL_TASK}", base_url.trim_end_matches('/')),
        })
    }

    /// `Ok(None)` when the orchestrator has nothing ready (404).
    pub async fn fetch_task(&self) -> Result<Option<Task>, ClientError> {
        let response = self.http.get(&self.task_url).send().await?;
        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<Task>().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(ClientError::UnexpectedStatus {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    pub async fn submit_report(&self, report: &TaskReport) -> Result<(), ClientError> {
        let response = self.http.post(&self.task_url).json(report).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(ClientError::UnexpectedStatus {
            status,
            body: response.text().await.unwrap_or_default(),
        })
    }
}
