//! Poller pool

use std::time::Duration;

use shared_types::{Task, TaskReport};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::client::OrchestratorClient;
use crate::compute::evaluate;
use crate::config::AgentConfig;

/// Pause between a successful report and the next poll.
const AFTER_REPORT_PAUSE: Duration = Duration::from_millis(100);

pub struct Agent {
    config: AgentConfig,
    client: OrchestratorClient,
}

impl Agent {
    pub fn new(config: AgentConfig) -> anyhow::Result<Self> {
        let client = OrchestratorClient::new(&config.orchestrator_url, config.request_timeout())?;
        info!(
            orchestrator_url = %config.orchestrator_url,
            computing_power = config.computing_power,
            "agent created"
        );
        Ok(Self { config, client })
    }

    /// Run `computing_power` pollers until `cancel` fires, then wait for
    /// them to wind down. Pollers never stop on their own.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut pollers = JoinSet::new();
        for worker_id in 0..self.config.computing_power {
            let poller = Poller {
                worker_id,
                client: self.client.clone(),
                backoff: self.config.poll_backoff(),
                cancel: cancel.clone(),
            };
            pollers.spawn(
                poller
                    .run()
                    .instrument(info_span!("poller", worker_id)),
            );
        }

        while let Some(joined) = pollers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "poller task failed");
            }
        }
        info!("agent shut down complete");
    }
}

struct Poller {
    worker_id: usize,
    client: OrchestratorClient,
    backoff: Duration,
    cancel: CancellationToken,
}

impl Poller {
    async fn run(self) {
        info!(worker_id = self.worker_id, "worker started");
        loop {
            let fetched = tokio::select! {
                _ = self.cancel.cancelled() => break,
                fetched = self.client.fetch_task() => fetched,
            };

            let keep_going = match fetched {
                Ok(Some(task)) => self.execute(task).await,
                Ok(None) => {
                    debug!("no tasks available");
                    self.pause(self.backoff).await
                }
                Err(e) => {
                    warn!(error = %e, "failed to fetch task");
                    self.pause(self.backoff).await
                }
            };
            if !keep_going {
                break;
            }
        }
        info!(worker_id = self.worker_id, "worker stopped");
    }

    /// Sleep unless cancelled. Returns false once cancellation fires.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    async fn execute(&self, task: Task) -> bool {
        info!(
            task_id = task.id,
            arg1 = task.arg1,
            operation = %task.operation,
            arg2 = task.arg2,
            operation_time_ms = task.operation_time.as_millis() as u64,
            "task received"
        );

        let report = match evaluate(&task.operation, task.arg1, task.arg2) {
            Ok(result) => TaskReport::success(task.id, result),
            Err(e) => {
                warn!(task_id = task.id, error = %e, "task calculation error");
                TaskReport::failure(task.id, e.to_string())
            }
        };

        if !self.pause(task.operation_time).await {
            info!(task_id = task.id, "stopping during task execution");
            return false;
        }

        // A lost report would strand the node at the worker, so transport
        // failures are retried until the orchestrator answers.
        loop {
            match self.client.submit_report(&report).await {
                Ok(()) => {
                    info!(task_id = task.id, result = report.result, "task completed");
                    return self.pause(AFTER_REPORT_PAUSE).await;
                }
                Err(e) if e.is_transport() => {
                    warn!(task_id = task.id, error = %e, "failed to send result, retrying");
                    if !self.pause(self.backoff).await {
                        return false;
                    }
                }
                Err(e) => {
                    error!(task_id = task.id, error = %e, "result rejected by orchestrator");
                    return self.pause(self.backoff).await;
                }
            }
        }
    }
}
