//! Contract with the background task queue.
//!
//! The queue owns scheduling, priorities and backoff. This module only
//! defines what a task looks like, how one is executed against the
//! `AdapterManager`, and when a failed execution should be tried again.

use async_trait::async_trait;
use bankbridge_adapters::AdapterError;
use bankbridge_contract::{ApplicationEnvelope, ApplicationStatus, BankResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::manager::{AdapterManager, ManagerError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    SendApplication,
    CheckStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Running,
    Succeeded,
    Retrying,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankTask {
    pub id: String,
    pub kind: TaskKind,
    pub application_id: String,
    pub bank_id: String,
    pub envelope: Option<ApplicationEnvelope>,
    pub priority: i32,
    /// Retries already performed.
    pub attempts: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
}

impl BankTask {
    pub fn send(envelope: ApplicationEnvelope, bank_id: impl Into<String>, max_retries: u32) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            kind: TaskKind::SendApplication,
            application_id: envelope.id.clone(),
            bank_id: bank_id.into(),
            envelope: Some(envelope),
            priority: 0,
            attempts: 0,
            max_retries,
            created_at: Utc::now(),
        }
    }

    pub fn check_status(
        application_id: impl Into<String>,
        bank_id: impl Into<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            kind: TaskKind::CheckStatus,
            application_id: application_id.into(),
            bank_id: bank_id.into(),
            envelope: None,
            priority: 0,
            attempts: 0,
            max_retries,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn can_retry(&self) -> bool {
        self.attempts < self.max_retries
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("task {0} not found")]
    TaskNotFound(String),
    #[error("queue rejected task: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Queues `task` and returns its id.
    async fn enqueue(&self, task: BankTask) -> Result<String, QueueError>;

    async fn task_state(&self, task_id: &str) -> Result<TaskState, QueueError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Response(BankResponse),
    Status(ApplicationStatus),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The provider answered. A submission may still carry `success == false`
    /// for a business rejection.
    Completed(TaskResult),
    Retry { reason: String },
    Failed { reason: String },
}

impl TaskOutcome {
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Completed(TaskResult::Response(response)) if !response.success => {
                TaskState::Failed
            }
            TaskOutcome::Completed(_) => TaskState::Succeeded,
            TaskOutcome::Retry { .. } => TaskState::Retrying,
            TaskOutcome::Failed { .. } => TaskState::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BankTaskProcessor {
    manager: AdapterManager,
}

impl BankTaskProcessor {
    pub fn new(manager: AdapterManager) -> Self {
        Self { manager }
    }

    pub async fn process(&self, task: &BankTask) -> TaskOutcome {
        let outcome = match task.kind {
            TaskKind::SendApplication => self.send(task).await,
            TaskKind::CheckStatus => self.check_status(task).await,
        };
        info!(
            task_id = %task.id,
            bank_id = %task.bank_id,
            attempts = task.attempts,
            state = ?outcome.state(),
            "task processed"
        );
        outcome
    }

    /// Processes `task` and puts it back on `queue` with one more attempt when
    /// the outcome is `Retry`.
    pub async fn process_and_requeue(
        &self,
        queue: &dyn TaskQueue,
        task: BankTask,
    ) -> Result<TaskOutcome, QueueError> {
        let outcome = self.process(&task).await;
        if let TaskOutcome::Retry { reason } = &outcome {
            warn!(task_id = %task.id, %reason, "re-enqueueing task");
            let mut next = task;
            next.attempts += 1;
            queue.enqueue(next).await?;
        }
        Ok(outcome)
    }

    async fn send(&self, task: &BankTask) -> TaskOutcome {
        let Some(envelope) = &task.envelope else {
            return TaskOutcome::Failed {
                reason: format!("send task {} carries no application", task.id),
            };
        };

        let responses = self
            .manager
            .send_to_specific(envelope, &[task.bank_id.as_str()])
            .await;
        let Some(response) = responses.into_iter().next() else {
            return TaskOutcome::Failed {
                reason: format!("no response for bank {}", task.bank_id),
            };
        };

        if response.is_retryable() {
            retry_or_fail(task, response.message)
        } else {
            TaskOutcome::Completed(TaskResult::Response(response))
        }
    }

    async fn check_status(&self, task: &BankTask) -> TaskOutcome {
        match self
            .manager
            .application_status(&task.application_id, &task.bank_id)
            .await
        {
            Ok(status) => TaskOutcome::Completed(TaskResult::Status(status)),
            Err(
                error @ ManagerError::Adapter(
                    AdapterError::Communication(_) | AdapterError::Timeout { .. },
                ),
            ) => retry_or_fail(task, error.to_string()),
            Err(error) => TaskOutcome::Failed {
                reason: error.to_string(),
            },
        }
    }
}

fn retry_or_fail(task: &BankTask, reason: String) -> TaskOutcome {
    if task.can_retry() {
        TaskOutcome::Retry { reason }
    } else {
        TaskOutcome::Failed {
            reason: format!("gave up after {} retries: {reason}", task.attempts),
        }
    }
}
