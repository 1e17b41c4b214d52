//! Scheduled job contract and its error type.

use async_trait::async_trait;
use serde_json::Value;

use boxoffice_core::error::AppError;

/// A unit of periodic work run by the [`CronScheduler`](crate::CronScheduler).
#[async_trait]
pub trait ScheduledJob: Send + Sync + std::fmt::Debug {
    /// Stable job name for logs.
    fn name(&self) -> &str;

    /// Run once and return a summary of what was done.
    async fn run(&self) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure; the next tick will fail the same way
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; the next tick may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Whether the failure is worth waiting out.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Permanent(_) => false,
            Self::Internal(err) => err.is_transient(),
        }
    }
}
