//! Cron scheduler for periodic waitlist maintenance.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use boxoffice_core::error::AppError;

use crate::executor::ScheduledJob;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler })
    }

    /// Run `job` on the given six-field cron expression.
    ///
    /// Failures are logged; the job runs again on the next tick.
    pub async fn register(
        &self,
        schedule: &str,
        job: Arc<dyn ScheduledJob>,
    ) -> Result<(), AppError> {
        let name = job.name().to_string();
        let task = Arc::clone(&job);
        let cron = CronJob::new_async(schedule, move |_uuid, _lock| {
            let task = Arc::clone(&task);
            Box::pin(async move {
                match task.run().await {
                    Ok(summary) => {
                        tracing::debug!(job = task.name(), summary = %summary, "Scheduled job finished")
                    }
                    Err(e) if e.is_transient() => {
                        tracing::warn!(job = task.name(), error = %e, "Scheduled job failed; retrying next tick")
                    }
                    Err(e) => tracing::error!(job = task.name(), error = %e, "Scheduled job failed"),
                }
            })
        })
        .map_err(|e| AppError::configuration(format!("Invalid schedule '{}' for {}: {}", schedule, name, e)))?;

        self.scheduler
            .add(cron)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {} schedule: {}", name, e)))?;

        tracing::info!(job = %name, schedule = %schedule, "Registered scheduled job");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    use crate::executor::JobExecutionError;

    #[derive(Debug)]
    struct Noop;

    #[async_trait]
    impl ScheduledJob for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        async fn run(&self) -> Result<Value, JobExecutionError> {
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn test_rejects_malformed_schedule() {
        let scheduler = CronScheduler::new().await.unwrap();
        let err = scheduler
            .register("every minute please", Arc::new(Noop))
            .await
            .unwrap_err();
        assert_eq!(err.kind, boxoffice_core::error::ErrorKind::Configuration);

        scheduler.register("0 * * * * *", Arc::new(Noop)).await.unwrap();
    }
}
