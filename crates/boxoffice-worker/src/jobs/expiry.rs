//! Promotion expiry sweep.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use boxoffice_service::{WaitlistError, WaitlistService};

use crate::executor::{JobExecutionError, ScheduledJob};

/// Closes promotion windows that have run out.
#[derive(Debug)]
pub struct PromotionExpiryJob {
    waitlist: Arc<WaitlistService>,
}

impl PromotionExpiryJob {
    /// Create the job over the waitlist service.
    pub fn new(waitlist: Arc<WaitlistService>) -> Self {
        Self { waitlist }
    }
}

#[async_trait]
impl ScheduledJob for PromotionExpiryJob {
    fn name(&self) -> &str {
        "promotion_expiry"
    }

    async fn run(&self) -> Result<Value, JobExecutionError> {
        let expired = self.waitlist.expire_promotions().await.map_err(job_error)?;
        debug!(expired, "Promotion expiry sweep finished");
        Ok(serde_json::json!({
            "task": "promotion_expiry",
            "expired": expired,
        }))
    }
}

fn job_error(err: WaitlistError) -> JobExecutionError {
    match err {
        WaitlistError::Internal(app) => JobExecutionError::Internal(app),
        other => JobExecutionError::Permanent(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_cache::memory::MemoryCoordinationStore;
    use boxoffice_core::config::{NotificationConfig, WaitlistConfig};
    use boxoffice_database::memory::MemoryStore;
    use boxoffice_service::Outbox;

    #[tokio::test]
    async fn test_sweep_with_nothing_due() {
        let store = MemoryStore::new();
        let (outbox, _rx) = Outbox::channel(&NotificationConfig::default());
        let waitlist = Arc::new(WaitlistService::new(
            Arc::new(store.clone()),
            Arc::new(store),
            Arc::new(MemoryCoordinationStore::new()),
            outbox,
            WaitlistConfig::default(),
        ));

        let job = PromotionExpiryJob::new(waitlist);
        assert_eq!(job.name(), "promotion_expiry");
        let summary = job.run().await.unwrap();
        assert_eq!(summary["expired"], 0);
    }
}
