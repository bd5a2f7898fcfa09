use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use crate::errors::SweepError;

/// Caps how many target pipelines run at once. A permit is held from the
/// probe through the last dump of a target.
#[derive(Debug, Clone)]
pub struct TargetAdmission {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl TargetAdmission {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self { semaphore: Arc::new(Semaphore::new(limit)), limit }
    }

    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, SweepError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SweepError::Cancelled("target admission closed".into()))
    }

    /// Wake every waiter with an error; used when the run is cancelled.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
