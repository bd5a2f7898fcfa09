use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use crate::models::ScanOutcome;

#[derive(Debug, Default)]
struct Snapshot {
    outcome: Option<ScanOutcome>,
    started: Option<Instant>,
}

/// Latest snapshot of a target's outcome, shared with the scheduler so an
/// aborted worker can still be reported with what it extracted.
#[derive(Debug, Clone, Default)]
pub struct OutcomeCheckpoint {
    latest: Arc<Mutex<Snapshot>>,
}

impl OutcomeCheckpoint {
    pub fn record(&self, outcome: &ScanOutcome) {
        let mut snapshot = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        snapshot.started.get_or_insert_with(Instant::now);
        snapshot.outcome = Some(outcome.clone());
    }

    /// The last snapshot, with its duration measured from the first one.
    /// `None` if the worker never got past admission.
    pub fn take(&self) -> Option<ScanOutcome> {
        let mut snapshot = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let started = snapshot.started;
        snapshot.outcome.take().map(|mut outcome| {
            if let Some(started) = started {
                outcome.duration_ms = started.elapsed().as_millis() as u64;
            }
            outcome
        })
    }
}
