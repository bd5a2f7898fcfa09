use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use crate::engine::Invoker;
use crate::models::{RunSummary, ScanOutcome, TargetDescriptor, TerminalState};
use super::admission::TargetAdmission;
use super::checkpoint::OutcomeCheckpoint;
use super::events::{EventSink, ScanEvent};
use super::extraction::TargetPipeline;
use super::state::ScanSettings;
use tracing::{error, info, warn};

/// Everything a run produced, in completion order.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<ScanOutcome>,
    pub summary: RunSummary,
}

/// Fans targets out to workers, at most `threads` pipelines at a time.
pub struct ScanScheduler {
    invoker: Arc<dyn Invoker>,
    settings: ScanSettings,
    admission: TargetAdmission,
    cancel_token: CancellationToken,
    events: EventSink,
}

impl ScanScheduler {
    pub fn new(invoker: Arc<dyn Invoker>, settings: ScanSettings) -> Self {
        let admission = TargetAdmission::new(settings.threads);
        Self {
            invoker,
            settings,
            admission,
            cancel_token: CancellationToken::new(),
            events: EventSink::default(),
        }
    }

    /// Replace the scheduler's cancel token with an external one (e.g. from
    /// the interrupt listener).
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Attach an event channel for streaming progress to a reporter.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    pub async fn run(&self, targets: Vec<TargetDescriptor>) -> ScanRun {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let started = Instant::now();
        let total = targets.len();

        info!(run_id = %run_id, targets = total, threads = self.admission.limit(), "Run started");
        self.events.emit(ScanEvent::RunStarted {
            run_id: run_id.clone(),
            targets: total,
            threads: self.admission.limit(),
        });

        // Checkpoints of workers that have not reported yet, by target id
        let mut pending: HashMap<usize, OutcomeCheckpoint> = HashMap::with_capacity(total);
        let mut workers: JoinSet<(usize, Option<ScanOutcome>)> = JoinSet::new();
        for (id, target) in targets.into_iter().enumerate() {
            let pipeline = TargetPipeline::new(
                self.invoker.clone(),
                Arc::new(target),
                self.settings.clone(),
                self.events.clone(),
            )
            .with_id(id);
            pending.insert(id, pipeline.checkpoint());
            let admission = self.admission.clone();
            workers.spawn(async move {
                // Held until the whole pipeline for this target is over
                let Ok(_permit) = admission.acquire().await else {
                    return (id, None);
                };
                (id, Some(pipeline.run().await))
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    cancelled = true;
                    break;
                }
                joined = workers.join_next() => match joined {
                    Some(Ok((id, outcome))) => {
                        pending.remove(&id);
                        outcomes.extend(outcome);
                    }
                    Some(Err(e)) => error!(error = %e, "Target worker panicked"),
                    None => break,
                },
            }
        }

        if cancelled {
            self.admission.close();
            workers.abort_all();
            // Reap aborted workers so their engine processes are killed, and
            // keep any outcome that finished in the meantime
            while let Some(joined) = workers.join_next().await {
                if let Ok((id, outcome)) = joined {
                    if outcome.is_some() {
                        pending.remove(&id);
                    }
                    outcomes.extend(outcome);
                }
            }
            let completed = outcomes.len();

            // Workers aborted mid-pipeline are reported with what they had
            let mut interrupted: Vec<(usize, ScanOutcome)> = pending
                .into_iter()
                .filter_map(|(id, checkpoint)| {
                    let mut outcome = checkpoint.take()?;
                    outcome.state = TerminalState::Cancelled;
                    Some((id, outcome))
                })
                .collect();
            interrupted.sort_by_key(|(id, _)| *id);
            let interrupted_count = interrupted.len();
            outcomes.extend(interrupted.into_iter().map(|(_, outcome)| outcome));

            warn!(
                run_id = %run_id,
                completed,
                interrupted = interrupted_count,
                remaining = total - outcomes.len(),
                "Run cancelled"
            );
            self.events.emit(ScanEvent::RunCancelled {
                completed,
                interrupted: interrupted_count,
                remaining: total - outcomes.len(),
            });
        }

        let summary = RunSummary::from_outcomes(
            total,
            &outcomes,
            cancelled,
            started.elapsed().as_millis() as u64,
        );
        info!(
            run_id = %run_id,
            completed = summary.completed,
            vulnerable = summary.vulnerable,
            databases = summary.databases,
            tables = summary.tables,
            dumps = summary.dumps,
            errors = summary.errors,
            "Run finished"
        );
        self.events.emit(ScanEvent::RunCompleted { summary: summary.clone() });

        ScanRun { run_id, started_at, outcomes, summary }
    }
}
