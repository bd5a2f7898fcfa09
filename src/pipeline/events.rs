use tokio::sync::mpsc;
use crate::models::{RunSummary, Stage, TerminalState};

/// Messages sent from the scheduler and target workers to the console
/// reporter as the run progresses.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Run execution started
    RunStarted {
        run_id: String,
        targets: usize,
        threads: usize,
    },
    /// A worker was admitted and is probing its target
    TargetStarted {
        host: String,
    },
    TargetVulnerable {
        host: String,
    },
    TargetNotVulnerable {
        host: String,
    },
    DatabasesFound {
        host: String,
        count: usize,
    },
    TablesFound {
        host: String,
        database: String,
        count: usize,
    },
    /// A table dump is being executed. `target_id` tells apart list
    /// entries that share a host.
    DumpStarted {
        target_id: usize,
        host: String,
        database: String,
        table: String,
    },
    TableDumped {
        target_id: usize,
        host: String,
        database: String,
        table: String,
    },
    /// An invocation failed; only its branch stops
    StageFailed {
        target_id: usize,
        host: String,
        stage: Stage,
        database: Option<String>,
        table: Option<String>,
        error: String,
    },
    /// A target's pipeline reached a terminal state
    TargetFinished {
        host: String,
        state: TerminalState,
        databases: usize,
        tables: usize,
    },
    RunCompleted {
        summary: RunSummary,
    },
    /// Operator interrupt; outstanding workers were torn down
    RunCancelled {
        completed: usize,
        interrupted: usize,
        remaining: usize,
    },
}

/// Optional event channel shared by every worker.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<ScanEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn emit(&self, event: ScanEvent) {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(event);
        }
    }
}
