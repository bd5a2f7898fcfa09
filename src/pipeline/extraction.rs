use std::sync::Arc;
use std::time::Instant;
use crate::engine::{args, InvocationResult, Invoker};
use crate::interpreter::{classify_vulnerable, dedup_names, extract_entities, EntityPattern};
use crate::utils::truncation::{output_tail, FAILURE_TAIL_LINES};
use crate::models::{DatabaseOutcome, ScanOutcome, Stage, StageError, TargetDescriptor, TerminalState};
use super::checkpoint::OutcomeCheckpoint;
use super::events::{EventSink, ScanEvent};
use super::state::{ScanSettings, TargetState};
use tracing::{debug, info, warn};

/// Drives one target from probe to the last dump. Every stage runs
/// sequentially; a failed invocation ends only the branch it was made for.
pub struct TargetPipeline {
    id: usize,
    invoker: Arc<dyn Invoker>,
    target: Arc<TargetDescriptor>,
    settings: ScanSettings,
    events: EventSink,
    checkpoint: OutcomeCheckpoint,
    host: String,
}

impl TargetPipeline {
    pub fn new(
        invoker: Arc<dyn Invoker>,
        target: Arc<TargetDescriptor>,
        settings: ScanSettings,
        events: EventSink,
    ) -> Self {
        let host = target.host();
        Self {
            id: 0,
            invoker,
            target,
            settings,
            events,
            checkpoint: OutcomeCheckpoint::default(),
            host,
        }
    }

    /// Position of this target in the run, carried on per-target events.
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    /// Handle to the snapshot taken before each invocation.
    pub fn checkpoint(&self) -> OutcomeCheckpoint {
        self.checkpoint.clone()
    }

    pub async fn run(&self) -> ScanOutcome {
        let started = Instant::now();
        let mut outcome = ScanOutcome::new(self.target.endpoint(), &self.host);
        self.events.emit(ScanEvent::TargetStarted { host: self.host.clone() });

        let terminal = self.drive(&mut outcome).await;
        self.enter(&outcome, &TargetState::Terminal(terminal));

        outcome.state = terminal;
        outcome.duration_ms = started.elapsed().as_millis() as u64;

        self.events.emit(ScanEvent::TargetFinished {
            host: self.host.clone(),
            state: terminal,
            databases: outcome.databases.len(),
            tables: outcome.table_count(),
        });
        info!(
            target = %self.host,
            state = %terminal,
            databases = outcome.databases.len(),
            tables = outcome.table_count(),
            dumps = outcome.dumps_completed,
            errors = outcome.errors.len(),
            duration_ms = outcome.duration_ms,
            "Target finished"
        );
        outcome
    }

    async fn drive(&self, outcome: &mut ScanOutcome) -> TerminalState {
        self.enter(outcome, &TargetState::Probing);
        let probe = self.invoke(&args::probe(self.settings.flush_session)).await;
        debug!(target = %self.host, output = %probe.output, "Probe output");
        if probe.failed {
            self.record_failure(outcome, Stage::Probe, None, None, &probe);
            return TerminalState::Failed(Stage::Probe);
        }
        if !classify_vulnerable(&probe.output) {
            info!(target = %self.host, "Not vulnerable");
            self.events.emit(ScanEvent::TargetNotVulnerable { host: self.host.clone() });
            return TerminalState::NotVulnerable;
        }

        outcome.vulnerable = true;
        info!(target = %self.host, "Vulnerable, fetching details");
        self.events.emit(ScanEvent::TargetVulnerable { host: self.host.clone() });

        self.enter(outcome, &TargetState::EnumeratingDatabases);
        let listing = self.invoke(&args::list_databases()).await;
        if listing.failed {
            self.record_failure(outcome, Stage::EnumerateDatabases, None, None, &listing);
            return TerminalState::Failed(Stage::EnumerateDatabases);
        }
        let databases = dedup_names(extract_entities(&listing.output, EntityPattern::Databases));
        info!(target = %self.host, count = databases.len(), "Databases found");
        self.events.emit(ScanEvent::DatabasesFound {
            host: self.host.clone(),
            count: databases.len(),
        });

        for database in &databases {
            let Some(tables) = self.enumerate_tables(outcome, database).await else {
                continue;
            };
            for table in &tables {
                self.dump(outcome, database, table).await;
            }
        }

        TerminalState::Done
    }

    /// Lists one database's tables and records them. `None` when the
    /// invocation failed.
    async fn enumerate_tables(&self, outcome: &mut ScanOutcome, database: &str) -> Option<Vec<String>> {
        self.enter(outcome, &TargetState::EnumeratingTables { database: database.to_string() });
        let listing = self.invoke(&args::list_tables(database)).await;
        if listing.failed {
            // The database itself was found; keep it with no tables
            outcome.databases.push(DatabaseOutcome {
                name: database.to_string(),
                tables: Vec::new(),
            });
            self.record_failure(outcome, Stage::EnumerateTables, Some(database), None, &listing);
            return None;
        }

        let tables = dedup_names(extract_entities(&listing.output, EntityPattern::Tables));
        info!(target = %self.host, database, count = tables.len(), "Tables found");
        self.events.emit(ScanEvent::TablesFound {
            host: self.host.clone(),
            database: database.to_string(),
            count: tables.len(),
        });
        outcome.databases.push(DatabaseOutcome {
            name: database.to_string(),
            tables: tables.clone(),
        });
        Some(tables)
    }

    async fn dump(&self, outcome: &mut ScanOutcome, database: &str, table: &str) {
        self.enter(outcome, &TargetState::Dumping {
            database: database.to_string(),
            table: table.to_string(),
        });
        self.events.emit(ScanEvent::DumpStarted {
            target_id: self.id,
            host: self.host.clone(),
            database: database.to_string(),
            table: table.to_string(),
        });

        let result = self.invoke(&args::dump_table(database, table, self.settings.dump_threads)).await;
        if result.failed {
            self.record_failure(outcome, Stage::Dump, Some(database), Some(table), &result);
            return;
        }

        outcome.dumps_completed += 1;
        info!(target = %self.host, database, table, "Table dumped");
        self.events.emit(ScanEvent::TableDumped {
            target_id: self.id,
            host: self.host.clone(),
            database: database.to_string(),
            table: table.to_string(),
        });
    }

    async fn invoke(&self, extra_args: &[String]) -> InvocationResult {
        self.invoker.invoke(&self.target, extra_args).await
    }

    /// Every await in the pipeline follows a call to this, so the
    /// checkpoint always holds everything extracted before the current
    /// invocation.
    fn enter(&self, outcome: &ScanOutcome, state: &TargetState) {
        debug!(target = %self.host, state = %state, "State transition");
        self.checkpoint.record(outcome);
    }

    fn record_failure(
        &self,
        outcome: &mut ScanOutcome,
        stage: Stage,
        database: Option<&str>,
        table: Option<&str>,
        result: &InvocationResult,
    ) {
        let message = result.error_message();
        let classification = result.error.as_ref().map(|e| e.classify());
        warn!(
            target = %self.host,
            stage = %stage,
            error_type = classification.as_ref().map_or("InvocationError", |c| c.error_type),
            scope = ?classification.as_ref().map(|c| c.scope),
            database = ?database,
            table = ?table,
            error = %message,
            "Stage failed"
        );
        if !result.output.is_empty() {
            debug!(
                target = %self.host,
                stage = %stage,
                output = %output_tail(&result.output, FAILURE_TAIL_LINES),
                "Output of failed stage"
            );
        }
        outcome.errors.push(StageError {
            stage,
            database: database.map(str::to_string),
            table: table.map(str::to_string),
            message: message.clone(),
        });
        self.events.emit(ScanEvent::StageFailed {
            target_id: self.id,
            host: self.host.clone(),
            stage,
            database: database.map(str::to_string),
            table: table.map(str::to_string),
            error: message,
        });
    }
}
