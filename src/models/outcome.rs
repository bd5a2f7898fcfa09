use serde::{Deserialize, Serialize};

/// One phase of a target's pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Probe,
    EnumerateDatabases,
    EnumerateTables,
    Dump,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::EnumerateDatabases => "enumerate-databases",
            Self::EnumerateTables => "enumerate-tables",
            Self::Dump => "dump",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a target's pipeline stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "stage", rename_all = "kebab-case")]
pub enum TerminalState {
    NotVulnerable,
    Done,
    Failed(Stage),
    Cancelled,
}

impl std::fmt::Display for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotVulnerable => f.write_str("not-vulnerable"),
            Self::Done => f.write_str("done"),
            Self::Failed(stage) => write!(f, "failed({})", stage),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A failed invocation, tagged with the branch it ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageError {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseOutcome {
    pub name: String,
    pub tables: Vec<String>,
}

/// Terminal record for a single target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub target: String,
    pub host: String,
    pub vulnerable: bool,
    pub state: TerminalState,
    pub databases: Vec<DatabaseOutcome>,
    pub errors: Vec<StageError>,
    pub dumps_completed: usize,
    pub duration_ms: u64,
}

impl ScanOutcome {
    pub fn new(target: &str, host: &str) -> Self {
        Self {
            target: target.to_string(),
            host: host.to_string(),
            vulnerable: false,
            state: TerminalState::NotVulnerable,
            databases: Vec::new(),
            errors: Vec::new(),
            dumps_completed: 0,
            duration_ms: 0,
        }
    }

    pub fn table_count(&self) -> usize {
        self.databases.iter().map(|d| d.tables.len()).sum()
    }
}

/// Aggregate over every outcome a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub targets: usize,
    /// Targets whose pipeline reached its end.
    pub completed: usize,
    /// Targets stopped mid-pipeline by cancellation, reported with partial data.
    pub interrupted: usize,
    pub vulnerable: usize,
    pub databases: usize,
    pub tables: usize,
    pub dumps: usize,
    pub errors: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn from_outcomes(targets: usize, outcomes: &[ScanOutcome], cancelled: bool, duration_ms: u64) -> Self {
        Self {
            targets,
            completed: outcomes.iter().filter(|o| o.state != TerminalState::Cancelled).count(),
            interrupted: outcomes.iter().filter(|o| o.state == TerminalState::Cancelled).count(),
            vulnerable: outcomes.iter().filter(|o| o.vulnerable).count(),
            databases: outcomes.iter().map(|o| o.databases.len()).sum(),
            tables: outcomes.iter().map(|o| o.table_count()).sum(),
            dumps: outcomes.iter().map(|o| o.dumps_completed).sum(),
            errors: outcomes.iter().map(|o| o.errors.len()).sum(),
            cancelled,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome_with(dbs: &[(&str, &[&str])]) -> ScanOutcome {
        let mut o = ScanOutcome::new("http://a.test/?id=1", "a.test");
        o.vulnerable = true;
        o.state = TerminalState::Done;
        o.databases = dbs.iter().map(|(name, tables)| DatabaseOutcome {
            name: name.to_string(),
            tables: tables.iter().map(|t| t.to_string()).collect(),
        }).collect();
        o
    }

    #[test]
    fn test_table_count() {
        let o = outcome_with(&[("shop", &["users", "orders"]), ("blog", &["posts"])]);
        assert_eq!(o.table_count(), 3);
    }

    #[test]
    fn test_terminal_state_display() {
        assert_eq!(TerminalState::Failed(Stage::Probe).to_string(), "failed(probe)");
        assert_eq!(TerminalState::NotVulnerable.to_string(), "not-vulnerable");
    }

    #[test]
    fn test_terminal_state_serialization() {
        let json = serde_json::to_value(TerminalState::Failed(Stage::EnumerateTables)).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["stage"], "enumerate-tables");
    }

    #[test]
    fn test_summary_from_outcomes() {
        let mut a = outcome_with(&[("shop", &["users"])]);
        a.dumps_completed = 1;
        let mut b = ScanOutcome::new("http://b.test/", "b.test");
        b.errors.push(StageError {
            stage: Stage::Probe,
            database: None,
            table: None,
            message: "exit status: 1".into(),
        });
        b.state = TerminalState::Failed(Stage::Probe);

        let summary = RunSummary::from_outcomes(3, &[a, b], false, 10);
        assert_eq!(summary.targets, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.vulnerable, 1);
        assert_eq!(summary.databases, 1);
        assert_eq!(summary.tables, 1);
        assert_eq!(summary.dumps, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.interrupted, 0);
    }

    #[test]
    fn test_summary_counts_interrupted_apart() {
        let done = outcome_with(&[("shop", &["users"])]);
        let mut partial = outcome_with(&[("crm", &["leads", "notes"])]);
        partial.state = TerminalState::Cancelled;

        let summary = RunSummary::from_outcomes(4, &[done, partial], true, 10);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.interrupted, 1);
        // Partial data still counts toward the totals
        assert_eq!(summary.databases, 2);
        assert_eq!(summary.tables, 3);
        assert!(summary.cancelled);
    }
}
