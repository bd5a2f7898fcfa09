use crate::config::{DEFAULT_DUMP_THREADS, DEFAULT_THREADS};
use crate::models::TerminalState;

/// Run-wide knobs shared by every target worker.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Maximum concurrent target pipelines.
    pub threads: usize,
    /// Forwarded to the engine's `--threads` on dumps.
    pub dump_threads: u8,
    /// Ask the engine to discard its stored session before probing.
    pub flush_session: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            dump_threads: DEFAULT_DUMP_THREADS,
            flush_session: false,
        }
    }
}

/// Position of a target worker in the extraction state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
    Probing,
    EnumeratingDatabases,
    EnumeratingTables { database: String },
    Dumping { database: String, table: String },
    Terminal(TerminalState),
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probing => write!(f, "probing"),
            Self::EnumeratingDatabases => write!(f, "enumerating-databases"),
            Self::EnumeratingTables { database } => write!(f, "enumerating-tables({})", database),
            Self::Dumping { database, table } => write!(f, "dumping({}.{})", database, table),
            Self::Terminal(state) => write!(f, "{}", state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stage;

    #[test]
    fn test_state_display() {
        let s = TargetState::EnumeratingTables { database: "shop".into() };
        assert_eq!(s.to_string(), "enumerating-tables(shop)");
        assert_eq!(
            TargetState::Terminal(TerminalState::Failed(Stage::Dump)).to_string(),
            "failed(dump)"
        );
    }

    #[test]
    fn test_settings_defaults() {
        let s = ScanSettings::default();
        assert_eq!(s.threads, 20);
        assert_eq!(s.dump_threads, 10);
        assert!(!s.flush_session);
    }
}
