use super::types::SweepError;

/// How far an error reaches once it is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Aborts the whole run.
    Run,
    /// Ends one branch of one target's pipeline; siblings keep going.
    Branch,
}

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub scope: ErrorScope,
}

impl SweepError {
    /// Classify this error to determine its type and how far it propagates.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Branch-scoped: recorded on the outcome, never retried
            SweepError::Invocation(_) => ErrorClassification {
                error_type: "InvocationError",
                scope: ErrorScope::Branch,
            },
            SweepError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                scope: ErrorScope::Branch,
            },

            // Run-scoped
            SweepError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                scope: ErrorScope::Run,
            },
            SweepError::InvalidTarget(_) => ErrorClassification {
                error_type: "InvalidTargetError",
                scope: ErrorScope::Run,
            },
            SweepError::Bootstrap(_) => ErrorClassification {
                error_type: "BootstrapError",
                scope: ErrorScope::Run,
            },
            SweepError::Git(_) => ErrorClassification {
                error_type: "GitError",
                scope: ErrorScope::Run,
            },
            SweepError::Cancelled(_) => ErrorClassification {
                error_type: "CancelledError",
                scope: ErrorScope::Run,
            },
            SweepError::Io(_) => ErrorClassification {
                error_type: "IoError",
                scope: ErrorScope::Run,
            },
            SweepError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                scope: ErrorScope::Run,
            },
            SweepError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                scope: ErrorScope::Run,
            },
            SweepError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                scope: ErrorScope::Run,
            },
        }
    }

    /// Process exit code used by the binary when this error ends the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            SweepError::Config(_) | SweepError::Yaml(_) => 2,
            SweepError::Bootstrap(_) | SweepError::Git(_) => 3,
            SweepError::InvalidTarget(_) => 5,
            SweepError::Cancelled(_) => 130,
            _ => 1,
        }
    }
}
