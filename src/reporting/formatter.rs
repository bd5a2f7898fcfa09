use crate::models::{RunSummary, ScanOutcome, TerminalState};
use crate::utils::formatting::{format_duration, plural};

pub fn format_outcome(outcome: &ScanOutcome) -> String {
    let mut out = match outcome.state {
        TerminalState::NotVulnerable => format!("{}: not vulnerable\n", outcome.host),
        TerminalState::Failed(stage) if !outcome.vulnerable => {
            format!("{}: {} failed\n", outcome.host, stage)
        }
        TerminalState::Cancelled if !outcome.vulnerable => {
            format!("{}: interrupted while probing\n", outcome.host)
        }
        TerminalState::Cancelled => format!(
            "{}: vulnerable, interrupted after {}, {}, {} dumped\n",
            outcome.host,
            plural(outcome.databases.len(), "database"),
            plural(outcome.table_count(), "table"),
            outcome.dumps_completed,
        ),
        _ if outcome.databases.is_empty() => {
            format!("{}: vulnerable, no user databases\n", outcome.host)
        }
        _ => format!(
            "{}: vulnerable, {}, {}, {} dumped\n",
            outcome.host,
            plural(outcome.databases.len(), "database"),
            plural(outcome.table_count(), "table"),
            outcome.dumps_completed,
        ),
    };
    for db in &outcome.databases {
        if db.tables.is_empty() {
            out.push_str(&format!("  {}\n", db.name));
        } else {
            out.push_str(&format!("  {}: {}\n", db.name, db.tables.join(", ")));
        }
    }
    for err in &outcome.errors {
        let scope = match (&err.database, &err.table) {
            (Some(db), Some(t)) => format!(" {}.{}", db, t),
            (Some(db), None) => format!(" {}", db),
            _ => String::new(),
        };
        out.push_str(&format!("  ! {}{}: {}\n", err.stage, scope, err.message));
    }
    out
}

pub fn format_summary(summary: &RunSummary) -> String {
    let headline = if summary.cancelled { "Scan interrupted." } else { "Scan complete." };
    let interrupted = if summary.interrupted > 0 {
        format!(" ({} interrupted)", summary.interrupted)
    } else {
        String::new()
    };
    format!(
        "{} {} of {} reported{}, {} vulnerable, {}, {}, {} dumped, {} in {}\n",
        headline,
        summary.completed,
        summary.targets,
        interrupted,
        summary.vulnerable,
        plural(summary.databases, "database"),
        plural(summary.tables, "table"),
        summary.dumps,
        plural(summary.errors, "error"),
        format_duration(summary.duration_ms),
    )
}
