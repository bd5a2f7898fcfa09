pub mod markers;

use std::collections::HashSet;
use regex::Regex;
use markers::{DATABASE_LINE, IDENTIFIED_MARKER, RESUMED_MARKER, SYSTEM_SCHEMAS, TABLE_LINE};

/// Which listing an engine report is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPattern {
    Databases,
    Tables,
}

impl EntityPattern {
    fn regex(&self) -> &'static Regex {
        match self {
            Self::Databases => &*DATABASE_LINE,
            Self::Tables => &*TABLE_LINE,
        }
    }
}

/// True when the engine reported an injection point, fresh or resumed.
pub fn classify_vulnerable(output: &str) -> bool {
    output.contains(IDENTIFIED_MARKER) || output.contains(RESUMED_MARKER)
}

/// Names matched by `pattern`, in document order, duplicates kept,
/// system schemas removed.
pub fn extract_entities(output: &str, pattern: EntityPattern) -> Vec<String> {
    pattern
        .regex()
        .captures_iter(output)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .filter(|name| !is_system_schema(name))
        .map(str::to_string)
        .collect()
}

pub fn is_system_schema(name: &str) -> bool {
    SYSTEM_SCHEMAS.iter().any(|s| s.eq_ignore_ascii_case(name))
}

/// Drops repeated names, keeping the first occurrence.
pub fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}
