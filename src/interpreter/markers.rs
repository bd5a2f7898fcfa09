//! Console phrasing of the sqlmap report that this crate depends on.
//!
//! sqlmap has no structured output mode for these stages, so everything the
//! pipeline learns comes from matching the strings below. Keep them together
//! so a change in the engine's wording is a one-file update.

use std::sync::LazyLock;
use regex::Regex;

/// Printed when a fresh run finds injectable parameters.
pub const IDENTIFIED_MARKER: &str = "sqlmap identified the following injection point(s)";

/// Printed when injectable parameters are loaded from a stored session.
pub const RESUMED_MARKER: &str = "sqlmap resumed the following injection point(s) from stored session";

/// Schemas that belong to the server rather than the application.
/// Compared case-insensitively.
pub const SYSTEM_SCHEMAS: &[&str] = &[
    "mysql",
    "performance_schema",
    "sys",
    "test",
    "information_schema",
];

/// `[*] shop` lines of an `--dbs` listing. Whole-line match keeps the
/// `[*] starting @ ...` banner out.
pub static DATABASE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\[\*\] (\w+)[ \t]*\r?$").expect("database pattern is valid")
});

/// `| users    |` rows of a `--tables` listing. Column padding varies with the
/// longest name, so trailing blanks inside the cell are allowed.
pub static TABLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\| (\w+)[ \t]*\|[ \t]*\r?$").expect("table pattern is valid")
});
