//! sqlmap command-line spellings.

use crate::models::TargetDescriptor;
use super::EngineSettings;

/// Arguments passed on every invocation, after the interpreter.
pub fn base_args(settings: &EngineSettings, target: &TargetDescriptor) -> Vec<String> {
    let mut args = vec![
        settings.script.display().to_string(),
        "-u".to_string(),
        target.endpoint().to_string(),
        "--risk".to_string(),
        target.risk().to_string(),
        "--level".to_string(),
        target.level().to_string(),
    ];
    if settings.smart {
        args.push("--smart".to_string());
    }
    args.extend([
        "--batch".to_string(),
        "-o".to_string(),
        "--output-dir".to_string(),
        settings.output_dir.display().to_string(),
    ]);
    args
}

pub fn probe(flush_session: bool) -> Vec<String> {
    if flush_session {
        vec!["--flush-session".to_string()]
    } else {
        Vec::new()
    }
}

pub fn list_databases() -> Vec<String> {
    vec!["--dbs".to_string()]
}

pub fn list_tables(database: &str) -> Vec<String> {
    vec!["--tables".to_string(), "-D".to_string(), database.to_string()]
}

pub fn dump_table(database: &str, table: &str, threads: u8) -> Vec<String> {
    vec![
        "-D".to_string(),
        database.to_string(),
        "-T".to_string(),
        table.to_string(),
        "--dump".to_string(),
        "--threads".to_string(),
        threads.to_string(),
    ]
}
