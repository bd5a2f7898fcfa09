use std::path::Path;
use crate::errors::SweepError;
use super::types::{SweepConfig, MAX_DUMP_THREADS};
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<SweepConfig, SweepError> {
    if !path.exists() {
        return Err(SweepError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(SweepError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<SweepConfig, SweepError> {
    // An empty document is a valid, empty config
    if content.trim().is_empty() {
        return Ok(SweepConfig::default());
    }
    let config: SweepConfig = serde_yaml::from_str(content)?;
    validate_ranges(&config)?;
    Ok(config)
}

/// Reject values the engine or the scheduler cannot work with.
fn validate_ranges(config: &SweepConfig) -> Result<(), SweepError> {
    if let Some(scan) = &config.scan {
        if scan.threads == Some(0) {
            return Err(SweepError::Config("scan.threads must be at least 1".into()));
        }
        if let Some(dump_threads) = scan.dump_threads {
            if dump_threads == 0 || dump_threads > MAX_DUMP_THREADS {
                return Err(SweepError::Config(format!(
                    "scan.dump_threads must be between 1 and {}, got {}",
                    MAX_DUMP_THREADS, dump_threads
                )));
            }
        }
        if scan.preset.is_some() && (scan.risk.is_some() || scan.level.is_some()) {
            warn!("scan.preset overrides scan.risk and scan.level from the same file");
        }
    }

    if let Some(engine) = &config.engine {
        if engine.timeout_secs == Some(0) {
            return Err(SweepError::Config("engine.timeout_secs must be positive".into()));
        }
        if engine.script.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(SweepError::Config("engine.script is empty".into()));
        }
    }

    Ok(())
}
