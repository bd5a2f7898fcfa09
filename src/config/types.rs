use serde::{Deserialize, Serialize};
use crate::models::{Level, Risk};

pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_SCRIPT: &str = "sqlmap/sqlmap.py";
pub const DEFAULT_INSTALL_DIR: &str = "sqlmap";
pub const DEFAULT_REPOSITORY: &str = "https://github.com/sqlmapproject/sqlmap.git";
pub const DEFAULT_OUTPUT_DIR: &str = "./Output";
pub const DEFAULT_THREADS: usize = 20;
pub const DEFAULT_DUMP_THREADS: u8 = 10;
/// sqlmap refuses `--threads` above this.
pub const MAX_DUMP_THREADS: u8 = 10;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    pub engine: Option<EngineConfig>,
    pub scan: Option<ScanConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Interpreter used to launch the engine script.
    pub python: Option<String>,
    pub script: Option<String>,
    /// Where the engine is cloned when `script` is missing.
    pub install_dir: Option<String>,
    pub repository: Option<String>,
    pub output_dir: Option<String>,
    pub timeout_secs: Option<u64>,
    pub smart: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    pub preset: Option<Preset>,
    pub risk: Option<Risk>,
    pub level: Option<Level>,
    pub threads: Option<usize>,
    pub dump_threads: Option<u8>,
    pub flush_session: Option<bool>,
}

/// Canned settings for the two common run shapes.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// One URL, maximum depth.
    Single,
    /// Many URLs, moderate depth, wider fan-out.
    Multi,
}

/// Values a preset pins. `None` leaves the next source in charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetValues {
    pub risk: Risk,
    pub level: Level,
    pub threads: Option<usize>,
    pub dump_threads: Option<u8>,
}

impl Preset {
    pub fn values(&self) -> PresetValues {
        match self {
            Self::Single => PresetValues {
                risk: Risk::of(3),
                level: Level::of(5),
                threads: None,
                dump_threads: None,
            },
            Self::Multi => PresetValues {
                risk: Risk::of(2),
                level: Level::of(3),
                threads: Some(30),
                dump_threads: Some(10),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_single_values() {
        let v = Preset::Single.values();
        assert_eq!(v.risk.value(), 3);
        assert_eq!(v.level.value(), 5);
        assert_eq!(v.threads, None);
    }

    #[test]
    fn test_preset_multi_values() {
        let v = Preset::Multi.values();
        assert_eq!(v.risk.value(), 2);
        assert_eq!(v.level.value(), 3);
        assert_eq!(v.threads, Some(30));
        assert_eq!(v.dump_threads, Some(10));
    }

    #[test]
    fn test_preset_deserialize() {
        let parsed: Preset = serde_yaml::from_str("multi").unwrap();
        assert_eq!(parsed, Preset::Multi);
    }

    #[test]
    fn test_config_default_is_empty() {
        let config = SweepConfig::default();
        assert!(config.engine.is_none());
        assert!(config.scan.is_none());
    }

    #[test]
    fn test_scan_config_rejects_bad_risk() {
        let parsed: Result<ScanConfig, _> = serde_yaml::from_str("risk: 9\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let parsed: Result<SweepConfig, _> = serde_yaml::from_str("scan:\n  riks: 2\n");
        assert!(parsed.is_err());
    }
}
