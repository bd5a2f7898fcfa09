pub mod args;
pub mod invoker;

use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::config::{
    EngineConfig, DEFAULT_INSTALL_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_PYTHON, DEFAULT_REPOSITORY,
    DEFAULT_SCRIPT,
};

pub use invoker::{InvocationResult, Invoker, SqlmapInvoker};

/// Resolved settings for launching the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub python: String,
    pub script: PathBuf,
    pub install_dir: PathBuf,
    pub repository: String,
    pub output_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub smart: bool,
}

impl EngineSettings {
    pub fn from_config(config: Option<&EngineConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };
        let script = config.script.as_ref().map(PathBuf::from).unwrap_or(defaults.script);
        let install_dir = match &config.install_dir {
            Some(dir) => PathBuf::from(dir),
            None if config.script.is_some() => install_dir_for(&script).unwrap_or(defaults.install_dir),
            None => defaults.install_dir,
        };
        Self {
            python: config.python.clone().unwrap_or(defaults.python),
            script,
            install_dir,
            repository: config.repository.clone().unwrap_or(defaults.repository),
            output_dir: config.output_dir.as_ref().map(PathBuf::from).unwrap_or(defaults.output_dir),
            timeout: config.timeout_secs.map(Duration::from_secs),
            smart: config.smart.unwrap_or(defaults.smart),
        }
    }
}

/// Directory a clone must land in for `script` to exist afterwards.
pub fn install_dir_for(script: &Path) -> Option<PathBuf> {
    script
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            python: DEFAULT_PYTHON.to_string(),
            script: PathBuf::from(DEFAULT_SCRIPT),
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            repository: DEFAULT_REPOSITORY.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout: None,
            smart: true,
        }
    }
}
