use serde::{Deserialize, Serialize};
use url::Url;
use crate::errors::SweepError;

/// Engine `--risk` value, 1 through 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Risk(u8);

impl Risk {
    /// For literals known to be in range; panics otherwise.
    pub const fn of(value: u8) -> Self {
        assert!(value >= Self::MIN && value <= Self::MAX);
        Self(value)
    }

    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Risk {
    type Error = SweepError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SweepError::Config(format!(
                "risk must be between {} and {}, got {}",
                Self::MIN, Self::MAX, value
            )))
        }
    }
}

impl From<Risk> for u8 {
    fn from(risk: Risk) -> Self {
        risk.0
    }
}

impl Default for Risk {
    fn default() -> Self {
        Self::of(3)
    }
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine `--level` value, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    /// For literals known to be in range; panics otherwise.
    pub const fn of(value: u8) -> Self {
        assert!(value >= Self::MIN && value <= Self::MAX);
        Self(value)
    }

    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Level {
    type Error = SweepError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SweepError::Config(format!(
                "level must be between {} and {}, got {}",
                Self::MIN, Self::MAX, value
            )))
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::of(3)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scan parameters for one endpoint. Shared read-only by every invocation
/// made for that endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    endpoint: String,
    risk: Risk,
    level: Level,
}

impl TargetDescriptor {
    pub fn new(endpoint: &str, risk: Risk, level: Level) -> Result<Self, SweepError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(SweepError::InvalidTarget("empty endpoint".into()));
        }
        if endpoint.chars().any(char::is_whitespace) {
            return Err(SweepError::InvalidTarget(format!(
                "endpoint contains whitespace: {}",
                endpoint
            )));
        }
        Ok(Self {
            endpoint: endpoint.to_string(),
            risk,
            level,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn risk(&self) -> Risk {
        self.risk
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Host portion of the endpoint, for display.
    pub fn host(&self) -> String {
        hostname_of(&self.endpoint)
    }
}

/// Best-effort host extraction. Returns the input unchanged when it does not
/// parse as a URL or carries no host.
pub fn hostname_of(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        Ok(url) => match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => endpoint.to_string(),
        },
        Err(_) => endpoint.to_string(),
    }
}
