use std::path::Path;
use crate::errors::SweepError;
use crate::models::{Level, Risk, TargetDescriptor};
use tracing::{debug, warn};

/// Read a newline-separated target list. An unreadable file is fatal to the
/// run.
pub async fn load_target_list(path: &Path) -> Result<Vec<String>, SweepError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        SweepError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot read target list {}: {}", path.display(), e),
        ))
    })?;
    let endpoints = parse_target_list(&content);
    debug!(path = %path.display(), count = endpoints.len(), "Loaded target list");
    Ok(endpoints)
}

/// One endpoint per line, trimmed. Blank lines and `#` comments are skipped.
pub fn parse_target_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Build descriptors for every endpoint. Malformed lines are skipped with a
/// warning; an empty result is a configuration error.
pub fn build_descriptors(
    endpoints: &[String],
    risk: Risk,
    level: Level,
) -> Result<Vec<TargetDescriptor>, SweepError> {
    let mut descriptors = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        match TargetDescriptor::new(endpoint, risk, level) {
            Ok(d) => descriptors.push(d),
            Err(e) => warn!(endpoint = %endpoint, error = %e, "Skipping target"),
        }
    }
    if descriptors.is_empty() {
        return Err(SweepError::Config("no usable targets".into()));
    }
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_list_trims_and_skips() {
        let content = "http://a.test/?id=1\n\n  http://b.test/item.php?id=2  \n# staging\r\nhttp://c.test/\r\n";
        assert_eq!(
            parse_target_list(content),
            vec!["http://a.test/?id=1", "http://b.test/item.php?id=2", "http://c.test/"]
        );
    }

    #[test]
    fn test_parse_target_list_empty() {
        assert!(parse_target_list("").is_empty());
        assert!(parse_target_list("\n  \n").is_empty());
    }

    #[test]
    fn test_build_descriptors_skips_malformed() {
        let endpoints = vec!["http://a.test/?id=1".to_string(), "http://b .test/".to_string()];
        let ds = build_descriptors(&endpoints, Risk::of(2), Level::of(3)).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].risk().value(), 2);
    }

    #[test]
    fn test_build_descriptors_empty_is_error() {
        let err = build_descriptors(&[], Risk::default(), Level::default()).unwrap_err();
        assert!(matches!(err, SweepError::Config(_)));
    }
}
