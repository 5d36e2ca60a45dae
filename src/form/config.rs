//! Engine configuration
//!
//! Carried in the `engine` section of a form definition. Every key is
//! optional; missing keys take their defaults.

use serde::{Deserialize, Serialize};

use super::errors::{FormError, FormResult};
use crate::observability::Severity;

/// Default preset value that marks a field as needing review
pub const DEFAULT_NEEDS_REVIEW_MARKER: &str = "!!!PRÜFEN!!!<<<<";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Preset value that starts a field in the fishy state
    #[serde(default = "default_needs_review_marker")]
    pub needs_review_marker: String,

    /// Reject autofills that read fields declared at or after themselves
    /// (default: false, such autofills are only warned about)
    #[serde(default)]
    pub strict_autofill_order: bool,

    /// Minimum log severity: trace, info, warn, error or fatal (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_needs_review_marker() -> String {
    DEFAULT_NEEDS_REVIEW_MARKER.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            needs_review_marker: default_needs_review_marker(),
            strict_autofill_order: false,
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration values
    pub fn validate(&self) -> FormResult<()> {
        if self.needs_review_marker.is_empty() {
            return Err(FormError::invalid_config(
                "needs_review_marker must not be empty",
            ));
        }

        self.log_severity()?;
        Ok(())
    }

    /// The configured minimum log severity
    pub fn log_severity(&self) -> FormResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(FormError::invalid_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config: EngineConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.needs_review_marker, DEFAULT_NEEDS_REVIEW_MARKER);
        assert!(!config.strict_autofill_order);
        assert_eq!(config.log_severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = EngineConfig {
            log_level: "chatty".into(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            needs_review_marker: String::new(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
