//! Helper configuration
//!
//! Selectors and timings default to values that work against the stock
//! email-filter page; a JSON file can override any subset of them.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperConfig {
    /// Broad structural guess at what wraps one rule row.
    #[serde(default = "default_row_selector")]
    pub row_selector: String,
    #[serde(default = "default_text_input_selector")]
    pub text_input_selector: String,
    #[serde(default = "default_button_selector")]
    pub button_selector: String,
    /// Case-insensitive regex matched against button labels.
    #[serde(default = "default_add_button_pattern")]
    pub add_button_pattern: String,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_export_prefix")]
    pub export_prefix: String,
}

fn default_row_selector() -> String {
    "tr, .ruleRow, .filterRow, .rule, .fieldset".into()
}
fn default_text_input_selector() -> String {
    r#"input[type="text"], input:not([type])"#.into()
}
fn default_button_selector() -> String {
    r#"button, input[type="button"], input[type="submit"], a"#.into()
}
fn default_add_button_pattern() -> String {
    r"add\s+.*rule".into()
}
fn default_poll_timeout_ms() -> u64 {
    2000
}
fn default_poll_interval_ms() -> u64 {
    50
}
fn default_export_prefix() -> String {
    "cpanel-email-filters".into()
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            row_selector: default_row_selector(),
            text_input_selector: default_text_input_selector(),
            button_selector: default_button_selector(),
            add_button_pattern: default_add_button_pattern(),
            poll_timeout_ms: default_poll_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            export_prefix: default_export_prefix(),
        }
    }
}

impl HelperConfig {
    /// Load config from a JSON file, or return defaults.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Parse config JSON, reporting malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = HelperConfig::from_json(r#"{"poll_timeout_ms": 500}"#).unwrap();
        assert_eq!(config.poll_timeout(), Duration::from_millis(500));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.export_prefix, "cpanel-email-filters");
    }

    #[test]
    fn test_malformed_json_is_reported() {
        assert!(HelperConfig::from_json("{poll_timeout_ms").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = HelperConfig::load(Path::new("/nonexistent/filters-helper.json"));
        assert_eq!(config, HelperConfig::default());
    }
}
