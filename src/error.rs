//! Error types

use thiserror::Error;

/// Failures that stop an operation before it touches the host page.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("no rule rows found on the page")]
    NoRulesFound,

    #[error("no values provided")]
    NoValues,

    #[error("no existing rule rows to use as a template")]
    NoTemplateRows,

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("invalid add-button pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HelperError>;
