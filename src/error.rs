//! Error type shared by the whole crate.
//!
//! Configuration problems are reported before any rendering starts; backend
//! and code-image failures abort the render and are propagated unchanged.

use thiserror::Error;

/// The unified error type returned by all public functions.
#[derive(Debug, Error)]
pub enum LabelError {
    /// The requested sheet format is not in the registry.
    #[error("Unknown label format: {key} (known formats: {known})")]
    UnknownFormat { key: String, known: String },

    /// A sheet layout failed validation.
    #[error("Invalid sheet layout '{key}': {reason}")]
    InvalidLayout { key: String, reason: String },

    /// A render option is out of range.
    #[error("Invalid option `{field}`: {reason}")]
    InvalidOption { field: &'static str, reason: String },

    /// More leading slots were skipped than the document contains.
    #[error("Skip ({skip}) exceeds the total label count ({total})")]
    SkipExceedsCount { skip: usize, total: usize },

    /// JSON input (options, formats or layout) failed to parse.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The code-image generator rejected its input.
    #[error("Failed to generate code image for '{payload}': {reason}")]
    CodeImage { payload: String, reason: String },

    /// The drawing backend failed.
    #[error("Render error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabelError {
    pub(crate) fn invalid_option(field: &'static str, reason: impl Into<String>) -> Self {
        LabelError::InvalidOption {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = LabelError> = std::result::Result<T, E>;
