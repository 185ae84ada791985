use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    /// A request field failed validation before any payload bytes were built.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A TLV value would not fit a 2-digit length marker.
    #[error("field {tag} value is {len} chars, TLV length marker caps at 99")]
    FieldTooLong { tag: String, len: usize },

    #[error("template image not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("image: {0}")]
    Image(String),

    #[error("font: {0}")]
    Font(String),
}
