//! CaptionKit Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

use super::PresetId;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Preset Errors
    // =========================================================================
    #[error("Preset not found: {0}")]
    PresetNotFound(PresetId),

    #[error("Preset catalog error: {0}")]
    CatalogError(String),

    // =========================================================================
    // Font Errors
    // =========================================================================
    #[error("Font fetch failed for {file}: {reason}")]
    FontFetchFailed { file: String, reason: String },

    #[error("Font catalog unavailable: {0}")]
    FontCatalogUnavailable(String),

    // =========================================================================
    // Preview Errors
    // =========================================================================
    #[error("Rasterizer failed: {0}")]
    RasterizerFailed(String),

    // =========================================================================
    // Export Errors
    // =========================================================================
    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Transcoder unavailable: {0}")]
    TranscoderUnavailable(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Single notification string shown to the user.
    ///
    /// Export failures are surfaced verbatim; everything else keeps its
    /// display form.
    pub fn to_user_message(&self) -> String {
        match self {
            Self::ExportFailed(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
