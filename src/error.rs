//! Error types for every stage of the pipeline.
//!
//! All of these are recoverable conditions meant to be shown to the user.
//! None of them leave a component half-updated.

use std::path::PathBuf;

use crate::state::data::PhotoId;

/// Errors raised by the photo store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Too many photos: {current} already in project, {requested} more would exceed the limit of {max}")]
    CapacityExceeded {
        current: usize,
        requested: usize,
        max: usize,
    },

    #[error("{file_name} is not an image (media type {media_type})")]
    InvalidMediaType {
        file_name: String,
        media_type: String,
    },

    #[error("{file_name} is {size_bytes} bytes, larger than the {max} byte limit")]
    FileTooLarge {
        file_name: String,
        size_bytes: u64,
        max: u64,
    },

    #[error("Photo not found: {0}")]
    NotFound(PhotoId),
}

/// Errors raised while importing a folder of photos.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read photo: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Rejected(#[from] StoreError),
}

/// Errors raised when a project record is saved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Errors raised by the report assembler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Project is incomplete: {0}")]
    IncompleteProject(&'static str),
}

/// Errors raised while encoding or delivering a report.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to encode report: {0}")]
    Encoding(String),

    #[error("Invalid recipient address: {0:?}")]
    InvalidRecipient(String),

    #[error("Failed to deliver report: {0}")]
    Delivery(String),
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Encoding(e.to_string())
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(e: zip::result::ZipError) -> Self {
        ExportError::Encoding(e.to_string())
    }
}

/// Errors raised while loading the application config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}
