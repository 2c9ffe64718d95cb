//! Media handling module
//!
//! This module handles:
//! - Recognising image media types (kind.rs)
//! - Probing and downsampling images (downsample.rs)
//! - Background ingestion of newly added photos (ingest.rs)
//! - Importing a folder of photos from disk (import.rs)

pub mod downsample;
pub mod import;
pub mod ingest;
pub mod kind;

pub use import::{import_folder, FolderImport};
pub use ingest::{read_photo, Ingestor};
