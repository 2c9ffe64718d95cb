//! State management module
//!
//! This module holds all project session state:
//! - Shared data structures (data.rs)
//! - The bounded photo collection (store.rs)
//! - Report generator settings (settings.rs)

pub mod data;
pub mod settings;
pub mod store;

pub use data::{CompanyInfo, DamageType, ImageData, NewPhoto, PhotoId, PhotoRecord, ProjectRecord, SeverityLevel};
pub use settings::ReportConfiguration;
pub use store::{PhotoSnapshot, PhotoStore, SharedPhotoStore, MAX_PHOTOS, MAX_PHOTO_SIZE};
