//! Storm damage report generation
//!
//! A project session collects the client record and a bounded set of photos,
//! ingests the photos in the background, assembles a paginated report
//! document and exports it as JSON, HTML or a zip bundle.

pub mod config;
pub mod error;
pub mod export;
pub mod media;
pub mod report;
pub mod session;
pub mod state;

pub use session::ProjectSession;
