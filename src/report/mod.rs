//! Report assembly module
//!
//! - The document model an encoder consumes (document.rs)
//! - Photo grid pagination and page planning (layout.rs)
//! - The assembler turning project, photos and settings into a document (assembler.rs)

pub mod assembler;
pub mod document;
pub mod layout;

pub use assembler::{assemble, validate};
pub use document::{Field, ImageVariant, PhotoEntry, PhotoPage, ReportDocument, Section, SectionKind};
pub use layout::PHOTOS_PER_PAGE;
