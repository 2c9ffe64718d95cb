//! The assembled report
//!
//! A `ReportDocument` is a plain value: it holds everything an encoder needs
//! and is never modified after assembly. Regenerating a report builds a new
//! one from the current project, photos and settings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::media::kind::extension_for_bytes;
use crate::state::data::{CompanyInfo, ImageData, PhotoId};

/// Which binary variant of a photo is embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageVariant {
    /// The original upload
    Full,
    /// The downsampled JPEG produced during ingestion
    Reduced,
}

/// One labelled line of an info section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

impl Field {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// A photo placed in the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoEntry {
    pub photo_id: PhotoId,
    /// Store insertion index of the photo
    pub order: u64,
    /// 1-based position of the photo within the report ("Photo 3")
    pub number: usize,
    pub file_name: String,
    /// None when notes are turned off or the photo has none
    pub notes: Option<String>,
    pub variant: ImageVariant,
    pub dimensions: Option<(u32, u32)>,
    /// Bytes of the selected variant
    #[serde(skip)]
    pub image: ImageData,
}

impl PhotoEntry {
    /// Path of the embedded image inside an exported bundle
    pub fn asset_name(&self) -> String {
        format!(
            "photos/photo-{:03}.{}",
            self.number,
            extension_for_bytes(self.image.as_bytes())
        )
    }

    pub fn label(&self) -> String {
        format!("Photo {}", self.number)
    }
}

/// One printed page of the photo grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoPage {
    /// 1-based page number within the photo grid
    pub number: usize,
    pub entries: Vec<PhotoEntry>,
}

/// A section of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    CoverPage {
        title: String,
        client_summary: String,
        incident_date: Option<NaiveDate>,
        letterhead: Option<CompanyInfo>,
    },
    ClientInfo {
        fields: Vec<Field>,
    },
    InsuranceInfo {
        fields: Vec<Field>,
    },
    PhotoGrid {
        entries_per_page: usize,
        pages: Vec<PhotoPage>,
    },
    Notes {
        text: String,
    },
}

/// Discriminant of [`Section`], handy for ordering checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionKind {
    CoverPage,
    ClientInfo,
    InsuranceInfo,
    PhotoGrid,
    Notes,
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::CoverPage { .. } => SectionKind::CoverPage,
            Section::ClientInfo { .. } => SectionKind::ClientInfo,
            Section::InsuranceInfo { .. } => SectionKind::InsuranceInfo,
            Section::PhotoGrid { .. } => SectionKind::PhotoGrid,
            Section::Notes { .. } => SectionKind::Notes,
        }
    }
}

/// The finished report, ready for an encoder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    /// Supplied by the caller so assembly stays deterministic
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
    /// Photos left out because ingestion had not finished
    pub pending_photos: Vec<PhotoId>,
}

impl ReportDocument {
    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(Section::kind).collect()
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind() == kind)
    }

    /// All photo entries in report order, across grid pages
    pub fn photo_entries(&self) -> impl Iterator<Item = &PhotoEntry> {
        self.sections
            .iter()
            .filter_map(|s| match s {
                Section::PhotoGrid { pages, .. } => Some(pages),
                _ => None,
            })
            .flatten()
            .flat_map(|page| page.entries.iter())
    }

    pub fn photo_count(&self) -> usize {
        self.photo_entries().count()
    }
}
