//! Report export module
//!
//! Encoding turns a [`ReportDocument`] into bytes; delivery hands those bytes
//! to the user. Encoders never look at delivery and sinks never look inside
//! the bytes.
//!
//! - JSON manifest, HTML page and zip bundle encoders (json.rs, html.rs, bundle.rs)
//! - Download directory and mail outbox sinks (sink.rs)

pub mod bundle;
pub mod html;
pub mod json;
pub mod sink;

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ExportError;
use crate::report::ReportDocument;

pub use bundle::BundleEncoder;
pub use html::HtmlEncoder;
pub use json::JsonEncoder;
pub use sink::{validate_recipient, DownloadSink, Exporter, OutboxMailer};

/// Turns a report document into a byte artifact
pub trait ReportEncoder {
    fn encode(&self, document: &ReportDocument) -> Result<Vec<u8>, ExportError>;

    /// Media type of the encoded bytes
    fn media_type(&self) -> &'static str;

    /// File extension of the encoded bytes, without the dot
    fn extension(&self) -> &'static str;

    /// Encode and name the artifact after the report title
    fn artifact(&self, document: &ReportDocument) -> Result<Artifact, ExportError> {
        let bytes = self.encode(document)?;
        Ok(Artifact {
            title: document.title.clone(),
            file_name: format!("{}.{}", slugify(&document.title), self.extension()),
            media_type: self.media_type(),
            bytes,
        })
    }
}

/// An encoded report, ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub title: String,
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Where a report goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryChannel {
    /// Save the artifact to the download directory
    Download,
    /// Send the artifact to one e-mail address
    Email { recipient: String },
}

/// What a delivery did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    Downloaded { path: PathBuf },
    Queued { recipient: String, message_dir: PathBuf },
}

/// Output formats offered on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Bundle,
    Html,
    Json,
}

impl ExportFormat {
    pub fn encoder(&self) -> Box<dyn ReportEncoder + Send + Sync> {
        match self {
            ExportFormat::Bundle => Box::new(BundleEncoder),
            ExportFormat::Html => Box::new(HtmlEncoder),
            ExportFormat::Json => Box::new(JsonEncoder),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bundle" | "zip" => Ok(ExportFormat::Bundle),
            "html" => Ok(ExportFormat::Html),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

/// "John Doe - Damage Report" -> "john-doe-damage-report"
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::report::assemble;
    use crate::state::data::{ImageData, NewPhoto, ProjectRecord};
    use crate::state::settings::ReportConfiguration;
    use crate::state::store::PhotoStore;
    use chrono::{NaiveDate, TimeZone, Utc};

    /// A small but complete document with two photos
    pub(crate) fn sample_document() -> ReportDocument {
        let mut project = ProjectRecord::new("John Doe", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        project.claim_number = "CLM-42".into();

        let mut store = PhotoStore::new();
        let added = store
            .add_batch(vec![
                NewPhoto::new("ridge.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 1]),
                NewPhoto::new("gutter.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 2]),
            ])
            .unwrap();
        for photo in &added {
            store
                .complete_ingest(photo.id, ImageData::from(vec![0xFF, 0xD8, 0xFF, 0xDB]))
                .unwrap();
        }
        store
            .update_notes(added[0].id, "Granule loss <north slope>")
            .unwrap();

        let mut config = ReportConfiguration::for_project(&project);
        config.additional_notes = "Tarp installed 3/2".into();

        assemble(
            &project,
            store.list().as_slice(),
            &config,
            Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("John Doe - Damage Report"), "john-doe-damage-report");
        assert_eq!(slugify("  Storm  Damage Report!! "), "storm-damage-report");
        assert_eq!(slugify("---"), "report");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("ZIP".parse::<ExportFormat>().unwrap(), ExportFormat::Bundle);
        assert_eq!("html".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_artifact_named_after_title() {
        let artifact = JsonEncoder.artifact(&sample_document()).unwrap();
        assert_eq!(artifact.file_name, "john-doe-damage-report.json");
        assert_eq!(artifact.media_type, "application/json");
        assert_eq!(artifact.title, "John Doe - Damage Report");
    }
}
