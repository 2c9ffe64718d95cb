//! Zip bundle of a report
//!
//! Layout:
//! - `report.html` printable report
//! - `report.json` structural manifest
//! - `photos/photo-NNN.<ext>` every embedded image, named as the HTML refers to it

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::report::ReportDocument;

use super::{HtmlEncoder, JsonEncoder, ReportEncoder};

pub const HTML_ENTRY: &str = "report.html";
pub const MANIFEST_ENTRY: &str = "report.json";

/// Packs the HTML report, its manifest and the photos into one zip
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleEncoder;

impl ReportEncoder for BundleEncoder {
    fn encode(&self, document: &ReportDocument) -> Result<Vec<u8>, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let text = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        // Images are already compressed
        let binary = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        zip.start_file(HTML_ENTRY, text)?;
        write_entry(&mut zip, &HtmlEncoder.encode(document)?)?;

        zip.start_file(MANIFEST_ENTRY, text)?;
        write_entry(&mut zip, &JsonEncoder.encode(document)?)?;

        for entry in document.photo_entries() {
            zip.start_file(entry.asset_name(), binary)?;
            write_entry(&mut zip, entry.image.as_bytes())?;
        }

        let bytes = zip.finish()?.into_inner();
        tracing::debug!(
            photos = document.photo_count(),
            size = bytes.len(),
            "📦 Report bundle encoded"
        );
        Ok(bytes)
    }

    fn media_type(&self) -> &'static str {
        "application/zip"
    }

    fn extension(&self) -> &'static str {
        "zip"
    }
}

fn write_entry(zip: &mut ZipWriter<Cursor<Vec<u8>>>, bytes: &[u8]) -> Result<(), ExportError> {
    zip.write_all(bytes)
        .map_err(|e| ExportError::Encoding(e.to_string()))
}
