use crate::error::ExportError;
use crate::report::ReportDocument;

use super::ReportEncoder;

/// Structural manifest of a report. Image bytes are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl ReportEncoder for JsonEncoder {
    fn encode(&self, document: &ReportDocument) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec_pretty(document)?)
    }

    fn media_type(&self) -> &'static str {
        "application/json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_document;
    use serde_json::Value;

    #[test]
    fn test_manifest_structure() {
        let bytes = JsonEncoder.encode(&sample_document()).unwrap();
        let manifest: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(manifest["title"], "John Doe - Damage Report");
        assert_eq!(manifest["generated_at"], "2024-03-02T09:30:00Z");

        let kinds: Vec<&str> = manifest["sections"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["kind"].as_str().unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec!["cover_page", "client_info", "insurance_info", "photo_grid", "notes"]
        );

        let entry = &manifest["sections"][3]["pages"][0]["entries"][0];
        assert_eq!(entry["number"], 1);
        assert_eq!(entry["variant"], "full");
        assert!(entry.get("image").is_none());
    }
}
