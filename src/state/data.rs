//! Shared data structures for the project session
//!
//! These structs represent the data model that flows between
//! the photo store, the report assembler and the export sinks.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use serde::de::{self, value::StrDeserializer, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ProjectError;

/// Opaque identifier of a photo, unique within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(Uuid);

impl PhotoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PhotoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoded image bytes shared between the store and generated reports.
///
/// Cloning is cheap: the buffer is reference counted and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData(Arc<[u8]>);

impl ImageData {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ImageData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Arc::from(bytes))
    }
}

// Printing megabytes of JPEG in a Debug dump helps nobody
impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageData({} bytes)", self.0.len())
    }
}

/// A file offered to the photo store, before it has an id
#[derive(Debug, Clone)]
pub struct NewPhoto {
    /// Filename only (e.g., "roof_north.jpg")
    pub file_name: String,
    /// Declared media type (e.g., "image/jpeg")
    pub media_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl NewPhoto {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Represents a single photo in the project
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub file_name: String,
    pub media_type: String,
    /// Original upload, embedded in high resolution reports
    pub image: ImageData,
    /// Downsampled variant (None until ingestion produced it)
    pub reduced: Option<ImageData>,
    /// Pixel dimensions (None until ingestion probed the image)
    pub dimensions: Option<(u32, u32)>,
    /// Free-text annotation shown beside the photo in the report
    pub notes: String,
    /// Insertion index. Never renumbered when siblings are removed.
    pub order: u64,
    pub size_bytes: u64,
    /// Ingestion progress, 0 to 100
    pub progress: u8,
    /// Why ingestion gave up, if it did
    pub failure: Option<String>,
}

impl PhotoRecord {
    /// A photo is ready for reports once ingestion reached 100%
    pub fn is_ready(&self) -> bool {
        self.progress >= 100
    }
}

/// Kind of storm damage recorded for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageType {
    #[serde(rename = "Wind Damage")]
    Wind,
    #[serde(rename = "Hail Damage")]
    Hail,
    #[serde(rename = "Water Damage")]
    Water,
    #[serde(rename = "Flood Damage")]
    Flood,
    #[serde(rename = "Lightning Damage")]
    Lightning,
    #[serde(rename = "Tornado Damage")]
    Tornado,
    #[serde(rename = "Hurricane Damage")]
    Hurricane,
    #[serde(rename = "Fire Damage")]
    Fire,
    Other,
}

impl DamageType {
    pub fn label(&self) -> &'static str {
        match self {
            DamageType::Wind => "Wind Damage",
            DamageType::Hail => "Hail Damage",
            DamageType::Water => "Water Damage",
            DamageType::Flood => "Flood Damage",
            DamageType::Lightning => "Lightning Damage",
            DamageType::Tornado => "Tornado Damage",
            DamageType::Hurricane => "Hurricane Damage",
            DamageType::Fire => "Fire Damage",
            DamageType::Other => "Other",
        }
    }
}

/// How bad the damage is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityLevel {
    Minor,
    Moderate,
    Severe,
    Catastrophic,
}

impl SeverityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            SeverityLevel::Minor => "Minor",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Severe => "Severe",
            SeverityLevel::Catastrophic => "Catastrophic",
        }
    }
}

/// Client, location, damage and insurance facts for one project.
///
/// Only `client_name` and `incident_date` are required; every other field
/// is optional and only shows up in a report when filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRecord {
    // ========== Client ==========
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,

    // ========== Location ==========
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,

    // ========== Damage ==========
    /// Accepts a plain date or a full RFC 3339 timestamp
    #[serde(alias = "date", deserialize_with = "incident_date_from_form")]
    pub incident_date: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_as_none")]
    pub damage_type: Option<DamageType>,
    #[serde(deserialize_with = "blank_as_none")]
    pub severity_level: Option<SeverityLevel>,

    // ========== Insurance ==========
    pub insurance_company: String,
    pub claim_number: String,
    pub adjuster_name: String,
    pub adjuster_phone: String,

    pub notes: String,
}

impl ProjectRecord {
    pub fn new(client_name: impl Into<String>, incident_date: NaiveDate) -> Self {
        Self {
            client_name: client_name.into(),
            incident_date: Some(incident_date),
            ..Self::default()
        }
    }

    /// Parse from JSON string (a saved project form)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the fields required before a project may be saved
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.client_name.trim().is_empty() {
            return Err(ProjectError::MissingField("clientName"));
        }
        if self.incident_date.is_none() {
            return Err(ProjectError::MissingField("incidentDate"));
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// "123 Main St, Springfield, IL 62704" built from whatever is filled in
    pub fn location_line(&self) -> String {
        let state_zip = join_non_empty(&[self.state.as_str(), self.zip_code.as_str()], " ");
        join_non_empty(
            &[self.address.as_str(), self.city.as_str(), state_zip.as_str()],
            ", ",
        )
    }

    /// True when at least one insurance field is filled in
    pub fn has_insurance_info(&self) -> bool {
        [
            &self.insurance_company,
            &self.claim_number,
            &self.adjuster_name,
            &self.adjuster_phone,
        ]
        .iter()
        .any(|v| !v.trim().is_empty())
    }
}

/// Contractor letterhead printed on the cover page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub license_number: String,
}

impl CompanyInfo {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// "2024-03-01" or "2024-03-01T05:00:00.000Z" (date part as written)
fn incident_date_from_form<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Ok(None),
    };
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| Some(timestamp.date_naive()))
        .map_err(|e| de::Error::custom(format!("invalid incident date {:?}: {}", value, e)))
}

/// An unpicked select is saved as "", which means no value
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => {
            let value: StrDeserializer<'_, D::Error> = value.trim().into_deserializer();
            T::deserialize(value).map(Some)
        }
        _ => Ok(None),
    }
}

/// Join the trimmed, non-empty parts with `sep`
pub fn join_non_empty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}
