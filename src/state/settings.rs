//! Report settings chosen before generating a report
//!
//! This struct stores every toggle of the report generator.
//! It is serialized to JSON so a contractor can keep a preferred setup
//! between projects.

use serde::{Deserialize, Serialize};

use super::data::{CompanyInfo, ProjectRecord};

/// Report name used when neither the settings nor the project provide one
pub const DEFAULT_REPORT_NAME: &str = "Storm Damage Report";

/// All settings for one generated report
///
/// Every combination of toggles is valid. Turning everything off still
/// produces a (nearly empty) report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfiguration {
    // ========== Contents ==========

    /// Include every uploaded photo (all or nothing)
    pub include_all_photos: bool,

    /// Print each photo's notes under it
    pub include_notes: bool,

    /// Include the client / location / damage section
    pub include_client_info: bool,

    /// Include the insurance section
    pub include_insurance_info: bool,

    // ========== Layout ==========

    /// Embed original uploads instead of reduced variants
    pub high_resolution: bool,

    /// Start the report with a cover page
    pub cover_page: bool,

    // ========== Text ==========

    /// Report title. Empty means "derive from the project", which is
    /// also what a settings file without a name gets.
    #[serde(alias = "customReportName", default)]
    pub report_name: String,

    /// Free text printed at the end of the report
    pub additional_notes: String,

    /// Contractor details printed on the cover page
    pub letterhead: Option<CompanyInfo>,
}

impl Default for ReportConfiguration {
    /// Create default settings (everything included)
    fn default() -> Self {
        Self {
            include_all_photos: true,
            include_notes: true,
            include_client_info: true,
            include_insurance_info: true,
            high_resolution: true,
            cover_page: true,
            report_name: DEFAULT_REPORT_NAME.to_string(),
            additional_notes: String::new(),
            letterhead: None,
        }
    }
}

impl ReportConfiguration {
    /// Create new default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings with the report named after the project's client
    pub fn for_project(project: &ProjectRecord) -> Self {
        Self {
            report_name: derived_report_name(project),
            ..Self::default()
        }
    }

    /// Convert to JSON string for saving
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if every setting is at its default
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Reset all settings to default
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The title a report generated with these settings will carry
    pub fn resolved_report_name(&self, project: &ProjectRecord) -> String {
        let name = self.report_name.trim();
        if name.is_empty() {
            derived_report_name(project)
        } else {
            name.to_string()
        }
    }
}

fn derived_report_name(project: &ProjectRecord) -> String {
    let client = project.client_name.trim();
    if client.is_empty() {
        DEFAULT_REPORT_NAME.to_string()
    } else {
        format!("{} - Damage Report", client)
    }
}
