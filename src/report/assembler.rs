//! Report assembly
//!
//! Turns a project record, the photo list and the report settings into a
//! [`ReportDocument`]. Assembly is a pure function of its inputs (the
//! timestamp is passed in), so calling it twice with the same inputs yields
//! the same document.
//!
//! Section order is fixed:
//! cover → client info → insurance info → photo grid → additional notes.
//! A section is left out when its toggle is off or it has nothing to show.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AssemblyError;
use crate::state::data::{join_non_empty, PhotoId, PhotoRecord, ProjectRecord};
use crate::state::settings::ReportConfiguration;

use super::document::{Field, ImageVariant, PhotoEntry, ReportDocument, Section};
use super::layout::{paginate, PHOTOS_PER_PAGE};

/// Check that the project has the minimum identity a report needs
pub fn validate(project: &ProjectRecord) -> Result<(), AssemblyError> {
    if project.client_name.trim().is_empty() {
        return Err(AssemblyError::IncompleteProject("client name is required"));
    }
    Ok(())
}

/// Assemble a report.
///
/// Only a missing client name is fatal. Missing photos, empty sections and
/// photos still being ingested just make the document smaller.
pub fn assemble(
    project: &ProjectRecord,
    photos: &[PhotoRecord],
    config: &ReportConfiguration,
    generated_at: DateTime<Utc>,
) -> Result<ReportDocument, AssemblyError> {
    validate(project)?;

    let title = config.resolved_report_name(project);
    let mut sections = Vec::new();

    if config.cover_page {
        sections.push(cover_page(project, config, &title));
    }

    if config.include_client_info {
        let fields = client_fields(project);
        if !fields.is_empty() {
            sections.push(Section::ClientInfo { fields });
        }
    }

    if config.include_insurance_info {
        let fields = insurance_fields(project);
        if !fields.is_empty() {
            sections.push(Section::InsuranceInfo { fields });
        }
    }

    let (entries, pending_photos) = if config.include_all_photos {
        select_photos(photos, config)
    } else {
        (Vec::new(), Vec::new())
    };

    if !entries.is_empty() {
        sections.push(Section::PhotoGrid {
            entries_per_page: PHOTOS_PER_PAGE,
            pages: paginate(entries, PHOTOS_PER_PAGE),
        });
    }

    let notes = config.additional_notes.trim();
    if !notes.is_empty() {
        sections.push(Section::Notes {
            text: notes.to_string(),
        });
    }

    if !pending_photos.is_empty() {
        tracing::info!(
            pending = pending_photos.len(),
            "Photos still uploading were left out of the report"
        );
    }

    Ok(ReportDocument {
        title,
        generated_at,
        sections,
        pending_photos,
    })
}

fn cover_page(project: &ProjectRecord, config: &ReportConfiguration, title: &str) -> Section {
    let location = project.location_line();
    Section::CoverPage {
        title: title.to_string(),
        client_summary: join_non_empty(&[project.client_name.as_str(), location.as_str()], ", "),
        incident_date: project.incident_date,
        letterhead: config.letterhead.clone().filter(|c| !c.is_empty()),
    }
}

fn client_fields(project: &ProjectRecord) -> Vec<Field> {
    let mut fields = Vec::new();
    push_field(&mut fields, "Client Name", &project.client_name);
    push_field(&mut fields, "Phone", &project.client_phone);
    push_field(&mut fields, "Email", &project.client_email);
    push_field(&mut fields, "Property Address", &project.location_line());
    if let Some(date) = project.incident_date {
        fields.push(Field::new("Incident Date", format_date(date)));
    }
    if let Some(damage) = project.damage_type {
        fields.push(Field::new("Type of Damage", damage.label()));
    }
    if let Some(severity) = project.severity_level {
        fields.push(Field::new("Severity Level", severity.label()));
    }
    push_field(&mut fields, "Project Notes", &project.notes);
    fields
}

fn insurance_fields(project: &ProjectRecord) -> Vec<Field> {
    let mut fields = Vec::new();
    push_field(&mut fields, "Insurance Company", &project.insurance_company);
    push_field(&mut fields, "Claim Number", &project.claim_number);
    push_field(&mut fields, "Adjuster Name", &project.adjuster_name);
    push_field(&mut fields, "Adjuster Phone", &project.adjuster_phone);
    fields
}

fn push_field(fields: &mut Vec<Field>, label: &'static str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        fields.push(Field::new(label, value));
    }
}

/// "March 1, 2024"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Split photos into report entries (ready ones, in `order`) and the ids of
/// photos that are still being ingested
fn select_photos(
    photos: &[PhotoRecord],
    config: &ReportConfiguration,
) -> (Vec<PhotoEntry>, Vec<PhotoId>) {
    let mut sorted: Vec<&PhotoRecord> = photos.iter().collect();
    sorted.sort_by_key(|p| p.order);

    let mut entries = Vec::new();
    let mut pending = Vec::new();

    for photo in sorted {
        if !photo.is_ready() {
            pending.push(photo.id);
            continue;
        }

        let (variant, image) = match (&photo.reduced, config.high_resolution) {
            (Some(reduced), false) => (ImageVariant::Reduced, reduced.clone()),
            _ => (ImageVariant::Full, photo.image.clone()),
        };

        let notes = if config.include_notes {
            Some(photo.notes.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        entries.push(PhotoEntry {
            photo_id: photo.id,
            order: photo.order,
            number: entries.len() + 1,
            file_name: photo.file_name.clone(),
            notes,
            variant,
            dimensions: photo.dimensions,
            image,
        });
    }

    (entries, pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::document::SectionKind;
    use crate::state::data::{CompanyInfo, DamageType, ImageData, NewPhoto};
    use crate::state::store::PhotoStore;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap()
    }

    fn john_doe() -> ProjectRecord {
        ProjectRecord::new("John Doe", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn fully_populated() -> ProjectRecord {
        let mut project = john_doe();
        project.client_phone = "555-0100".into();
        project.address = "123 Main St".into();
        project.city = "Springfield".into();
        project.damage_type = Some(DamageType::Hail);
        project.insurance_company = "Acme Mutual".into();
        project.claim_number = "CLM-42".into();
        project
    }

    /// Store with `n` photos, all ingested, each with a reduced variant
    fn ready_photos(n: usize) -> Vec<PhotoRecord> {
        let mut store = PhotoStore::new();
        let files = (0..n)
            .map(|i| NewPhoto::new(format!("{}.jpg", i), "image/jpeg", vec![0xFF, 0xD8, 0xFF, i as u8]))
            .collect();
        for photo in store.add_batch(files).unwrap() {
            store
                .complete_ingest(photo.id, ImageData::from(vec![0xFF, 0xD8, 0xFF, 0xEE]))
                .unwrap();
        }
        store.list().into_iter().collect()
    }

    #[test]
    fn test_blank_client_name_is_incomplete() {
        let mut project = john_doe();
        project.client_name = "  ".into();

        let mut all_off = ReportConfiguration::default();
        all_off.cover_page = false;
        all_off.include_all_photos = false;

        for config in [ReportConfiguration::default(), all_off] {
            assert_matches!(
                assemble(&project, &ready_photos(2), &config, generated_at()),
                Err(AssemblyError::IncompleteProject(_))
            );
        }
    }

    #[test]
    fn test_zero_photos_has_no_grid() {
        let document = assemble(&john_doe(), &[], &ReportConfiguration::default(), generated_at()).unwrap();
        assert!(document.section(SectionKind::PhotoGrid).is_none());
        assert_eq!(document.kinds(), vec![SectionKind::CoverPage, SectionKind::ClientInfo]);
    }

    #[test]
    fn test_example_project_with_three_photos() {
        let photos = ready_photos(3);
        let config = ReportConfiguration::for_project(&john_doe());
        let document = assemble(&john_doe(), &photos, &config, generated_at()).unwrap();

        assert_eq!(document.title, "John Doe - Damage Report");
        assert_eq!(
            document.kinds(),
            vec![SectionKind::CoverPage, SectionKind::ClientInfo, SectionKind::PhotoGrid]
        );

        let orders: Vec<u64> = document.photo_entries().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        let numbers: Vec<usize> = document.photo_entries().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(document.pending_photos.is_empty());
    }

    #[test]
    fn test_full_section_order() {
        let mut config = ReportConfiguration::default();
        config.additional_notes = "Temporary tarp installed on 3/2.".into();

        let document = assemble(&fully_populated(), &ready_photos(8), &config, generated_at()).unwrap();
        assert_eq!(
            document.kinds(),
            vec![
                SectionKind::CoverPage,
                SectionKind::ClientInfo,
                SectionKind::InsuranceInfo,
                SectionKind::PhotoGrid,
                SectionKind::Notes,
            ]
        );

        assert_matches!(
            document.section(SectionKind::PhotoGrid),
            Some(Section::PhotoGrid { entries_per_page: PHOTOS_PER_PAGE, pages }) if pages.len() == 2
        );
    }

    #[test]
    fn test_loaded_settings_without_name_use_client_title() {
        let config = ReportConfiguration::from_json(r#"{"includeNotes":false}"#).unwrap();
        let document = assemble(&john_doe(), &[], &config, generated_at()).unwrap();
        assert_eq!(document.title, "John Doe - Damage Report");
        assert_matches!(
            document.section(SectionKind::CoverPage),
            Some(Section::CoverPage { title, .. }) if title == "John Doe - Damage Report"
        );
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let photos = ready_photos(5);
        let config = ReportConfiguration::default();
        let first = assemble(&fully_populated(), &photos, &config, generated_at()).unwrap();
        let second = assemble(&fully_populated(), &photos, &config, generated_at()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_toggles_off_gives_empty_body() {
        let config = ReportConfiguration {
            include_all_photos: false,
            include_notes: false,
            include_client_info: false,
            include_insurance_info: false,
            high_resolution: false,
            cover_page: false,
            report_name: String::new(),
            additional_notes: String::new(),
            letterhead: None,
        };

        let document = assemble(&fully_populated(), &ready_photos(3), &config, generated_at()).unwrap();
        assert!(document.sections.is_empty());
        assert_eq!(document.title, "John Doe - Damage Report");
    }

    #[test]
    fn test_pending_photos_are_skipped_and_flagged() {
        let mut photos = ready_photos(3);
        photos[1].progress = 60;

        let document = assemble(&john_doe(), &photos, &ReportConfiguration::default(), generated_at()).unwrap();
        let orders: Vec<u64> = document.photo_entries().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 2]);
        assert_eq!(document.pending_photos, vec![photos[1].id]);
    }

    #[test]
    fn test_entries_follow_order_not_input_position() {
        let mut photos = ready_photos(3);
        photos.reverse();

        let document = assemble(&john_doe(), &photos, &ReportConfiguration::default(), generated_at()).unwrap();
        let orders: Vec<u64> = document.photo_entries().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_notes_toggle_keeps_photos() {
        let mut photos = ready_photos(2);
        photos[0].notes = "Cracked shingle".into();

        let mut config = ReportConfiguration::default();
        let with_notes = assemble(&john_doe(), &photos, &config, generated_at()).unwrap();
        let notes: Vec<Option<String>> = with_notes.photo_entries().map(|e| e.notes.clone()).collect();
        assert_eq!(notes, vec![Some("Cracked shingle".to_string()), None]);

        config.include_notes = false;
        let without = assemble(&john_doe(), &photos, &config, generated_at()).unwrap();
        assert_eq!(without.photo_count(), 2);
        assert!(without.photo_entries().all(|e| e.notes.is_none()));
    }

    #[test]
    fn test_resolution_selects_variant() {
        let mut photos = ready_photos(2);
        photos[1].reduced = None;

        let mut config = ReportConfiguration::default();
        let high = assemble(&john_doe(), &photos, &config, generated_at()).unwrap();
        assert!(high.photo_entries().all(|e| e.variant == ImageVariant::Full));

        config.high_resolution = false;
        let low = assemble(&john_doe(), &photos, &config, generated_at()).unwrap();
        let variants: Vec<ImageVariant> = low.photo_entries().map(|e| e.variant).collect();
        // The second photo has no reduced variant, so it falls back to the original
        assert_eq!(variants, vec![ImageVariant::Reduced, ImageVariant::Full]);
        let first = low.photo_entries().next().unwrap();
        assert_eq!(first.image.as_bytes(), &[0xFF, 0xD8, 0xFF, 0xEE]);
    }

    #[test]
    fn test_insurance_section_needs_data() {
        let document = assemble(&john_doe(), &[], &ReportConfiguration::default(), generated_at()).unwrap();
        assert!(document.section(SectionKind::InsuranceInfo).is_none());

        let mut config = ReportConfiguration::default();
        config.include_insurance_info = false;
        let document = assemble(&fully_populated(), &[], &config, generated_at()).unwrap();
        assert!(document.section(SectionKind::InsuranceInfo).is_none());
    }

    #[test]
    fn test_cover_page_content() {
        let mut config = ReportConfiguration::for_project(&fully_populated());
        config.letterhead = Some(CompanyInfo {
            name: "Stormguard Restoration".into(),
            ..CompanyInfo::default()
        });

        let document = assemble(&fully_populated(), &[], &config, generated_at()).unwrap();
        assert_matches!(
            document.section(SectionKind::CoverPage),
            Some(Section::CoverPage { client_summary, letterhead: Some(company), .. })
                if client_summary == "John Doe, 123 Main St, Springfield"
                    && company.name == "Stormguard Restoration"
        );

        let client = match document.section(SectionKind::ClientInfo) {
            Some(Section::ClientInfo { fields }) => fields.clone(),
            other => panic!("unexpected section {:?}", other),
        };
        let labels: Vec<&str> = client.iter().map(|f| f.label).collect();
        assert_eq!(
            labels,
            vec!["Client Name", "Phone", "Property Address", "Incident Date", "Type of Damage"]
        );
        assert_eq!(client[3].value, "March 1, 2024");
    }
}
