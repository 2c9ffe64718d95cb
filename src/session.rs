//! One project being worked on
//!
//! The session owns the project record, the shared photo store, the
//! ingestion tasks feeding it and the report settings. Everything that
//! changes photos goes through here so that a removal always cancels the
//! matching ingestion first.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AssemblyError, ProjectError, StoreError};
use crate::media::Ingestor;
use crate::report::{assemble, ReportDocument};
use crate::state::data::{NewPhoto, PhotoId, PhotoRecord, ProjectRecord};
use crate::state::settings::ReportConfiguration;
use crate::state::store::{self, PhotoSnapshot, PhotoStore, SharedPhotoStore};

pub struct ProjectSession {
    project: ProjectRecord,
    store: SharedPhotoStore,
    ingestor: Ingestor,
    config: ReportConfiguration,
}

impl ProjectSession {
    /// New session with an empty photo store and settings named after the client
    pub fn new(project: ProjectRecord, reduced_max_edge: u32) -> Self {
        Self::with_store(project, PhotoStore::new(), reduced_max_edge)
    }

    pub fn with_store(project: ProjectRecord, photos: PhotoStore, reduced_max_edge: u32) -> Self {
        let store = photos.shared();
        let ingestor = Ingestor::new(Arc::clone(&store), reduced_max_edge);
        let config = ReportConfiguration::for_project(&project);

        Self {
            project,
            store,
            ingestor,
            config,
        }
    }

    // ========== Project ==========

    pub fn project(&self) -> &ProjectRecord {
        &self.project
    }

    /// Replace the project record once it has every required field.
    ///
    /// A report name still derived from the old client follows the new one.
    pub fn save_project(&mut self, project: ProjectRecord) -> Result<(), ProjectError> {
        project.validate()?;

        let derived = ReportConfiguration::for_project(&self.project).report_name;
        if self.config.report_name == derived {
            self.config.report_name = ReportConfiguration::for_project(&project).report_name;
        }

        tracing::info!(client = %project.client_name, "Project saved");
        self.project = project;
        Ok(())
    }

    // ========== Settings ==========

    pub fn config(&self) -> &ReportConfiguration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ReportConfiguration {
        &mut self.config
    }

    pub fn set_config(&mut self, config: ReportConfiguration) {
        self.config = config;
    }

    // ========== Photos ==========

    /// Add a batch of photos and start ingesting each of them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add_photos(&self, files: Vec<NewPhoto>) -> Result<Vec<PhotoRecord>, StoreError> {
        let added = store::lock(&self.store).add_batch(files)?;
        for photo in &added {
            self.ingestor.spawn(photo);
        }

        tracing::info!(count = added.len(), "📸 Photos added, ingesting");
        Ok(added)
    }

    /// Remove a photo, cancelling its ingestion if still running
    pub fn remove_photo(&self, id: PhotoId) -> Result<PhotoRecord, StoreError> {
        self.ingestor.cancel(id);
        store::lock(&self.store).remove(id)
    }

    /// Remove several photos. Returns the ids that were actually removed.
    pub fn remove_photos(&self, ids: &[PhotoId]) -> Vec<PhotoId> {
        for id in ids {
            self.ingestor.cancel(*id);
        }
        store::lock(&self.store).remove_batch(ids)
    }

    pub fn update_notes(&self, id: PhotoId, notes: impl Into<String>) -> Result<(), StoreError> {
        store::lock(&self.store).update_notes(id, notes)
    }

    pub fn photos(&self) -> PhotoSnapshot {
        store::lock(&self.store).list()
    }

    /// Photos whose ingestion has not finished (or failed)
    pub fn pending_count(&self) -> usize {
        let store = store::lock(&self.store);
        store.len() - store.ready_count()
    }

    /// Wait for every ingestion started so far
    pub async fn wait_for_ingest(&self) {
        self.ingestor.wait_idle().await;
    }

    // ========== Report ==========

    /// Assemble a report from the current project, photos and settings
    pub fn generate_report(&self, generated_at: DateTime<Utc>) -> Result<ReportDocument, AssemblyError> {
        let photos = self.photos();
        assemble(&self.project, photos.as_slice(), &self.config, generated_at)
    }
}

impl std::fmt::Debug for ProjectSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectSession")
            .field("client", &self.project.client_name)
            .field("photos", &store::lock(&self.store).len())
            .field("ingestor", &self.ingestor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::downsample::tests::png;
    use crate::report::{ImageVariant, SectionKind};
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, TimeZone};

    fn john_doe() -> ProjectRecord {
        ProjectRecord::new("John Doe", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
    }

    fn pngs(n: usize) -> Vec<NewPhoto> {
        (0..n)
            .map(|i| NewPhoto::new(format!("roof-{}.png", i), "image/png", png(40, 30)))
            .collect()
    }

    #[tokio::test]
    async fn test_three_ready_photos_end_to_end() {
        let session = ProjectSession::new(john_doe(), 20);
        let added = session.add_photos(pngs(3)).unwrap();
        session.wait_for_ingest().await;
        assert_eq!(session.pending_count(), 0);

        let document = session.generate_report(now()).unwrap();
        assert_eq!(
            document.kinds(),
            vec![SectionKind::CoverPage, SectionKind::ClientInfo, SectionKind::PhotoGrid]
        );
        let ids: Vec<PhotoId> = document.photo_entries().map(|e| e.photo_id).collect();
        assert_eq!(ids, added.iter().map(|p| p.id).collect::<Vec<_>>());
        assert!(document.pending_photos.is_empty());
    }

    #[tokio::test]
    async fn test_low_resolution_uses_reduced_variant() {
        let mut session = ProjectSession::new(john_doe(), 20);
        session.add_photos(pngs(1)).unwrap();
        session.wait_for_ingest().await;
        session.config_mut().high_resolution = false;

        let document = session.generate_report(now()).unwrap();
        let entry = document.photo_entries().next().unwrap();
        assert_eq!(entry.variant, ImageVariant::Reduced);
        assert_eq!(entry.asset_name(), "photos/photo-001.jpg");
    }

    #[tokio::test]
    async fn test_removed_photo_never_comes_back() {
        let session = ProjectSession::new(john_doe(), 20);
        let added = session.add_photos(pngs(2)).unwrap();
        session.remove_photo(added[0].id).unwrap();
        session.wait_for_ingest().await;

        let photos = session.photos();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos.as_slice()[0].id, added[1].id);
        assert_matches!(session.remove_photo(added[0].id), Err(StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_batch_skips_missing() {
        let session = ProjectSession::new(john_doe(), 20);
        let added = session.add_photos(pngs(3)).unwrap();
        session.remove_photo(added[1].id).unwrap();

        let removed = session.remove_photos(&[added[0].id, added[1].id]);
        assert_eq!(removed, vec![added[0].id]);
        session.wait_for_ingest().await;
        assert_eq!(session.photos().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_batch_starts_nothing() {
        let session = ProjectSession::with_store(john_doe(), PhotoStore::with_limits(2, 1024 * 1024), 20);
        let result = session.add_photos(pngs(3));

        assert_matches!(result, Err(StoreError::CapacityExceeded { current: 0, requested: 3, max: 2 }));
        assert!(session.photos().is_empty());
    }

    #[tokio::test]
    async fn test_notes_follow_toggle() {
        let mut session = ProjectSession::new(john_doe(), 20);
        let added = session.add_photos(pngs(1)).unwrap();
        session.update_notes(added[0].id, "Missing shingles").unwrap();
        session.wait_for_ingest().await;

        let document = session.generate_report(now()).unwrap();
        let entry = document.photo_entries().next().unwrap();
        assert_eq!(entry.notes.as_deref(), Some("Missing shingles"));

        session.config_mut().include_notes = false;
        let document = session.generate_report(now()).unwrap();
        assert_eq!(document.photo_entries().next().unwrap().notes, None);
        assert_eq!(document.photo_count(), 1);
    }

    #[test]
    fn test_save_project_renames_derived_report() {
        let mut session = ProjectSession::new(john_doe(), 20);
        assert_eq!(session.config().report_name, "John Doe - Damage Report");

        let mut project = john_doe();
        project.client_name = "Jane Roe".into();
        session.save_project(project).unwrap();
        assert_eq!(session.config().report_name, "Jane Roe - Damage Report");

        session.config_mut().report_name = "Roof Claim".into();
        let mut project = john_doe();
        project.client_name = "Jim Poe".into();
        session.save_project(project).unwrap();
        assert_eq!(session.config().report_name, "Roof Claim");
    }

    #[test]
    fn test_save_project_requires_fields() {
        let mut session = ProjectSession::new(john_doe(), 20);
        let mut project = john_doe();
        project.incident_date = None;

        assert_matches!(
            session.save_project(project),
            Err(ProjectError::MissingField("incidentDate"))
        );
        assert_eq!(session.project().client_name, "John Doe");
    }
}
