use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StoreError;
use crate::media::kind::is_image_media_type;

use super::data::{ImageData, NewPhoto, PhotoId, PhotoRecord};

/// Maximum number of photos a single project may hold
pub const MAX_PHOTOS: usize = 100;

/// Maximum size of a single photo upload (10 MiB)
pub const MAX_PHOTO_SIZE: u64 = 10 * 1024 * 1024;

/// The store shared between the session and ingestion tasks.
///
/// Every mutation takes the lock once, so a batch add does its capacity
/// check and its inserts inside one critical section.
pub type SharedPhotoStore = Arc<Mutex<PhotoStore>>;

/// Lock a shared store, recovering the guard if the lock was poisoned.
pub fn lock(store: &SharedPhotoStore) -> MutexGuard<'_, PhotoStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The PhotoStore holds the photos of one project session.
/// It owns the image bytes and keeps records in insertion order.
pub struct PhotoStore {
    photos: Vec<PhotoRecord>,
    next_order: u64,
    max_photos: usize,
    max_photo_size: u64,
}

impl PhotoStore {
    /// Create an empty store with the standard project limits
    pub fn new() -> Self {
        Self::with_limits(MAX_PHOTOS, MAX_PHOTO_SIZE)
    }

    pub fn with_limits(max_photos: usize, max_photo_size: u64) -> Self {
        Self {
            photos: Vec::new(),
            next_order: 0,
            max_photos,
            max_photo_size,
        }
    }

    /// Wrap the store for sharing with ingestion tasks
    pub fn shared(self) -> SharedPhotoStore {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.max_photos.saturating_sub(self.photos.len())
    }

    /// Add a single photo. Same rules as [`PhotoStore::add_batch`].
    pub fn add(&mut self, file: NewPhoto) -> Result<PhotoRecord, StoreError> {
        let mut added = self.add_batch(vec![file])?;
        // add_batch returns one record per input file
        Ok(added.remove(0))
    }

    /// Add a batch of photos.
    ///
    /// The whole batch is rejected if it would push the store past its
    /// capacity, or if any file is not an image or is too large. Nothing is
    /// inserted unless every file passes.
    pub fn add_batch(&mut self, files: Vec<NewPhoto>) -> Result<Vec<PhotoRecord>, StoreError> {
        if self.photos.len() + files.len() > self.max_photos {
            tracing::warn!(
                current = self.photos.len(),
                requested = files.len(),
                "Rejected photo batch over capacity"
            );
            return Err(StoreError::CapacityExceeded {
                current: self.photos.len(),
                requested: files.len(),
                max: self.max_photos,
            });
        }

        for file in &files {
            if !is_image_media_type(&file.media_type) {
                return Err(StoreError::InvalidMediaType {
                    file_name: file.file_name.clone(),
                    media_type: file.media_type.clone(),
                });
            }
            if file.size_bytes() > self.max_photo_size {
                return Err(StoreError::FileTooLarge {
                    file_name: file.file_name.clone(),
                    size_bytes: file.size_bytes(),
                    max: self.max_photo_size,
                });
            }
        }

        let mut added = Vec::with_capacity(files.len());
        for file in files {
            let size_bytes = file.size_bytes();
            let record = PhotoRecord {
                id: PhotoId::new(),
                file_name: file.file_name,
                media_type: file.media_type,
                image: ImageData::from(file.bytes),
                reduced: None,
                dimensions: None,
                notes: String::new(),
                order: self.next_order,
                size_bytes,
                progress: 0,
                failure: None,
            };
            self.next_order += 1;
            self.photos.push(record.clone());
            added.push(record);
        }

        tracing::debug!(added = added.len(), total = self.photos.len(), "Photos added");
        Ok(added)
    }

    /// Remove a photo. Siblings keep their `order`.
    pub fn remove(&mut self, id: PhotoId) -> Result<PhotoRecord, StoreError> {
        let index = self.index_of(id)?;
        Ok(self.photos.remove(index))
    }

    /// Remove several photos, skipping ids that are already gone.
    /// Returns the ids that were actually removed.
    pub fn remove_batch(&mut self, ids: &[PhotoId]) -> Vec<PhotoId> {
        ids.iter()
            .filter_map(|id| self.remove(*id).ok().map(|r| r.id))
            .collect()
    }

    /// Replace the notes of a photo
    pub fn update_notes(&mut self, id: PhotoId, notes: impl Into<String>) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        self.photos[index].notes = notes.into();
        Ok(())
    }

    pub fn get(&self, id: PhotoId) -> Option<&PhotoRecord> {
        self.photos.iter().find(|p| p.id == id)
    }

    /// Snapshot of all photos in ascending `order`.
    ///
    /// The snapshot is detached from the store: later changes do not show up
    /// in it, and it can be iterated as many times as needed.
    pub fn list(&self) -> PhotoSnapshot {
        // Records are appended with increasing order and removal keeps the
        // relative order, so the vector is already sorted.
        PhotoSnapshot(self.photos.clone())
    }

    /// Advance the ingestion progress of a photo (clamped to 0..=100).
    ///
    /// Fails with `NotFound` once the photo has been removed, which is how
    /// late updates from a cancelled ingestion get dropped.
    pub fn set_progress(&mut self, id: PhotoId, progress: u8) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        self.photos[index].progress = progress.min(100);
        Ok(())
    }

    /// Record the pixel size found while probing the image
    pub fn set_dimensions(&mut self, id: PhotoId, width: u32, height: u32) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        self.photos[index].dimensions = Some((width, height));
        Ok(())
    }

    /// Attach the reduced variant and mark the photo ready
    pub fn complete_ingest(&mut self, id: PhotoId, reduced: ImageData) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        let photo = &mut self.photos[index];
        photo.reduced = Some(reduced);
        photo.failure = None;
        photo.progress = 100;
        Ok(())
    }

    /// Mark ingestion as failed. The photo stays below 100% and is never
    /// included in a report until it is removed and uploaded again.
    pub fn fail_ingest(&mut self, id: PhotoId, reason: impl Into<String>) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        self.photos[index].failure = Some(reason.into());
        Ok(())
    }

    pub fn ready_count(&self) -> usize {
        self.photos.iter().filter(|p| p.is_ready()).count()
    }

    fn index_of(&self, id: PhotoId) -> Result<usize, StoreError> {
        self.photos
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

impl Default for PhotoStore {
    fn default() -> Self {
        Self::new()
    }
}

// Implement Debug without dumping every record
impl std::fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoStore")
            .field("photos", &self.photos.len())
            .field("next_order", &self.next_order)
            .field("max_photos", &self.max_photos)
            .finish()
    }
}

/// Point-in-time copy of the store contents, ordered by `order`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoSnapshot(Vec<PhotoRecord>);

impl PhotoSnapshot {
    pub fn iter(&self) -> std::slice::Iter<'_, PhotoRecord> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[PhotoRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a PhotoSnapshot {
    type Item = &'a PhotoRecord;
    type IntoIter = std::slice::Iter<'a, PhotoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for PhotoSnapshot {
    type Item = PhotoRecord;
    type IntoIter = std::vec::IntoIter<PhotoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
