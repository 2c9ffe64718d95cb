//! Background photo ingestion
//!
//! Every photo added to the store gets its own ingestion task that:
//! - probes the image header (progress 50%)
//! - produces the reduced variant (progress 100%, photo is ready)
//!
//! CPU-bound steps run on the blocking pool. Each task owns a cancellation
//! token; removing a photo cancels it, and the store refuses any update
//! for an id it no longer holds.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::task;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::StoreError;
use crate::state::data::{ImageData, NewPhoto, PhotoId, PhotoRecord};
use crate::state::store::{self, PhotoStore, SharedPhotoStore};

use super::downsample;
use super::kind::media_type_for_path;

/// Progress reported once the task has started
const PROGRESS_STARTED: u8 = 10;
/// Progress reported once the header has been probed
const PROGRESS_PROBED: u8 = 50;

/// Why an ingestion task stopped early
enum Halt {
    /// The photo left the store (or the task was cancelled)
    Removed,
    /// The image could not be processed
    Failed(String),
}

impl From<StoreError> for Halt {
    fn from(_: StoreError) -> Self {
        // The only error a progress update can hit is NotFound
        Halt::Removed
    }
}

/// Spawns and tracks ingestion tasks for one photo store
pub struct Ingestor {
    store: SharedPhotoStore,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    tokens: Arc<Mutex<HashMap<PhotoId, CancellationToken>>>,
    reduced_max_edge: u32,
}

impl Ingestor {
    pub fn new(store: SharedPhotoStore, reduced_max_edge: u32) -> Self {
        Self {
            store,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            tokens: Arc::new(Mutex::new(HashMap::new())),
            reduced_max_edge,
        }
    }

    /// Start ingesting a freshly added photo.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, photo: &PhotoRecord) {
        let id = photo.id;
        let token = self.shutdown.child_token();
        lock_tokens(&self.tokens).insert(id, token.clone());

        let store = Arc::clone(&self.store);
        let tokens = Arc::clone(&self.tokens);
        let image = photo.image.clone();
        let max_edge = self.reduced_max_edge;

        self.tracker.spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(Halt::Removed),
                result = run_stages(&store, id, image, max_edge) => result,
            };

            match outcome {
                Ok(()) => tracing::debug!(%id, "✅ Photo ready"),
                Err(Halt::Removed) => tracing::debug!(%id, "Ingestion dropped, photo removed"),
                Err(Halt::Failed(reason)) => {
                    tracing::warn!(%id, %reason, "⚠️  Photo ingestion failed");
                    // Ignore NotFound: the photo may have been removed meanwhile
                    let _ = store::lock(&store).fail_ingest(id, reason);
                }
            }

            lock_tokens(&tokens).remove(&id);
        });
    }

    /// Cancel the ingestion of a photo. Returns false if none was running.
    pub fn cancel(&self, id: PhotoId) -> bool {
        match lock_tokens(&self.tokens).remove(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of ingestion tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every ingestion task spawned so far has finished
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel every running ingestion task
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for Ingestor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("in_flight", &self.tracker.len())
            .field("reduced_max_edge", &self.reduced_max_edge)
            .finish()
    }
}

/// Read a photo file from disk, guessing its media type from the extension
pub async fn read_photo(path: &Path) -> std::io::Result<NewPhoto> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(NewPhoto::new(file_name, media_type_for_path(path), bytes))
}

async fn run_stages(
    store: &SharedPhotoStore,
    id: PhotoId,
    image: ImageData,
    max_edge: u32,
) -> Result<(), Halt> {
    update(store, |s| s.set_progress(id, PROGRESS_STARTED))?;

    // Step 1: probe the header
    let header = image.clone();
    let (width, height) = task::spawn_blocking(move || downsample::probe_dimensions(header.as_bytes()))
        .await
        .map_err(|e| Halt::Failed(format!("Task join error: {}", e)))?
        .map_err(Halt::Failed)?;

    update(store, |s| {
        s.set_dimensions(id, width, height)?;
        s.set_progress(id, PROGRESS_PROBED)
    })?;

    // Step 2: produce the reduced variant
    let reduced = task::spawn_blocking(move || downsample::reduce(image.as_bytes(), max_edge))
        .await
        .map_err(|e| Halt::Failed(format!("Task join error: {}", e)))?
        .map_err(Halt::Failed)?;

    update(store, |s| s.complete_ingest(id, ImageData::from(reduced)))?;
    Ok(())
}

/// Apply one store update without holding the lock across an await
fn update<F>(store: &SharedPhotoStore, f: F) -> Result<(), Halt>
where
    F: FnOnce(&mut PhotoStore) -> Result<(), StoreError>,
{
    let mut guard = store::lock(store);
    f(&mut *guard).map_err(Halt::from)
}

fn lock_tokens(
    tokens: &Mutex<HashMap<PhotoId, CancellationToken>>,
) -> std::sync::MutexGuard<'_, HashMap<PhotoId, CancellationToken>> {
    tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
