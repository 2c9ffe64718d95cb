use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ImportError, StoreError};
use crate::state::data::NewPhoto;

use super::ingest::read_photo;
use super::kind::{is_image_media_type, media_type_for_path};

/// Result of a folder import
#[derive(Debug, Default)]
pub struct FolderImport {
    pub photos: Vec<NewPhoto>,
    /// Files that are not images
    pub skipped: Vec<PathBuf>,
}

/// Read every image file under `folder`, recursively, in file name order.
/// Files without a known image extension are skipped.
///
/// Sizes are checked before any file is read: one image larger than
/// `max_photo_size` fails the whole import.
pub async fn import_folder(folder: &Path, max_photo_size: u64) -> Result<FolderImport, ImportError> {
    tracing::info!(folder = %folder.display(), "🔍 Scanning folder");

    let mut result = FolderImport::default();
    let mut images = Vec::new();
    for (path, size_bytes) in files_under(folder) {
        if !is_image_media_type(&media_type_for_path(&path)) {
            result.skipped.push(path);
            continue;
        }
        if size_bytes > max_photo_size {
            tracing::warn!(file = %path.display(), size_bytes, "Photo over the size limit");
            return Err(StoreError::FileTooLarge {
                file_name: path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
                size_bytes,
                max: max_photo_size,
            }
            .into());
        }
        images.push(path);
    }

    for path in images {
        result.photos.push(read_photo(&path).await?);
    }

    tracing::info!(
        imported = result.photos.len(),
        skipped = result.skipped.len(),
        "✅ Folder scanned"
    );
    Ok(result)
}

/// Regular files under `folder` with their size on disk
fn files_under(folder: &Path) -> Vec<(PathBuf, u64)> {
    WalkDir::new(folder)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let size = e.metadata().ok()?.len();
            Some((e.into_path(), size))
        })
        .collect()
}
