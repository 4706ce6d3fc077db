//! On-disk storage for pet photos.
//!
//! Each photo is one file named `<uuid>.<ext>`, the extension taken from the
//! sniffed image format, and is served back under `/blob/<uuid>`.

use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ServerError;

/// Formats a browser can show in an `<img>` tag.
const PHOTO_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// A stored photo as read back from disk.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    max_size: usize,
}

impl BlobStore {
    pub async fn new(root: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&root)
            .await
            .map_err(|e| storage_error("create", &root, e))?;

        info!(path = %root.display(), max_size, "Photo store ready");
        Ok(Self { root, max_size })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Store a photo and return its id.
    pub async fn store_image(&self, data: &[u8]) -> Result<Uuid, ServerError> {
        let format = self.check_upload(data)?;
        let id = Uuid::new_v4();
        let path = self.file_for(id, format);

        fs::write(&path, data)
            .await
            .map_err(|e| storage_error("write", &path, e))?;

        debug!(id = %id, size = data.len(), format = ?format, "Photo stored");
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<StoredBlob, ServerError> {
        let (path, format) = self.locate(id).await?;
        let bytes = fs::read(&path)
            .await
            .map_err(|e| storage_error("read", &path, e))?;

        Ok(StoredBlob {
            bytes,
            content_type: format.to_mime_type(),
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServerError> {
        let (path, _) = self.locate(id).await?;
        fs::remove_file(&path)
            .await
            .map_err(|e| storage_error("delete", &path, e))?;

        debug!(id = %id, "Photo deleted");
        Ok(())
    }

    /// Rejects empty, oversized and non-photo payloads before any write.
    fn check_upload(&self, data: &[u8]) -> Result<ImageFormat, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::BlobTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }
        match image::guess_format(data) {
            Ok(format) if PHOTO_FORMATS.contains(&format) => Ok(format),
            _ => Err(ServerError::BadRequest(
                "Upload is not a PNG, JPEG, GIF or WebP image".to_string(),
            )),
        }
    }

    async fn locate(&self, id: Uuid) -> Result<(PathBuf, ImageFormat), ServerError> {
        for format in PHOTO_FORMATS {
            let path = self.file_for(id, format);
            if fs::try_exists(&path).await.unwrap_or(false) {
                return Ok((path, format));
            }
        }
        Err(ServerError::BlobNotFound(id))
    }

    /// Ids are UUIDs, so the joined name never leaves `root`.
    fn file_for(&self, id: Uuid, format: ImageFormat) -> PathBuf {
        let ext = format.extensions_str().first().copied().unwrap_or("img");
        self.root.join(format!("{id}.{ext}"))
    }
}

fn storage_error(action: &str, path: &Path, e: io::Error) -> ServerError {
    ServerError::BlobStorage(format!("Failed to {action} {}: {e}", path.display()))
}

/// Extract the blob id from a photo URL served by this instance.
pub fn blob_id_from_url(origin: &url::Url, photo_url: &str) -> Option<Uuid> {
    let url = url::Url::parse(photo_url).ok()?;
    if url.origin() != origin.origin() {
        return None;
    }
    let id = url.path().strip_prefix("/blob/")?;
    Uuid::parse_str(id).ok()
}
