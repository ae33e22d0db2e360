use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;

use crate::dto::candidate_dto::ImageOutcome;
use crate::error::{Error, Result};

const CANDIDATE_IMAGE_DIR: &str = "candidates";
const PUBLIC_PREFIX: &str = "/uploads/candidates";

/// File part pulled out of a multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// Writes candidate portraits under `<uploads_dir>/candidates` and hands back
/// the public path they are served from.
#[derive(Debug, Clone)]
pub struct ImageStore {
    uploads_dir: PathBuf,
    image_dir: PathBuf,
}

impl ImageStore {
    /// Creates the image directory and checks that it accepts writes.
    pub async fn init(uploads_dir: impl Into<PathBuf>) -> Result<Self> {
        let uploads_dir = uploads_dir.into();
        let image_dir = uploads_dir.join(CANDIDATE_IMAGE_DIR);

        fs::create_dir_all(&image_dir).await.map_err(|e| {
            Error::Config(format!(
                "Cannot create upload directory {}: {}",
                image_dir.display(),
                e
            ))
        })?;

        let probe = image_dir.join(format!(".write-probe-{}", uuid::Uuid::new_v4()));
        fs::write(&probe, b"").await.map_err(|e| {
            Error::Config(format!(
                "Upload directory {} is not writable: {}",
                image_dir.display(),
                e
            ))
        })?;
        fs::remove_file(&probe).await?;

        tracing::info!("Candidate images stored in {}", image_dir.display());
        Ok(Self {
            uploads_dir,
            image_dir,
        })
    }

    /// Directory that backs the `/uploads` static route.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Saves the bytes under a fresh UUID name that keeps the original
    /// extension, returning the public path.
    pub async fn save(&self, file_name: Option<&str>, data: &[u8]) -> std::io::Result<String> {
        let unique_name = format!("{}{}", uuid::Uuid::new_v4(), file_extension(file_name));
        fs::write(self.image_dir.join(&unique_name), data).await?;
        Ok(format!("{}/{}", PUBLIC_PREFIX, unique_name))
    }

    /// Deletes an image previously returned by [`ImageStore::save`].
    pub async fn remove(&self, url: &str) -> std::io::Result<()> {
        let name = url
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} is not a candidate image path", url),
                )
            })?;
        fs::remove_file(self.image_dir.join(name)).await
    }

    /// Stores an optional upload. Empty or absent files are skipped and write
    /// failures are logged and reported instead of returned.
    pub async fn store(&self, upload: Option<ImageUpload>) -> ImageOutcome {
        let Some(upload) = upload.filter(|u| !u.data.is_empty()) else {
            return ImageOutcome::NotProvided;
        };

        match self.save(upload.file_name.as_deref(), &upload.data).await {
            Ok(url) => {
                tracing::info!("Image saved at: {}", url);
                ImageOutcome::Stored { url }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save candidate image, continuing without it");
                ImageOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Extension of the last path segment, dot included; empty when there is no
/// name or no dot.
pub fn file_extension(file_name: Option<&str>) -> &str {
    let Some(name) = file_name else {
        return "";
    };
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rfind('.').map(|idx| &base[idx..]).unwrap_or("")
}
