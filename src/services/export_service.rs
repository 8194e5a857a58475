// src/services/export_service.rs
use crate::errors::AppError;
use crate::models::GeneratedImage;
use log::info;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

const FILE_PREFIX: &str = "icon";
const FILE_EXTENSION: &str = "png";

pub struct ExportService {
    download_dir: PathBuf,
}

impl ExportService {
    pub fn new(download_dir: PathBuf) -> Self {
        Self { download_dir }
    }

    /// `icon-<millis>.png`, or `icon-<millis>-<attempt>.png` after a collision.
    pub fn file_name(&self, millis: i64, attempt: u32) -> String {
        match attempt {
            0 => format!("{}-{}.{}", FILE_PREFIX, millis, FILE_EXTENSION),
            n => format!("{}-{}-{}.{}", FILE_PREFIX, millis, n, FILE_EXTENSION),
        }
    }

    /// Writes the raw payload of `image` to the download directory.
    /// Returns `None` when no image is selected.
    pub async fn save(&self, image: Option<&GeneratedImage>) -> Result<Option<PathBuf>, AppError> {
        let Some(image) = image else {
            return Ok(None);
        };

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| AppError::Export(format!("Failed to create download directory: {}", e)))?;

        let millis = chrono::Utc::now().timestamp_millis();
        let mut attempt = 0;
        let (path, mut file) = loop {
            let path = self.download_dir.join(self.file_name(millis, attempt));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(AppError::Export(format!(
                        "Failed to create {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        };

        file.write_all(&image.image_data)
            .await
            .map_err(|e| AppError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| AppError::Export(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(
            "Saved image {} ({} bytes) to {}",
            image.id,
            image.image_data.len(),
            path.display()
        );

        Ok(Some(path))
    }
}
