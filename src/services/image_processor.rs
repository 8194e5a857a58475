// src/services/image_processor.rs
use crate::errors::AppError;
use image::GenericImageView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub width: u32,
    pub height: u32,
    pub format: String,
}

pub struct ImageProcessor;

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Reads dimensions and format of a generated payload for the preview line.
    pub fn inspect(&self, data: &[u8]) -> Result<ImageSummary, AppError> {
        let format = image::guess_format(data)
            .map_err(|e| AppError::ImageProcessing(format!("Unknown image format: {}", e)))?;

        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| AppError::ImageProcessing(format!("Invalid image data: {}", e)))?;

        let (width, height) = img.dimensions();

        Ok(ImageSummary {
            width,
            height,
            format: format!("{:?}", format).to_uppercase(),
        })
    }
}
