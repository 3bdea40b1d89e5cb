// src/services/image_processor.rs
use crate::errors::RestyleError;
use crate::models::data_url;
use image::io::Reader;
use image::{GenericImageView, ImageFormat as ImgFormat};
use std::io::Cursor;

pub struct ImageProcessor {
    max_dimension: u32,
}

pub fn mime_for(format: ImgFormat) -> &'static str {
    match format {
        ImgFormat::Png => "image/png",
        ImgFormat::Jpeg => "image/jpeg",
        ImgFormat::Gif => "image/gif",
        ImgFormat::WebP => "image/webp",
        ImgFormat::Bmp => "image/bmp",
        ImgFormat::Tiff => "image/tiff",
        ImgFormat::Ico => "image/x-icon",
        _ => "application/octet-stream",
    }
}

impl ImageProcessor {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    pub fn validate_image(&self, data: &[u8]) -> Result<(u32, u32, ImgFormat), RestyleError> {
        if data.is_empty() {
            return Err(RestyleError::ImageProcessing(
                "The uploaded file is empty".to_string(),
            ));
        }

        let reader = Reader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| {
                RestyleError::ImageProcessing(format!("Could not read the image: {}", e))
            })?;
        let format = reader.format().ok_or_else(|| {
            RestyleError::ImageProcessing("Unrecognized image format".to_string())
        })?;

        // Header only; the pixel data is not touched until the size is known.
        let (width, height) = reader.into_dimensions().map_err(|e| {
            RestyleError::ImageProcessing(format!("Could not read the image: {}", e))
        })?;

        if width > self.max_dimension || height > self.max_dimension {
            return Err(RestyleError::ImageProcessing(format!(
                "Image dimensions exceed {}x{}",
                self.max_dimension, self.max_dimension
            )));
        }

        image::load_from_memory_with_format(data, format).map_err(|e| {
            RestyleError::ImageProcessing(format!("Could not read the image: {}", e))
        })?;

        Ok((width, height, format))
    }

    /// Decodes the upload and returns a `data:` URI the presentation can show
    /// directly.
    pub fn derive_display(&self, data: &[u8]) -> Result<String, RestyleError> {
        let (width, height, format) = self.validate_image(data)?;
        log::debug!(
            "Derived display representation ({}x{}, {:?}, {} bytes)",
            width,
            height,
            format,
            data.len()
        );
        Ok(data_url(mime_for(format), data))
    }

    /// Downscales to fit `max_size` on the longest side. Returns the input
    /// untouched, with its own mime type, when it already fits.
    pub fn resize_if_needed(
        &self,
        data: &[u8],
        max_size: u32,
    ) -> Result<(Vec<u8>, &'static str), RestyleError> {
        let format = image::guess_format(data).map_err(|e| {
            RestyleError::ImageProcessing(format!("Unrecognized image format: {}", e))
        })?;
        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| RestyleError::ImageProcessing(format!("Failed to load image: {}", e)))?;

        let (width, height) = img.dimensions();

        if width <= max_size && height <= max_size {
            return Ok((data.to_vec(), mime_for(format)));
        }

        let ratio = (max_size as f32 / width.max(height) as f32).min(1.0);
        let new_width = ((width as f32 * ratio) as u32).max(1);
        let new_height = ((height as f32 * ratio) as u32).max(1);

        let resized = img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3);

        let mut output = Vec::new();
        resized
            .write_to(&mut std::io::Cursor::new(&mut output), ImgFormat::Png)
            .map_err(|e| {
                RestyleError::ImageProcessing(format!("Failed to encode resized image: {}", e))
            })?;

        Ok((output, "image/png"))
    }
}
