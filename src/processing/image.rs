use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::contrast::adaptive_threshold;
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use tempfile::NamedTempFile;
use crate::config::ScannerConfig;
use crate::utils::QidError;

/// Binarized grayscale card image ready for the recognizer.
#[derive(Debug, Clone)]
pub struct EnhancedImage {
    image: GrayImage,
}

impl EnhancedImage {
    pub fn from_gray(image: GrayImage) -> Self {
        EnhancedImage { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Writes the image to a PNG temp file; the file is removed when the handle drops.
    pub fn save_to_temp_file(&self) -> Result<NamedTempFile, QidError> {
        let temp_file = tempfile::Builder::new().suffix(".png").tempfile()?;
        self.image
            .save(temp_file.path())
            .map_err(|e| QidError::ImageDecode(format!("Failed to write temp image: {}", e)))?;
        Ok(temp_file)
    }
}

/// Strips an optional `data:image/...;base64,` prefix and decodes the payload.
/// Characters outside the base64 alphabet (line breaks, stray punctuation
/// from copy-paste) are skipped rather than rejected.
pub fn decode_image_payload(image_data: &str) -> Result<Vec<u8>, QidError> {
    let payload = if image_data.starts_with("data:image") {
        image_data
            .split_once(',')
            .map(|(_, rest)| rest)
            .ok_or_else(|| QidError::InvalidImageData("data URL has no payload".to_string()))?
    } else {
        image_data
    };

    let compact: String = payload
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    if compact.is_empty() {
        return Err(QidError::InvalidImageData("empty image payload".to_string()));
    }

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| QidError::InvalidImageData(format!("invalid base64: {}", e)))
}

/// Decodes, size-checks, downscales and cleans a card photo.
#[derive(Debug, Clone)]
pub struct ImageEnhancer {
    min_width: u32,
    min_height: u32,
    max_width: u32,
    blur_sigma: f32,
    threshold_block_radius: u32,
    close_radius: u8,
}

impl ImageEnhancer {
    pub fn new(config: &ScannerConfig) -> Self {
        ImageEnhancer {
            min_width: config.min_width,
            min_height: config.min_height,
            max_width: config.max_width,
            blur_sigma: config.blur_sigma,
            threshold_block_radius: config.threshold_block_radius,
            close_radius: config.close_radius,
        }
    }

    pub fn enhance(&self, raw_image: &[u8]) -> Result<EnhancedImage, QidError> {
        let img = image::load_from_memory(raw_image)
            .map_err(|e| QidError::ImageDecode(format!("Failed to load image: {}", e)))?;

        let (width, height) = img.dimensions();
        if width < self.min_width || height < self.min_height {
            return Err(QidError::ImageTooSmall {
                width,
                height,
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }

        let img = self.downscale(img);
        Ok(EnhancedImage::from_gray(self.clean(&img.to_luma8())))
    }

    fn downscale(&self, img: DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        if width <= self.max_width {
            return img;
        }

        let scale = self.max_width as f64 / width as f64;
        let new_width = (width as f64 * scale) as u32;
        let new_height = ((height as f64 * scale) as u32).max(1);
        log::debug!("Downscaling image {}x{} -> {}x{}", width, height, new_width, new_height);
        img.resize_exact(new_width, new_height, FilterType::Triangle)
    }

    // denoise, binarize, then close small gaps in the strokes
    fn clean(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, self.blur_sigma);
        let binary = adaptive_threshold(&blurred, self.threshold_block_radius);
        close(&binary, Norm::LInf, self.close_radius)
    }
}
