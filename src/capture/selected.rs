/// The image the user picked (or the result of cropping it)
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::error::CaptureError;

/// Raw file bytes plus what we learned from sniffing them.
///
/// Bytes are uploaded as-is; decoding only happens to read dimensions
/// and when a crop is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub bytes: Vec<u8>,
    /// MIME type guessed from the file contents, e.g. "image/jpeg"
    pub mime: String,
    /// File name sent in the multipart part
    pub file_name: String,
    /// Natural width in pixels, after EXIF orientation
    pub width: u32,
    /// Natural height in pixels, after EXIF orientation
    pub height: u32,
}

impl SelectedImage {
    /// Sniff and decode `bytes`, rejecting anything that is not an image.
    pub fn from_bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self, CaptureError> {
        let file_name = file_name.into();

        let format = image::guess_format(&bytes)
            .map_err(|_| CaptureError::UnsupportedFormat(file_name.clone()))?;

        let decoded = decode_oriented(&bytes, format)?;

        Ok(Self {
            mime: format.to_mime_type().to_string(),
            width: decoded.width(),
            height: decoded.height(),
            bytes,
            file_name,
        })
    }

    /// Load an image file from disk.
    ///
    /// Decoding is CPU-bound, so it runs on the blocking pool.
    pub async fn load(path: PathBuf) -> Result<Self, CaptureError> {
        tokio::task::spawn_blocking(move || Self::load_blocking(&path))
            .await
            .map_err(|e| CaptureError::Read {
                path: String::new(),
                reason: format!("task join error: {}", e),
            })?
    }

    fn load_blocking(path: &Path) -> Result<Self, CaptureError> {
        let bytes = std::fs::read(path).map_err(|e| CaptureError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        let image = Self::from_bytes(bytes, file_name)?;
        log::info!(
            "📷 Loaded {} ({}x{}, {}KB, {})",
            image.file_name,
            image.width,
            image.height,
            image.bytes.len() / 1024,
            image.mime
        );
        Ok(image)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Decode the pixels the way the preview shows them (EXIF rotation applied).
    pub fn decode(&self) -> Result<DynamicImage, CaptureError> {
        let format = image::guess_format(&self.bytes)
            .map_err(|_| CaptureError::UnsupportedFormat(self.file_name.clone()))?;
        decode_oriented(&self.bytes, format)
    }
}

/// Decode `bytes` and rotate/flip them upright according to their EXIF tag.
///
/// The preview widget honours the tag, so crop coordinates only line up
/// with the pixels if every decode here does too.
fn decode_oriented(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, CaptureError> {
    let decode_err = |e: image::ImageError| CaptureError::Decode(e.to_string());

    let mut decoder = ImageReader::with_format(Cursor::new(bytes), format)
        .into_decoder()
        .map_err(decode_err)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    image.apply_orientation(orientation);
    Ok(image)
}
