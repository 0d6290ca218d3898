/// Square crop regions and the display-to-natural pixel mapping
///
/// The user drags a region over a (possibly scaled) preview. Applying it
/// maps the region into the image's natural resolution, copies exactly that
/// sub-rectangle, and re-encodes the result as PNG.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use super::error::CaptureError;
use super::selected::SelectedImage;

/// File name given to every cropped upload
pub const CROPPED_FILE_NAME: &str = "cropped_image.png";
/// MIME type of every cropped upload
pub const CROPPED_MIME: &str = "image/png";

/// Fraction of the shorter displayed side covered by the initial crop
const INITIAL_CROP_FRACTION: f32 = 0.8;

/// Size of the image as it is shown on screen, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Scale `natural` down (never up) so it fits inside `max`, keeping aspect.
    pub fn fit_within(natural: (u32, u32), max: DisplaySize) -> Self {
        let (w, h) = (natural.0 as f32, natural.1 as f32);
        if w <= 0.0 || h <= 0.0 {
            return Self::new(0.0, 0.0);
        }
        let scale = (max.width / w).min(max.height / h).min(1.0);
        Self::new(w * scale, h * scale)
    }

    fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// A crop rectangle in displayed-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A crop rectangle in natural-resolution pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Centered square covering most of the shorter side
    pub fn centered(bounds: DisplaySize) -> Self {
        let side = bounds.width.min(bounds.height).max(0.0) * INITIAL_CROP_FRACTION;
        Self::new(
            (bounds.width - side) / 2.0,
            (bounds.height - side) / 2.0,
            side,
            side,
        )
    }

    /// Square spanned by dragging from `anchor` to `current`.
    ///
    /// The side follows the longer drag axis and the square grows in the
    /// direction of the drag.
    pub fn from_drag(anchor: (f32, f32), current: (f32, f32), bounds: DisplaySize) -> Self {
        let dx = current.0 - anchor.0;
        let dy = current.1 - anchor.1;
        let side = dx.abs().max(dy.abs());

        let x = if dx < 0.0 { anchor.0 - side } else { anchor.0 };
        let y = if dy < 0.0 { anchor.1 - side } else { anchor.1 };

        Self::new(x, y, side, side).constrain(bounds)
    }

    /// Clamp into `bounds` and force a 1:1 aspect.
    pub fn constrain(self, bounds: DisplaySize) -> Self {
        let bw = bounds.width.max(0.0);
        let bh = bounds.height.max(0.0);

        let x = self.x.clamp(0.0, bw);
        let y = self.y.clamp(0.0, bh);
        let side = self
            .width
            .min(self.height)
            .max(0.0)
            .min(bw - x)
            .min(bh - y);

        Self::new(x, y, side, side)
    }

    /// Map into natural-resolution pixels.
    ///
    /// Each axis has its own scale (`displayed / natural`). Every component
    /// is divided by its axis scale and rounded half away from zero. The
    /// origin is clamped into the image, the size to what remains of it,
    /// and never below one pixel.
    pub fn to_natural(&self, displayed: DisplaySize, natural: (u32, u32)) -> Result<PixelRect, CaptureError> {
        let (nw, nh) = natural;
        if displayed.is_empty() || nw == 0 || nh == 0 {
            return Err(CaptureError::InvalidDisplay);
        }

        let scale_x = displayed.width as f64 / nw as f64;
        let scale_y = displayed.height as f64 / nh as f64;

        let (x, width) = map_axis(self.x as f64, self.width as f64, scale_x, nw);
        let (y, height) = map_axis(self.y as f64, self.height as f64, scale_y, nh);

        Ok(PixelRect { x, y, width, height })
    }
}

fn map_axis(start: f64, length: f64, scale: f64, natural: u32) -> (u32, u32) {
    let max_start = natural.saturating_sub(1) as f64;
    let start = (start / scale).round().clamp(0.0, max_start) as u32;
    let length = (length / scale).round().max(1.0) as u32;
    (start, length.min(natural - start))
}

/// Copy `region` (in `displayed` coordinates) out of `image` and encode it as PNG.
pub fn crop_image(image: &SelectedImage, region: &CropRegion, displayed: DisplaySize) -> Result<SelectedImage, CaptureError> {
    let rect = region.to_natural(displayed, image.dimensions())?;

    let decoded = image.decode()?;
    let cropped = decoded.crop_imm(rect.x, rect.y, rect.width, rect.height);

    // PNG cannot hold float or 16-bit-per-channel data from every decoder
    let cropped = DynamicImage::ImageRgba8(cropped.to_rgba8());

    let mut bytes = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    log::info!(
        "✂️  Cropped {} to {}x{} at ({}, {})",
        image.file_name,
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );

    Ok(SelectedImage {
        bytes,
        mime: CROPPED_MIME.to_string(),
        file_name: CROPPED_FILE_NAME.to_string(),
        width: rect.width,
        height: rect.height,
    })
}
