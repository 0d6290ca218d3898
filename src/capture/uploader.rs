/// Uploader state: the current image and, while cropping, the crop session
use super::crop::{crop_image, CropRegion, DisplaySize};
use super::error::CaptureError;
use super::selected::SelectedImage;

/// An active crop: where the preview is drawn and the square being dragged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSession {
    pub displayed: DisplaySize,
    pub region: CropRegion,
}

/// Owns the selected image. Never shared; callers get clones or borrows.
#[derive(Debug, Default)]
pub struct ImageUploader {
    image: Option<SelectedImage>,
    crop: Option<CropSession>,
}

impl ImageUploader {
    /// Replace the current image. Rejected while a crop is in progress.
    pub fn select(&mut self, image: SelectedImage) -> Result<&SelectedImage, CaptureError> {
        if self.is_cropping() {
            return Err(CaptureError::Busy);
        }
        let image: &SelectedImage = self.image.insert(image);
        Ok(image)
    }

    /// Enter crop mode with a centered square over the preview.
    pub fn begin_crop(&mut self, displayed: DisplaySize) -> Result<CropRegion, CaptureError> {
        if self.image.is_none() {
            return Err(CaptureError::NoImage);
        }
        if displayed.width <= 0.0 || displayed.height <= 0.0 {
            return Err(CaptureError::InvalidDisplay);
        }
        let region = CropRegion::centered(displayed);
        self.crop = Some(CropSession { displayed, region });
        Ok(region)
    }

    /// Store a new crop square, clamped to the preview and forced to 1:1.
    pub fn update_crop(&mut self, region: CropRegion) -> Result<CropRegion, CaptureError> {
        let session = self.crop.as_mut().ok_or(CaptureError::NotCropping)?;
        session.region = region.constrain(session.displayed);
        Ok(session.region)
    }

    /// Crop the current image to `region` and make the result the new image.
    ///
    /// On failure crop mode stays active so the user can adjust or cancel.
    pub fn apply_crop(&mut self, region: CropRegion) -> Result<&SelectedImage, CaptureError> {
        let session = self.crop.ok_or(CaptureError::NotCropping)?;
        let image = self.image.as_ref().ok_or(CaptureError::NoImage)?;

        let region = region.constrain(session.displayed);
        let cropped = crop_image(image, &region, session.displayed)?;

        self.crop = None;
        let image: &SelectedImage = self.image.insert(cropped);
        Ok(image)
    }

    /// Leave crop mode, keeping the original image.
    pub fn cancel_crop(&mut self) {
        self.crop = None;
    }

    /// Drop the image and any crop state.
    pub fn remove(&mut self) {
        self.image = None;
        self.crop = None;
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    pub fn crop_session(&self) -> Option<&CropSession> {
        self.crop.as_ref()
    }

    pub fn is_cropping(&self) -> bool {
        self.crop.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::crop::CROPPED_FILE_NAME;
    use crate::capture::selected::tests::gradient_png;

    fn sample(width: u32, height: u32) -> SelectedImage {
        SelectedImage::from_bytes(gradient_png(width, height), "face.png").unwrap()
    }

    #[test]
    fn test_select_replaces_image() {
        let mut uploader = ImageUploader::default();
        uploader.select(sample(10, 10)).unwrap();
        uploader.select(sample(20, 30)).unwrap();
        assert_eq!(uploader.image().unwrap().dimensions(), (20, 30));
    }

    #[test]
    fn test_select_rejected_while_cropping() {
        let mut uploader = ImageUploader::default();
        uploader.select(sample(100, 100)).unwrap();
        uploader.begin_crop(DisplaySize::new(100.0, 100.0)).unwrap();

        assert_eq!(uploader.select(sample(20, 20)).unwrap_err(), CaptureError::Busy);
        assert_eq!(uploader.image().unwrap().dimensions(), (100, 100));

        uploader.cancel_crop();
        assert!(uploader.select(sample(20, 20)).is_ok());
    }

    #[test]
    fn test_begin_crop_requires_image() {
        let mut uploader = ImageUploader::default();
        let err = uploader.begin_crop(DisplaySize::new(100.0, 100.0)).unwrap_err();
        assert_eq!(err, CaptureError::NoImage);
        assert!(!uploader.is_cropping());
    }

    #[test]
    fn test_update_crop_outside_crop_mode() {
        let mut uploader = ImageUploader::default();
        uploader.select(sample(10, 10)).unwrap();
        let err = uploader.update_crop(CropRegion::new(0.0, 0.0, 5.0, 5.0)).unwrap_err();
        assert_eq!(err, CaptureError::NotCropping);
    }

    #[test]
    fn test_update_crop_is_constrained() {
        let mut uploader = ImageUploader::default();
        uploader.select(sample(200, 100)).unwrap();
        uploader.begin_crop(DisplaySize::new(200.0, 100.0)).unwrap();

        let region = uploader.update_crop(CropRegion::new(180.0, 0.0, 60.0, 40.0)).unwrap();
        assert_eq!(region, CropRegion::new(180.0, 0.0, 20.0, 20.0));
        assert_eq!(uploader.crop_session().unwrap().region, region);
    }

    #[test]
    fn test_apply_crop_replaces_image_and_exits_crop_mode() {
        let mut uploader = ImageUploader::default();
        uploader.select(sample(100, 100)).unwrap();
        uploader.begin_crop(DisplaySize::new(50.0, 50.0)).unwrap();

        let cropped = uploader.apply_crop(CropRegion::new(0.0, 0.0, 25.0, 25.0)).unwrap();
        assert_eq!(cropped.dimensions(), (50, 50));
        assert_eq!(cropped.file_name, CROPPED_FILE_NAME);
        assert!(!uploader.is_cropping());
    }

    #[test]
    fn test_remove_clears_everything() {
        let mut uploader = ImageUploader::default();
        uploader.select(sample(100, 100)).unwrap();
        uploader.begin_crop(DisplaySize::new(100.0, 100.0)).unwrap();

        uploader.remove();

        assert!(uploader.image().is_none());
        assert!(uploader.crop_session().is_none());
    }
}
