/// Image capture module
///
/// This module handles everything that happens before an upload:
/// - Loading and sniffing the picked file (selected.rs)
/// - Square crop regions and the display-to-natural pixel mapping (crop.rs)
/// - The uploader state: selection, crop mode, removal (uploader.rs)

pub mod crop;
pub mod error;
pub mod selected;
pub mod uploader;

pub use crop::{CropRegion, DisplaySize};
pub use error::CaptureError;
pub use selected::SelectedImage;
pub use uploader::ImageUploader;
