pub mod picture;
pub mod viewer;

pub use picture::{validate_image, ImageUpload, ProfilePictures, MAX_IMAGE_BYTES};
pub use viewer::ProfileViewer;
