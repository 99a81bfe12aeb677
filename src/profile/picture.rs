use chrono::Utc;
use futures::future::try_join;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    backend::{DataSource, DbPath, ObjectStore},
    models::{ExplorerError, Result},
};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const PHOTO_URL: &str = "photoURL";
const PHOTO_PATH: &str = "photoPath";

/// An image ready to be uploaded
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file, guessing its content type from the extension
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ExplorerError::InvalidImage(format!("Could not read {}: {}", path.display(), e)))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        Ok(Self::new(content_type_for(&extension), bytes))
    }

    fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "img",
        }
    }
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Reject non-images and anything over 5 MiB
pub fn validate_image(content_type: &str, size: usize) -> Result<()> {
    if !content_type.starts_with("image/") {
        return Err(ExplorerError::InvalidImage(
            "Please select an image file (JPG, PNG, GIF)".to_string(),
        ));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ExplorerError::InvalidImage(
            "Image size should be less than 5MB".to_string(),
        ));
    }
    Ok(())
}

/// Profile picture upload/removal; the URL lives at `users/{id}/profile/photoURL`
pub struct ProfilePictures {
    source: Arc<dyn DataSource>,
    store: Arc<dyn ObjectStore>,
}

impl ProfilePictures {
    pub fn new(source: Arc<dyn DataSource>, store: Arc<dyn ObjectStore>) -> Self {
        Self { source, store }
    }

    pub async fn current(&self, uid: &str) -> Result<Option<String>> {
        self.read_field(uid, PHOTO_URL).await
    }

    /// Store the image and point the profile at it, returning the download URL
    pub async fn upload(&self, uid: &str, image: ImageUpload) -> Result<String> {
        validate_image(&image.content_type, image.bytes.len())?;

        let previous = self.read_field(uid, PHOTO_PATH).await?;
        let name = format!(
            "profile_pictures/{}/profile_{}.{}",
            uid,
            Utc::now().timestamp_millis(),
            image.extension()
        );

        let stored = self.store.upload(&name, image.bytes, &image.content_type).await?;
        let url_path = DbPath::profile_field(uid, PHOTO_URL)?;
        let path_path = DbPath::profile_field(uid, PHOTO_PATH)?;
        let linked = try_join(
            self.source.write(&url_path, json!(stored.download_url)),
            self.source.write(&path_path, json!(stored.name)),
        )
        .await;
        if let Err(e) = linked {
            // the profile does not point at the new object, so drop it
            if let Err(cleanup) = self.store.delete(&stored.name).await {
                warn!("Could not delete unlinked picture {}: {}", stored.name, cleanup);
            }
            return Err(e);
        }
        info!("Profile picture updated for {}", uid);

        if let Some(previous) = previous.filter(|p| *p != stored.name) {
            if let Err(e) = self.store.delete(&previous).await {
                warn!("Could not delete old profile picture {}: {}", previous, e);
            }
        }

        Ok(stored.download_url)
    }

    pub async fn remove(&self, uid: &str) -> Result<()> {
        if let Some(path) = self.read_field(uid, PHOTO_PATH).await? {
            if let Err(e) = self.store.delete(&path).await {
                warn!("Could not delete profile picture {}: {}", path, e);
            }
        }

        let url_path = DbPath::profile_field(uid, PHOTO_URL)?;
        let path_path = DbPath::profile_field(uid, PHOTO_PATH)?;
        try_join(self.source.remove(&url_path), self.source.remove(&path_path)).await?;
        info!("Profile picture removed for {}", uid);
        Ok(())
    }

    async fn read_field(&self, uid: &str, field: &str) -> Result<Option<String>> {
        let value = self.source.read(&DbPath::profile_field(uid, field)?).await?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryDataSource, MemoryObjectStore, MockDataSource};

    fn pictures() -> (ProfilePictures, Arc<MemoryDataSource>, Arc<MemoryObjectStore>) {
        let source = Arc::new(MemoryDataSource::new());
        let store = Arc::new(MemoryObjectStore::new());
        (ProfilePictures::new(source.clone(), store.clone()), source, store)
    }

    #[test]
    fn test_validate_image_limits() {
        assert!(validate_image("image/png", 1024).is_ok());
        assert!(validate_image("image/jpeg", MAX_IMAGE_BYTES).is_ok());

        let err = validate_image("text/plain", 10).unwrap_err();
        assert_eq!(err.to_string(), "Please select an image file (JPG, PNG, GIF)");

        let err = validate_image("image/png", MAX_IMAGE_BYTES + 1).unwrap_err();
        assert_eq!(err.to_string(), "Image size should be less than 5MB");
    }

    #[tokio::test]
    async fn test_upload_replaces_previous_picture() {
        let (pictures, _source, store) = pictures();

        let first = pictures.upload("uid", ImageUpload::new("image/png", vec![1])).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = pictures.upload("uid", ImageUpload::new("image/gif", vec![2])).await.unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with(".gif"));
        assert_eq!(pictures.current("uid").await.unwrap(), Some(second));
        // the first object was cleaned up
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_upload_touches_nothing() {
        let (pictures, source, store) = pictures();

        let result = pictures
            .upload("uid", ImageUpload::new("application/pdf", vec![0; 10]))
            .await;

        assert!(matches!(result, Err(ExplorerError::InvalidImage(_))));
        assert!(store.is_empty());
        assert_eq!(source.read_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_profile_write_discards_upload() {
        let mut source = MockDataSource::new();
        source.expect_read().returning(|_| Ok(None));
        source.expect_write().returning(|path, _| {
            Err(ExplorerError::WriteFailed {
                path: path.to_string(),
                message: "quota exceeded".to_string(),
            })
        });
        let store = Arc::new(MemoryObjectStore::new());
        let pictures = ProfilePictures::new(Arc::new(source), store.clone());

        let result = pictures.upload("uid", ImageUpload::new("image/png", vec![1])).await;

        assert!(matches!(result, Err(ExplorerError::WriteFailed { .. })));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_remove_clears_profile_fields() {
        let (pictures, _source, store) = pictures();
        pictures.upload("uid", ImageUpload::new("image/png", vec![1])).await.unwrap();

        pictures.remove("uid").await.unwrap();

        assert_eq!(pictures.current("uid").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for("jpeg"), "image/jpeg");
        assert_eq!(content_type_for("txt"), "application/octet-stream");
    }
}
