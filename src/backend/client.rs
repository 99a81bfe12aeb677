use async_trait::async_trait;
use serde_json::Value;

use crate::models::{ExplorerError, Result};

/// Hierarchical key-path document store holding the `users` tree
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read the subtree at `path`; `None` when nothing is stored there
    async fn read(&self, path: &str) -> Result<Option<Value>>;

    /// Replace the subtree at `path`
    async fn write(&self, path: &str, value: Value) -> Result<()>;

    /// Delete the subtree at `path`
    async fn remove(&self, path: &str) -> Result<()>;
}

/// Object returned by a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub name: String,
    pub download_url: String,
}

/// Blob storage for profile pictures
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject>;

    async fn delete(&self, name: &str) -> Result<()>;
}

/// Builds database paths, rejecting ids the database would refuse as keys
pub struct DbPath;

impl DbPath {
    pub const USERS: &'static str = "users";

    pub fn user(id: &str) -> Result<String> {
        Self::validate_key(id)?;
        Ok(format!("{}/{}", Self::USERS, id))
    }

    pub fn profile_field(id: &str, field: &str) -> Result<String> {
        Self::validate_key(field)?;
        Ok(format!("{}/profile/{}", Self::user(id)?, field))
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(ExplorerError::InvalidPath("empty key".to_string()));
        }
        if let Some(c) = key.chars().find(|c| matches!(c, '.' | '$' | '#' | '[' | ']' | '/')) {
            return Err(ExplorerError::InvalidPath(format!(
                "key {:?} contains forbidden character {:?}",
                key, c
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_building() {
        assert_eq!(DbPath::user("abc123").unwrap(), "users/abc123");
        assert_eq!(
            DbPath::profile_field("abc123", "photoURL").unwrap(),
            "users/abc123/profile/photoURL"
        );
    }

    #[test]
    fn test_path_rejects_bad_keys() {
        assert!(DbPath::user("").is_err());
        assert!(DbPath::user("a/b").is_err());
        assert!(DbPath::user("a.b").is_err());
        assert!(DbPath::profile_field("abc", "photo#url").is_err());
    }
}
