use async_trait::async_trait;
use reqwest::{header, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{
    backend::{ObjectStore, StoredObject},
    config::BackendSettings,
    models::{ExplorerError, Result},
};

/// Object storage client for the Firebase Storage v0 REST API
pub struct StorageClient {
    http_client: reqwest::Client,
    storage_url: String,
    bucket: String,
    id_token: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    name: String,
    #[serde(rename = "downloadTokens")]
    download_tokens: Option<String>,
}

impl StorageClient {
    pub fn new(config: &BackendSettings, id_token: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ExplorerError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            storage_url: config.storage_url.trim_end_matches('/').to_string(),
            bucket: config.storage_bucket.clone(),
            id_token: id_token.into(),
        })
    }

    fn objects_url(&self) -> Result<Url> {
        Url::parse(&format!("{}/b/{}/o", self.storage_url, self.bucket))
            .map_err(|e| ExplorerError::ConfigError(format!("Invalid storage URL: {}", e)))
    }

    /// `.../o/{name}` with the name as a single encoded segment
    fn object_url(&self, name: &str) -> Result<Url> {
        let mut url = self.objects_url()?;
        url.path_segments_mut()
            .map_err(|_| ExplorerError::ConfigError("Storage URL cannot be a base".to_string()))?
            .push(name);
        Ok(url)
    }

    fn download_url(&self, name: &str, token: Option<&str>) -> Result<String> {
        let mut url = self.object_url(name)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            if let Some(token) = token {
                query.append_pair("token", token);
            }
        }
        Ok(url.to_string())
    }

    fn auth_header(&self) -> String {
        format!("Firebase {}", self.id_token)
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        debug!("Uploading {} ({} bytes)", name, bytes.len());
        let mut url = self.objects_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);

        let response = self
            .http_client
            .post(url)
            .header(header::AUTHORIZATION, self.auth_header())
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExplorerError::Storage(format!(
                "upload of {} failed with {}",
                name,
                response.status()
            )));
        }

        let uploaded: UploadResponse = response.json().await?;
        let download_url = self.download_url(&uploaded.name, uploaded.download_tokens.as_deref())?;

        Ok(StoredObject {
            name: uploaded.name,
            download_url,
        })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        debug!("Deleting {}", name);
        let response = self
            .http_client
            .delete(self.object_url(name)?)
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExplorerError::Storage(format!(
                "delete of {} failed with {}",
                name,
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_download_url_encodes_object_name() {
        let client = StorageClient::new(&Settings::default().backend, "token").unwrap();
        let url = client
            .download_url("profile_pictures/uid/profile_1.png", Some("abc"))
            .unwrap();

        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/mars-explorer.appspot.com/o/\
             profile_pictures%2Fuid%2Fprofile_1.png?alt=media&token=abc"
        );
    }
}
