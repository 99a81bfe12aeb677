use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    backend::DataSource,
    config::BackendSettings,
    models::{ExplorerError, Result},
};

/// Realtime database client speaking the `{path}.json` REST surface
pub struct RealtimeDbClient {
    http_client: reqwest::Client,
    database_url: String,
    auth_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone, Copy)]
enum Op {
    Read,
    Write,
}

impl RealtimeDbClient {
    pub fn new(config: &BackendSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ExplorerError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            database_url: config.database_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Use a signed-in user's id token instead of the configured token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http_client.request(method, self.endpoint(path));
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn check(response: Response, op: Op, path: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ExplorerError::PermissionDenied(path.to_string()));
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(Self::failure(op, path, message))
    }

    fn failure(op: Op, path: &str, message: String) -> ExplorerError {
        let path = path.to_string();
        match op {
            Op::Read => ExplorerError::LoadFailed { path, message },
            Op::Write => ExplorerError::WriteFailed { path, message },
        }
    }
}

#[async_trait]
impl DataSource for RealtimeDbClient {
    async fn read(&self, path: &str) -> Result<Option<Value>> {
        debug!("GET {}", path);
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| Self::failure(Op::Read, path, e.to_string()))?;
        let response = Self::check(response, Op::Read, path).await?;

        let value: Value = response.json().await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        debug!("PUT {}", path);
        let response = self
            .request(Method::PUT, path)
            .json(&value)
            .send()
            .await
            .map_err(|e| Self::failure(Op::Write, path, e.to_string()))?;
        Self::check(response, Op::Write, path).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        debug!("DELETE {}", path);
        let response = self
            .request(Method::DELETE, path)
            .send()
            .await
            .map_err(|e| Self::failure(Op::Write, path, e.to_string()))?;
        Self::check(response, Op::Write, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_endpoint_formatting() {
        let mut settings = Settings::default().backend;
        settings.database_url = "https://demo-rtdb.example.com/".to_string();

        let client = RealtimeDbClient::new(&settings).unwrap();
        assert_eq!(client.endpoint("users"), "https://demo-rtdb.example.com/users.json");
        assert_eq!(
            client.endpoint("/users/abc/profile/email"),
            "https://demo-rtdb.example.com/users/abc/profile/email.json"
        );
    }
}
