use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::{validate_login, validate_signup, AuthErrorCode},
    config::BackendSettings,
    models::{display_name_for, ExplorerError, Result},
};

/// A signed-in explorer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn username(&self) -> String {
        display_name_for(&self.email)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Hosted email/password identity service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession>;
}

/// Identity Toolkit REST client (`accounts:signInWithPassword`, `accounts:signUp`)
pub struct IdentityToolkitClient {
    http_client: reqwest::Client,
    identity_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl IdentityToolkitClient {
    pub fn new(config: &BackendSettings) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ExplorerError::ConfigError(
                "backend.api_key is required for sign-in".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ExplorerError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            identity_url: config.identity_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn exchange(&self, action: &str, email: &str, password: &str) -> Result<AuthSession> {
        let url = format!("{}/accounts:{}", self.identity_url, action);
        let response = self
            .http_client
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(&CredentialsRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let code = match response.json::<ErrorResponse>().await {
                Ok(body) => AuthErrorCode::from_rest(&body.error.message),
                Err(_) => AuthErrorCode::Other(status.to_string()),
            };
            warn!("{} rejected for {}: {}", action, email, code);
            return Err(ExplorerError::Auth(code));
        }

        let token: TokenResponse = response.json().await?;
        Ok(session_from(token, email))
    }
}

fn session_from(token: TokenResponse, email: &str) -> AuthSession {
    let lifetime = token.expires_in.parse::<i64>().unwrap_or(3600);
    AuthSession {
        uid: token.local_id,
        email: token.email.unwrap_or_else(|| email.to_string()),
        id_token: token.id_token,
        refresh_token: token.refresh_token,
        expires_at: Utc::now() + Duration::seconds(lifetime),
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.exchange("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.exchange("signUp", email, password).await
    }
}

/// Validate credentials, then sign in
pub async fn login_user(provider: &dyn AuthProvider, email: &str, password: &str) -> Result<AuthSession> {
    let email = validate_login(email, password)?;
    let session = provider.sign_in(&email, password).await?;
    info!("User is logged in: {}", session.uid);
    Ok(session)
}

/// Validate the sign-up form, then create the account
pub async fn signup_user(
    provider: &dyn AuthProvider,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<AuthSession> {
    let email = validate_signup(email, password, confirm)?;
    let session = provider.sign_up(&email, password).await?;
    info!("Account created: {}", session.uid);
    Ok(session)
}
