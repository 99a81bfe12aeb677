use serde::{Deserialize, Serialize};
use config::{Config, ConfigError, File};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub backend: BackendSettings,
    pub refresh: RefreshSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub log_level: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Realtime database root, e.g. `https://<project>-default-rtdb.firebaseio.com`
    pub database_url: String,
    /// Web API key for the identity service
    pub api_key: String,
    /// Token appended to database reads when no user is signed in
    pub auth_token: Option<String>,
    pub identity_url: String,
    pub storage_url: String,
    pub storage_bucket: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSettings {
    pub interval_seconds: u64,
    pub load_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "Explorer Leaderboard".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                log_level: "info".to_string(),
                environment: Environment::Development,
            },
            backend: BackendSettings {
                database_url: "https://mars-explorer-default-rtdb.firebaseio.com".to_string(),
                api_key: String::new(),
                auth_token: None,
                identity_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
                storage_url: "https://firebasestorage.googleapis.com/v0".to_string(),
                storage_bucket: "mars-explorer.appspot.com".to_string(),
                request_timeout_seconds: 15,
            },
            refresh: RefreshSettings::default(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            load_timeout_seconds: 15,
        }
    }
}

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_seconds)
    }
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("EXPLORER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .build()?;

        s.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.backend.database_url.starts_with("http://")
            && !self.backend.database_url.starts_with("https://")
        {
            return Err(format!(
                "Database URL must be http(s), got {}",
                self.backend.database_url
            ));
        }

        if self.refresh.interval_seconds == 0 {
            return Err("Refresh interval must be at least one second".to_string());
        }

        if self.refresh.load_timeout_seconds == 0 {
            return Err("Load timeout must be at least one second".to_string());
        }

        Ok(())
    }
}
