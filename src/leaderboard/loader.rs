use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    backend::{DataSource, DbPath},
    models::{Result, UserRecord},
};

/// Fetches the whole `users` collection in one read
#[derive(Clone)]
pub struct SnapshotLoader {
    source: Arc<dyn DataSource>,
}

impl SnapshotLoader {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Load and decode every user. An empty namespace is `Ok(vec![])`,
    /// not an error; transport and permission failures are returned as-is.
    pub async fn load_all(&self) -> Result<Vec<UserRecord>> {
        let snapshot = match self.source.read(DbPath::USERS).await? {
            Some(snapshot) => snapshot,
            None => {
                info!("No users stored yet");
                return Ok(Vec::new());
            }
        };

        let records = decode_snapshot(&snapshot);
        info!("Loaded {} user records", records.len());
        Ok(records)
    }
}

fn decode_snapshot(snapshot: &Value) -> Vec<UserRecord> {
    match snapshot {
        Value::Object(users) => users
            .iter()
            .map(|(id, raw)| UserRecord::from_remote(id.as_str(), raw))
            .collect(),
        // Collections keyed by small integers come back as arrays with holes
        Value::Array(users) => users
            .iter()
            .enumerate()
            .filter(|(_, raw)| !raw.is_null())
            .map(|(idx, raw)| UserRecord::from_remote(idx.to_string(), raw))
            .collect(),
        other => {
            warn!("Ignoring users snapshot of unexpected shape: {}", other);
            Vec::new()
        }
    }
}
