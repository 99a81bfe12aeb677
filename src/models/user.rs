use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::utils::{amount_or_zero, score_or_zero};

pub const UNKNOWN_EXPLORER: &str = "Unknown Explorer";

/// Read-only projection of one remote user record, rebuilt on every load
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub total_score: f64,
    /// Material key -> high score; only materials with a recorded high score
    pub rock_scores: BTreeMap<String, f64>,
    pub total_samples: u64,
    pub account_created: String,
}

impl UserRecord {
    /// Decode a raw `users/{id}` tree. Never fails: missing or malformed
    /// fields fall back to their defaults.
    pub fn from_remote(id: impl Into<String>, raw: &Value) -> Self {
        let id = id.into();
        let profile = raw.get("profile");

        let email = profile
            .and_then(|p| p.get("email"))
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .unwrap_or(UNKNOWN_EXPLORER)
            .to_string();

        let account_created = profile
            .and_then(|p| p.get("accountCreated"))
            .and_then(timestamp_string)
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        let total_score = score_or_zero(raw.get("scores").and_then(|s| s.get("totalScore")));

        let mut rock_scores = BTreeMap::new();
        let mut total_samples: u64 = 0;

        if let Some(samples) = samples_of(raw) {
            for (rock_key, sample) in samples {
                if let Some(high_score) = sample.get("highScore").filter(|v| !v.is_null()) {
                    rock_scores.insert(rock_key.clone(), score_or_zero(Some(high_score)));
                }
                total_samples = total_samples.saturating_add(amount_or_zero(sample.get("amount")));
            }
        } else {
            debug!("User {} has no sample inventory", id);
        }

        Self {
            display_name: display_name_for(&email),
            id,
            email,
            total_score,
            rock_scores,
            total_samples,
            account_created,
        }
    }

    /// High score for a material key, 0 when none was recorded
    pub fn rock_score(&self, rock_key: &str) -> f64 {
        self.rock_scores.get(rock_key).copied().unwrap_or(0.0)
    }

    /// First letter of the display name, upper-cased
    pub fn avatar_initial(&self) -> char {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

/// Portion of an email before `@`, or the whole value when there is none
pub fn display_name_for(email: &str) -> String {
    match email.split_once('@') {
        Some((name, _)) => name.to_string(),
        None => email.to_string(),
    }
}

pub(crate) fn samples_of(raw: &Value) -> Option<&serde_json::Map<String, Value>> {
    raw.get("inventory")?.get("samples")?.as_object()
}

/// Stored timestamps are ISO strings; numbers are epoch milliseconds
pub(crate) fn timestamp_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(|dt| dt.to_rfc3339()),
        _ => None,
    }
}
