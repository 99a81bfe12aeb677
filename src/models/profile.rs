use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::{display_name_for, samples_of, timestamp_string};
use crate::utils::{amount_or_zero, parse_float, score_or_zero};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleLine {
    pub material: String,
    pub amount: u64,
    pub high_score: Option<f64>,
}

/// What the profile page shows for one signed-in explorer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileView {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub account_created: String,
    pub last_login: String,
    pub photo_url: Option<String>,
    pub total_score: f64,
    pub samples: Vec<SampleLine>,
}

impl ProfileView {
    pub fn from_remote(id: impl Into<String>, raw: &Value) -> Self {
        let profile = raw.get("profile");
        let field = |name: &str| profile.and_then(|p| p.get(name));

        let email = field("email").and_then(Value::as_str).filter(|e| !e.is_empty());
        let display_name = email
            .map(display_name_for)
            .unwrap_or_else(|| "Explorer".to_string());

        let samples = samples_of(raw)
            .map(|samples| {
                samples
                    .iter()
                    .map(|(material, sample)| SampleLine {
                        material: material.clone(),
                        amount: amount_or_zero(sample.get("amount")),
                        high_score: sample
                            .get("highScore")
                            .filter(|v| !v.is_null())
                            .map(|v| parse_float(v).unwrap_or(0.0).max(0.0)),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: id.into(),
            display_name,
            email: email.unwrap_or(NOT_AVAILABLE).to_string(),
            account_created: field("accountCreated")
                .and_then(timestamp_string)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            last_login: field("lastLogin")
                .and_then(timestamp_string)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            photo_url: field("photoURL")
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            total_score: score_or_zero(raw.get("scores").and_then(|s| s.get("totalScore"))),
            samples,
        }
    }
}
