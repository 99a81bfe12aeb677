use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Metric, UserRecord};

/// Records ordered by one metric, plus the aggregate statistics shown above the table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingView {
    pub metric: Metric,
    pub ordered_records: Vec<UserRecord>,
    pub top_value: f64,
    pub average_value: f64,
    /// Number of records, including those scoring 0 on the metric
    pub count: usize,
}

/// One displayable leaderboard row
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<'a> {
    pub rank: usize,
    pub score: f64,
    pub record: &'a UserRecord,
}

impl RankingView {
    pub fn empty(metric: Metric) -> Self {
        Self {
            metric,
            ordered_records: Vec::new(),
            top_value: 0.0,
            average_value: 0.0,
            count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_records.is_empty()
    }

    /// Rows with 1-based ranks
    pub fn entries(&self) -> impl Iterator<Item = RankedEntry<'_>> {
        self.ordered_records
            .iter()
            .enumerate()
            .map(move |(idx, record)| RankedEntry {
                rank: idx + 1,
                score: metric_value(record, self.metric),
                record,
            })
    }
}

impl RankedEntry<'_> {
    /// Gold, silver and bronze rows get highlighted
    pub fn is_podium(&self) -> bool {
        self.rank <= 3
    }

    pub fn samples_label(&self) -> String {
        format!("{} collected", self.record.total_samples)
    }

    /// Whole days since the account was created; `None` if the timestamp is unreadable
    pub fn days_since_joined(&self, now: DateTime<Utc>) -> Option<i64> {
        let joined = DateTime::parse_from_rfc3339(&self.record.account_created).ok()?;
        Some((now - joined.with_timezone(&Utc)).num_days())
    }
}

/// Sort key of a record under a metric
pub fn metric_value(record: &UserRecord, metric: Metric) -> f64 {
    match metric {
        Metric::TotalScore => record.total_score,
        Metric::Material(material) => record.rock_score(material.key()),
    }
}
