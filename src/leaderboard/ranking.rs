use std::cmp::Ordering;

use crate::models::{metric_value, Metric, RankingView, UserRecord};

/// Order `records` by `metric`, highest first, and compute the header statistics.
///
/// The sort is stable: records with equal keys keep their input order. An
/// empty input gives a zero-valued view.
pub fn rank(records: &[UserRecord], metric: Metric) -> RankingView {
    let mut ordered_records = records.to_vec();
    ordered_records.sort_by(|a, b| {
        metric_value(b, metric)
            .partial_cmp(&metric_value(a, metric))
            .unwrap_or(Ordering::Equal)
    });

    let mut sum = 0.0;
    let mut top = 0.0_f64;
    for record in &ordered_records {
        let value = metric_value(record, metric);
        sum += value;
        if value > top {
            top = value;
        }
    }

    let count = ordered_records.len();
    let average_value = if count > 0 { sum / count as f64 } else { 0.0 };

    RankingView {
        metric,
        ordered_records,
        top_value: top,
        average_value,
        count,
    }
}
