use explorer_leaderboard::{
    backend::MemoryDataSource,
    leaderboard::{rank, SnapshotLoader},
    models::{Material, Metric},
    profile::ProfileViewer,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_load_and_rank_total_score() {
    let source = Arc::new(MemoryDataSource::with_users(json!({
        "A": { "profile": { "email": "a@mars.io" }, "scores": { "totalScore": 10 } },
        "B": { "profile": { "email": "b@mars.io" }, "scores": { "totalScore": 25 } },
        "C": { "profile": { "email": "c@mars.io" }, "scores": { "totalScore": "25" } }
    })));

    let records = SnapshotLoader::new(source).load_all().await.unwrap();
    let view = rank(&records, Metric::TotalScore);

    let order: Vec<_> = view.ordered_records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(order, vec!["B", "C", "A"]);
    assert_eq!(view.top_value, 25.0);
    assert_eq!(view.average_value, 20.0);
    assert_eq!(view.count, 3);
}

#[tokio::test]
async fn test_missing_total_score_ranks_last() {
    let source = Arc::new(MemoryDataSource::with_users(json!({
        "scored": { "scores": { "totalScore": 1 } },
        "unscored": {
            "profile": { "email": "new@mars.io" },
            "inventory": { "samples": { "basalt": { "amount": 3 } } }
        }
    })));

    let records = SnapshotLoader::new(source).load_all().await.unwrap();
    let unscored = records.iter().find(|r| r.id == "unscored").unwrap();
    assert_eq!(unscored.total_score, 0.0);
    assert_eq!(unscored.total_samples, 3);
    // an amount without a high score records no rock score
    assert!(unscored.rock_scores.is_empty());

    let view = rank(&records, Metric::TotalScore);
    assert_eq!(view.ordered_records.last().unwrap().id, "unscored");
}

#[tokio::test]
async fn test_demo_data_every_metric() {
    let records = SnapshotLoader::new(Arc::new(MemoryDataSource::demo()))
        .load_all()
        .await
        .unwrap();

    for metric in Metric::all() {
        let view = rank(&records, metric);
        assert_eq!(view.count, records.len(), "{}", metric);
        for pair in view.entries().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].score >= pair[1].score, "{}", metric);
        }
    }

    let gypsum = rank(&records, Metric::Material(Material::Gypsum));
    assert_eq!(gypsum.ordered_records[0].id, "a1f3");
    assert_eq!(gypsum.top_value, 205.0);
}

#[tokio::test]
async fn test_profile_of_ranked_explorer() {
    let source = Arc::new(MemoryDataSource::demo());
    let records = SnapshotLoader::new(source.clone()).load_all().await.unwrap();
    let leader = rank(&records, Metric::TotalScore).ordered_records[0].clone();

    let profile = ProfileViewer::new(source).load(&leader.id).await.unwrap().unwrap();

    assert_eq!(profile.display_name, leader.display_name);
    assert_eq!(profile.total_score, leader.total_score);
    let amount: u64 = profile.samples.iter().map(|s| s.amount).sum();
    assert_eq!(amount, leader.total_samples);
}
