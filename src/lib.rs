pub mod models;
pub mod config;
pub mod backend;
pub mod leaderboard;
pub mod auth;
pub mod profile;
pub mod utils;
pub mod tui;

pub use models::{ExplorerError, Material, Metric, RankingView, Result, UserRecord};
pub use config::Settings;
pub use leaderboard::{rank, RefreshController, SnapshotLoader, ViewState};
