pub mod controller;
pub mod loader;
pub mod ranking;

pub use controller::{ControllerHandle, RefreshController, RefreshOutcome, ViewState};
pub use loader::SnapshotLoader;
pub use ranking::rank;
