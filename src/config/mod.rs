pub mod settings;

pub use settings::{BackendSettings, RefreshSettings, Settings};
