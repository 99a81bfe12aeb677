pub mod app;
pub mod ui;
pub mod event;

pub use app::{App, Status};
pub use event::{Event, EventHandler};
