pub mod error;
pub mod metric;
pub mod profile;
pub mod ranking;
pub mod user;

pub use error::*;
pub use metric::*;
pub use profile::*;
pub use ranking::*;
pub use user::*;
