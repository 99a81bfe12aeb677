pub mod client;
pub mod errors;
pub mod validation;

pub use client::{login_user, signup_user, AuthProvider, AuthSession, IdentityToolkitClient};
pub use errors::AuthErrorCode;
pub use validation::{validate_login, validate_signup};
