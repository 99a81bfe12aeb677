use crate::models::{ExplorerError, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Trimmed email and password for a sign-in attempt
pub fn validate_login(email: &str, password: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ExplorerError::Validation(
            "Please enter both email and password.".to_string(),
        ));
    }
    Ok(email.to_string())
}

/// Checks run before a sign-up request is sent
pub fn validate_signup(email: &str, password: &str, confirm: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(ExplorerError::Validation("Please fill in all fields.".to_string()));
    }
    if password != confirm {
        return Err(ExplorerError::Validation("Passwords don't match.".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ExplorerError::Validation(
            "Your password must be at least 6 characters long.".to_string(),
        ));
    }
    Ok(email.to_string())
}
