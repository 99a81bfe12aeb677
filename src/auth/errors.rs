use std::fmt;

/// Identity service failure codes the site knows how to explain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    InvalidEmail,
    UserNotFound,
    WrongPassword,
    EmailAlreadyInUse,
    WeakPassword,
    TooManyRequests,
    Other(String),
}

impl AuthErrorCode {
    /// Map an Identity Toolkit REST error message (`"EMAIL_NOT_FOUND"`,
    /// `"WEAK_PASSWORD : Password should be ..."`) to a code
    pub fn from_rest(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or("").trim();
        match code {
            "INVALID_EMAIL" => AuthErrorCode::InvalidEmail,
            "EMAIL_NOT_FOUND" => AuthErrorCode::UserNotFound,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => AuthErrorCode::WrongPassword,
            "EMAIL_EXISTS" => AuthErrorCode::EmailAlreadyInUse,
            "WEAK_PASSWORD" => AuthErrorCode::WeakPassword,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyRequests,
            other => AuthErrorCode::Other(other.to_string()),
        }
    }

    /// SDK-style code, e.g. `auth/user-not-found`
    pub fn as_str(&self) -> &str {
        match self {
            AuthErrorCode::InvalidEmail => "auth/invalid-email",
            AuthErrorCode::UserNotFound => "auth/user-not-found",
            AuthErrorCode::WrongPassword => "auth/wrong-password",
            AuthErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthErrorCode::WeakPassword => "auth/weak-password",
            AuthErrorCode::TooManyRequests => "auth/too-many-requests",
            AuthErrorCode::Other(code) => code,
        }
    }

    pub fn friendly_message(&self) -> &'static str {
        match self {
            AuthErrorCode::InvalidEmail => "That doesn't look like a valid email address.",
            AuthErrorCode::UserNotFound => "We couldn't find an account with that email.",
            AuthErrorCode::WrongPassword => "The password you entered is incorrect.",
            AuthErrorCode::EmailAlreadyInUse => "An account already exists with this email.",
            AuthErrorCode::WeakPassword => "Your password is too weak. Try using at least 6 characters.",
            AuthErrorCode::TooManyRequests => "Too many failed attempts. Please try again later.",
            AuthErrorCode::Other(_) => "Something went wrong. Please try again.",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
