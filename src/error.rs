use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    Blacklisted,

    #[error("Refresh token reused or does not match stored token")]
    ReusedToken,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Message safe to return across the service boundary.
    ///
    /// All token-validation failures collapse to one generic string so a
    /// caller probing the refresh endpoint cannot tell a bad signature from
    /// an expired or rotated-away token.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::Blacklisted
            | AuthError::ReusedToken => "Invalid or expired token",
            AuthError::RateLimited => "Rate limit exceeded. Please wait before retrying.",
            AuthError::NotAuthorized => "Not authorized",
            AuthError::Internal(_) => "Internal server error",
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Internal(err.to_string())
    }
}
