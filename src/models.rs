use serde::{Deserialize, Serialize};

/// Role tag embedded in issued tokens.
///
/// The role carried by a token is trusted until natural expiry; protected
/// calls that make authorization decisions re-check the authoritative
/// principal record themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Basic,
    Dependent,
    Admin,
    Caretaker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Basic => "basic",
            Role::Dependent => "dependent",
            Role::Admin => "admin",
            Role::Caretaker => "caretaker",
        }
    }
}

/// Authenticated identity as stored in the (external) principal store.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub role: Role,
    /// Argon2 PHC hash, never a plaintext secret.
    pub password_hash: String,
}

/// Access/refresh pair returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}
