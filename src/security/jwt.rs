//! Signed session claims: one codec shared by access and refresh tokens.
//!
//! Both token flavors carry the identical payload; the caller-chosen TTL is
//! the only difference. Reusing one encode/decode path keeps the validation
//! semantics of the two flavors from drifting apart.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::models::Role;

/// Session claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username of the principal)
    pub sub: String,
    /// Role tag at issue time
    pub role: Role,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
    /// JWT ID, unique per issued token. Without it two tokens minted for
    /// the same principal within one second are byte-identical, and
    /// rotation would blacklist the token it just handed out.
    pub jti: String,
}

impl Claims {
    /// Role gate for protected calls downstream of token verification.
    /// Admins pass every gate.
    pub fn require_role(&self, required: Role) -> Result<()> {
        if self.role == required || self.role == Role::Admin {
            Ok(())
        } else {
            Err(AuthError::NotAuthorized)
        }
    }
}

/// Why a decode was rejected. Kept distinguishable for audit detail; the
/// public error surface collapses all three to one unauthorized signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    InvalidSignature,
    Expired,
    Malformed,
}

impl DecodeFailure {
    pub fn detail(&self) -> &'static str {
        match self {
            DecodeFailure::InvalidSignature => "signature verification failed",
            DecodeFailure::Expired => "token expired",
            DecodeFailure::Malformed => "malformed token or missing claims",
        }
    }
}

impl From<DecodeFailure> for AuthError {
    fn from(failure: DecodeFailure) -> Self {
        match failure {
            DecodeFailure::Expired => AuthError::TokenExpired,
            DecodeFailure::InvalidSignature | DecodeFailure::Malformed => AuthError::InvalidToken,
        }
    }
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Build a codec from a shared secret and an algorithm name.
    ///
    /// Only the HMAC family is accepted; asymmetric algorithm names are a
    /// configuration error rather than a silent downgrade.
    pub fn new(
        secret: &str,
        algorithm: &str,
        access_ttl_minutes: i64,
        refresh_ttl_days: i64,
    ) -> Result<Self> {
        let algorithm = match algorithm {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                return Err(AuthError::Internal(format!(
                    "Unsupported JWT algorithm: {other}"
                )))
            }
        };

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        })
    }

    pub fn issue_access(&self, sub: &str, role: Role) -> Result<String> {
        self.issue(sub, role, self.access_ttl)
    }

    pub fn issue_refresh(&self, sub: &str, role: Role) -> Result<String> {
        self.issue(sub, role, self.refresh_ttl)
    }

    fn issue(&self, sub: &str, role: Role, ttl: Duration) -> Result<String> {
        let claims = Claims {
            sub: sub.to_string(),
            role,
            exp: (Utc::now() + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|_| AuthError::Internal("Failed to encode token".to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// Zero leeway: a token is valid strictly while `now < exp`.
    pub fn decode(&self, token: &str) -> std::result::Result<Claims, DecodeFailure> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => Err(match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => DecodeFailure::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    DecodeFailure::InvalidSignature
                }
                _ => DecodeFailure::Malformed,
            }),
        }
    }
}
