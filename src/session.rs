//! Session lifecycle orchestration: login, logout, refresh rotation, access
//! verification, and request admission.
//!
//! Explicitly constructed service object owning all mutable auth state;
//! handlers receive it by handle. Per principal the observable states are
//! no-session (nothing stored), active (refresh token stored and not
//! blacklisted), and back to active through rotation; logout returns the
//! principal to no-session.

use std::sync::Arc;

use chrono::Utc;

use crate::audit::{AuditEvent, AuditSink, AuditStatus};
use crate::config::Config;
use crate::error::{AuthError, Result};
use crate::models::TokenPair;
use crate::security::jwt::{Claims, TokenCodec};
use crate::security::rate_limit::{RateLimitPolicy, SlidingWindowLimiter};
use crate::security::revocation::{RevocationStore, TokenFlavor};
use crate::security::password;
use crate::store::PrincipalStore;

pub struct SessionManager {
    codec: TokenCodec,
    revocation: RevocationStore,
    general_limiter: SlidingWindowLimiter,
    refresh_limiter: SlidingWindowLimiter,
    store: Arc<dyn PrincipalStore>,
    audit: Arc<dyn AuditSink>,
}

impl SessionManager {
    pub fn new(
        config: &Config,
        store: Arc<dyn PrincipalStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        let codec = TokenCodec::new(
            &config.jwt_secret,
            &config.jwt_algorithm,
            config.access_token_expire_minutes,
            config.refresh_token_expire_days,
        )?;

        Ok(Self {
            codec,
            revocation: RevocationStore::new(),
            general_limiter: SlidingWindowLimiter::new(RateLimitPolicy::new(
                config.rate_limit,
                config.rate_limit_window_secs,
            )),
            refresh_limiter: SlidingWindowLimiter::new(RateLimitPolicy::new(
                config.refresh_max_attempts,
                config.refresh_window_secs,
            )),
            store,
            audit,
        })
    }

    /// General-traffic admission check, keyed by request identifier.
    /// Boolean by contract; a denial is audited, not an error.
    pub fn admit(&self, identifier: &str) -> bool {
        if self.general_limiter.admit(identifier, Utc::now()) {
            return true;
        }

        self.audit.record(AuditEvent::rate_limit(
            identifier,
            "API_REQUEST_BLOCKED",
            "Exceeded general request limit",
        ));
        false
    }

    /// Authenticate a principal and open a session.
    ///
    /// Unknown username and wrong password both surface as
    /// `InvalidCredentials`; only the audit detail differs, so the boundary
    /// cannot be used for username enumeration. A successful login
    /// unconditionally overwrites any stored refresh token: one live refresh
    /// token per principal, a second login detaches the first.
    pub async fn login(&self, username: &str, secret: &str) -> Result<TokenPair> {
        let principal = match self.store.find_by_username(username).await {
            Ok(principal) => principal,
            Err(err) => {
                tracing::error!(username, "Principal lookup failed: {err}");
                return Err(AuthError::Internal("Principal lookup failed".to_string()));
            }
        };

        let Some(principal) = principal else {
            self.audit.record(AuditEvent::auth(
                username,
                "LOGIN",
                AuditStatus::Failed,
                "User not found",
            ));
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password(secret, &principal.password_hash) {
            self.audit.record(AuditEvent::auth(
                username,
                "LOGIN",
                AuditStatus::Failed,
                "Password mismatch",
            ));
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.codec.issue_access(&principal.username, principal.role)?;
        let refresh_token = self.codec.issue_refresh(&principal.username, principal.role)?;
        self.revocation.store_refresh(&principal.username, &refresh_token);

        self.audit.record(AuditEvent::auth(
            username,
            "LOGIN",
            AuditStatus::Success,
            "",
        ));

        Ok(TokenPair::bearer(access_token, refresh_token))
    }

    /// Validate an access token: blacklist check, then signature and expiry.
    pub fn verify_access(&self, token: &str) -> Result<Claims> {
        if self.revocation.is_revoked(token, TokenFlavor::Access) {
            self.audit.record(AuditEvent::auth(
                "unknown",
                "BLACKLISTED_TOKEN",
                AuditStatus::Failed,
                "Attempted reuse of a blacklisted token",
            ));
            return Err(AuthError::Blacklisted);
        }

        match self.codec.decode(token) {
            Ok(claims) => Ok(claims),
            Err(failure) => {
                self.audit.record(AuditEvent::auth(
                    "unknown",
                    "INVALID_TOKEN",
                    AuditStatus::Failed,
                    failure.detail(),
                ));
                Err(failure.into())
            }
        }
    }

    /// Close the session behind an access token.
    ///
    /// Blacklists the access token and detaches the stored refresh token.
    /// The refresh token itself is not blacklisted here: once detached it
    /// can only fail the stored-token match on any later refresh attempt.
    pub fn logout(&self, access_token: &str) -> Result<String> {
        let claims = self.verify_access(access_token)?;

        self.revocation.revoke_access(access_token, claims.exp);
        self.revocation.clear_principal(&claims.sub);

        self.audit.record(AuditEvent::auth(
            &claims.sub,
            "LOGOUT",
            AuditStatus::Success,
            "User logged out",
        ));

        Ok(claims.sub)
    }

    /// Rotate a refresh token: validate, swap, blacklist the old token,
    /// return a fresh pair. Every refresh token is single-use.
    pub fn refresh(&self, refresh_token: &str, identifier: &str) -> Result<TokenPair> {
        if !self.refresh_limiter.admit(identifier, Utc::now()) {
            self.audit.record(AuditEvent::rate_limit(
                identifier,
                "REFRESH_TOKEN_BLOCKED",
                "Exceeded refresh attempts limit",
            ));
            return Err(AuthError::RateLimited);
        }

        if self.revocation.is_revoked(refresh_token, TokenFlavor::Refresh) {
            self.audit.record(AuditEvent::auth(
                "unknown",
                "REFRESH_TOKEN",
                AuditStatus::Failed,
                "Blacklisted token reuse attempt",
            ));
            return Err(AuthError::Blacklisted);
        }

        let claims = match self.codec.decode(refresh_token) {
            Ok(claims) => claims,
            Err(failure) => {
                self.audit.record(AuditEvent::auth(
                    "unknown",
                    "REFRESH_TOKEN",
                    AuditStatus::Failed,
                    failure.detail(),
                ));
                return Err(failure.into());
            }
        };

        let access_token = self.codec.issue_access(&claims.sub, claims.role)?;
        let new_refresh_token = self.codec.issue_refresh(&claims.sub, claims.role)?;

        // The compare-and-swap is the serialization point: a rotated-away
        // token, even one that has not expired, no longer matches storage.
        // Of two concurrent callers with the same token, exactly one swap
        // succeeds.
        if !self
            .revocation
            .swap_refresh(&claims.sub, refresh_token, &new_refresh_token)
        {
            self.audit.record(AuditEvent::auth(
                &claims.sub,
                "REFRESH_TOKEN",
                AuditStatus::Failed,
                "Replay attempt or token mismatch",
            ));
            return Err(AuthError::ReusedToken);
        }

        self.revocation.revoke_refresh(refresh_token, claims.exp);

        self.audit.record(AuditEvent::auth(
            &claims.sub,
            "REFRESH_TOKEN",
            AuditStatus::Success,
            "Refresh token rotated successfully",
        ));

        Ok(TokenPair::bearer(access_token, new_refresh_token))
    }
}
