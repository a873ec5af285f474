//! In-memory revocation state: the single active refresh token per principal
//! and the blacklists of explicitly revoked tokens.
//!
//! Revoked tokens are keyed by SHA-256 hash, never stored raw, and carry the
//! token's own expiry so entries can be dropped lazily once the token would
//! fail expiry validation anyway. State lives for the process lifetime only;
//! a horizontally scaled deployment would back this with a shared cache
//! behind the same interface.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFlavor {
    Access,
    Refresh,
}

#[derive(Default)]
pub struct RevocationStore {
    /// principal -> currently valid refresh token (at most one per principal)
    active_refresh: DashMap<String, String>,
    /// token hash -> token expiry (Unix seconds)
    revoked_access: DashMap<String, i64>,
    revoked_refresh: DashMap<String, i64>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally overwrite the stored refresh token for a principal.
    /// Does not revoke the previous token; callers that need replay
    /// protection revoke explicitly before (or atomically with) the swap.
    pub fn store_refresh(&self, principal: &str, token: &str) {
        self.active_refresh
            .insert(principal.to_string(), token.to_string());
    }

    pub fn get_refresh(&self, principal: &str) -> Option<String> {
        self.active_refresh.get(principal).map(|t| t.clone())
    }

    /// Atomic compare-and-swap of the stored refresh token.
    ///
    /// Returns `false` when nothing is stored or the stored token differs
    /// from `expected` — the rotated-away/ghost-token case. The entry lock
    /// serializes concurrent rotation attempts for the same principal, so at
    /// most one caller can win a given token.
    pub fn swap_refresh(&self, principal: &str, expected: &str, replacement: &str) -> bool {
        match self.active_refresh.entry(principal.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get() == expected {
                    entry.insert(replacement.to_string());
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Remove the stored refresh association without revoking the token.
    pub fn clear_principal(&self, principal: &str) {
        self.active_refresh.remove(principal);
    }

    pub fn revoke_access(&self, token: &str, expires_at: i64) {
        self.revoked_access.insert(sha256_hash(token), expires_at);
    }

    pub fn revoke_refresh(&self, token: &str, expires_at: i64) {
        self.revoked_refresh.insert(sha256_hash(token), expires_at);
    }

    pub fn is_revoked(&self, token: &str, flavor: TokenFlavor) -> bool {
        let set = match flavor {
            TokenFlavor::Access => &self.revoked_access,
            TokenFlavor::Refresh => &self.revoked_refresh,
        };

        let key = sha256_hash(token);
        let now = Utc::now().timestamp();

        // Lazy eviction: a blacklist entry past its token's expiry is dead
        // weight, the token fails expiry validation regardless. Strictly
        // past only: decode accepts a token for the whole second where
        // now == exp, so the blacklist must keep covering it.
        if set.remove_if(&key, |_, exp| *exp < now).is_some() {
            return false;
        }

        set.contains_key(&key)
    }
}

/// Hash a token using SHA-256
fn sha256_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
