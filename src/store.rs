//! Seam to the external principal store (the document database in the
//! surrounding service). The core only ever needs one lookup.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::{Principal, Role};
use crate::security::password;

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Look up a principal by username. `Ok(None)` means no such user;
    /// `Err` is a store failure, never an authentication verdict.
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Principal>>;
}

/// Map-backed store, used for development dummy data and as the test
/// fixture in place of the document database.
#[derive(Default)]
pub struct InMemoryPrincipalStore {
    users: HashMap<String, Principal>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, principal: Principal) {
        self.users.insert(principal.username.clone(), principal);
    }

    /// Hash the password and insert the principal.
    pub fn add_user(
        &mut self,
        id: &str,
        username: &str,
        password: &str,
        role: Role,
    ) -> crate::error::Result<()> {
        let password_hash = password::hash_password(password)?;
        self.insert(Principal {
            id: id.to_string(),
            username: username.to_string(),
            role,
            password_hash,
        });
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Principal>> {
        Ok(self.users.get(username).cloned())
    }
}
