use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::principal::{Principal, Role};

/// Input for persisting a new principal. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Narrow seam to the credential backend. The guard stack only ever needs
/// lookup-by-username, lookup-by-id and insert; everything else the backend
/// does (admin deletion paths, migration) stays behind this trait.
pub trait CredentialStore: Send + Sync {
    fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>>;
    fn find_by_id(&self, id: Uuid) -> AppResult<Option<Principal>>;
    /// Persist a new principal. Fails with `DuplicateUsername` when the
    /// username (exact, case-sensitive) is already taken.
    fn insert(&self, new: NewPrincipal) -> AppResult<Principal>;
}

/// In-memory credential store. Username index kept alongside the primary map
/// so both lookups stay O(1).
#[derive(Default)]
pub struct MemoryCredentialStore {
    by_id: RwLock<HashMap<Uuid, Principal>>,
    username_index: RwLock<HashMap<String, Uuid>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>> {
        let idx = self.username_index.read();
        let Some(id) = idx.get(username) else { return Ok(None) };
        Ok(self.by_id.read().get(id).cloned())
    }

    fn find_by_id(&self, id: Uuid) -> AppResult<Option<Principal>> {
        Ok(self.by_id.read().get(&id).cloned())
    }

    fn insert(&self, new: NewPrincipal) -> AppResult<Principal> {
        // Take both locks in a fixed order; uniqueness check and insert must
        // be one atomic step or two racing registers could share a username.
        let mut idx = self.username_index.write();
        if idx.contains_key(&new.username) {
            return Err(AppError::duplicate_username());
        }
        let now = Utc::now();
        let principal = Principal {
            id: Uuid::new_v4(),
            username: new.username.clone(),
            password_hash: new.password_hash,
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        self.by_id.write().insert(principal.id, principal.clone());
        idx.insert(new.username, principal.id);
        Ok(principal)
    }
}
