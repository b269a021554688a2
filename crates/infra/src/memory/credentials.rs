use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use ers_auth::{CredentialStore, Identity};
use ers_core::{StoreError, StoreResult};

use super::poisoned;

/// Identities keyed by username.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    by_username: RwLock<HashMap<String, Identity>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>> {
        let map = self.by_username.read().map_err(poisoned)?;
        Ok(map.get(username).cloned())
    }

    async fn insert(&self, identity: Identity) -> StoreResult<()> {
        let mut map = self.by_username.write().map_err(poisoned)?;
        if map.contains_key(&identity.username) {
            return Err(StoreError::Duplicate("username".to_string()));
        }
        if identity.employee_id.is_some()
            && map.values().any(|i| i.employee_id == identity.employee_id)
        {
            return Err(StoreError::Duplicate("employee_id".to_string()));
        }
        map.insert(identity.username.clone(), identity);
        Ok(())
    }
}
