//! Credential-store identity and its storage port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ers_core::{EmployeeId, IdentityId, StoreResult};

use crate::Role;

/// A user that can log in.
///
/// # Invariants
/// - `username` is unique and never changes after registration.
/// - An `Employee` identity always has a `manager_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub employee_id: Option<EmployeeId>,
    pub manager_id: Option<EmployeeId>,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Storage port for identities.
///
/// `insert` must enforce uniqueness of `username` and `employee_id`, reporting
/// the offending column through `StoreError::Duplicate("username" | "employee_id")`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>>;

    async fn insert(&self, identity: Identity) -> StoreResult<()>;
}
