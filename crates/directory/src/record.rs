use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ers_auth::Role;
use ers_core::{EmployeeId, EmployeeRecordId, StoreResult};

/// Directory entry for one employee or manager.
///
/// `manager_id` is a business identifier carried by value; nothing checks that a
/// record with that employee id exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    pub id: EmployeeRecordId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub employee_id: EmployeeId,
    pub manager_id: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage port for directory records.
///
/// `insert` enforces uniqueness of `employee_id` and reports a clash as
/// `StoreError::Duplicate("employee_id")`. Listings are ordered by creation time.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert(&self, record: EmployeeRecord) -> StoreResult<()>;

    async fn get(&self, id: EmployeeRecordId) -> StoreResult<Option<EmployeeRecord>>;

    async fn list_all(&self) -> StoreResult<Vec<EmployeeRecord>>;

    async fn list_by_manager(&self, manager_id: EmployeeId) -> StoreResult<Vec<EmployeeRecord>>;

    /// Returns `false` when no record had that id.
    async fn delete(&self, id: EmployeeRecordId) -> StoreResult<bool>;
}
