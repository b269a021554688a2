use async_trait::async_trait;

use ers_core::{EmployeeId, ExpectedVersion, ReimbursementId, StoreResult};

use crate::Reimbursement;

/// Storage port for reimbursement requests.
///
/// Writes after creation are compare-and-swap on `version`: when the stored
/// version does not match `expected` the store returns `StoreError::Conflict`
/// and leaves the record untouched. Listings are ordered by creation time.
#[async_trait]
pub trait ReimbursementStore: Send + Sync {
    async fn insert(&self, record: &Reimbursement) -> StoreResult<()>;

    async fn get(&self, id: ReimbursementId) -> StoreResult<Option<Reimbursement>>;

    async fn list_all(&self) -> StoreResult<Vec<Reimbursement>>;

    async fn list_by_employee(&self, employee_id: EmployeeId) -> StoreResult<Vec<Reimbursement>>;

    async fn list_by_manager(&self, manager_id: EmployeeId) -> StoreResult<Vec<Reimbursement>>;

    /// Persist `record`, returning it at its new version (`stored + 1`).
    async fn update(
        &self,
        record: &Reimbursement,
        expected: ExpectedVersion,
    ) -> StoreResult<Reimbursement>;

    /// Returns `false` when no record had that id.
    async fn delete(&self, id: ReimbursementId, expected: ExpectedVersion) -> StoreResult<bool>;
}
