use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use ers_core::{
    AggregateRoot, EmployeeId, ExpectedVersion, ReimbursementId, StoreError, StoreResult,
};
use ers_reimbursement::{Reimbursement, ReimbursementStore};

use super::poisoned;

#[derive(Debug, Default)]
pub struct InMemoryReimbursementStore {
    records: RwLock<HashMap<ReimbursementId, Reimbursement>>,
}

impl InMemoryReimbursementStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&self, keep: impl Fn(&Reimbursement) -> bool) -> StoreResult<Vec<Reimbursement>> {
        let map = self.records.read().map_err(poisoned)?;
        let mut out: Vec<Reimbursement> = map.values().filter(|r| keep(r)).cloned().collect();
        out.sort_by_key(|r| (r.created_at(), *r.id().as_uuid()));
        Ok(out)
    }
}

fn conflict(id: ReimbursementId, expected: ExpectedVersion, actual: u64) -> StoreError {
    StoreError::Conflict(format!(
        "reimbursement {id}: expected {expected:?}, stored version {actual}"
    ))
}

#[async_trait]
impl ReimbursementStore for InMemoryReimbursementStore {
    async fn insert(&self, record: &Reimbursement) -> StoreResult<()> {
        let mut map = self.records.write().map_err(poisoned)?;
        if map.contains_key(&record.id()) {
            return Err(StoreError::Duplicate("id".to_string()));
        }
        map.insert(record.id(), record.clone());
        Ok(())
    }

    async fn get(&self, id: ReimbursementId) -> StoreResult<Option<Reimbursement>> {
        let map = self.records.read().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<Reimbursement>> {
        self.collect(|_| true)
    }

    async fn list_by_employee(&self, employee_id: EmployeeId) -> StoreResult<Vec<Reimbursement>> {
        self.collect(|r| r.employee_id() == employee_id)
    }

    async fn list_by_manager(&self, manager_id: EmployeeId) -> StoreResult<Vec<Reimbursement>> {
        self.collect(|r| r.manager_id() == manager_id)
    }

    async fn update(
        &self,
        record: &Reimbursement,
        expected: ExpectedVersion,
    ) -> StoreResult<Reimbursement> {
        let id = record.id();
        let mut map = self.records.write().map_err(poisoned)?;
        // A record deleted under us is also a lost race.
        let Some(current) = map.get(&id) else {
            return Err(StoreError::Conflict(format!("reimbursement {id} no longer exists")));
        };
        if !expected.matches(current.version()) {
            return Err(conflict(id, expected, current.version()));
        }

        let next = record.clone().with_version(current.version() + 1);
        map.insert(id, next.clone());
        Ok(next)
    }

    async fn delete(&self, id: ReimbursementId, expected: ExpectedVersion) -> StoreResult<bool> {
        let mut map = self.records.write().map_err(poisoned)?;
        let Some(current) = map.get(&id) else {
            return Ok(false);
        };
        if !expected.matches(current.version()) {
            return Err(conflict(id, expected, current.version()));
        }
        map.remove(&id);
        Ok(true)
    }
}
