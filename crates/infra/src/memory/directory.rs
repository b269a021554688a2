use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use ers_core::{EmployeeId, EmployeeRecordId, StoreError, StoreResult};
use ers_directory::{DirectoryStore, EmployeeRecord};

use super::poisoned;

#[derive(Debug, Default)]
pub struct InMemoryDirectoryStore {
    records: RwLock<HashMap<EmployeeRecordId, EmployeeRecord>>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(
        &self,
        keep: impl Fn(&EmployeeRecord) -> bool,
    ) -> StoreResult<Vec<EmployeeRecord>> {
        let map = self.records.read().map_err(poisoned)?;
        let mut out: Vec<EmployeeRecord> = map.values().filter(|r| keep(r)).cloned().collect();
        out.sort_by_key(|r| (r.created_at, *r.id.as_uuid()));
        Ok(out)
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn insert(&self, record: EmployeeRecord) -> StoreResult<()> {
        let mut map = self.records.write().map_err(poisoned)?;
        if map.values().any(|r| r.employee_id == record.employee_id) {
            return Err(StoreError::Duplicate("employee_id".to_string()));
        }
        map.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: EmployeeRecordId) -> StoreResult<Option<EmployeeRecord>> {
        let map = self.records.read().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<EmployeeRecord>> {
        self.collect(|_| true)
    }

    async fn list_by_manager(&self, manager_id: EmployeeId) -> StoreResult<Vec<EmployeeRecord>> {
        self.collect(|r| r.manager_id == Some(manager_id))
    }

    async fn delete(&self, id: EmployeeRecordId) -> StoreResult<bool> {
        let mut map = self.records.write().map_err(poisoned)?;
        Ok(map.remove(&id).is_some())
    }
}
