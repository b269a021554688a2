use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use ers_core::{
    AggregateRoot, DomainError, DomainResult, EmployeeId, ExpectedVersion, ReimbursementId,
};

use crate::{Amount, Decision, Reimbursement, ReimbursementStore};

/// Create-request payload. Every field is required; missing ones are reported
/// field by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReimbursement {
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct ReimbursementService {
    store: Arc<dyn ReimbursementStore>,
}

impl ReimbursementService {
    pub fn new(store: Arc<dyn ReimbursementStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, cmd: CreateReimbursement) -> DomainResult<Reimbursement> {
        let employee_id = cmd
            .employee_id
            .ok_or_else(|| DomainError::validation("employeeId", "employeeId is required"))?;
        let manager_id = cmd
            .manager_id
            .ok_or_else(|| DomainError::validation("managerId", "managerId is required"))?;
        let amount = cmd
            .amount
            .ok_or_else(|| DomainError::validation("amount", "amount is required"))
            .and_then(Amount::new)?;
        let description = cmd.description.unwrap_or_default();

        let record = Reimbursement::open(employee_id, manager_id, amount, &description, Utc::now())?;
        self.store.insert(&record).await?;

        tracing::info!(
            reimbursement_id = %record.id(),
            employee_id = %employee_id,
            manager_id = %manager_id,
            amount = %amount,
            "reimbursement created"
        );
        Ok(record)
    }

    pub async fn get(&self, id: ReimbursementId) -> DomainResult<Reimbursement> {
        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list_all(&self) -> DomainResult<Vec<Reimbursement>> {
        Ok(self.store.list_all().await?)
    }

    pub async fn list_by_employee(&self, employee_id: EmployeeId) -> DomainResult<Vec<Reimbursement>> {
        Ok(self.store.list_by_employee(employee_id).await?)
    }

    pub async fn list_by_manager(&self, manager_id: EmployeeId) -> DomainResult<Vec<Reimbursement>> {
        Ok(self.store.list_by_manager(manager_id).await?)
    }

    pub async fn approve(
        &self,
        id: ReimbursementId,
        acting_manager: EmployeeId,
    ) -> DomainResult<Reimbursement> {
        self.decide(id, Decision::Approve, acting_manager).await
    }

    pub async fn reject(
        &self,
        id: ReimbursementId,
        acting_manager: EmployeeId,
    ) -> DomainResult<Reimbursement> {
        self.decide(id, Decision::Reject, acting_manager).await
    }

    async fn decide(
        &self,
        id: ReimbursementId,
        decision: Decision,
        acting_manager: EmployeeId,
    ) -> DomainResult<Reimbursement> {
        let mut record = self.get(id).await?;
        let loaded = ExpectedVersion::Exact(record.version());

        if let Err(e) = record.decide(decision, acting_manager, Utc::now()) {
            tracing::debug!(reimbursement_id = %id, ?decision, error = %e, "decision refused");
            return Err(e);
        }

        let saved = self.store.update(&record, loaded).await?;
        tracing::info!(
            reimbursement_id = %id,
            status = %saved.status(),
            by = %acting_manager,
            version = saved.version(),
            "reimbursement decided"
        );
        Ok(saved)
    }

    pub async fn delete(&self, id: ReimbursementId, actor: EmployeeId) -> DomainResult<()> {
        let record = self.get(id).await?;
        record.authorize_delete(actor)?;

        if !self
            .store
            .delete(id, ExpectedVersion::Exact(record.version()))
            .await?
        {
            return Err(not_found(id));
        }
        tracing::info!(reimbursement_id = %id, by = %actor, "reimbursement deleted");
        Ok(())
    }
}

fn not_found(id: ReimbursementId) -> DomainError {
    DomainError::not_found(format!("Reimbursement with id {id} not found"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ers_core::{StoreError, StoreResult};

    use super::*;
    use crate::Status;

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<ReimbursementId, Reimbursement>>);

    #[async_trait]
    impl ReimbursementStore for MapStore {
        async fn insert(&self, record: &Reimbursement) -> StoreResult<()> {
            self.0
                .lock()
                .unwrap()
                .insert(record.id(), record.clone());
            Ok(())
        }

        async fn get(&self, id: ReimbursementId) -> StoreResult<Option<Reimbursement>> {
            Ok(self.0.lock().unwrap().get(&id).cloned())
        }

        async fn list_all(&self) -> StoreResult<Vec<Reimbursement>> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }

        async fn list_by_employee(&self, employee_id: EmployeeId) -> StoreResult<Vec<Reimbursement>> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.employee_id() == employee_id)
                .cloned()
                .collect())
        }

        async fn list_by_manager(&self, manager_id: EmployeeId) -> StoreResult<Vec<Reimbursement>> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.manager_id() == manager_id)
                .cloned()
                .collect())
        }

        async fn update(
            &self,
            record: &Reimbursement,
            expected: ExpectedVersion,
        ) -> StoreResult<Reimbursement> {
            let mut map = self.0.lock().unwrap();
            let current = map
                .get(&record.id())
                .ok_or_else(|| StoreError::Conflict("record vanished".to_string()))?;
            if !expected.matches(current.version()) {
                return Err(StoreError::Conflict(format!(
                    "stored version {}",
                    current.version()
                )));
            }
            let next = record.clone().with_version(current.version() + 1);
            map.insert(next.id(), next.clone());
            Ok(next)
        }

        async fn delete(&self, id: ReimbursementId, expected: ExpectedVersion) -> StoreResult<bool> {
            let mut map = self.0.lock().unwrap();
            match map.get(&id) {
                None => Ok(false),
                Some(r) if !expected.matches(r.version()) => {
                    Err(StoreError::Conflict(format!("stored version {}", r.version())))
                }
                Some(_) => Ok(map.remove(&id).is_some()),
            }
        }
    }

    /// Wraps a store and lets another writer win every update.
    struct LosingStore(MapStore);

    #[async_trait]
    impl ReimbursementStore for LosingStore {
        async fn insert(&self, record: &Reimbursement) -> StoreResult<()> {
            self.0.insert(record).await
        }

        async fn get(&self, id: ReimbursementId) -> StoreResult<Option<Reimbursement>> {
            self.0.get(id).await
        }

        async fn list_all(&self) -> StoreResult<Vec<Reimbursement>> {
            self.0.list_all().await
        }

        async fn list_by_employee(&self, employee_id: EmployeeId) -> StoreResult<Vec<Reimbursement>> {
            self.0.list_by_employee(employee_id).await
        }

        async fn list_by_manager(&self, manager_id: EmployeeId) -> StoreResult<Vec<Reimbursement>> {
            self.0.list_by_manager(manager_id).await
        }

        async fn update(
            &self,
            record: &Reimbursement,
            expected: ExpectedVersion,
        ) -> StoreResult<Reimbursement> {
            let stored = self.0.get(record.id()).await?.unwrap();
            self.0.update(&stored, ExpectedVersion::Any).await?;
            self.0.update(record, expected).await
        }

        async fn delete(&self, id: ReimbursementId, expected: ExpectedVersion) -> StoreResult<bool> {
            self.0.delete(id, expected).await
        }
    }

    fn service() -> ReimbursementService {
        ReimbursementService::new(Arc::new(MapStore::default()))
    }

    fn emp(n: i64) -> EmployeeId {
        EmployeeId::new(n)
    }

    fn travel(employee: i64, manager: i64) -> CreateReimbursement {
        CreateReimbursement {
            employee_id: Some(emp(employee)),
            manager_id: Some(emp(manager)),
            amount: Some(Decimal::from_str("1000.00").unwrap()),
            description: Some("Travel".to_string()),
        }
    }

    #[tokio::test]
    async fn approve_scenario() {
        let svc = service();
        let created = svc.create(travel(1, 2)).await.unwrap();
        assert_eq!(created.status(), Status::Pending);
        assert_eq!(created.action_at(), None);

        let approved = svc.approve(created.id(), emp(2)).await.unwrap();
        assert_eq!(approved.status(), Status::Approved);
        assert!(approved.action_at().is_some());
        assert_eq!(approved.version(), 2);

        let err = svc.approve(created.id(), emp(2)).await.unwrap_err();
        assert_eq!(err.to_string(), "Only PENDING reimbursements can be approved");

        let stored = svc.get(created.id()).await.unwrap();
        assert_eq!(stored.action_at(), approved.action_at());
    }

    #[tokio::test]
    async fn wrong_manager_is_refused() {
        let svc = service();
        let created = svc.create(travel(1, 2)).await.unwrap();
        let err = svc.approve(created.id(), emp(999)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only the assigned manager can approve this reimbursement"
        );
        let err = svc.reject(created.id(), emp(999)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only the assigned manager can reject this reimbursement"
        );
    }

    #[tokio::test]
    async fn reject_then_delete_is_refused() {
        let svc = service();
        let created = svc.create(travel(1, 2)).await.unwrap();
        svc.reject(created.id(), emp(2)).await.unwrap();

        let err = svc.delete(created.id(), emp(1)).await.unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid_transition("Employee can delete only PENDING reimbursements")
        );
    }

    #[tokio::test]
    async fn owner_deletes_pending_request() {
        let svc = service();
        let created = svc.create(travel(1, 2)).await.unwrap();

        let err = svc.delete(created.id(), emp(3)).await.unwrap_err();
        assert!(matches!(err, DomainError::OperationNotAllowed(_)));

        svc.delete(created.id(), emp(1)).await.unwrap();
        assert!(matches!(
            svc.get(created.id()).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let id = ReimbursementId::new();
        let err = service().approve(id, emp(2)).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Reimbursement with id {id} not found"));
        assert!(matches!(
            service().delete(id, emp(1)).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn create_reports_missing_fields_and_same_party() {
        let svc = service();

        let mut cmd = travel(1, 2);
        cmd.employee_id = None;
        assert_eq!(
            svc.create(cmd).await.unwrap_err(),
            DomainError::validation("employeeId", "employeeId is required")
        );

        let mut cmd = travel(1, 2);
        cmd.amount = Some(Decimal::ZERO);
        assert_eq!(
            svc.create(cmd).await.unwrap_err(),
            DomainError::validation("amount", "Amount must be positive")
        );

        let mut cmd = travel(1, 2);
        cmd.description = None;
        assert!(matches!(
            svc.create(cmd).await.unwrap_err(),
            DomainError::Validation { ref field, .. } if field == "description"
        ));

        assert_eq!(
            svc.create(travel(4, 4)).await.unwrap_err(),
            DomainError::SameParty
        );
    }

    #[tokio::test]
    async fn listings_filter_by_party() {
        let svc = service();
        svc.create(travel(1, 2)).await.unwrap();
        svc.create(travel(1, 3)).await.unwrap();
        svc.create(travel(4, 2)).await.unwrap();

        assert_eq!(svc.list_all().await.unwrap().len(), 3);
        assert_eq!(svc.list_by_employee(emp(1)).await.unwrap().len(), 2);
        assert_eq!(svc.list_by_manager(emp(2)).await.unwrap().len(), 2);
        assert!(svc.list_by_manager(emp(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lost_update_surfaces_concurrent_modification() {
        let svc = ReimbursementService::new(Arc::new(LosingStore(MapStore::default())));
        let created = svc.create(travel(1, 2)).await.unwrap();

        let err = svc.approve(created.id(), emp(2)).await.unwrap_err();
        assert!(matches!(err, DomainError::ConcurrentModification(_)));
    }
}
