use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use ers_auth::{PasswordHasher, Principal, Role, UnknownRole, require_role};
use ers_core::{DomainError, DomainResult, EmployeeId, EmployeeRecordId, StoreError};

use crate::{DirectoryStore, EmployeeRecord};

/// Create-employee payload.
///
/// `manager_id` is accepted for compatibility but always replaced by the acting
/// manager's own employee id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
}

#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn DirectoryStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn DirectoryStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        cmd: CreateEmployee,
    ) -> DomainResult<EmployeeRecord> {
        require_role(principal, Role::Manager, "Only managers can create employees")?;
        let Some(acting_manager) = principal.employee_id else {
            return Err(DomainError::forbidden(
                "Manager token carries no employeeId; cannot assign employees",
            ));
        };

        let username = cmd.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::validation("username", "Username is required"));
        }
        if cmd.password.is_empty() {
            return Err(DomainError::validation("password", "Password is required"));
        }
        if cmd.role.trim().is_empty() {
            return Err(DomainError::validation("role", "Role is required"));
        }
        let role: Role = cmd
            .role
            .parse()
            .map_err(|e: UnknownRole| DomainError::validation("role", e.to_string()))?;
        let Some(employee_id) = cmd.employee_id else {
            return Err(DomainError::validation("employeeId", "employeeId is required"));
        };

        if cmd.manager_id.is_some_and(|m| m != acting_manager) {
            tracing::debug!(
                requested = ?cmd.manager_id,
                acting = %acting_manager,
                "overriding managerId with acting manager"
            );
        }

        let password_hash = self
            .hasher
            .hash(&cmd.password)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let now = Utc::now();
        let record = EmployeeRecord {
            id: EmployeeRecordId::new(),
            username,
            password_hash,
            role,
            employee_id,
            manager_id: Some(acting_manager),
            created_at: now,
            updated_at: now,
        };

        match self.store.insert(record.clone()).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(DomainError::DuplicateEmployeeId(employee_id.get()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            record_id = %record.id,
            employee_id = %record.employee_id,
            manager_id = %acting_manager,
            "employee created"
        );
        Ok(record)
    }

    /// Managers read any record; employees only their own.
    ///
    /// An employee asking for someone else's record, or for an id that does
    /// not exist, gets the same `Forbidden`.
    pub async fn get(
        &self,
        principal: &Principal,
        id: EmployeeRecordId,
    ) -> DomainResult<EmployeeRecord> {
        let found = self.store.get(id).await?;

        if principal.is_manager() {
            return found.ok_or_else(|| not_found(id));
        }

        match found {
            Some(record) if principal.is_employee(record.employee_id) => Ok(record),
            _ => {
                tracing::debug!(username = %principal.username, record_id = %id, "read denied");
                Err(DomainError::forbidden("Employees can only view their own profile"))
            }
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        manager_id: Option<EmployeeId>,
    ) -> DomainResult<Vec<EmployeeRecord>> {
        require_role(principal, Role::Manager, "Only managers can list employees")?;

        let records = match manager_id {
            Some(m) => self.store.list_by_manager(m).await?,
            None => self.store.list_all().await?,
        };
        Ok(records)
    }

    pub async fn delete(&self, principal: &Principal, id: EmployeeRecordId) -> DomainResult<()> {
        require_role(principal, Role::Manager, "Only managers can delete employees")?;

        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(record_id = %id, by = %principal.username, "employee deleted");
        Ok(())
    }
}

fn not_found(id: EmployeeRecordId) -> DomainError {
    DomainError::not_found(format!("Employee with id {id} not found"))
}
