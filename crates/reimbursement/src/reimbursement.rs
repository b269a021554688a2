use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ers_core::{AggregateRoot, DomainError, DomainResult, EmployeeId, ReimbursementId};

use crate::Amount;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Approved => "APPROVED",
            Status::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Status::Pending),
            "APPROVED" => Ok(Status::Approved),
            "REJECTED" => Ok(Status::Rejected),
            other => Err(DomainError::validation(
                "status",
                format!("unknown status: {other}"),
            )),
        }
    }
}

/// A manager's decision on a pending request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn verb(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        }
    }

    fn target(self) -> Status {
        match self {
            Decision::Approve => Status::Approved,
            Decision::Reject => Status::Rejected,
        }
    }
}

/// Aggregate root: a reimbursement request.
///
/// # Invariants
/// - `employee_id != manager_id`
/// - `description` is trimmed and non-blank
/// - `action_at` is `None` while `Pending` and set exactly once on transition
/// - `Approved` / `Rejected` are terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reimbursement {
    id: ReimbursementId,
    employee_id: EmployeeId,
    manager_id: EmployeeId,
    amount: Amount,
    description: String,
    status: Status,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    action_at: Option<DateTime<Utc>>,
    version: u64,
}

/// Plain field view of a [`Reimbursement`], used to move records in and out
/// of storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReimbursementSnapshot {
    pub id: ReimbursementId,
    pub employee_id: EmployeeId,
    pub manager_id: EmployeeId,
    pub amount: Amount,
    pub description: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub action_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl Reimbursement {
    /// Open a new pending request at version 1.
    pub fn open(
        employee_id: EmployeeId,
        manager_id: EmployeeId,
        amount: Amount,
        description: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if employee_id == manager_id {
            return Err(DomainError::SameParty);
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(DomainError::validation(
                "description",
                "description is required",
            ));
        }

        Ok(Self {
            id: ReimbursementId::new(),
            employee_id,
            manager_id,
            amount,
            description: description.to_string(),
            status: Status::Pending,
            created_at: now,
            updated_at: now,
            action_at: None,
            version: 1,
        })
    }

    /// Rebuild from stored fields, re-checking the invariants.
    pub fn restore(s: ReimbursementSnapshot) -> DomainResult<Self> {
        if s.employee_id == s.manager_id {
            return Err(DomainError::SameParty);
        }
        if s.status.is_terminal() != s.action_at.is_some() {
            return Err(DomainError::internal(format!(
                "reimbursement {} has status {} but action_at {:?}",
                s.id, s.status, s.action_at
            )));
        }
        Ok(Self {
            id: s.id,
            employee_id: s.employee_id,
            manager_id: s.manager_id,
            amount: s.amount,
            description: s.description,
            status: s.status,
            created_at: s.created_at,
            updated_at: s.updated_at,
            action_at: s.action_at,
            version: s.version,
        })
    }

    pub fn id(&self) -> ReimbursementId {
        self.id
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    pub fn manager_id(&self) -> EmployeeId {
        self.manager_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn action_at(&self) -> Option<DateTime<Utc>> {
        self.action_at
    }

    /// Same record at a new persisted version. Only storage backends call this.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Apply a manager decision in place. The version is left for the store to bump.
    pub fn decide(
        &mut self,
        decision: Decision,
        acting_manager: EmployeeId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.manager_id != acting_manager {
            return Err(DomainError::WrongManager(format!(
                "Only the assigned manager can {} this reimbursement",
                decision.verb()
            )));
        }
        if self.status != Status::Pending {
            return Err(DomainError::invalid_transition(format!(
                "Only PENDING reimbursements can be {}",
                decision.past()
            )));
        }

        self.status = decision.target();
        self.action_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Whether `actor` may delete this request.
    pub fn authorize_delete(&self, actor: EmployeeId) -> DomainResult<()> {
        if actor == self.employee_id {
            if self.status == Status::Pending {
                return Ok(());
            }
            return Err(DomainError::invalid_transition(
                "Employee can delete only PENDING reimbursements",
            ));
        }
        if actor == self.manager_id {
            return Err(DomainError::not_allowed(
                "Manager deletion is not allowed. Use reject/approve actions.",
            ));
        }
        Err(DomainError::not_allowed(
            "Only the owner employee or assigned manager (for actions) can perform this operation",
        ))
    }
}

impl AggregateRoot for Reimbursement {
    fn version(&self) -> u64 {
        self.version
    }
}
