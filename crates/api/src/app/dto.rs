use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ers_auth::{IssuedToken, Principal};
use ers_core::{AggregateRoot, EmployeeId};
use ers_directory::EmployeeRecord;
use ers_reimbursement::Reimbursement;

// -------------------------
// Auth
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for LoginResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Claims of the token presented to `/api/auth/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub username: String,
    pub role: &'static str,
    pub employee_id: Option<EmployeeId>,
    pub manager_id: Option<EmployeeId>,
}

impl From<&Principal> for MeResponse {
    fn from(p: &Principal) -> Self {
        Self {
            user_id: p.identity_id.to_string(),
            username: p.username.clone(),
            role: p.role.as_str(),
            employee_id: p.employee_id,
            manager_id: p.manager_id,
        }
    }
}

// -------------------------
// Directory
// -------------------------

/// Directory record as returned to clients; the password hash never leaves
/// the service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: String,
    pub username: String,
    pub role: &'static str,
    pub employee_id: EmployeeId,
    pub manager_id: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmployeeRecord> for EmployeeResponse {
    fn from(r: EmployeeRecord) -> Self {
        Self {
            id: r.id.to_string(),
            username: r.username,
            role: r.role.as_str(),
            employee_id: r.employee_id,
            manager_id: r.manager_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListQuery {
    pub manager_id: Option<EmployeeId>,
}

// -------------------------
// Reimbursements
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimbursementResponse {
    pub id: String,
    pub employee_id: EmployeeId,
    pub manager_id: EmployeeId,
    pub amount: Decimal,
    pub description: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub action_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl From<&Reimbursement> for ReimbursementResponse {
    fn from(r: &Reimbursement) -> Self {
        Self {
            id: r.id().to_string(),
            employee_id: r.employee_id(),
            manager_id: r.manager_id(),
            amount: r.amount().value(),
            description: r.description().to_string(),
            status: r.status().as_str(),
            created_at: r.created_at(),
            updated_at: r.updated_at(),
            action_at: r.action_at(),
            version: r.version(),
        }
    }
}

/// `employeeId` wins when both filters are given.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimbursementListQuery {
    pub employee_id: Option<EmployeeId>,
    pub manager_id: Option<EmployeeId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    pub actor_id: Option<EmployeeId>,
}
