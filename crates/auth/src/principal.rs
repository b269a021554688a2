use ers_core::{EmployeeId, IdentityId};

use crate::{Identity, Role, TokenClaims};

/// Authenticated caller, reconstructed from verified token claims.
///
/// Every authorization decision in the directory and reimbursement services is
/// made against this value, never against route or body parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub identity_id: IdentityId,
    pub username: String,
    pub role: Role,
    pub employee_id: Option<EmployeeId>,
    pub manager_id: Option<EmployeeId>,
}

impl Principal {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// True when the principal's own business id equals `employee_id`.
    pub fn is_employee(&self, employee_id: EmployeeId) -> bool {
        self.employee_id == Some(employee_id)
    }
}

impl From<TokenClaims> for Principal {
    fn from(claims: TokenClaims) -> Self {
        Self {
            identity_id: claims.sub,
            username: claims.username,
            role: claims.role,
            employee_id: claims.employee_id,
            manager_id: claims.manager_id,
        }
    }
}

impl From<&Identity> for Principal {
    fn from(identity: &Identity) -> Self {
        Self {
            identity_id: identity.id,
            username: identity.username.clone(),
            role: identity.role,
            employee_id: identity.employee_id,
            manager_id: identity.manager_id,
        }
    }
}
