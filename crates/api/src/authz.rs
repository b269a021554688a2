//! Transport-level authorization guards.
//!
//! These run in the handlers before the service is called. The reimbursement
//! service repeats its own assigned-manager check; the two guards are kept
//! independent of each other.

use ers_auth::{Principal, Role, require_role};
use ers_core::{DomainError, DomainResult, EmployeeId};
use ers_reimbursement::{Decision, Reimbursement};

/// Employee id the principal acts as; tokens without one cannot act.
pub fn acting_employee_id(principal: &Principal) -> DomainResult<EmployeeId> {
    principal.employee_id.ok_or_else(|| {
        DomainError::forbidden("Token carries no employeeId; this action needs one")
    })
}

/// Require a MANAGER token whose employee id is the record's approver.
///
/// Returns the acting manager id to hand to the service.
pub fn ensure_assigned_manager(
    principal: &Principal,
    record: &Reimbursement,
    decision: Decision,
) -> DomainResult<EmployeeId> {
    require_role(
        principal,
        Role::Manager,
        "Only managers can approve or reject reimbursements",
    )?;
    let acting = acting_employee_id(principal)?;
    if acting != record.manager_id() {
        tracing::debug!(
            acting = %acting,
            assigned = %record.manager_id(),
            "manager is not the assigned approver"
        );
        return Err(DomainError::WrongManager(format!(
            "Only the assigned manager can {} this reimbursement",
            decision.verb()
        )));
    }
    Ok(acting)
}

/// Resolve the actor for a delete: always the token's employee id. A
/// client-supplied `actorId` must agree with it.
pub fn resolve_delete_actor(
    principal: &Principal,
    claimed: Option<EmployeeId>,
) -> DomainResult<EmployeeId> {
    let actor = acting_employee_id(principal)?;
    match claimed {
        Some(claimed) if claimed != actor => {
            tracing::warn!(
                token = %actor,
                claimed = %claimed,
                "actorId does not match authenticated employee"
            );
            Err(DomainError::forbidden(
                "actorId does not match the authenticated user",
            ))
        }
        _ => Ok(actor),
    }
}
