//! Role-based authorization guard.
//!
//! - No IO
//! - No panics
//! - Pure check against the verified principal

use ers_core::{DomainError, DomainResult};

use crate::{Principal, Role};

/// Require the principal to hold `role`, failing with `Forbidden(message)`.
pub fn require_role(principal: &Principal, role: Role, message: &str) -> DomainResult<()> {
    if principal.role == role {
        Ok(())
    } else {
        tracing::debug!(
            username = %principal.username,
            have = %principal.role,
            need = %role,
            "role check failed"
        );
        Err(DomainError::forbidden(message))
    }
}
