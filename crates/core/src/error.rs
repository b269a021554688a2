//! Domain error model.

use thiserror::Error;

use crate::store::StoreError;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error shared by the auth, directory and reimbursement services.
///
/// Every variant except `Internal` carries a message that is safe to return to
/// the client verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Unknown username, wrong password or disabled identity (never distinguished).
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Employee with employeeId {0} already exists")]
    DuplicateEmployeeId(i64),

    #[error("Employee must be assigned to a manager (managerId required)")]
    MissingManager,

    /// Role or ownership mismatch.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("employeeId and managerId cannot be the same")]
    SameParty,

    #[error("{0}")]
    WrongManager(String),

    /// Attempted a lifecycle transition the current status does not allow.
    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    OperationNotAllowed(String),

    /// A concurrent writer changed the record between read and write.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    /// A field failed validation.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Infrastructure failure; the message is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn not_allowed(msg: impl Into<String>) -> Self {
        Self::OperationNotAllowed(msg.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => DomainError::ConcurrentModification(msg),
            StoreError::Duplicate(field) => {
                DomainError::validation(field, "value already exists")
            }
            StoreError::Backend(msg) => DomainError::Internal(msg),
        }
    }
}
