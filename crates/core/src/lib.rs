//! `ers-core`: shared domain building blocks for the reimbursement services.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod store;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{EmployeeId, EmployeeRecordId, IdentityId, ReimbursementId};
pub use store::{StoreError, StoreResult};
