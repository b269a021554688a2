//! Reimbursement domain module.
//!
//! A reimbursement request moves `PENDING -> APPROVED | REJECTED` exactly once.
//! Transition rules are pure functions on [`Reimbursement`]; the
//! [`ReimbursementService`] loads, decides and persists with a version
//! compare-and-swap through [`ReimbursementStore`].

pub mod amount;
pub mod reimbursement;
pub mod service;
pub mod store;

pub use amount::Amount;
pub use reimbursement::{Decision, Reimbursement, ReimbursementSnapshot, Status};
pub use service::{CreateReimbursement, ReimbursementService};
pub use store::ReimbursementStore;
