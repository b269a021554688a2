//! Employee directory domain module.
//!
//! Record type, storage port and the role rules for creating, reading, listing
//! and deleting directory entries. Every rule is evaluated against the verified
//! [`ers_auth::Principal`]; storage lives behind [`DirectoryStore`].

pub mod record;
pub mod service;

pub use record::{DirectoryStore, EmployeeRecord};
pub use service::{CreateEmployee, DirectoryService};
