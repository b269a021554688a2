//! In-memory stores for tests and dev.
//!
//! Each store keeps its records in a `RwLock<HashMap>`; uniqueness and version
//! checks run under the write lock so they are atomic with the write.

mod credentials;
mod directory;
mod reimbursements;

pub use credentials::InMemoryCredentialStore;
pub use directory::InMemoryDirectoryStore;
pub use reimbursements::InMemoryReimbursementStore;

use ers_core::StoreError;

fn poisoned<T>(_: T) -> StoreError {
    StoreError::backend("in-memory store lock poisoned")
}
