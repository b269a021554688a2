//! Infrastructure layer: storage adapters for the credential, directory and
//! reimbursement ports.
//!
//! - `memory`: lock-guarded maps for tests and single-process dev runs
//! - `postgres`: sqlx-backed stores sharing one `PgPool`
//! - `db`: pool construction, migrations and sqlx error mapping

pub mod db;
pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCredentialStore, InMemoryDirectoryStore, InMemoryReimbursementStore};
pub use postgres::{PostgresCredentialStore, PostgresDirectoryStore, PostgresReimbursementStore};
