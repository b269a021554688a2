//! Postgres-backed stores.
//!
//! All three share one `PgPool`; the schema lives in `crates/infra/migrations`
//! and is applied by [`crate::db::migrate`].
//!
//! ## Optimistic Concurrency
//!
//! Reimbursement writes are a single statement guarded by
//! `WHERE id = $1 AND version = $2`. Zero affected rows means another writer got
//! there first and surfaces as `StoreError::Conflict`.

mod credentials;
mod directory;
mod reimbursements;

pub use credentials::PostgresCredentialStore;
pub use directory::PostgresDirectoryStore;
pub use reimbursements::PostgresReimbursementStore;

use ers_auth::Role;
use ers_core::StoreError;

use crate::db::decode_error;

fn decode_role(raw: &str) -> Result<Role, StoreError> {
    raw.parse::<Role>().map_err(|e| decode_error("role", e))
}

/// Integration tests run only when `ERS_TEST_DATABASE_URL` points at a
/// disposable database.
#[cfg(test)]
pub(crate) async fn test_pool() -> Option<sqlx::PgPool> {
    let url = std::env::var("ERS_TEST_DATABASE_URL").ok()?;
    let pool = crate::db::connect(&url, 2).await.ok()?;
    crate::db::migrate(&pool).await.ok()?;
    Some(pool)
}
