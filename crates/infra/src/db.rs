//! Pool construction, migrations and error mapping.
//!
//! ## Error Mapping
//!
//! | sqlx error | Postgres code | `StoreError` |
//! |------------|---------------|--------------|
//! | Database (unique violation) | `23505` | `Duplicate(column)` |
//! | Database (other) | any other | `Backend` |
//! | PoolClosed / Io / other | n/a | `Backend` |

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use ers_core::StoreError;

/// Open a pool against `url`.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;
    tracing::info!(max_connections, "connected to postgres");
    Ok(pool)
}

/// Apply the bundled schema migrations (idempotent).
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                let column = db_err
                    .constraint()
                    .map(column_of_constraint)
                    .unwrap_or("unknown");
                return StoreError::Duplicate(column.to_string());
            }
            StoreError::backend(format!(
                "database error in {operation}: {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

/// Unique constraints are named `<table>_<column>_key`.
fn column_of_constraint(constraint: &str) -> &'static str {
    if constraint.ends_with("_employee_id_key") {
        "employee_id"
    } else if constraint.ends_with("_username_key") {
        "username"
    } else {
        "unknown"
    }
}

pub(crate) fn decode_error(what: &str, err: impl core::fmt::Display) -> StoreError {
    StoreError::backend(format!("failed to decode {what} row: {err}"))
}
