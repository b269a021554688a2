use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use ers_auth::{CredentialStore, Identity};
use ers_core::{EmployeeId, IdentityId, StoreResult};

use super::decode_role;
use crate::db::{decode_error, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>> {
        let row = sqlx::query(
            r#"
            SELECT id, employee_id, manager_id, username, password_hash, role, enabled, created_at
            FROM identities
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_username", e))?;

        row.map(|r| {
            IdentityRow::from_row(&r)
                .map_err(|e| decode_error("identity", e))
                .and_then(Identity::try_from)
        })
        .transpose()
    }

    #[instrument(skip(self, identity), fields(username = %identity.username), err)]
    async fn insert(&self, identity: Identity) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO identities
                (id, employee_id, manager_id, username, password_hash, role, enabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(identity.id.as_uuid())
        .bind(identity.employee_id.map(EmployeeId::get))
        .bind(identity.manager_id.map(EmployeeId::get))
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.enabled)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_identity", e))?;
        Ok(())
    }
}

struct IdentityRow {
    id: uuid::Uuid,
    employee_id: Option<i64>,
    manager_id: Option<i64>,
    username: String,
    password_hash: String,
    role: String,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for IdentityRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(IdentityRow {
            id: row.try_get("id")?,
            employee_id: row.try_get("employee_id")?,
            manager_id: row.try_get("manager_id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role: row.try_get("role")?,
            enabled: row.try_get("enabled")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<IdentityRow> for Identity {
    type Error = ers_core::StoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: IdentityId::from_uuid(row.id),
            employee_id: row.employee_id.map(EmployeeId::new),
            manager_id: row.manager_id.map(EmployeeId::new),
            username: row.username,
            password_hash: row.password_hash,
            role: decode_role(&row.role)?,
            enabled: row.enabled,
            created_at: row.created_at,
        })
    }
}
