use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::{Span, instrument};

use ers_core::{
    AggregateRoot, EmployeeId, ExpectedVersion, ReimbursementId, StoreError, StoreResult,
};
use ers_reimbursement::{Amount, Reimbursement, ReimbursementSnapshot, ReimbursementStore, Status};

use crate::db::{decode_error, map_sqlx_error};

const SELECT_REIMBURSEMENTS: &str = r#"
    SELECT id, employee_id, manager_id, amount, description, status,
           created_at, updated_at, action_at, version
    FROM reimbursements
"#;

#[derive(Debug, Clone)]
pub struct PostgresReimbursementStore {
    pool: PgPool,
}

impl PostgresReimbursementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(
        &self,
        operation: &str,
        filter: &str,
        party: Option<EmployeeId>,
    ) -> StoreResult<Vec<Reimbursement>> {
        let sql = format!("{SELECT_REIMBURSEMENTS} {filter} ORDER BY created_at, id");
        let mut query = sqlx::query(&sql);
        if let Some(party) = party {
            query = query.bind(party.get());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        Span::current().record("row_count", rows.len());
        rows.iter().map(decode).collect()
    }
}

fn decode(row: &PgRow) -> StoreResult<Reimbursement> {
    let row = ReimbursementRow::from_row(row).map_err(|e| decode_error("reimbursement", e))?;
    let snapshot = row.into_snapshot()?;
    Reimbursement::restore(snapshot).map_err(|e| decode_error("reimbursement", e))
}

fn to_db_version(version: u64) -> StoreResult<i64> {
    i64::try_from(version).map_err(|_| StoreError::backend(format!("version {version} overflows BIGINT")))
}

#[async_trait]
impl ReimbursementStore for PostgresReimbursementStore {
    #[instrument(skip(self, record), fields(reimbursement_id = %record.id()), err)]
    async fn insert(&self, record: &Reimbursement) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reimbursements
                (id, employee_id, manager_id, amount, description, status,
                 created_at, updated_at, action_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.employee_id().get())
        .bind(record.manager_id().get())
        .bind(record.amount().value())
        .bind(record.description())
        .bind(record.status().as_str())
        .bind(record.created_at())
        .bind(record.updated_at())
        .bind(record.action_at())
        .bind(to_db_version(record.version())?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_reimbursement", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(reimbursement_id = %id), err)]
    async fn get(&self, id: ReimbursementId) -> StoreResult<Option<Reimbursement>> {
        let row = sqlx::query(&format!("{SELECT_REIMBURSEMENTS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_reimbursement", e))?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn list_all(&self) -> StoreResult<Vec<Reimbursement>> {
        self.list_where("list_reimbursements", "", None).await
    }

    #[instrument(skip(self), fields(employee_id = %employee_id, row_count = tracing::field::Empty), err)]
    async fn list_by_employee(&self, employee_id: EmployeeId) -> StoreResult<Vec<Reimbursement>> {
        self.list_where(
            "list_reimbursements_by_employee",
            "WHERE employee_id = $1",
            Some(employee_id),
        )
        .await
    }

    #[instrument(skip(self), fields(manager_id = %manager_id, row_count = tracing::field::Empty), err)]
    async fn list_by_manager(&self, manager_id: EmployeeId) -> StoreResult<Vec<Reimbursement>> {
        self.list_where(
            "list_reimbursements_by_manager",
            "WHERE manager_id = $1",
            Some(manager_id),
        )
        .await
    }

    /// Single-statement compare-and-swap; `ExpectedVersion::Any` drops the
    /// version guard but still bumps the version.
    #[instrument(
        skip(self, record),
        fields(reimbursement_id = %record.id(), expected = ?expected),
        err
    )]
    async fn update(
        &self,
        record: &Reimbursement,
        expected: ExpectedVersion,
    ) -> StoreResult<Reimbursement> {
        let guard = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(to_db_version(v)?),
        };

        let row = sqlx::query(
            r#"
            UPDATE reimbursements
            SET status = $3,
                description = $4,
                updated_at = $5,
                action_at = $6,
                version = version + 1
            WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)
            RETURNING version
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(guard)
        .bind(record.status().as_str())
        .bind(record.description())
        .bind(record.updated_at())
        .bind(record.action_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_reimbursement", e))?;

        let Some(row) = row else {
            return Err(StoreError::Conflict(format!(
                "reimbursement {} changed or vanished since version {expected:?}",
                record.id()
            )));
        };
        let version: i64 = row
            .try_get("version")
            .map_err(|e| decode_error("reimbursement version", e))?;
        let version = u64::try_from(version).map_err(|e| decode_error("reimbursement version", e))?;

        Ok(record.clone().with_version(version))
    }

    #[instrument(skip(self), fields(reimbursement_id = %id, expected = ?expected), err)]
    async fn delete(&self, id: ReimbursementId, expected: ExpectedVersion) -> StoreResult<bool> {
        let guard = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(to_db_version(v)?),
        };

        let result = sqlx::query(
            "DELETE FROM reimbursements WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)",
        )
        .bind(id.as_uuid())
        .bind(guard)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_reimbursement", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Nothing deleted: either the row is gone or its version moved on.
        let exists = sqlx::query("SELECT 1 FROM reimbursements WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_reimbursement", e))?
            .is_some();
        if exists {
            return Err(StoreError::Conflict(format!(
                "reimbursement {id} changed since version {expected:?}"
            )));
        }
        Ok(false)
    }
}

struct ReimbursementRow {
    id: uuid::Uuid,
    employee_id: i64,
    manager_id: i64,
    amount: Decimal,
    description: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    action_at: Option<DateTime<Utc>>,
    version: i64,
}

impl<'r> FromRow<'r, PgRow> for ReimbursementRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReimbursementRow {
            id: row.try_get("id")?,
            employee_id: row.try_get("employee_id")?,
            manager_id: row.try_get("manager_id")?,
            amount: row.try_get("amount")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            action_at: row.try_get("action_at")?,
            version: row.try_get("version")?,
        })
    }
}

impl ReimbursementRow {
    fn into_snapshot(self) -> StoreResult<ReimbursementSnapshot> {
        Ok(ReimbursementSnapshot {
            id: ReimbursementId::from_uuid(self.id),
            employee_id: EmployeeId::new(self.employee_id),
            manager_id: EmployeeId::new(self.manager_id),
            amount: Amount::new(self.amount).map_err(|e| decode_error("amount", e))?,
            description: self.description,
            status: self.status.parse::<Status>().map_err(|e| decode_error("status", e))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            action_at: self.action_at,
            version: u64::try_from(self.version).map_err(|e| decode_error("version", e))?,
        })
    }
}
