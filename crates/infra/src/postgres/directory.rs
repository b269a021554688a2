use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use ers_core::{EmployeeId, EmployeeRecordId, StoreError, StoreResult};
use ers_directory::{DirectoryStore, EmployeeRecord};

use super::decode_role;
use crate::db::{decode_error, map_sqlx_error};

const SELECT_EMPLOYEES: &str = r#"
    SELECT id, username, password_hash, role, employee_id, manager_id, created_at, updated_at
    FROM employees
"#;

#[derive(Debug, Clone)]
pub struct PostgresDirectoryStore {
    pool: PgPool,
}

impl PostgresDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_rows(rows: Vec<PgRow>) -> StoreResult<Vec<EmployeeRecord>> {
    rows.iter()
        .map(|r| {
            EmployeeRow::from_row(r)
                .map_err(|e| decode_error("employee", e))
                .and_then(EmployeeRecord::try_from)
        })
        .collect()
}

#[async_trait]
impl DirectoryStore for PostgresDirectoryStore {
    #[instrument(skip(self, record), fields(employee_id = %record.employee_id), err)]
    async fn insert(&self, record: EmployeeRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employees
                (id, username, password_hash, role, employee_id, manager_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.username)
        .bind(&record.password_hash)
        .bind(record.role.as_str())
        .bind(record.employee_id.get())
        .bind(record.manager_id.map(EmployeeId::get))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_employee", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(record_id = %id), err)]
    async fn get(&self, id: EmployeeRecordId) -> StoreResult<Option<EmployeeRecord>> {
        let row = sqlx::query(&format!("{SELECT_EMPLOYEES} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_employee", e))?;
        Ok(decode_rows(row.into_iter().collect())?.pop())
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> StoreResult<Vec<EmployeeRecord>> {
        let rows = sqlx::query(&format!("{SELECT_EMPLOYEES} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_employees", e))?;
        decode_rows(rows)
    }

    #[instrument(skip(self), fields(manager_id = %manager_id), err)]
    async fn list_by_manager(&self, manager_id: EmployeeId) -> StoreResult<Vec<EmployeeRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_EMPLOYEES} WHERE manager_id = $1 ORDER BY created_at, id"
        ))
        .bind(manager_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_employees_by_manager", e))?;
        decode_rows(rows)
    }

    #[instrument(skip(self), fields(record_id = %id), err)]
    async fn delete(&self, id: EmployeeRecordId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_employee", e))?;
        Ok(result.rows_affected() > 0)
    }
}

struct EmployeeRow {
    id: uuid::Uuid,
    username: String,
    password_hash: String,
    role: String,
    employee_id: i64,
    manager_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for EmployeeRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(EmployeeRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role: row.try_get("role")?,
            employee_id: row.try_get("employee_id")?,
            manager_id: row.try_get("manager_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<EmployeeRow> for EmployeeRecord {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(EmployeeRecord {
            id: EmployeeRecordId::from_uuid(row.id),
            username: row.username,
            password_hash: row.password_hash,
            role: decode_role(&row.role)?,
            employee_id: EmployeeId::new(row.employee_id),
            manager_id: row.manager_id.map(EmployeeId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use ers_auth::Role;

    use super::*;
    use crate::postgres::test_pool;

    #[tokio::test]
    async fn insert_get_list_delete() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PostgresDirectoryStore::new(pool);
        // Unique per run so the test can share a database.
        let number = Utc::now().timestamp_micros();
        let manager = EmployeeId::new(-number);
        let now = Utc::now();
        let record = EmployeeRecord {
            id: EmployeeRecordId::new(),
            username: "pg-employee".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Employee,
            employee_id: EmployeeId::new(number),
            manager_id: Some(manager),
            created_at: now,
            updated_at: now,
        };

        store.insert(record.clone()).await.unwrap();
        assert_eq!(
            store.insert(EmployeeRecord {
                id: EmployeeRecordId::new(),
                ..record.clone()
            })
            .await,
            Err(StoreError::Duplicate("employee_id".to_string()))
        );

        let found = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(found.employee_id, record.employee_id);
        assert_eq!(store.list_by_manager(manager).await.unwrap().len(), 1);

        assert!(store.delete(record.id).await.unwrap());
        assert!(!store.delete(record.id).await.unwrap());
    }
}
