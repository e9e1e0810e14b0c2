use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::operation_record::OperationRecord,
    use_cases::image::{NewOperationRecord, OperationRecordRepo},
};

const SELECT_COLS: &str =
    "id, user_id, filename, operation, original_size, processed_size, image_data, created_at";

// Listings skip the stored bytes.
const LIST_COLS: &str = "id, user_id, filename, operation, original_size, processed_size, \
                         NULL::bytea AS image_data, created_at";

fn row_to_record(row: sqlx::postgres::PgRow) -> OperationRecord {
    OperationRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        filename: row.get("filename"),
        operation: row.get("operation"),
        original_size: row.get("original_size"),
        processed_size: row.get("processed_size"),
        image_data: row.get("image_data"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl OperationRecordRepo for PostgresPersistence {
    async fn create(&self, record: &NewOperationRecord) -> AppResult<OperationRecord> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO operation_records
                   (id, user_id, filename, operation, original_size, processed_size, image_data)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {LIST_COLS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(record.user_id)
        .bind(&record.filename)
        .bind(record.operation)
        .bind(&record.original_size)
        .bind(&record.processed_size)
        .bind(&record.image_data)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_record(row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<OperationRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM operation_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_record))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<OperationRecord>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {LIST_COLS} FROM operation_records
               WHERE user_id = $1
               ORDER BY created_at DESC, id DESC
               OFFSET $2 LIMIT $3"#
        ))
        .bind(user_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM operation_records WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.get("n"))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM operation_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
