use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::plan::Plan,
    use_cases::plan::{CreatePlanInput, PlanRepo, UpdatePlanInput},
};

const SELECT_COLS: &str =
    "id, name, max_operations, price, description, is_deleted, deleted_at, created_at";

fn row_to_plan(row: sqlx::postgres::PgRow) -> Plan {
    Plan {
        id: row.get("id"),
        name: row.get("name"),
        max_operations: row.get("max_operations"),
        price: row.get("price"),
        description: row.get("description"),
        is_deleted: row.get("is_deleted"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl PlanRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM plans WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn get_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM plans WHERE name = $1"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn list_all(&self) -> AppResult<Vec<Plan>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM plans ORDER BY price ASC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_plan).collect())
    }

    async fn create(&self, input: &CreatePlanInput) -> AppResult<Plan> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO plans (id, name, max_operations, price, description)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {SELECT_COLS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.max_operations)
        .bind(input.price)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_plan(row))
    }

    async fn update(&self, id: Uuid, input: &UpdatePlanInput) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!(
            r#"UPDATE plans SET
                   name = COALESCE($2, name),
                   max_operations = COALESCE($3, max_operations),
                   price = COALESCE($4, price),
                   description = COALESCE($5, description)
               WHERE id = $1
               RETURNING {SELECT_COLS}"#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(input.max_operations)
        .bind(input.price)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn soft_delete(&self, id: Uuid, at: NaiveDateTime) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!(
            r#"UPDATE plans SET is_deleted = TRUE, deleted_at = $2
               WHERE id = $1
               RETURNING {SELECT_COLS}"#
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn restore(&self, id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!(
            r#"UPDATE plans SET is_deleted = FALSE, deleted_at = NULL
               WHERE id = $1
               RETURNING {SELECT_COLS}"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn hard_delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_subscriptions(&self, id: Uuid) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM subscriptions WHERE plan_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.get("n"))
    }
}
