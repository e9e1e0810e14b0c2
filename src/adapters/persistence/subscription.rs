use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::subscription::Subscription,
    use_cases::subscription::SubscriptionRepo,
};

const SELECT_COLS: &str = r#"
    s.id, s.user_id, s.plan_id, s.operations_used, s.start_date, s.end_date, s.is_active,
    p.name AS plan_name, p.max_operations
"#;

fn row_to_subscription(row: sqlx::postgres::PgRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan_id: row.get("plan_id"),
        operations_used: row.get("operations_used"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        is_active: row.get("is_active"),
        plan_name: row.get("plan_name"),
        max_operations: row.get("max_operations"),
    }
}

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_active_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            r#"SELECT {SELECT_COLS}
               FROM subscriptions s JOIN plans p ON p.id = s.plan_id
               WHERE s.user_id = $1 AND s.is_active"#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_subscription))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {SELECT_COLS}
               FROM subscriptions s JOIN plans p ON p.id = s.plan_id
               WHERE s.user_id = $1
               ORDER BY s.start_date DESC, s.created_at DESC"#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_subscription).collect())
    }

    async fn replace_active(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<Subscription> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Row lock serializes concurrent upgrades for the same user.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::from)?;

        sqlx::query(
            r#"UPDATE subscriptions SET is_active = FALSE, end_date = $2
               WHERE user_id = $1 AND is_active"#,
        )
        .bind(user_id)
        .bind(start)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let row = sqlx::query(&format!(
            r#"WITH s AS (
                   INSERT INTO subscriptions
                       (id, user_id, plan_id, operations_used, start_date, end_date, is_active)
                   VALUES ($1, $2, $3, 0, $4, $5, TRUE)
                   RETURNING *
               )
               SELECT {SELECT_COLS} FROM s JOIN plans p ON p.id = s.plan_id"#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(plan_id)
        .bind(start)
        .bind(end)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_subscription(row))
    }

    async fn renew(
        &self,
        subscription_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            r#"WITH s AS (
                   UPDATE subscriptions
                   SET operations_used = 0, start_date = $2, end_date = $3
                   WHERE id = $1 AND is_active
                   RETURNING *
               )
               SELECT {SELECT_COLS} FROM s JOIN plans p ON p.id = s.plan_id"#
        ))
        .bind(subscription_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_subscription))
    }

    async fn increment_active(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"UPDATE subscriptions SET operations_used = operations_used + 1
               WHERE user_id = $1 AND is_active"#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
