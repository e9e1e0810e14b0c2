use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::user::{User, UserCredentials},
    use_cases::user::{NewUser, UserChanges, UserRepo},
};

const SELECT_COLS: &str = "id, email, username, role, is_active, created_at";

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

impl PostgresPersistence {
    async fn fetch_user_by(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_user))
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.fetch_user_by("email", email).await
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.fetch_user_by("username", username).await
    }

    async fn get_credentials(&self, login: &str) -> AppResult<Option<UserCredentials>> {
        // Username match wins over an email match on another account. Emails are
        // stored lowercased.
        let row = sqlx::query(&format!(
            r#"SELECT {SELECT_COLS}, hashed_password FROM users
               WHERE username = $1 OR email = lower($1)
               ORDER BY (username = $1) DESC
               LIMIT 1"#
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(|row| UserCredentials {
            user: row_to_user(&row),
            hashed_password: row.get("hashed_password"),
        }))
    }

    async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM users ORDER BY created_at ASC, id ASC OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO users (id, email, username, hashed_password, role)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {SELECT_COLS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.hashed_password)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_user(&row))
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"UPDATE users SET
                   email = COALESCE($2, email),
                   username = COALESCE($3, username),
                   hashed_password = COALESCE($4, hashed_password),
                   role = COALESCE($5, role),
                   is_active = COALESCE($6, is_active)
               WHERE id = $1
               RETURNING {SELECT_COLS}"#
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.username)
        .bind(&changes.hashed_password)
        .bind(changes.role)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET is_active = $2 WHERE id = $1 RETURNING {SELECT_COLS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
