use sqlx::PgPool;

use crate::app_error::{AppError, Resource};

pub mod operation_record;
pub mod plan;
pub mod subscription;
pub mod user;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound(Resource::Record),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("A record with this value already exists".into())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::ReferentialIntegrity("Record is referenced by other records".into())
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                AppError::InvalidInput("Value out of range".into())
            }
            _ => {
                // Details stay in the log.
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
