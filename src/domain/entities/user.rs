use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user_role::UserRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
}

/// User plus the stored credential. Never cached or serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithSubscription {
    #[serde(flatten)]
    pub user: User,
    pub current_plan: Option<String>,
    pub operations_used: Option<i32>,
    pub operations_remaining: Option<i32>,
}
