use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named quota/price tier. Rows are cached as-is, including soft-deleted ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub max_operations: i32,
    /// Smallest currency unit.
    pub price: i32,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
}

impl Plan {
    pub fn is_visible(&self, include_deleted: bool) -> bool {
        include_deleted || !self.is_deleted
    }
}
