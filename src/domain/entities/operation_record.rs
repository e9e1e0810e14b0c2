use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use super::image_operation::ImageOperation;

/// One executed transform. Output bytes are only loaded for single-record reads.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub operation: ImageOperation,
    pub original_size: Option<String>,
    pub processed_size: Option<String>,
    #[serde(skip)]
    pub image_data: Option<Vec<u8>>,
    pub created_at: Option<NaiveDateTime>,
}
