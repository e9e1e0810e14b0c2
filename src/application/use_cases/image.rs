use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, ForbiddenReason, Resource};
use crate::application::helpers::image_transform::{self, TransformParams};
use crate::domain::entities::image_operation::ImageOperation;
use crate::domain::entities::operation_record::OperationRecord;
use crate::use_cases::subscription::SubscriptionUseCases;

#[async_trait]
pub trait OperationRecordRepo: Send + Sync {
    async fn create(&self, record: &NewOperationRecord) -> AppResult<OperationRecord>;
    /// Includes stored output bytes.
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<OperationRecord>>;
    /// Newest first, without output bytes.
    async fn list_by_user(&self, user_id: Uuid, skip: i64, limit: i64)
    -> AppResult<Vec<OperationRecord>>;
    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct NewOperationRecord {
    pub user_id: Uuid,
    pub filename: String,
    pub operation: ImageOperation,
    pub original_size: String,
    pub processed_size: String,
    pub image_data: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct ProcessImageInput {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub operation: ImageOperation,
    pub params: TransformParams,
}

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub record: OperationRecord,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordPage {
    pub items: Vec<OperationRecord>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct StoredOutput {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

fn content_type_of(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

#[derive(Clone)]
pub struct ImageUseCases {
    records: Arc<dyn OperationRecordRepo>,
    subscriptions: SubscriptionUseCases,
}

impl ImageUseCases {
    pub fn new(records: Arc<dyn OperationRecordRepo>, subscriptions: SubscriptionUseCases) -> Self {
        Self {
            records,
            subscriptions,
        }
    }

    /// Quota check, transform, record, count. Only a persisted result consumes quota.
    #[instrument(skip(self, input), fields(operation = %input.operation, filename = %input.filename))]
    pub async fn process(&self, user_id: Uuid, input: ProcessImageInput) -> AppResult<ProcessedImage> {
        self.subscriptions.ensure_quota(user_id).await?;

        let ProcessImageInput {
            filename,
            bytes,
            operation,
            params,
        } = input;

        let (original_size, processed_size, output, format) =
            tokio::task::spawn_blocking(move || {
                let (img, format) = image_transform::decode(&bytes)?;
                let original_size = image_transform::dimensions_label(&img);
                let processed = image_transform::apply(&img, operation, &params)?;
                let processed_size = image_transform::dimensions_label(&processed);
                let (output, format) = image_transform::encode(&processed, format)?;
                Ok::<_, image_transform::TransformError>((
                    original_size,
                    processed_size,
                    output,
                    format,
                ))
            })
            .await
            .map_err(|e| AppError::Internal(format!("transform task failed: {e}")))?
            .map_err(|e| {
                tracing::warn!(user_id = %user_id, error = %e, "Image processing failed");
                AppError::from(e)
            })?;

        let record = self
            .records
            .create(&NewOperationRecord {
                user_id,
                filename,
                operation,
                original_size,
                processed_size,
                image_data: Some(output.clone()),
            })
            .await?;

        // The transform already happened; a counting failure must not fail the request.
        if let Err(e) = self.subscriptions.increment_usage(user_id).await {
            tracing::error!(user_id = %user_id, record_id = %record.id, error = %e, "Failed to count operation");
        }

        tracing::info!(
            user_id = %user_id,
            record_id = %record.id,
            original = record.original_size.as_deref().unwrap_or_default(),
            processed = record.processed_size.as_deref().unwrap_or_default(),
            "Image processed"
        );
        Ok(ProcessedImage {
            record: OperationRecord {
                image_data: None,
                ..record
            },
            bytes: output,
            content_type: format.to_mime_type(),
        })
    }

    #[instrument(skip(self))]
    pub async fn history(&self, user_id: Uuid, skip: i64, limit: i64) -> AppResult<RecordPage> {
        let items = self
            .records
            .list_by_user(user_id, skip.max(0), limit.clamp(1, 200))
            .await?;
        let total = self.records.count_by_user(user_id).await?;
        Ok(RecordPage { items, total })
    }

    #[instrument(skip(self))]
    pub async fn get_record(&self, user_id: Uuid, record_id: Uuid) -> AppResult<OperationRecord> {
        let record = self.owned_record(user_id, record_id).await?;
        Ok(OperationRecord {
            image_data: None,
            ..record
        })
    }

    #[instrument(skip(self))]
    pub async fn get_output(&self, user_id: Uuid, record_id: Uuid) -> AppResult<StoredOutput> {
        let record = self.owned_record(user_id, record_id).await?;
        let bytes = record
            .image_data
            .ok_or(AppError::NotFound(Resource::OperationRecord))?;
        Ok(StoredOutput {
            filename: record.filename,
            content_type: content_type_of(&bytes),
            bytes,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_record(&self, user_id: Uuid, record_id: Uuid) -> AppResult<()> {
        self.owned_record(user_id, record_id).await?;
        if !self.records.delete(record_id).await? {
            return Err(AppError::NotFound(Resource::OperationRecord));
        }
        tracing::info!(user_id = %user_id, record_id = %record_id, "Operation record deleted");
        Ok(())
    }

    async fn owned_record(&self, user_id: Uuid, record_id: Uuid) -> AppResult<OperationRecord> {
        let record = self
            .records
            .get_by_id(record_id)
            .await?
            .ok_or(AppError::NotFound(Resource::OperationRecord))?;
        if record.user_id != user_id {
            tracing::warn!(user_id = %user_id, record_id = %record_id, "Access to foreign operation record");
            return Err(AppError::Forbidden(ForbiddenReason::NotOwner));
        }
        Ok(record)
    }
}
