use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, extract::CurrentUser, routes::Pagination},
    app_error::{AppError, AppResult},
    domain::entities::image_operation::ImageOperation,
    helpers::image_transform::TransformParams,
    use_cases::image::ProcessImageInput,
};

const DEFAULT_HISTORY_PAGE: i64 = 50;
const RECORD_ID_HEADER: HeaderName = HeaderName::from_static("x-operation-record-id");

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/process",
            post(process_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/history", get(history))
        .route("/{id}", get(get_record).delete(delete_record))
        .route("/{id}/download", get(download))
}

/// Multipart form after field parsing.
#[derive(Debug, Default)]
struct ProcessForm {
    file: Option<(String, Vec<u8>)>,
    operation: Option<ImageOperation>,
    params: TransformParams,
}

fn multipart_error(e: MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(limit)
    } else {
        AppError::InvalidInput(format!("Malformed multipart body: {}", e.body_text()))
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> AppResult<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| AppError::InvalidInput(format!("Field '{name}' must be an integer")))
}

async fn read_form(mut multipart: Multipart, limit: usize) -> AppResult<ProcessForm> {
    let mut form = ProcessForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
            form.file = Some((filename, bytes.to_vec()));
            continue;
        }

        let value = field.text().await.map_err(|e| multipart_error(e, limit))?;
        match name.as_str() {
            "operation" => {
                let op = ImageOperation::from_str(value.trim()).map_err(|_| {
                    AppError::InvalidInput(format!(
                        "Unknown operation '{value}'; expected crop, grayscale, sepia, resize, rotate or blur"
                    ))
                })?;
                form.operation = Some(op);
            }
            "width" => form.params.width = parse_number(&name, &value)?,
            "height" => form.params.height = parse_number(&name, &value)?,
            "x" => form.params.x = parse_number(&name, &value)?,
            "y" => form.params.y = parse_number(&name, &value)?,
            "angle" => form.params.angle = parse_number(&name, &value)?,
            "blur_radius" => form.params.blur_radius = parse_number(&name, &value)?,
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(form)
}

/// Keeps the name safe inside a quoted Content-Disposition value.
fn attachment_name(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect::<String>();
    if base.is_empty() {
        "processed_image".to_string()
    } else {
        format!("processed_{base}")
    }
}

fn attachment_headers(
    filename: &str,
    content_type: &'static str,
    record_id: Uuid,
) -> AppResult<HeaderMap> {
    let disposition = format!("attachment; filename=\"{}\"", attachment_name(filename));
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|e| AppError::Internal(e.to_string()))?,
    );
    headers.insert(
        RECORD_ID_HEADER,
        HeaderValue::from_str(&record_id.to_string())
            .map_err(|e| AppError::Internal(e.to_string()))?,
    );
    Ok(headers)
}

async fn process_image(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<impl IntoResponse> {
    let multipart = multipart.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let form = read_form(multipart, app_state.config.max_upload_bytes).await?;

    let (filename, bytes) = form
        .file
        .ok_or_else(|| AppError::InvalidInput("Missing 'file' field".into()))?;
    if bytes.is_empty() {
        return Err(AppError::InvalidInput("Uploaded file is empty".into()));
    }
    let operation = form
        .operation
        .ok_or_else(|| AppError::InvalidInput("Missing 'operation' field".into()))?;

    let processed = app_state
        .image_use_cases
        .process(
            user.id,
            ProcessImageInput {
                filename,
                bytes,
                operation,
                params: form.params,
            },
        )
        .await?;

    let headers = attachment_headers(
        &processed.record.filename,
        processed.content_type,
        processed.record.id,
    )?;
    Ok((headers, processed.bytes))
}

async fn history(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<Pagination>,
) -> AppResult<impl IntoResponse> {
    let page = app_state
        .image_use_cases
        .history(user.id, page.skip, page.limit.unwrap_or(DEFAULT_HISTORY_PAGE))
        .await?;
    Ok(Json(page))
}

async fn get_record(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.image_use_cases.get_record(user.id, id).await?))
}

async fn download(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let output = app_state.image_use_cases.get_output(user.id, id).await?;
    let headers = attachment_headers(&output.filename, output.content_type, id)?;
    Ok((headers, output.bytes))
}

async fn delete_record(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    app_state.image_use_cases.delete_record(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
