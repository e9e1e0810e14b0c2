use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = ?self, "Request failed");
            }
            AppError::Forbidden(_) | AppError::ReferentialIntegrity(_) | AppError::Conflict(_) => {
                tracing::warn!(error = %self, "Request rejected");
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        match self {
            AppError::Database(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError, None)
            }
            AppError::NotFound(resource) => error_resp(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                Some(format!("{resource} not found")),
            ),
            AppError::Conflict(msg) => {
                error_resp(StatusCode::CONFLICT, ErrorCode::Conflict, Some(msg))
            }
            AppError::Forbidden(reason) => error_resp(
                StatusCode::FORBIDDEN,
                reason.into(),
                Some(reason.message().to_string()),
            ),
            AppError::ReferentialIntegrity(msg) => {
                error_resp(StatusCode::CONFLICT, ErrorCode::ReferentialIntegrity, Some(msg))
            }
            AppError::Processing(msg) => error_resp(
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::ProcessingFailed,
                Some(msg),
            ),
            AppError::InvalidCredentials => {
                let mut resp = error_resp(
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::InvalidCredentials,
                    Some("Incorrect username or password, or invalid token".into()),
                );
                resp.headers_mut().insert(
                    axum::http::header::WWW_AUTHENTICATE,
                    axum::http::HeaderValue::from_static("Bearer"),
                );
                resp
            }
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::PayloadTooLarge(limit) => error_resp(
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorCode::PayloadTooLarge,
                Some(format!("Upload exceeds the {limit} byte limit")),
            ),
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, None)
            }
        }
    }
}

pub(crate) fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
