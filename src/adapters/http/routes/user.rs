use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{AdminUser, CurrentUser},
        routes::Pagination,
    },
    app_error::AppResult,
    use_cases::user::UpdateUserInput,
};

const DEFAULT_USER_PAGE: i64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_me).put(update_me))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/{id}/deactivate", post(deactivate_user))
}

async fn get_me(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let view = app_state
        .user_use_cases
        .get_user_with_subscription(user.id)
        .await?;
    Ok(Json(view))
}

async fn update_me(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateUserInput>,
) -> AppResult<impl IntoResponse> {
    let updated = app_state
        .user_use_cases
        .update_own_profile(user.id, payload)
        .await?;
    Ok(Json(updated))
}

async fn list_users(
    State(app_state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(page): Query<Pagination>,
) -> AppResult<impl IntoResponse> {
    let users = app_state
        .user_use_cases
        .list_users_with_subscription(page.skip, page.limit.unwrap_or(DEFAULT_USER_PAGE))
        .await?;
    Ok(Json(users))
}

async fn get_user(
    State(app_state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.user_use_cases.get_user_with_subscription(id).await?))
}

async fn update_user(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserInput>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(admin_id = %admin.id, user_id = %id, "Admin updating user");
    Ok(Json(app_state.user_use_cases.update_user(id, payload).await?))
}

async fn deactivate_user(
    State(app_state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.user_use_cases.deactivate_user(id).await?))
}

async fn delete_user(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    tracing::info!(admin_id = %admin.id, user_id = %id, "Admin deleting user");
    app_state.user_use_cases.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
