use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, extract::AdminUser},
    app_error::AppResult,
    use_cases::plan::{CreatePlanInput, UpdatePlanInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/{id}", get(get_plan).put(update_plan))
        .route("/{id}/soft", delete(soft_delete_plan))
        .route("/{id}/restore", post(restore_plan))
        .route("/{id}/hard", delete(hard_delete_plan))
}

#[derive(Debug, Deserialize)]
struct ListPlansQuery {
    #[serde(default)]
    include_deleted: bool,
}

async fn list_plans(
    State(app_state): State<AppState>,
    Query(query): Query<ListPlansQuery>,
) -> AppResult<impl IntoResponse> {
    let plans = app_state
        .plan_use_cases
        .list_plans(query.include_deleted)
        .await?;
    Ok(Json(plans))
}

async fn get_plan(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.plan_use_cases.get_plan(id, false).await?))
}

async fn create_plan(
    State(app_state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(payload): Json<CreatePlanInput>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state.plan_use_cases.create_plan(payload).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn update_plan(
    State(app_state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanInput>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.plan_use_cases.update_plan(id, payload).await?))
}

async fn soft_delete_plan(
    State(app_state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.plan_use_cases.soft_delete_plan(id).await?))
}

async fn restore_plan(
    State(app_state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.plan_use_cases.restore_plan(id).await?))
}

async fn hard_delete_plan(
    State(app_state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    app_state.plan_use_cases.hard_delete_plan(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
