use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, extract::CurrentUser},
    app_error::AppResult,
    domain::entities::subscription::Subscription,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(available_plans))
        .route("/my-subscription", get(my_subscription))
        .route("/history", get(history))
        .route("/upgrade", post(upgrade))
}

#[derive(Serialize)]
struct SubscriptionResponse {
    #[serde(flatten)]
    subscription: Subscription,
    operations_remaining: i32,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            operations_remaining: subscription.operations_remaining(),
            subscription,
        }
    }
}

#[derive(Deserialize)]
struct UpgradeRequest {
    plan_id: Uuid,
}

async fn available_plans(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.plan_use_cases.list_plans(false).await?))
}

async fn my_subscription(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let subscription = app_state
        .subscription_use_cases
        .get_active_subscription(user.id)
        .await?;
    Ok(Json(SubscriptionResponse::from(subscription)))
}

async fn history(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let rows = app_state.subscription_use_cases.history(user.id).await?;
    let rows: Vec<SubscriptionResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(rows))
}

async fn upgrade(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpgradeRequest>,
) -> AppResult<impl IntoResponse> {
    let subscription = app_state
        .subscription_use_cases
        .upgrade(user.id, payload.plan_id)
        .await?;
    Ok((StatusCode::CREATED, Json(SubscriptionResponse::from(subscription))))
}
