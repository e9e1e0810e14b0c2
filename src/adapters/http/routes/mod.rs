pub mod auth;
pub mod image;
pub mod plan;
pub mod subscription;
pub mod user;

use axum::Router;
use serde::Deserialize;

use crate::adapters::http::app_state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", user::router())
        .nest("/plans", plan::router())
        .nest("/subscriptions", subscription::router())
        .nest("/images", image::router(state.config.max_upload_bytes))
}

/// `?skip=&limit=` query shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
}
