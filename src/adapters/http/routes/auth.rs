use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState, app_error::AppResult, use_cases::user::RegisterInput,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterInput>,
) -> AppResult<impl IntoResponse> {
    let user = app_state.user_use_cases.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// OAuth2 password-grant style form; `username` may also carry an email.
#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(
    State(app_state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    let token = app_state
        .auth_use_cases
        .login(&form.username, &form.password)
        .await?;
    Ok(Json(token))
}
