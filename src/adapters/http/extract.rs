use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, ForbiddenReason, Resource},
    domain::entities::user::User,
};

/// Active user resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Active user with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::InvalidCredentials)?;

        let claims = state
            .auth_use_cases
            .verify_token(bearer.token())
            .ok_or(AppError::InvalidCredentials)?;

        // A token that outlives its account is just an invalid token.
        let user = match state.user_use_cases.get_user(claims.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(Resource::User)) => return Err(AppError::InvalidCredentials),
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Err(AppError::Forbidden(ForbiddenReason::InactiveAccount));
        }
        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            tracing::warn!(user_id = %user.id, "Non-admin attempted an admin action");
            return Err(AppError::Forbidden(ForbiddenReason::AdminOnly));
        }
        Ok(AdminUser(user))
    }
}
