use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use tracing::instrument;

use crate::app_error::{AppError, AppResult, ForbiddenReason};
use crate::application::jwt::{self, Claims};
use crate::use_cases::user::{CredentialHasher, UserRepo, verify_blocking};

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Clone)]
pub struct AuthUseCases {
    users: Arc<dyn UserRepo>,
    hasher: Arc<dyn CredentialHasher>,
    jwt_secret: SecretString,
    token_ttl: time::Duration,
}

impl AuthUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        hasher: Arc<dyn CredentialHasher>,
        jwt_secret: SecretString,
        token_ttl: time::Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            jwt_secret,
            token_ttl,
        }
    }

    /// `login` may be a username or an email address.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &str) -> AppResult<AccessToken> {
        let Some(creds) = self.users.get_credentials(login.trim()).await? else {
            tracing::info!("Login for unknown account");
            return Err(AppError::InvalidCredentials);
        };

        let valid = verify_blocking(
            self.hasher.clone(),
            password.to_string(),
            creds.hashed_password,
        )
        .await?;
        if !valid {
            tracing::info!(user_id = %creds.user.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }
        if !creds.user.is_active {
            return Err(AppError::Forbidden(ForbiddenReason::InactiveAccount));
        }

        let access_token = jwt::issue(
            creds.user.id,
            &creds.user.username,
            creds.user.role,
            &self.jwt_secret,
            self.token_ttl,
        )?;
        tracing::info!(user_id = %creds.user.id, "User logged in");
        Ok(AccessToken {
            access_token,
            token_type: "bearer",
        })
    }

    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        jwt::verify(token, &self.jwt_secret).ok()
    }
}
