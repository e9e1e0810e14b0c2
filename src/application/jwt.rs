use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::user_role::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

pub fn issue(
    user_id: Uuid,
    username: &str,
    role: UserRole,
    secret: &SecretString,
    ttl: Duration,
) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = Claims {
        user_id,
        username: username.to_string(),
        role,
        iat: now,
        exp: now + ttl.whole_seconds(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify(token: &str, secret: &SecretString) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn issued_token_verifies() {
        let user_id = Uuid::new_v4();
        let token = issue(user_id, "alice", UserRole::Admin, &secret("k1"), Duration::minutes(30))
            .unwrap();
        let claims = verify(&token, &secret("k1")).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(Uuid::new_v4(), "bob", UserRole::User, &secret("k1"), Duration::minutes(5))
            .unwrap();
        assert!(matches!(
            verify(&token, &secret("k2")),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue(Uuid::new_v4(), "bob", UserRole::User, &secret("k1"), Duration::minutes(-5))
            .unwrap();
        assert!(verify(&token, &secret("k1")).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify("not.a.jwt", &secret("k1")).is_err());
    }
}
