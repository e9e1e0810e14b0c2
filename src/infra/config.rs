use std::net::SocketAddr;

use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;

use crate::application::cache::CacheTtl;

pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub redis_url: String,
    pub cache_ttl: CacheTtl,
    /// Upper bound for a buffered image upload.
    pub max_upload_bytes: usize,
    /// Plan bound to every newly registered user, when it exists and is live.
    pub default_plan_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url: String = get_env("DATABASE_URL");
        let db_max_connections: u32 = get_env_default("DB_MAX_CONNECTIONS", 5);
        let jwt_secret = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let access_token_ttl_minutes: i64 = get_env_default("ACCESS_TOKEN_TTL_MINUTES", 30);
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8000)));
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());

        let cache_ttl = CacheTtl {
            plans: std::time::Duration::from_secs(get_env_default("CACHE_TTL_PLANS_SECS", 600)),
            user: std::time::Duration::from_secs(get_env_default("CACHE_TTL_USER_SECS", 300)),
            subscription: std::time::Duration::from_secs(get_env_default(
                "CACHE_TTL_SUBSCRIPTION_SECS",
                300,
            )),
        };

        let max_upload_bytes: usize = get_env_default("MAX_UPLOAD_BYTES", 10 * 1024 * 1024);
        let default_plan_name: String = get_env_default("DEFAULT_PLAN_NAME", "FREE".to_string());

        Self {
            database_url,
            db_max_connections,
            jwt_secret,
            access_token_ttl: Duration::minutes(access_token_ttl_minutes),
            bind_addr,
            redis_url,
            cache_ttl,
            max_upload_bytes,
            default_plan_name,
        }
    }
}
