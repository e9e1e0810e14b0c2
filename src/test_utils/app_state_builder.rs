//! Test app state builder for HTTP-level testing.
//!
//! Wires every use case onto one `InMemoryPersistence`, with `PlainHasher`
//! standing in for Argon2 and the cache disabled unless a store is supplied.

use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::SecretString;
use time::Duration;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        cache::{Cache, CacheStore, CacheTtl},
        jwt,
    },
    domain::entities::user::User,
    infra::{config::AppConfig, setup::build_app_state},
    test_utils::{InMemoryPersistence, PlainHasher},
};

pub const TEST_JWT_SECRET: &str = "test-secret-with-enough-entropy-0123456789";

pub fn create_test_config(overrides: impl FnOnce(&mut AppConfig)) -> AppConfig {
    let mut config = AppConfig {
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        access_token_ttl: Duration::minutes(30),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        redis_url: "redis://unused".to_string(),
        cache_ttl: CacheTtl::default(),
        max_upload_bytes: 1024 * 1024,
        default_plan_name: "FREE".to_string(),
    };
    overrides(&mut config);
    config
}

/// Bearer token for `user`, signed with the test secret.
pub fn token_for(user: &User) -> String {
    jwt::issue(
        user.id,
        &user.username,
        user.role,
        &SecretString::new(TEST_JWT_SECRET.into()),
        Duration::minutes(30),
    )
    .unwrap()
}

pub fn bearer(user: &User) -> String {
    format!("Bearer {}", token_for(user))
}

/// Bearer token for an id that has no account behind it.
pub fn orphan_bearer() -> String {
    let token = jwt::issue(
        Uuid::new_v4(),
        "ghost",
        Default::default(),
        &SecretString::new(TEST_JWT_SECRET.into()),
        Duration::minutes(30),
    )
    .unwrap();
    format!("Bearer {token}")
}

pub struct TestAppStateBuilder {
    persistence: Arc<InMemoryPersistence>,
    cache: Cache,
    config: AppConfig,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            persistence: Arc::new(InMemoryPersistence::new()),
            cache: Cache::disabled(),
            config: create_test_config(|_| {}),
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<InMemoryPersistence>) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache = Cache::new(store, CacheTtl::default());
        self
    }

    pub fn with_config(mut self, overrides: impl FnOnce(&mut AppConfig)) -> Self {
        overrides(&mut self.config);
        self
    }

    pub fn build(self) -> AppState {
        build_app_state(
            self.config,
            self.persistence,
            self.cache,
            Arc::new(PlainHasher),
        )
    }
}
