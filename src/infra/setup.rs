use std::fs::File;
use std::sync::Arc;

use sqlx::PgPool;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::cache::Cache,
    infra::{
        config::AppConfig, password::Argon2Hasher, postgres_persistence,
        redis_cache::RedisCacheStore,
    },
    use_cases::{
        auth::AuthUseCases,
        image::{ImageUseCases, OperationRecordRepo},
        plan::{PlanRepo, PlanUseCases},
        subscription::{SubscriptionRepo, SubscriptionUseCases},
        user::{CredentialHasher, UserRepo, UserUseCases},
    },
};

pub async fn init_app_state() -> anyhow::Result<(AppState, PgPool)> {
    let config = AppConfig::from_env();

    let postgres = Arc::new(
        postgres_persistence(&config.database_url, config.db_max_connections).await?,
    );
    let pool = postgres.pool().clone();

    let cache = match RedisCacheStore::connect(&config.redis_url).await {
        Ok(store) => {
            tracing::info!("Connected to Redis cache");
            Cache::new(Arc::new(store), config.cache_ttl)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unreachable; running without cache");
            Cache::disabled()
        }
    };

    let state = build_app_state(config, postgres, cache, Arc::new(Argon2Hasher::default()));
    Ok((state, pool))
}

/// Wires every use case onto one persistence backend.
pub fn build_app_state<P>(
    config: AppConfig,
    persistence: Arc<P>,
    cache: Cache,
    hasher: Arc<dyn CredentialHasher>,
) -> AppState
where
    P: PlanRepo + SubscriptionRepo + UserRepo + OperationRecordRepo + 'static,
{
    let plan_repo = persistence.clone() as Arc<dyn PlanRepo>;
    let subscription_repo = persistence.clone() as Arc<dyn SubscriptionRepo>;
    let user_repo = persistence.clone() as Arc<dyn UserRepo>;
    let record_repo = persistence as Arc<dyn OperationRecordRepo>;

    let plan_use_cases = PlanUseCases::new(plan_repo.clone(), cache.clone());
    let subscription_use_cases =
        SubscriptionUseCases::new(subscription_repo, plan_repo, cache.clone());
    let user_use_cases = UserUseCases::new(
        user_repo.clone(),
        subscription_use_cases.clone(),
        hasher.clone(),
        cache,
        config.default_plan_name.clone(),
    );
    let auth_use_cases = AuthUseCases::new(
        user_repo,
        hasher,
        config.jwt_secret.clone(),
        config.access_token_ttl,
    );
    let image_use_cases = ImageUseCases::new(record_repo, subscription_use_cases.clone());

    AppState {
        config: Arc::new(config),
        plan_use_cases: Arc::new(plan_use_cases),
        subscription_use_cases: Arc::new(subscription_use_cases),
        user_use_cases: Arc::new(user_use_cases),
        auth_use_cases: Arc::new(auth_use_cases),
        image_use_cases: Arc::new(image_use_cases),
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pixelgate=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs)
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("cannot create app.log, JSON logs disabled: {e}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
