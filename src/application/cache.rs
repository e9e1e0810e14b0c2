//! Read-through cache facade.
//!
//! Use cases talk to [`Cache`], which wraps an optional [`CacheStore`]. Every
//! store failure is logged and swallowed so callers fall through to the
//! relational store; a `Cache` built with [`Cache::disabled`] is a pure
//! pass-through.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache command failed: {0}")]
    Command(String),
}

/// Key-value backend with TTL and prefix deletion.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
    /// Returns whether a key was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
    /// Returns the number of keys removed.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}

/// TTL classes for cached views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub plans: Duration,
    pub user: Duration,
    pub subscription: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            plans: Duration::from_secs(600),
            user: Duration::from_secs(300),
            subscription: Duration::from_secs(300),
        }
    }
}

pub mod keys {
    use uuid::Uuid;

    pub const PLANS: &str = "plans";
    pub const PLAN_NAME_PREFIX: &str = "plan:name:";
    pub const USER_WITH_SUBSCRIPTION_PREFIX: &str = "user:with_subscription:";
    pub const ACTIVE_SUBSCRIPTION_PREFIX: &str = "subscription:active:user:";

    pub fn plan_by_id(id: Uuid) -> String {
        format!("plan:id:{id}")
    }

    pub fn plan_by_name(name: &str) -> String {
        format!("{PLAN_NAME_PREFIX}{name}")
    }

    pub fn user_by_id(id: Uuid) -> String {
        format!("user:id:{id}")
    }

    pub fn user_with_subscription(id: Uuid) -> String {
        format!("{USER_WITH_SUBSCRIPTION_PREFIX}{id}")
    }

    pub fn active_subscription(user_id: Uuid) -> String {
        format!("{ACTIVE_SUBSCRIPTION_PREFIX}{user_id}")
    }
}

#[derive(Clone)]
pub struct Cache {
    store: Option<Arc<dyn CacheStore>>,
    ttl: CacheTtl,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: CacheTtl) -> Self {
        Self {
            store: Some(store),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        Self {
            store: None,
            ttl: CacheTtl::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache get failed");
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to encode cache entry");
                return false;
            }
        };
        match store.set_ex(key, raw, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache set failed");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        match store.delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache delete failed");
                false
            }
        }
    }

    pub async fn delete_by_prefix(&self, prefix: &str) -> u64 {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };
        match store.delete_by_prefix(prefix).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(prefix, error = %e, "Cache prefix delete failed");
                0
            }
        }
    }

    /// Drops every cached view derived from a plan row.
    pub async fn invalidate_plan(&self, plan_id: Uuid, affects_subscriptions: bool) {
        self.delete(keys::PLANS).await;
        self.delete(&keys::plan_by_id(plan_id)).await;
        self.delete_by_prefix(keys::PLAN_NAME_PREFIX).await;
        if affects_subscriptions {
            self.delete_by_prefix(keys::ACTIVE_SUBSCRIPTION_PREFIX).await;
            self.delete_by_prefix(keys::USER_WITH_SUBSCRIPTION_PREFIX).await;
        }
    }

    /// Drops the views that embed a user's quota state.
    pub async fn invalidate_subscription(&self, user_id: Uuid) {
        self.delete(&keys::active_subscription(user_id)).await;
        self.delete(&keys::user_with_subscription(user_id)).await;
    }

    pub async fn invalidate_user(&self, user_id: Uuid, deleted: bool) {
        self.delete(&keys::user_by_id(user_id)).await;
        self.delete(&keys::user_with_subscription(user_id)).await;
        if deleted {
            self.delete(&keys::active_subscription(user_id)).await;
        }
    }
}

/// Escapes Redis glob metacharacters so a prefix matches literally in `SCAN MATCH`.
pub fn escape_glob(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 4);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
