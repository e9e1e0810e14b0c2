use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, ForbiddenReason, Resource};
use crate::application::cache::{Cache, keys};
use crate::domain::entities::subscription::{Subscription, billing_window};
use crate::use_cases::plan::PlanRepo;

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_active_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>>;
    /// Newest `start_date` first.
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Subscription>>;
    /// Deactivates the user's active row (if any, `end_date` = `start`) and inserts a
    /// fresh active one, atomically.
    async fn replace_active(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<Subscription>;
    /// Zeroes the counter and moves the window of an existing row.
    async fn renew(
        &self,
        subscription_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<Option<Subscription>>;
    /// Single-statement `operations_used + 1` on the active row. False when none exists.
    async fn increment_active(&self, user_id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDenial {
    NoActiveSubscription,
    QuotaExceeded,
}

impl From<QuotaDenial> for ForbiddenReason {
    fn from(denial: QuotaDenial) -> Self {
        match denial {
            QuotaDenial::NoActiveSubscription => ForbiddenReason::NoActiveSubscription,
            QuotaDenial::QuotaExceeded => ForbiddenReason::QuotaExceeded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed { remaining: i32 },
    Denied(QuotaDenial),
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    subscriptions: Arc<dyn SubscriptionRepo>,
    plans: Arc<dyn PlanRepo>,
    cache: Cache,
}

impl SubscriptionUseCases {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepo>,
        plans: Arc<dyn PlanRepo>,
        cache: Cache,
    ) -> Self {
        Self {
            subscriptions,
            plans,
            cache,
        }
    }

    /// Cached read of the user's active subscription; absence is not cached.
    #[instrument(skip(self))]
    pub async fn find_active(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let key = keys::active_subscription(user_id);
        if let Some(subscription) = self.cache.get::<Subscription>(&key).await {
            return Ok(Some(subscription));
        }
        let subscription = self.subscriptions.get_active_by_user(user_id).await?;
        if let Some(subscription) = &subscription {
            self.cache
                .set(&key, subscription, self.cache.ttl().subscription)
                .await;
        }
        Ok(subscription)
    }

    pub async fn get_active_subscription(&self, user_id: Uuid) -> AppResult<Subscription> {
        self.find_active(user_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Subscription))
    }

    /// Reads the store directly so a stale cache entry can never grant quota.
    #[instrument(skip(self))]
    pub async fn check_quota(&self, user_id: Uuid) -> AppResult<QuotaDecision> {
        let decision = match self.subscriptions.get_active_by_user(user_id).await? {
            None => QuotaDecision::Denied(QuotaDenial::NoActiveSubscription),
            Some(s) if !s.has_operations_remaining() => {
                QuotaDecision::Denied(QuotaDenial::QuotaExceeded)
            }
            Some(s) => QuotaDecision::Allowed {
                remaining: s.operations_remaining(),
            },
        };
        if let QuotaDecision::Denied(reason) = decision {
            tracing::warn!(user_id = %user_id, ?reason, "Quota check denied");
        }
        Ok(decision)
    }

    pub async fn ensure_quota(&self, user_id: Uuid) -> AppResult<i32> {
        match self.check_quota(user_id).await? {
            QuotaDecision::Allowed { remaining } => Ok(remaining),
            QuotaDecision::Denied(reason) => Err(AppError::Forbidden(reason.into())),
        }
    }

    /// Counts one completed operation. A missing subscription is not an error.
    #[instrument(skip(self))]
    pub async fn increment_usage(&self, user_id: Uuid) -> AppResult<bool> {
        let counted = self.subscriptions.increment_active(user_id).await?;
        self.cache.invalidate_subscription(user_id).await;
        if !counted {
            tracing::warn!(user_id = %user_id, "No active subscription to count operation against");
        }
        Ok(counted)
    }

    #[instrument(skip(self))]
    pub async fn upgrade(&self, user_id: Uuid, plan_id: Uuid) -> AppResult<Subscription> {
        let plan = self
            .plans
            .get_by_id(plan_id)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or(AppError::NotFound(Resource::Plan))?;

        let (start, end) = billing_window(Utc::now().naive_utc());
        let current = self.subscriptions.get_active_by_user(user_id).await?;

        let subscription = match current {
            Some(current) if current.plan_id == plan.id => {
                tracing::info!(user_id = %user_id, plan = %plan.name, "Renewing current plan");
                self.subscriptions
                    .renew(current.id, start, end)
                    .await?
                    .ok_or(AppError::NotFound(Resource::Subscription))?
            }
            current => {
                tracing::info!(
                    user_id = %user_id,
                    from = ?current.map(|c| c.plan_name),
                    to = %plan.name,
                    "Switching plan"
                );
                self.subscriptions
                    .replace_active(user_id, plan.id, start, end)
                    .await?
            }
        };

        self.cache.invalidate_subscription(user_id).await;
        Ok(subscription)
    }

    #[instrument(skip(self))]
    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<Subscription>> {
        self.subscriptions.list_by_user(user_id).await
    }

    /// Binds a user to the named plan when it exists and is live.
    #[instrument(skip(self))]
    pub async fn assign_default_plan(
        &self,
        user_id: Uuid,
        plan_name: &str,
    ) -> AppResult<Option<Subscription>> {
        let Some(plan) = self
            .plans
            .get_by_name(plan_name)
            .await?
            .filter(|p| !p.is_deleted)
        else {
            tracing::warn!(user_id = %user_id, plan_name, "Default plan unavailable; user left without subscription");
            return Ok(None);
        };
        let (start, end) = billing_window(Utc::now().naive_utc());
        let subscription = self
            .subscriptions
            .replace_active(user_id, plan.id, start, end)
            .await?;
        self.cache.invalidate_subscription(user_id).await;
        Ok(Some(subscription))
    }
}
