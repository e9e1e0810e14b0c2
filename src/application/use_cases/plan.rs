use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, Resource};
use crate::application::cache::{Cache, keys};
use crate::application::validators::{MAX_PLAN_NAME_LEN, is_valid_plan_name};
use crate::domain::entities::plan::Plan;

/// Plan storage. Every read returns soft-deleted rows too; callers filter.
#[async_trait]
pub trait PlanRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>>;
    async fn get_by_name(&self, name: &str) -> AppResult<Option<Plan>>;
    async fn list_all(&self) -> AppResult<Vec<Plan>>;
    async fn create(&self, input: &CreatePlanInput) -> AppResult<Plan>;
    async fn update(&self, id: Uuid, input: &UpdatePlanInput) -> AppResult<Option<Plan>>;
    async fn soft_delete(&self, id: Uuid, at: NaiveDateTime) -> AppResult<Option<Plan>>;
    async fn restore(&self, id: Uuid) -> AppResult<Option<Plan>>;
    async fn hard_delete(&self, id: Uuid) -> AppResult<bool>;
    /// Active and historical subscriptions referencing the plan.
    async fn count_subscriptions(&self, id: Uuid) -> AppResult<i64>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanInput {
    pub name: String,
    pub max_operations: i32,
    pub price: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlanInput {
    pub name: Option<String>,
    pub max_operations: Option<i32>,
    pub price: Option<i32>,
    pub description: Option<String>,
}

fn validate_name(name: &str) -> AppResult<()> {
    if is_valid_plan_name(name) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Plan name must be 1-{MAX_PLAN_NAME_LEN} characters without surrounding whitespace"
        )))
    }
}

fn validate_limits(max_operations: Option<i32>, price: Option<i32>) -> AppResult<()> {
    if max_operations.is_some_and(|m| m <= 0) {
        return Err(AppError::InvalidInput("max_operations must be positive".into()));
    }
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::InvalidInput("price must not be negative".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PlanUseCases {
    repo: Arc<dyn PlanRepo>,
    cache: Cache,
}

impl PlanUseCases {
    pub fn new(repo: Arc<dyn PlanRepo>, cache: Cache) -> Self {
        Self { repo, cache }
    }

    #[instrument(skip(self))]
    pub async fn list_plans(&self, include_deleted: bool) -> AppResult<Vec<Plan>> {
        let plans = match self.cache.get::<Vec<Plan>>(keys::PLANS).await {
            Some(plans) => plans,
            None => {
                let plans = self.repo.list_all().await?;
                self.cache
                    .set(keys::PLANS, &plans, self.cache.ttl().plans)
                    .await;
                plans
            }
        };
        Ok(plans
            .into_iter()
            .filter(|p| p.is_visible(include_deleted))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_plan(&self, id: Uuid, include_deleted: bool) -> AppResult<Plan> {
        let key = keys::plan_by_id(id);
        let plan = match self.cache.get::<Plan>(&key).await {
            Some(plan) => Some(plan),
            None => {
                let plan = self.repo.get_by_id(id).await?;
                if let Some(plan) = &plan {
                    self.cache.set(&key, plan, self.cache.ttl().plans).await;
                }
                plan
            }
        };
        plan.filter(|p| p.is_visible(include_deleted))
            .ok_or(AppError::NotFound(Resource::Plan))
    }

    #[instrument(skip(self))]
    pub async fn get_plan_by_name(&self, name: &str, include_deleted: bool) -> AppResult<Plan> {
        let key = keys::plan_by_name(name);
        let plan = match self.cache.get::<Plan>(&key).await {
            Some(plan) => Some(plan),
            None => {
                let plan = self.repo.get_by_name(name).await?;
                if let Some(plan) = &plan {
                    self.cache.set(&key, plan, self.cache.ttl().plans).await;
                }
                plan
            }
        };
        plan.filter(|p| p.is_visible(include_deleted))
            .ok_or(AppError::NotFound(Resource::Plan))
    }

    #[instrument(skip(self))]
    pub async fn create_plan(&self, input: CreatePlanInput) -> AppResult<Plan> {
        validate_name(&input.name)?;
        validate_limits(Some(input.max_operations), Some(input.price))?;
        self.ensure_name_free(&input.name).await?;

        let plan = self.repo.create(&input).await?;
        self.cache.invalidate_plan(plan.id, false).await;
        tracing::info!(plan_id = %plan.id, name = %plan.name, "Plan created");
        Ok(plan)
    }

    #[instrument(skip(self))]
    pub async fn update_plan(&self, id: Uuid, input: UpdatePlanInput) -> AppResult<Plan> {
        let current = self
            .repo
            .get_by_id(id)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or(AppError::NotFound(Resource::Plan))?;

        if let Some(name) = &input.name {
            validate_name(name)?;
            if *name != current.name {
                self.ensure_name_free(name).await?;
            }
        }
        validate_limits(input.max_operations, input.price)?;

        let plan = self
            .repo
            .update(id, &input)
            .await?
            .ok_or(AppError::NotFound(Resource::Plan))?;
        self.cache.invalidate_plan(id, true).await;
        tracing::info!(plan_id = %id, "Plan updated");
        Ok(plan)
    }

    #[instrument(skip(self))]
    pub async fn soft_delete_plan(&self, id: Uuid) -> AppResult<Plan> {
        let live = self.repo.get_by_id(id).await?.filter(|p| !p.is_deleted);
        if live.is_none() {
            return Err(AppError::NotFound(Resource::Plan));
        }
        let plan = self
            .repo
            .soft_delete(id, Utc::now().naive_utc())
            .await?
            .ok_or(AppError::NotFound(Resource::Plan))?;
        self.cache.invalidate_plan(id, false).await;
        tracing::info!(plan_id = %id, "Plan soft deleted");
        Ok(plan)
    }

    #[instrument(skip(self))]
    pub async fn restore_plan(&self, id: Uuid) -> AppResult<Plan> {
        let current = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Plan))?;
        if !current.is_deleted {
            return Err(AppError::InvalidInput("Plan is not deleted".into()));
        }
        let plan = self
            .repo
            .restore(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Plan))?;
        self.cache.invalidate_plan(id, false).await;
        tracing::info!(plan_id = %id, "Plan restored");
        Ok(plan)
    }

    #[instrument(skip(self))]
    pub async fn hard_delete_plan(&self, id: Uuid) -> AppResult<()> {
        if self.repo.get_by_id(id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Plan));
        }
        let references = self.repo.count_subscriptions(id).await?;
        if references > 0 {
            tracing::warn!(plan_id = %id, references, "Refusing to hard delete referenced plan");
            return Err(AppError::ReferentialIntegrity(format!(
                "Plan is referenced by {references} subscription(s)"
            )));
        }
        if !self.repo.hard_delete(id).await? {
            return Err(AppError::NotFound(Resource::Plan));
        }
        self.cache.invalidate_plan(id, true).await;
        tracing::warn!(plan_id = %id, "Plan hard deleted");
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str) -> AppResult<()> {
        match self.repo.get_by_name(name).await? {
            Some(existing) if existing.is_deleted => Err(AppError::Conflict(format!(
                "Plan name '{name}' belongs to a deleted plan; restore it instead"
            ))),
            Some(_) => Err(AppError::Conflict(format!("Plan name '{name}' already exists"))),
            None => Ok(()),
        }
    }
}
