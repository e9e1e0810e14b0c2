use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, Resource};
use crate::application::cache::{Cache, keys};
use crate::application::validators::{
    MIN_PASSWORD_LEN, is_valid_email, is_valid_password, is_valid_username,
};
use crate::domain::entities::subscription::Subscription;
use crate::domain::entities::user::{User, UserCredentials, UserWithSubscription};
use crate::domain::entities::user_role::UserRole;
use crate::use_cases::subscription::SubscriptionUseCases;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;
    /// Looks up by username first, then by email.
    async fn get_credentials(&self, login: &str) -> AppResult<Option<UserCredentials>>;
    async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<User>>;
    async fn create(&self, user: &NewUser) -> AppResult<User>;
    async fn update(&self, id: Uuid, changes: &UserChanges) -> AppResult<Option<User>>;
    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<User>>;
    /// Cascades to the user's subscriptions and operation records.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// One-way password hashing. Implementations are CPU bound and run off the reactor.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> AppResult<String>;
    fn verify(&self, password: &str, hash: &str) -> AppResult<bool>;
}

pub(crate) async fn hash_blocking(
    hasher: Arc<dyn CredentialHasher>,
    password: String,
) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
}

pub(crate) async fn verify_blocking(
    hasher: Arc<dyn CredentialHasher>,
    password: String,
    hash: String,
) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub role: UserRole,
}

/// Column-level partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub hashed_password: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

fn summarize(user: User, subscription: Option<&Subscription>) -> UserWithSubscription {
    UserWithSubscription {
        user,
        current_plan: subscription.map(|s| s.plan_name.clone()),
        operations_used: subscription.map(|s| s.operations_used),
        operations_remaining: subscription.map(Subscription::operations_remaining),
    }
}

#[derive(Clone)]
pub struct UserUseCases {
    users: Arc<dyn UserRepo>,
    subscriptions: SubscriptionUseCases,
    hasher: Arc<dyn CredentialHasher>,
    cache: Cache,
    default_plan_name: String,
}

impl UserUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        subscriptions: SubscriptionUseCases,
        hasher: Arc<dyn CredentialHasher>,
        cache: Cache,
        default_plan_name: String,
    ) -> Self {
        Self {
            users,
            subscriptions,
            hasher,
            cache,
            default_plan_name,
        }
    }

    /// Creates a `user`-role account and binds it to the default plan when one is live.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        let email = input.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if !is_valid_username(&input.username) {
            return Err(AppError::InvalidInput(
                "Username must be 3-100 letters, digits, '.', '_' or '-'".into(),
            ));
        }
        if !is_valid_password(&input.password) {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        if self.users.get_by_username(&input.username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".into()));
        }

        let hashed_password = hash_blocking(self.hasher.clone(), input.password).await?;
        let user = self
            .users
            .create(&NewUser {
                email,
                username: input.username,
                hashed_password,
                role: UserRole::User,
            })
            .await?;

        self.subscriptions
            .assign_default_plan(user.id, &self.default_plan_name)
            .await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        let key = keys::user_by_id(id);
        if let Some(user) = self.cache.get::<User>(&key).await {
            return Ok(user);
        }
        let user = self
            .users
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Resource::User))?;
        self.cache.set(&key, &user, self.cache.ttl().user).await;
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_user_with_subscription(&self, id: Uuid) -> AppResult<UserWithSubscription> {
        let key = keys::user_with_subscription(id);
        if let Some(view) = self.cache.get::<UserWithSubscription>(&key).await {
            return Ok(view);
        }
        let user = self.get_user(id).await?;
        let subscription = self.subscriptions.find_active(id).await?;
        let view = summarize(user, subscription.as_ref());
        self.cache.set(&key, &view, self.cache.ttl().user).await;
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn list_users_with_subscription(
        &self,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<UserWithSubscription>> {
        let users = self.users.list(skip.max(0), limit.clamp(1, 500)).await?;
        let mut views = Vec::with_capacity(users.len());
        for user in users {
            let subscription = self.subscriptions.find_active(user.id).await?;
            views.push(summarize(user, subscription.as_ref()));
        }
        Ok(views)
    }

    /// Administrative update; every field is honored.
    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: Uuid, input: UpdateUserInput) -> AppResult<User> {
        let current = self
            .users
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Resource::User))?;

        let mut changes = UserChanges {
            role: input.role,
            is_active: input.is_active,
            ..Default::default()
        };

        if let Some(email) = input.email.map(|e| e.trim().to_lowercase()) {
            if email != current.email {
                if !is_valid_email(&email) {
                    return Err(AppError::InvalidInput("Invalid email address".into()));
                }
                if self.users.get_by_email(&email).await?.is_some() {
                    return Err(AppError::Conflict("Email already in use".into()));
                }
                changes.email = Some(email);
            }
        }
        if let Some(username) = input.username {
            if username != current.username {
                if !is_valid_username(&username) {
                    return Err(AppError::InvalidInput("Invalid username".into()));
                }
                if self.users.get_by_username(&username).await?.is_some() {
                    return Err(AppError::Conflict("Username already taken".into()));
                }
                changes.username = Some(username);
            }
        }
        if let Some(password) = input.password {
            if !is_valid_password(&password) {
                return Err(AppError::InvalidInput(format!(
                    "Password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            changes.hashed_password = Some(hash_blocking(self.hasher.clone(), password).await?);
        }

        let user = self
            .users
            .update(id, &changes)
            .await?
            .ok_or(AppError::NotFound(Resource::User))?;
        self.cache.invalidate_user(id, false).await;
        Ok(user)
    }

    /// Self-service update. Role and activation changes are dropped.
    pub async fn update_own_profile(&self, id: Uuid, input: UpdateUserInput) -> AppResult<User> {
        if input.role.is_some() || input.is_active.is_some() {
            tracing::warn!(user_id = %id, "Ignoring role/is_active in self-service update");
        }
        let input = UpdateUserInput {
            role: None,
            is_active: None,
            ..input
        };
        self.update_user(id, input).await
    }

    #[instrument(skip(self))]
    pub async fn deactivate_user(&self, id: Uuid) -> AppResult<User> {
        let user = self
            .users
            .set_active(id, false)
            .await?
            .ok_or(AppError::NotFound(Resource::User))?;
        self.cache.invalidate_user(id, false).await;
        tracing::info!(user_id = %id, "User deactivated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound(Resource::User));
        }
        self.cache.invalidate_user(id, true).await;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
