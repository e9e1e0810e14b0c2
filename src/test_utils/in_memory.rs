//! One in-memory store behind every repository trait, with the same unique,
//! foreign-key and one-active-subscription rules as the database schema.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::{
    operation_record::OperationRecord,
    plan::Plan,
    subscription::{Subscription, billing_window},
    user::{User, UserCredentials},
};
use crate::use_cases::{
    image::{NewOperationRecord, OperationRecordRepo},
    plan::{CreatePlanInput, PlanRepo, UpdatePlanInput},
    subscription::SubscriptionRepo,
    user::{NewUser, UserChanges, UserRepo},
};

#[derive(Debug, Clone)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: Uuid,
    operations_used: i32,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    is_active: bool,
    seq: u64,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, (User, String)>,
    plans: HashMap<Uuid, Plan>,
    subscriptions: Vec<SubscriptionRow>,
    records: Vec<(OperationRecord, u64)>,
    seq: u64,
    plan_reads: usize,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn view(&self, row: &SubscriptionRow) -> Subscription {
        let plan = &self.plans[&row.plan_id];
        Subscription {
            id: row.id,
            user_id: row.user_id,
            plan_id: row.plan_id,
            operations_used: row.operations_used,
            start_date: row.start_date,
            end_date: row.end_date,
            is_active: row.is_active,
            plan_name: plan.name.clone(),
            max_operations: plan.max_operations,
        }
    }

    fn insert_subscription_row(
        &mut self,
        user_id: Uuid,
        plan_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<Subscription> {
        if !self.users.contains_key(&user_id) || !self.plans.contains_key(&plan_id) {
            return Err(AppError::ReferentialIntegrity("Referenced record not found".into()));
        }
        let seq = self.next_seq();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            operations_used: 0,
            start_date: start,
            end_date: end,
            is_active: true,
            seq,
        };
        let view = self.view(&row);
        self.subscriptions.push(row);
        Ok(view)
    }
}

#[derive(Default)]
pub struct InMemoryPersistence {
    state: Mutex<State>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_plan(&self, plan: Plan) -> Plan {
        self.state
            .lock()
            .unwrap()
            .plans
            .insert(plan.id, plan.clone());
        plan
    }

    pub fn insert_user(&self, user: User) -> User {
        self.insert_user_with_password(user, "plain$password")
    }

    pub fn insert_user_with_password(&self, user: User, hashed_password: &str) -> User {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(user.id, (user.clone(), hashed_password.to_string()));
        user
    }

    /// Inserts a row directly, bypassing the one-active rule when `active` is false.
    pub fn insert_subscription(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        operations_used: i32,
        active: bool,
    ) -> Subscription {
        let mut state = self.state.lock().unwrap();
        if active {
            for row in state.subscriptions.iter_mut().filter(|r| r.user_id == user_id) {
                row.is_active = false;
            }
        }
        let (start, end) = billing_window(chrono::Utc::now().naive_utc());
        let seq = state.next_seq();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            operations_used,
            start_date: start,
            end_date: end,
            is_active: active,
            seq,
        };
        let view = state.view(&row);
        state.subscriptions.push(row);
        view
    }

    pub fn set_operations_used(&self, user_id: Uuid, operations_used: i32) {
        let mut state = self.state.lock().unwrap();
        if let Some(row) = state
            .subscriptions
            .iter_mut()
            .find(|r| r.user_id == user_id && r.is_active)
        {
            row.operations_used = operations_used;
        }
    }

    /// Number of plan lookups that reached the store.
    pub fn plan_reads(&self) -> usize {
        self.state.lock().unwrap().plan_reads
    }

    pub fn credentials_of(&self, username: &str) -> Option<UserCredentials> {
        let state = self.state.lock().unwrap();
        state
            .users
            .values()
            .find(|(u, _)| u.username == username)
            .map(|(user, hash)| UserCredentials {
                user: user.clone(),
                hashed_password: hash.clone(),
            })
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn active_subscription_count(&self, user_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .filter(|r| r.user_id == user_id && r.is_active)
            .count()
    }
}

#[async_trait]
impl PlanRepo for InMemoryPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        let mut state = self.state.lock().unwrap();
        state.plan_reads += 1;
        Ok(state.plans.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        let mut state = self.state.lock().unwrap();
        state.plan_reads += 1;
        Ok(state.plans.values().find(|p| p.name == name).cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<Plan>> {
        let mut state = self.state.lock().unwrap();
        state.plan_reads += 1;
        let mut plans: Vec<Plan> = state.plans.values().cloned().collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        Ok(plans)
    }

    async fn create(&self, input: &CreatePlanInput) -> AppResult<Plan> {
        let mut state = self.state.lock().unwrap();
        if state.plans.values().any(|p| p.name == input.name) {
            return Err(AppError::Conflict("A record with this value already exists".into()));
        }
        let plan = Plan {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            max_operations: input.max_operations,
            price: input.price,
            description: input.description.clone(),
            is_deleted: false,
            deleted_at: None,
            created_at: Some(chrono::Utc::now().naive_utc()),
        };
        state.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn update(&self, id: Uuid, input: &UpdatePlanInput) -> AppResult<Option<Plan>> {
        let mut state = self.state.lock().unwrap();
        if let Some(name) = &input.name {
            if state.plans.values().any(|p| p.id != id && p.name == *name) {
                return Err(AppError::Conflict("A record with this value already exists".into()));
            }
        }
        let Some(plan) = state.plans.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            plan.name = name.clone();
        }
        if let Some(max) = input.max_operations {
            plan.max_operations = max;
        }
        if let Some(price) = input.price {
            plan.price = price;
        }
        if let Some(description) = &input.description {
            plan.description = Some(description.clone());
        }
        Ok(Some(plan.clone()))
    }

    async fn soft_delete(&self, id: Uuid, at: NaiveDateTime) -> AppResult<Option<Plan>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.plans.get_mut(&id).map(|plan| {
            plan.is_deleted = true;
            plan.deleted_at = Some(at);
            plan.clone()
        }))
    }

    async fn restore(&self, id: Uuid) -> AppResult<Option<Plan>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.plans.get_mut(&id).map(|plan| {
            plan.is_deleted = false;
            plan.deleted_at = None;
            plan.clone()
        }))
    }

    async fn hard_delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.subscriptions.iter().any(|r| r.plan_id == id) {
            return Err(AppError::ReferentialIntegrity("Plan is still referenced".into()));
        }
        Ok(state.plans.remove(&id).is_some())
    }

    async fn count_subscriptions(&self, id: Uuid) -> AppResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.subscriptions.iter().filter(|r| r.plan_id == id).count() as i64)
    }
}

#[async_trait]
impl SubscriptionRepo for InMemoryPersistence {
    async fn get_active_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .subscriptions
            .iter()
            .find(|r| r.user_id == user_id && r.is_active)
            .map(|r| state.view(r)))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Subscription>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<&SubscriptionRow> = state
            .subscriptions
            .iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.seq.cmp(&a.seq)));
        Ok(rows.into_iter().map(|r| state.view(r)).collect())
    }

    async fn replace_active(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<Subscription> {
        let mut state = self.state.lock().unwrap();
        if !state.plans.contains_key(&plan_id) {
            return Err(AppError::ReferentialIntegrity("Referenced record not found".into()));
        }
        for row in state
            .subscriptions
            .iter_mut()
            .filter(|r| r.user_id == user_id && r.is_active)
        {
            row.is_active = false;
            row.end_date = start;
        }
        state.insert_subscription_row(user_id, plan_id, start, end)
    }

    async fn renew(
        &self,
        subscription_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<Option<Subscription>> {
        let mut state = self.state.lock().unwrap();
        let Some(row) = state
            .subscriptions
            .iter_mut()
            .find(|r| r.id == subscription_id && r.is_active)
        else {
            return Ok(None);
        };
        row.operations_used = 0;
        row.start_date = start;
        row.end_date = end;
        let row = row.clone();
        Ok(Some(state.view(&row)))
    }

    async fn increment_active(&self, user_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .subscriptions
            .iter_mut()
            .find(|r| r.user_id == user_id && r.is_active)
        {
            Some(row) => {
                row.operations_used += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepo for InMemoryPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|(u, _)| u.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|(u, _)| u.username == username)
            .map(|(u, _)| u.clone()))
    }

    async fn get_credentials(&self, login: &str) -> AppResult<Option<UserCredentials>> {
        let state = self.state.lock().unwrap();
        let found = state
            .users
            .values()
            .find(|(u, _)| u.username == login)
            .or_else(|| {
                let email = login.to_lowercase();
                state.users.values().find(|(u, _)| u.email == email)
            });
        Ok(found.map(|(user, hash)| UserCredentials {
            user: user.clone(),
            hashed_password: hash.clone(),
        }))
    }

    async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<User>> {
        let state = self.state.lock().unwrap();
        let mut users: Vec<User> = state.users.values().map(|(u, _)| u.clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        let mut state = self.state.lock().unwrap();
        if state
            .users
            .values()
            .any(|(u, _)| u.email == new_user.email || u.username == new_user.username)
        {
            return Err(AppError::Conflict("A record with this value already exists".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            username: new_user.username.clone(),
            role: new_user.role,
            is_active: true,
            created_at: Some(chrono::Utc::now().naive_utc()),
        };
        state
            .users
            .insert(user.id, (user.clone(), new_user.hashed_password.clone()));
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> AppResult<Option<User>> {
        let mut state = self.state.lock().unwrap();
        let taken = state.users.values().any(|(u, _)| {
            u.id != id
                && (changes.email.as_deref() == Some(u.email.as_str())
                    || changes.username.as_deref() == Some(u.username.as_str()))
        });
        if taken {
            return Err(AppError::Conflict("A record with this value already exists".into()));
        }
        let Some((user, hash)) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(hashed) = &changes.hashed_password {
            *hash = hashed.clone();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(active) = changes.is_active {
            user.is_active = active;
        }
        Ok(Some(user.clone()))
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<User>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.users.get_mut(&id).map(|(user, _)| {
            user.is_active = is_active;
            user.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.subscriptions.retain(|r| r.user_id != id);
        state.records.retain(|(r, _)| r.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl OperationRecordRepo for InMemoryPersistence {
    async fn create(&self, new_record: &NewOperationRecord) -> AppResult<OperationRecord> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(&new_record.user_id) {
            return Err(AppError::ReferentialIntegrity("Referenced record not found".into()));
        }
        let record = OperationRecord {
            id: Uuid::new_v4(),
            user_id: new_record.user_id,
            filename: new_record.filename.clone(),
            operation: new_record.operation,
            original_size: Some(new_record.original_size.clone()),
            processed_size: Some(new_record.processed_size.clone()),
            image_data: new_record.image_data.clone(),
            created_at: Some(chrono::Utc::now().naive_utc()),
        };
        let seq = state.next_seq();
        state.records.push((record.clone(), seq));
        Ok(record)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<OperationRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .find(|(r, _)| r.id == id)
            .map(|(r, _)| r.clone()))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<OperationRecord>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<&(OperationRecord, u64)> = state
            .records
            .iter()
            .filter(|(r, _)| r.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at).then(b.1.cmp(&a.1)));
        Ok(rows
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|(r, _)| OperationRecord {
                image_data: None,
                ..r.clone()
            })
            .collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .filter(|(r, _)| r.user_id == user_id)
            .count() as i64)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.records.len();
        state.records.retain(|(r, _)| r.id != id);
        Ok(state.records.len() != before)
    }
}
