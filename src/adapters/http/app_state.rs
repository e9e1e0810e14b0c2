use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{
        auth::AuthUseCases, image::ImageUseCases, plan::PlanUseCases,
        subscription::SubscriptionUseCases, user::UserUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub plan_use_cases: Arc<PlanUseCases>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub user_use_cases: Arc<UserUseCases>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub image_use_cases: Arc<ImageUseCases>,
}
