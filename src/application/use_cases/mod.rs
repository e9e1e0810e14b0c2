pub mod auth;
pub mod image;
pub mod plan;
pub mod subscription;
pub mod user;
