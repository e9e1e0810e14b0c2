//! Test data factories. Use the closure parameter to override fields.

use std::io::Cursor;

use chrono::NaiveDateTime;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use uuid::Uuid;

use crate::app_error::AppResult;
use crate::domain::entities::{plan::Plan, user::User, user_role::UserRole};
use crate::use_cases::user::CredentialHasher;

pub fn test_datetime() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Create a live plan with a unique name.
pub fn create_test_plan(overrides: impl FnOnce(&mut Plan)) -> Plan {
    let id = Uuid::new_v4();
    let mut plan = Plan {
        id,
        name: format!("P{}", &id.simple().to_string()[..8]),
        max_operations: 5,
        price: 0,
        description: Some("Test plan".to_string()),
        is_deleted: false,
        deleted_at: None,
        created_at: Some(test_datetime()),
    };
    overrides(&mut plan);
    if plan.is_deleted && plan.deleted_at.is_none() {
        plan.deleted_at = Some(test_datetime());
    }
    plan
}

/// Create an active `user`-role account with unique credentials.
pub fn create_test_user(overrides: impl FnOnce(&mut User)) -> User {
    let id = Uuid::new_v4();
    let tag = &id.simple().to_string()[..8];
    let mut user = User {
        id,
        email: format!("user-{tag}@example.com"),
        username: format!("user_{tag}"),
        role: UserRole::User,
        is_active: true,
        created_at: Some(test_datetime()),
    };
    overrides(&mut user);
    user
}

/// PNG-encoded RGB image of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7) as u8, (y * 13) as u8, 90])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode test png");
    buf
}

/// Reversible stand-in for Argon2 so tests stay fast.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash.strip_prefix("plain$") == Some(password))
    }
}
