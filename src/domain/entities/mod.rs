pub mod image_operation;
pub mod operation_record;
pub mod plan;
pub mod subscription;
pub mod user;
pub mod user_role;
