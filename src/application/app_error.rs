use strum::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Resource {
    Plan,
    Subscription,
    User,
    #[strum(serialize = "Operation record")]
    OperationRecord,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    NoActiveSubscription,
    QuotaExceeded,
    NotOwner,
    InactiveAccount,
    AdminOnly,
}

impl ForbiddenReason {
    pub fn message(&self) -> &'static str {
        match self {
            ForbiddenReason::NoActiveSubscription => "No active subscription",
            ForbiddenReason::QuotaExceeded => "Operation quota exceeded for the current plan",
            ForbiddenReason::NotOwner => "Not allowed to access this resource",
            ForbiddenReason::InactiveAccount => "Account is inactive",
            ForbiddenReason::AdminOnly => "Administrator role required",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {}", .0.message())]
    Forbidden(ForbiddenReason),

    #[error("Referential integrity: {0}")]
    ReferentialIntegrity(String),

    #[error("Processing failed: {0}")]
    Processing(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    NotFound,
    Conflict,
    NoActiveSubscription,
    QuotaExceeded,
    NotOwner,
    InactiveAccount,
    AdminOnly,
    ReferentialIntegrity,
    ProcessingFailed,
    InvalidCredentials,
    InvalidInput,
    PayloadTooLarge,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::NoActiveSubscription => "NO_ACTIVE_SUBSCRIPTION",
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::NotOwner => "NOT_OWNER",
            ErrorCode::InactiveAccount => "INACTIVE_ACCOUNT",
            ErrorCode::AdminOnly => "ADMIN_ONLY",
            ErrorCode::ReferentialIntegrity => "REFERENTIAL_INTEGRITY",
            ErrorCode::ProcessingFailed => "PROCESSING_FAILED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl From<ForbiddenReason> for ErrorCode {
    fn from(reason: ForbiddenReason) -> Self {
        match reason {
            ForbiddenReason::NoActiveSubscription => ErrorCode::NoActiveSubscription,
            ForbiddenReason::QuotaExceeded => ErrorCode::QuotaExceeded,
            ForbiddenReason::NotOwner => ErrorCode::NotOwner,
            ForbiddenReason::InactiveAccount => ErrorCode::InactiveAccount,
            ForbiddenReason::AdminOnly => ErrorCode::AdminOnly,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
