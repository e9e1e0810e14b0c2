use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Transform kinds a user can spend quota on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    sqlx::Type,
)]
#[sqlx(type_name = "image_operation", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImageOperation {
    Crop,
    Grayscale,
    Sepia,
    Resize,
    Rotate,
    Blur,
}
