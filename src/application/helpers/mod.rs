pub mod image_transform;
