//! Pure pixel transforms. None of them mutates its input.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{
    DynamicImage, GenericImageView, GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage,
};
use thiserror::Error;

use crate::app_error::AppError;
use crate::domain::entities::image_operation::ImageOperation;

pub const MAX_RESIZE_DIMENSION: u32 = 10_000;
pub const MAX_BLUR_RADIUS: u32 = 100;

pub const DEFAULT_ANGLE: i32 = 90;
pub const DEFAULT_BLUR_RADIUS: u32 = 5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not encode image: {0}")]
    Encode(String),

    #[error("crop region {x},{y} {width}x{height} lies outside a {image_width}x{image_height} image")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("crop region is empty")]
    EmptyRegion,

    #[error("target size {width}x{height} must be between 1 and {MAX_RESIZE_DIMENSION} pixels per side")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("blur radius {0} exceeds {MAX_BLUR_RADIUS}")]
    BlurRadiusTooLarge(u32),
}

impl From<TransformError> for AppError {
    fn from(e: TransformError) -> Self {
        AppError::Processing(e.to_string())
    }
}

/// Optional knobs; missing values fall back to per-operation defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformParams {
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub angle: Option<i32>,
    pub blur_radius: Option<u32>,
}

pub fn dimensions_label(img: &DynamicImage) -> String {
    let (w, h) = img.dimensions();
    format!("{w}x{h}")
}

/// Decodes bytes, sniffing the format from the content.
pub fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), TransformError> {
    let format = image::guess_format(bytes).map_err(|e| TransformError::Decode(e.to_string()))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    Ok((img, format))
}

/// Encodes in `preferred` when possible, PNG otherwise.
pub fn encode(
    img: &DynamicImage,
    preferred: ImageFormat,
) -> Result<(Vec<u8>, ImageFormat), TransformError> {
    match write(img, preferred) {
        Ok(bytes) => Ok((bytes, preferred)),
        Err(e) if preferred != ImageFormat::Png => {
            tracing::debug!(format = ?preferred, error = %e, "Falling back to PNG output");
            write(img, ImageFormat::Png).map(|bytes| (bytes, ImageFormat::Png))
        }
        Err(e) => Err(e),
    }
}

fn write(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, TransformError> {
    let mut buf = Vec::new();
    let result = if format == ImageFormat::Jpeg && img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut Cursor::new(&mut buf), format)
    } else {
        img.write_to(&mut Cursor::new(&mut buf), format)
    };
    result.map_err(|e| TransformError::Encode(e.to_string()))?;
    Ok(buf)
}

pub fn apply(
    img: &DynamicImage,
    operation: ImageOperation,
    params: &TransformParams,
) -> Result<DynamicImage, TransformError> {
    let (w, h) = img.dimensions();
    match operation {
        ImageOperation::Crop => crop(
            img,
            params.x.unwrap_or(0),
            params.y.unwrap_or(0),
            params.width.unwrap_or(w / 2),
            params.height.unwrap_or(h / 2),
        ),
        ImageOperation::Grayscale => Ok(grayscale(img)),
        ImageOperation::Sepia => Ok(sepia(img)),
        ImageOperation::Resize => resize(
            img,
            params.width.unwrap_or(w / 2),
            params.height.unwrap_or(h / 2),
        ),
        ImageOperation::Rotate => Ok(rotate(img, params.angle.unwrap_or(DEFAULT_ANGLE))),
        ImageOperation::Blur => blur(img, params.blur_radius.unwrap_or(DEFAULT_BLUR_RADIUS)),
    }
}

pub fn crop(
    img: &DynamicImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<DynamicImage, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::EmptyRegion);
    }
    let (image_width, image_height) = img.dimensions();
    let fits = x
        .checked_add(width)
        .is_some_and(|right| right <= image_width)
        && y.checked_add(height).is_some_and(|bottom| bottom <= image_height);
    if !fits {
        return Err(TransformError::CropOutOfBounds {
            x,
            y,
            width,
            height,
            image_width,
            image_height,
        });
    }
    Ok(img.crop_imm(x, y, width, height))
}

/// ITU-R 601-2 luma in 16.16 fixed point, rounded. Alpha is dropped.
fn luma_601(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        Luma([l as u8])
    })
}

pub fn grayscale(img: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(luma_601(img))
}

pub fn sepia(img: &DynamicImage) -> DynamicImage {
    let luma = luma_601(img);
    let out = RgbImage::from_fn(luma.width(), luma.height(), |x, y| {
        let g = luma.get_pixel(x, y).0[0] as f32;
        Rgb([g as u8, (g * 0.95) as u8, (g * 0.82) as u8])
    });
    DynamicImage::ImageRgb8(out)
}

pub fn resize(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, TransformError> {
    let valid = 1..=MAX_RESIZE_DIMENSION;
    if !valid.contains(&width) || !valid.contains(&height) {
        return Err(TransformError::InvalidDimensions { width, height });
    }
    Ok(img.resize_exact(width, height, FilterType::CatmullRom))
}

/// Rotates counter-clockwise by `angle` degrees, expanding the canvas.
pub fn rotate(img: &DynamicImage, angle: i32) -> DynamicImage {
    match angle.rem_euclid(360) {
        0 => img.clone(),
        90 => img.rotate270(),
        180 => img.rotate180(),
        270 => img.rotate90(),
        deg => rotate_expand(img, deg as f64),
    }
}

// Nearest-neighbour inverse mapping onto an expanded transparent canvas.
fn rotate_expand(img: &DynamicImage, degrees: f64) -> DynamicImage {
    let src = img.to_rgba8();
    let (w, h) = (src.width() as f64, src.height() as f64);
    let (sin, cos) = degrees.to_radians().sin_cos();

    let out_w = (w * cos.abs() + h * sin.abs() - 1e-9).ceil().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs() - 1e-9).ceil().max(1.0) as u32;
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ocx, ocy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);

    let out = RgbaImage::from_fn(out_w, out_h, |ox, oy| {
        let dx = ox as f64 + 0.5 - ocx;
        let dy = oy as f64 + 0.5 - ocy;
        let sx = dx * cos - dy * sin + cx;
        let sy = dx * sin + dy * cos + cy;
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *src.get_pixel(sx as u32, sy as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    DynamicImage::ImageRgba8(out)
}

pub fn blur(img: &DynamicImage, radius: u32) -> Result<DynamicImage, TransformError> {
    if radius > MAX_BLUR_RADIUS {
        return Err(TransformError::BlurRadiusTooLarge(radius));
    }
    if radius == 0 {
        return Ok(img.clone());
    }
    Ok(img.blur(radius as f32))
}
