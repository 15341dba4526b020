//! Pure calculation functions for the face-aware viewport.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::{FaceBox, Size};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("Invalid geometry: natural {natural_w}x{natural_h}, target {target_w}x{target_h}")]
    InvalidGeometry {
        natural_w: f64,
        natural_h: f64,
        target_w: f64,
        target_h: f64,
    },
}

/// The visible region of the source image, in source pixel space.
///
/// Produced by [`compute_crop`]. Always lies inside the image it was computed
/// for, and its aspect ratio equals the requested output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl CropRect {
    /// Render as an SVG `viewBox` value: `"x y w h"`.
    pub fn to_view_box(&self) -> String {
        format!("{} {} {} {}", self.x, self.y, self.w, self.h)
    }
}

/// Compute the crop rectangle that matches `target`'s aspect ratio and keeps
/// `face` as close to the center as the image bounds allow.
///
/// One axis always spans the full image; the other is reduced to reach the
/// target aspect. The crop is then centered on the face and clamped so it
/// never leaves the image.
///
/// # Examples
/// ```
/// # use facecrop::imaging::compute_crop;
/// # use facecrop::types::{FaceBox, Size};
/// // 2:1 landscape, square output: full height, 500px wide, centered on face
/// let crop = compute_crop(
///     Size::new(1000.0, 500.0),
///     FaceBox::new(450.0, 200.0, 100.0, 100.0),
///     Size::new(200.0, 200.0),
/// ).unwrap();
/// assert_eq!((crop.x, crop.y, crop.w, crop.h), (250.0, 0.0, 500.0, 500.0));
/// ```
pub fn compute_crop(natural: Size, face: FaceBox, target: Size) -> Result<CropRect, GeometryError> {
    if !natural.is_valid() || !target.is_valid() {
        return Err(GeometryError::InvalidGeometry {
            natural_w: natural.width,
            natural_h: natural.height,
            target_w: target.width,
            target_h: target.height,
        });
    }

    let output_aspect = target.aspect();
    let image_aspect = natural.aspect();

    // The reduced side is capped at its natural length: `h * (w / h)` can
    // round one ulp past `w`.
    let (crop_w, crop_h) = if output_aspect == image_aspect {
        (natural.width, natural.height)
    } else if output_aspect > image_aspect {
        // Output is wider than the source: keep full width, cut height
        (natural.width, (natural.width / output_aspect).min(natural.height))
    } else {
        // Output is taller: keep full height, cut width
        ((natural.height * output_aspect).min(natural.width), natural.height)
    };

    let (cx, cy) = face.center();

    Ok(CropRect {
        x: clamp_offset(cx - crop_w / 2.0, natural.width - crop_w),
        y: clamp_offset(cy - crop_h / 2.0, natural.height - crop_h),
        w: crop_w,
        h: crop_h,
    })
}

/// Clamp a candidate offset into `[0, max]`.
fn clamp_offset(candidate: f64, max: f64) -> f64 {
    candidate.min(max).max(0.0)
}

/// A face box covering just the center point of the image.
///
/// Stand-in for entries that have no face data: feeding it to
/// [`compute_crop`] yields a plain center crop.
pub fn center_face(natural: Size) -> FaceBox {
    FaceBox::new(natural.width / 2.0, natural.height / 2.0, 0.0, 0.0)
}
