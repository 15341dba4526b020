//! Geometry types shared by the catalog, the viewport calculator and the
//! SVG compositor.
//!
//! All values are in source pixel space unless noted otherwise. They are
//! plain `f64` so that fractional crop offsets survive into the SVG
//! `viewBox` unchanged.

use serde::{Deserialize, Serialize};

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Both sides are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        is_positive_finite(self.width) && is_positive_finite(self.height)
    }
}

/// A precomputed face bounding box, as stored in the catalog.
///
/// Field names match the catalog JSON (`{"x":..,"y":..,"w":..,"h":..}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl FaceBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Center point `(cx, cy)` of the box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Check that the box has positive size and lies inside `bounds`.
    ///
    /// Returns a human-readable reason on failure, used by catalog
    /// validation.
    pub fn check_within(&self, bounds: Size) -> Result<(), String> {
        if !is_positive_finite(self.w) || !is_positive_finite(self.h) {
            return Err(format!(
                "face size {}x{} must be positive",
                self.w, self.h
            ));
        }
        if !self.x.is_finite() || !self.y.is_finite() || self.x < 0.0 || self.y < 0.0 {
            return Err(format!(
                "face origin ({}, {}) must be non-negative",
                self.x, self.y
            ));
        }
        if self.x + self.w > bounds.width || self.y + self.h > bounds.height {
            return Err(format!(
                "face ({}, {}, {}, {}) exceeds image bounds {}x{}",
                self.x, self.y, self.w, self.h, bounds.width, bounds.height
            ));
        }
        Ok(())
    }
}

pub(crate) fn is_positive_finite(v: f64) -> bool {
    v.is_finite() && v > 0.0
}
