//! Query-string parsing and validation for image requests.
//!
//! Recognised parameters:
//!
//! | Key | Meaning |
//! |---|---|
//! | `w` | output width (≥ 1, finite) |
//! | `h` | output height (≥ 1, finite) |
//! | `filter` | comma-separated effects: `greyscale`, `blur` |
//!
//! If only one of `w`/`h` is given the other copies it (square output).
//! If neither is given the chosen image's natural size is used. Empty
//! values count as absent. Numbers are decimal (`f64::from_str`), so `0x10`
//! or `1_000` are not numbers. Anything that fails to parse is kept as `NaN`
//! so validation rejects it rather than silently dropping it.

use crate::imaging::FilterSelection;
use crate::types::Size;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Invalid dimensions")]
    InvalidDimensions,
}

/// Requested output size; either side may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Dimensions {
    /// Parse raw `w`/`h` values, applying the square fallback.
    pub fn parse(w: Option<&str>, h: Option<&str>) -> Self {
        let width = w.and_then(parse_number);
        let height = h.and_then(parse_number);
        Self {
            width: width.or(height),
            height: height.or(width),
        }
    }

    /// Reject any present side that is non-finite or below 1.
    pub fn validate(&self) -> Result<(), RequestError> {
        let valid = |dim: Option<f64>| dim.is_none_or(|v| v.is_finite() && v >= 1.0);
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(RequestError::InvalidDimensions)
        }
    }

    /// Concrete output size, falling back to `natural` when unspecified.
    ///
    /// After [`parse`](Self::parse) either both sides are set or neither is.
    pub fn resolve(&self, natural: Size) -> Size {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Size::new(w, h),
            (Some(w), None) => Size::new(w, w),
            (None, Some(h)) => Size::new(h, h),
            (None, None) => natural,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.parse().unwrap_or(f64::NAN))
}

/// Everything an image route needs from the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageQuery {
    pub dimensions: Dimensions,
    pub filters: FilterSelection,
}

impl ImageQuery {
    /// Parse a raw (still percent-encoded) query string, without the `?`.
    ///
    /// The first occurrence of each key wins.
    pub fn parse(query: &str) -> Self {
        let mut w = None;
        let mut h = None;
        let mut filter = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "w" => &mut w,
                "h" => &mut h,
                "filter" => &mut filter,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        Self {
            dimensions: Dimensions::parse(w.as_deref(), h.as_deref()),
            filters: filter
                .as_deref()
                .map(FilterSelection::parse)
                .unwrap_or_default(),
        }
    }
}

/// Split a request target like `/image?w=10` into path and query.
pub fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}
