//! Face-aware framing and SVG composition. Pure, no I/O.
//!
//! | Operation | Function |
//! |---|---|
//! | **Crop** | [`compute_crop`]: target aspect + face center → clamped [`CropRect`] |
//! | **Filters** | [`FilterChain`]: ordered blur → desaturate primitives |
//! | **Compose** | [`render_svg`]: output size + framing + filters → SVG text |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Filters**: Data structures describing post-processing
//! - **Svg**: The single serializer that turns geometry + filters into markup

mod calculations;
pub mod filters;
pub mod svg;

pub use calculations::{CropRect, GeometryError, center_face, compute_crop};
pub use filters::{FilterChain, FilterPrimitive, FilterSelection};
pub use svg::{Viewport, render_svg};
