//! # facecrop
//!
//! Serves a random portrait from a fixed catalog as an SVG document, cropped
//! to whatever aspect ratio the caller asks for while keeping the subject's
//! face in view, with optional blur and greyscale.
//!
//! ```text
//! GET /image?w=400&h=200&filter=blur,greyscale
//!   → <svg width="400" height="200" viewBox="…crop around face…">
//!       <filter id="effects">…</filter>
//!       <image … xlink:href="data:image/jpeg;base64,…" />
//!     </svg>
//! ```
//!
//! # Architecture: Pure Core, Thin Shell
//!
//! The only non-trivial logic is geometry and markup, and both are pure
//! functions in [`imaging`]. Everything around them is plumbing that
//! prepares their inputs:
//!
//! ```text
//! request  query string   →  Dimensions + FilterSelection
//! catalog  meta.json      →  CatalogEntry  (random, cached once)
//! embed    entry.data     →  data: URI     (memoized)
//! imaging  geometry       →  CropRect → SVG text
//! server   tiny_http      →  HTTP response
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Crop computation, filter chain, SVG serializer (no I/O) |
//! | [`request`] | Query parsing and dimension validation |
//! | [`catalog`] | Catalog model, validation, random choice, populate-once cache |
//! | [`embed`] | Raster reference → base64 `data:` URI with MIME sniffing |
//! | [`service`] | Request pipeline composing the above, transport-agnostic |
//! | [`server`] | HTTP routes, headers, ETag revalidation, worker pool |
//! | [`verify`] | Catalog-vs-disk dimension checks for `facecrop check` |
//! | [`config`] | `facecrop.toml` loading, merging, validation |
//! | [`types`] | Geometry types shared across modules (`Size`, `FaceBox`) |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Crop With viewBox, Not Pixels
//!
//! The raster is never decoded or re-encoded. Cropping is a `viewBox` over
//! the full-size image, and `preserveAspectRatio="xMidYMid slice"` makes the
//! browser do the scaling. The service only needs each image's dimensions
//! and face box, which the catalog already carries.
//!
//! ## Two Framing Modes
//!
//! `/image` computes a face-centered crop; `/` skips the crop and relies on
//! `slice` alone. Entries without a face box still work on `/image`: the
//! crop centers on the image instead.
//!
//! ## Catalog Loaded Once
//!
//! The catalog is immutable for the life of the process. It is loaded on
//! first use through an injected [`catalog::CatalogCache`], never reloaded,
//! and shared between workers behind an `Arc`.

pub mod catalog;
pub mod config;
pub mod embed;
pub mod imaging;
pub mod output;
pub mod request;
pub mod server;
pub mod service;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_helpers;
