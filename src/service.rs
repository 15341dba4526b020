//! Request pipeline, independent of the HTTP transport.
//!
//! ```text
//! ImageQuery ─ validate ─► CatalogCache ─ choose ─► RasterStore ─ data URI ─┐
//!                                                                           ▼
//!                            SvgResponse ◄── render_svg ◄── compute_crop (face mode)
//! ```
//!
//! Two framing modes share the pipeline:
//!
//! - [`Mode::FaceAware`] crops around the entry's face box, or around the
//!   image center when the entry has none.
//! - [`Mode::Slice`] skips the crop and lets `preserveAspectRatio="xMidYMid
//!   slice"` fit the image to the output.
//!
//! The RNG is passed in so callers (and tests) control selection.

use crate::catalog::{CatalogCache, CatalogError, CatalogSource, FileCatalogSource};
use crate::config::ServiceConfig;
use crate::embed::{EmbedError, RasterStore};
use crate::imaging::{GeometryError, Viewport, center_face, compute_crop, render_svg};
use crate::request::{ImageQuery, RequestError};
use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Embed(#[from] EmbedError),
}

impl ServiceError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Request(_) | Self::Geometry(_) => 400,
            Self::Catalog(CatalogError::Empty) => 503,
            Self::Catalog(_) | Self::Embed(_) => 500,
        }
    }

    /// Message safe to show to clients. Internal details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            400 => "Invalid dimensions",
            503 => "No image available",
            _ => "Internal server error",
        }
    }
}

/// How the image is framed in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    FaceAware,
    Slice,
}

/// A rendered SVG plus what it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgResponse {
    pub body: String,
    /// Catalog `data` reference of the chosen image.
    pub image: String,
    /// Attribution of the chosen image.
    pub source: String,
}

/// The request pipeline with its two process-wide caches.
pub struct Service<S: CatalogSource = FileCatalogSource> {
    catalog: CatalogCache<S>,
    rasters: RasterStore,
}

impl Service<FileCatalogSource> {
    /// Build a file-backed service from config.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            CatalogCache::new(FileCatalogSource::new(&config.catalog.path)),
            RasterStore::new(&config.catalog.static_root, config.embed.memoize),
        )
    }
}

impl<S: CatalogSource> Service<S> {
    pub fn new(catalog: CatalogCache<S>, rasters: RasterStore) -> Self {
        Self { catalog, rasters }
    }

    pub fn catalog(&self) -> &CatalogCache<S> {
        &self.catalog
    }

    pub fn rasters(&self) -> &RasterStore {
        &self.rasters
    }

    /// Render one random image for `query`.
    pub fn render<R: Rng + ?Sized>(
        &self,
        mode: Mode,
        query: &ImageQuery,
        rng: &mut R,
    ) -> Result<SvgResponse, ServiceError> {
        query.dimensions.validate()?;

        let catalog = self.catalog.get()?;
        let entry = catalog.choose(rng)?;
        let image_ref = self.rasters.data_uri(&entry.data)?;

        let natural = entry.natural_size();
        let output = query.dimensions.resolve(natural);

        let viewport = match mode {
            Mode::FaceAware => {
                let face = entry.face.unwrap_or_else(|| center_face(natural));
                Some(Viewport {
                    crop: compute_crop(natural, face, output)?,
                    natural,
                })
            }
            Mode::Slice => None,
        };

        Ok(SvgResponse {
            body: render_svg(output, viewport.as_ref(), &image_ref, query.filters),
            image: entry.data.clone(),
            source: entry.source.clone(),
        })
    }
}
