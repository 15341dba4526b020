//! Image catalog: the pre-built list of servable images.
//!
//! The catalog is a JSON array (`meta.json`) produced offline, one entry per
//! image, each carrying the raster reference, natural dimensions and an
//! optional precomputed face box:
//!
//! ```json
//! [
//!   {
//!     "data": "/images/portrait-01.jpg",
//!     "source": "https://example.org/photo/123",
//!     "width": 1000,
//!     "height": 500,
//!     "face": { "x": 450, "y": 200, "w": 100, "h": 100 }
//!   }
//! ]
//! ```
//!
//! ## Lifecycle
//!
//! The catalog never changes while the process runs. [`CatalogCache`] loads
//! it through a [`CatalogSource`] on first use and hands out the same
//! `Arc<Catalog>` afterwards:
//!
//! - Concurrent first callers block on a single load.
//! - A failed load is not cached; the next call retries.
//! - There is no invalidation. Restart the process to pick up a new catalog.
//!
//! The source is a trait so tests can count loads and serve in-memory
//! catalogs without touching the filesystem.

use crate::types::{FaceBox, Size};
use once_cell::sync::OnceCell;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error reading catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Catalog has no entries")]
    Empty,
    #[error("Catalog entry {index} is invalid: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// One servable image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Raster reference: a path under the static root, or a `data:` URI.
    pub data: String,
    /// Attribution for the image (URL or credit line). Not interpreted.
    #[serde(default)]
    pub source: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Precomputed face bounding box, if a face was found offline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceBox>,
}

impl CatalogEntry {
    pub fn natural_size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "dimensions {}x{} must be non-zero",
                self.width, self.height
            ));
        }
        if self.data.trim().is_empty() {
            return Err("data reference is empty".to_string());
        }
        if let Some(face) = &self.face {
            face.check_within(self.natural_size())?;
        }
        Ok(())
    }
}

/// A validated, immutable set of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Validate entries and build a catalog.
    ///
    /// An empty list is accepted here; [`choose`](Self::choose) reports it.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        for (index, entry) in entries.iter().enumerate() {
            entry
                .validate()
                .map_err(|reason| CatalogError::InvalidEntry { index, reason })?;
        }
        Ok(Self { entries })
    }

    /// Parse and validate a `meta.json` document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that carry a face box.
    pub fn faces(&self) -> usize {
        self.entries.iter().filter(|e| e.face.is_some()).count()
    }

    /// Pick an entry uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&CatalogEntry, CatalogError> {
        self.entries.choose(rng).ok_or(CatalogError::Empty)
    }
}

/// Where the catalog comes from.
pub trait CatalogSource: Send + Sync {
    /// Load and validate the full catalog.
    fn load(&self) -> Result<Catalog, CatalogError>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Reads `meta.json` from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for FileCatalogSource {
    fn load(&self) -> Result<Catalog, CatalogError> {
        let json = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        Catalog::from_json(&json)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read-through cache: loads the catalog once, then serves it forever.
pub struct CatalogCache<S: CatalogSource> {
    source: S,
    cell: OnceCell<Arc<Catalog>>,
}

impl<S: CatalogSource> CatalogCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Return the cached catalog, loading it on first call.
    pub fn get(&self) -> Result<Arc<Catalog>, CatalogError> {
        self.cell
            .get_or_try_init(|| {
                let catalog = self.source.load()?;
                log::info!(
                    "Loaded catalog from {}: {} images, {} with faces",
                    self.source.describe(),
                    catalog.len(),
                    catalog.faces()
                );
                Ok(Arc::new(catalog))
            })
            .cloned()
    }

    /// Whether the catalog has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
