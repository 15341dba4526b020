//! Raster embedding: catalog reference → `data:` URI.
//!
//! The SVG response must be self-contained, so the raster is inlined as a
//! base64 `data:` URI. A reference is resolved like this:
//!
//! ```text
//! "data:image/png;base64,…"   → used verbatim
//! "/images/a.jpg"             → <static_root>/images/a.jpg, read + encoded
//! ```
//!
//! The MIME type comes from the file's magic bytes (`image::guess_format`),
//! falling back to `image/jpeg` when the format is not recognised.
//!
//! Encoded URIs are memoized for the process lifetime, keyed by reference.
//! The catalog is immutable, so entries never go stale.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// MIME type used when magic-byte detection fails.
pub const FALLBACK_MIME: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Raster reference escapes the static root: {0}")]
    UnsafePath(String),
}

/// Detect a raster's MIME type from its leading bytes.
pub fn detect_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

/// Build a base64 `data:` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Resolves catalog references to embeddable `data:` URIs.
pub struct RasterStore {
    root: PathBuf,
    memoize: bool,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl RasterStore {
    pub fn new(root: impl Into<PathBuf>, memoize: bool) -> Self {
        Self {
            root: root.into(),
            memoize,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a reference to a file under the static root.
    ///
    /// Leading `/` is relative to the root. `..` and drive prefixes are
    /// rejected.
    pub fn resolve_path(&self, reference: &str) -> Result<PathBuf, EmbedError> {
        let mut path = self.root.clone();
        for component in Path::new(reference).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(EmbedError::UnsafePath(reference.to_string()));
                }
            }
        }
        Ok(path)
    }

    /// Return the `data:` URI for a catalog reference.
    pub fn data_uri(&self, reference: &str) -> Result<Arc<str>, EmbedError> {
        if reference.starts_with("data:") {
            return Ok(Arc::from(reference));
        }

        if self.memoize {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(uri) = cache.get(reference) {
                return Ok(Arc::clone(uri));
            }
        }

        let path = self.resolve_path(reference)?;
        let bytes = std::fs::read(&path).map_err(|source| EmbedError::Io {
            path: path.clone(),
            source,
        })?;
        let mime = detect_mime(&bytes);
        log::debug!(
            "Encoded {} ({}, {} bytes)",
            path.display(),
            mime,
            bytes.len()
        );
        let uri: Arc<str> = Arc::from(encode_data_uri(mime, &bytes));

        if self.memoize {
            self.cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(reference.to_string(), Arc::clone(&uri));
        }
        Ok(uri)
    }

    /// Number of memoized URIs.
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
