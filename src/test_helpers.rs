//! Shared test utilities for the facecrop test suite.
//!
//! Provides catalog entry builders and on-disk fixtures: tiny rasters
//! written with the `image` crate and a ready-made static root containing
//! `meta.json` plus the images it references.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_static_root();
//! let config = config_for(tmp.path());
//! let service = Service::from_config(&config);
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::catalog::CatalogEntry;
use crate::config::ServiceConfig;
use crate::types::FaceBox;

// =========================================================================
// Catalog entries
// =========================================================================

/// Entry without a face box.
pub fn entry(data: &str, width: u32, height: u32) -> CatalogEntry {
    CatalogEntry {
        data: data.to_string(),
        source: String::new(),
        width,
        height,
        face: None,
    }
}

/// Entry with a face box given as `(x, y, w, h)`.
pub fn entry_with_face(
    data: &str,
    width: u32,
    height: u32,
    face: (f64, f64, f64, f64),
) -> CatalogEntry {
    CatalogEntry {
        face: Some(FaceBox::new(face.0, face.1, face.2, face.3)),
        ..entry(data, width, height)
    }
}

// =========================================================================
// Raster fixtures
// =========================================================================

/// Write a solid-colour PNG and return its path. Creates `dir` if needed.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 80, 255]))
        .save(&path)
        .unwrap();
    path
}

/// Write a solid-colour JPEG and return its path. Creates `dir` if needed.
pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    image::RgbImage::from_pixel(width, height, image::Rgb([40, 90, 160]))
        .save(&path)
        .unwrap();
    path
}

// =========================================================================
// Static root fixture
// =========================================================================

/// A static root with two images and a matching `meta.json`:
///
/// ```text
/// meta.json
/// images/landscape.png   40x20, face at (18, 8, 4, 4)
/// images/portrait.jpg    20x40, no face
/// ```
pub fn setup_static_root() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("images");
    write_png(&images, "landscape.png", 40, 20);
    write_jpeg(&images, "portrait.jpg", 20, 40);
    write_catalog(
        tmp.path(),
        &[
            entry_with_face("/images/landscape.png", 40, 20, (18.0, 8.0, 4.0, 4.0)),
            entry("/images/portrait.jpg", 20, 40),
        ],
    );
    tmp
}

/// Serialize entries to `<dir>/meta.json`.
pub fn write_catalog(dir: &Path, entries: &[CatalogEntry]) -> PathBuf {
    let path = dir.join("meta.json");
    std::fs::write(&path, serde_json::to_string_pretty(entries).unwrap()).unwrap();
    path
}

/// Stock config pointed at a static root.
pub fn config_for(root: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.catalog.path = root.join("meta.json").display().to_string();
    config.catalog.static_root = root.display().to_string();
    config
}
