//! Catalog verification against the rasters on disk.
//!
//! The catalog's `width`/`height` drive every crop, so a catalog built from
//! a different version of an image silently produces wrong framing. This
//! module re-reads each raster's header (`image::image_dimensions`, no full
//! decode) and compares.
//!
//! Entries are checked in parallel with rayon; results keep catalog order.

use crate::catalog::Catalog;
use crate::embed::RasterStore;
use rayon::prelude::*;

/// Outcome for a single catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryStatus {
    /// Declared dimensions match the file.
    Ok,
    /// Inline `data:` URI; nothing on disk to compare.
    Inline,
    /// File dimensions differ from the catalog.
    Mismatch {
        declared: (u32, u32),
        actual: (u32, u32),
    },
    /// File missing, unreadable, or not a recognised image.
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryCheck {
    pub index: usize,
    pub data: String,
    pub has_face: bool,
    pub status: EntryStatus,
}

impl EntryCheck {
    pub fn is_problem(&self) -> bool {
        matches!(
            self.status,
            EntryStatus::Mismatch { .. } | EntryStatus::Unreadable(_)
        )
    }
}

/// Check every entry of `catalog` against the files under `store`'s root.
pub fn verify_catalog(catalog: &Catalog, store: &RasterStore) -> Vec<EntryCheck> {
    catalog
        .entries()
        .par_iter()
        .enumerate()
        .map(|(index, entry)| {
            let status = if entry.data.starts_with("data:") {
                EntryStatus::Inline
            } else {
                match store.resolve_path(&entry.data) {
                    Err(err) => EntryStatus::Unreadable(err.to_string()),
                    Ok(path) => match image::image_dimensions(&path) {
                        Err(err) => EntryStatus::Unreadable(format!("{}: {}", path.display(), err)),
                        Ok(actual) if actual == (entry.width, entry.height) => EntryStatus::Ok,
                        Ok(actual) => EntryStatus::Mismatch {
                            declared: (entry.width, entry.height),
                            actual,
                        },
                    },
                }
            };
            EntryCheck {
                index,
                data: entry.data.clone(),
                has_face: entry.face.is_some(),
                status,
            }
        })
        .collect()
}
