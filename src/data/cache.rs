//! In-memory cache of the loaded dataset.
//!
//! The cache entry is keyed by source path and file modification time:
//! while the file on disk is unchanged the cached table is served, and a
//! touched file triggers a reload on the next query. `&mut self` on
//! [`DatasetCache::load`] keeps at most one load in flight at a time.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};

use crate::data::load_readings;
use crate::error::Result;
use crate::models::Reading;

struct CacheEntry {
    path: PathBuf,
    modified: SystemTime,
    readings: Arc<Vec<Reading>>,
}

/// Holds the most recently loaded dataset together with its source identity.
#[derive(Default)]
pub struct DatasetCache {
    entry: Option<CacheEntry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// Returns the dataset for `path`, reloading only when the file's
    /// modification time differs from the cached entry's.
    pub fn load(&mut self, path: &Path) -> Result<Arc<Vec<Reading>>> {
        let modified = fs::metadata(path)?.modified()?;

        if let Some(entry) = &self.entry {
            if entry.path == path && entry.modified == modified {
                debug!("Serving cached dataset for {}", path.display());
                return Ok(Arc::clone(&entry.readings));
            }
            info!(
                "Source {} changed on disk, reloading",
                path.display()
            );
        }

        let readings = Arc::new(load_readings(path)?);
        self.entry = Some(CacheEntry {
            path: path.to_path_buf(),
            modified,
            readings: Arc::clone(&readings),
        });
        Ok(readings)
    }

    /// Drops the cached entry so the next `load` rereads the file.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Whether a dataset is currently cached.
    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }
}
