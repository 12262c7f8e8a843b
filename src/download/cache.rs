use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::schema::{get_schema, DatasetKind};
use crate::writer::{read_npy, write_npy, DatasetTables, Table};

/// Extension of cached array files
pub const ARRAY_EXT: &str = "npy";

/// Directory of cached tables, one `<key>.npy` file per table
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "padherder-cache")
                    .context("Could not determine cache directory")?;
                proj_dirs.cache_dir().to_path_buf()
            }
        };

        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {:?}", cache_dir))?;

        Ok(Self { cache_dir })
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get path to the array file of a table
    pub fn array_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, ARRAY_EXT))
    }

    /// Check if a dataset's primary table is already cached
    pub fn is_cached(&self, kind: DatasetKind) -> bool {
        self.array_path(kind.key()).exists()
    }

    /// Load a cached table, or None when it has not been cached
    pub fn load(&self, key: &str) -> Result<Option<Table>> {
        let schema = get_schema(key).ok_or_else(|| anyhow!("Unknown table: {}", key))?;
        let path = self.array_path(key);
        if !path.exists() {
            return Ok(None);
        }

        debug!("loading {:?}", path);
        let table =
            read_npy(&path, schema).with_context(|| format!("Failed to read {:?}", path))?;
        Ok(Some(table))
    }

    /// Persist a table, overwriting any cached copy
    pub fn store(&self, table: &Table) -> Result<()> {
        let path = self.array_path(table.name());
        debug!("writing {} records to {:?}", table.len(), path);
        write_npy(&path, table).with_context(|| format!("Failed to write {:?}", path))
    }

    /// Persist both tables of a dataset
    ///
    /// The sublist goes first: a dataset only counts as cached once its
    /// primary table exists.
    pub fn store_dataset(&self, tables: &DatasetTables) -> Result<()> {
        if let Some(sublist) = &tables.sublist {
            self.store(sublist)?;
        }
        self.store(&tables.primary)
    }

    /// Remove a dataset's cached tables so the next load fetches it again
    pub fn clear(&self, kind: DatasetKind) -> Result<()> {
        for key in std::iter::once(kind.key()).chain(kind.sublist_key()) {
            let path = self.array_path(key);
            if path.exists() {
                fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            }
        }
        Ok(())
    }
}
