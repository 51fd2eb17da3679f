//! Store session
//!
//! Owns everything the store needs for the lifetime of the process: the
//! worker pool, the catalog and the path of the main container. Created
//! once at startup; dropping it is the teardown.

use crate::error::{NgViewError, Result};
use crate::store::catalog::Catalog;
use crate::store::options::CreateOptions;
use crate::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub struct Session {
    config: AppConfig,
    catalog: Arc<Catalog>,
    store_path: PathBuf,
}

impl Session {
    /// Initialize the store and make sure the main container exists.
    ///
    /// Any failure here is an initialization failure: the caller must not
    /// continue with a usable window.
    pub fn init(config: AppConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            NgViewError::Init(format!(
                "cannot create data directory {}: {}",
                config.data_dir.display(),
                e
            ))
        })?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|i| format!("ngview-store-{}", i))
            .build()
            .map_err(|e| NgViewError::Init(e.to_string()))?;
        let catalog = Arc::new(Catalog::new(pool));

        let store_path = Self::ensure_datastore(&catalog, &config)?;

        info!(
            data_dir = %config.data_dir.display(),
            store = %store_path.display(),
            threads = config.num_threads,
            "session initialized"
        );

        Ok(Self {
            config,
            catalog,
            store_path,
        })
    }

    fn ensure_datastore(catalog: &Catalog, config: &AppConfig) -> Result<PathBuf> {
        let path = config.store_path();
        if catalog.object_exists(&path) {
            return Ok(path);
        }
        catalog
            .create_container(&config.data_dir, &config.store_name, CreateOptions { unique: true })
            .map_err(|e| NgViewError::Init(e.to_string()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Path of the main store container
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        info!("session closed");
    }
}
