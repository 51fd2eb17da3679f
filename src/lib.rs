//! NgView - desktop viewer for NextGIS style vector stores
//!
//! A map document with a layer list, and a local store that vector data
//! sources are loaded into. Loading runs on a background worker with a
//! cancelable progress surface; results are delivered back to the
//! interactive thread, which owns all document and UI state.
//!
//! # Features
//!
//! - **Store**: `.ngst` containers holding imported GeoJSON datasets
//! - **Background import**: single-slot task runner with progress and cancel
//! - **Map documents**: `.ngmd` files listing layers over store datasets
//! - **GUI**: eframe window with menus, layer list, status bar and dialogs
//! - **CLI**: headless import and inspection
//!
//! # Example
//!
//! ```no_run
//! use ngview::{AppConfig, ConsoleProgress, Session};
//! use std::path::Path;
//!
//! fn main() -> ngview::Result<()> {
//!     let session = Session::init(AppConfig::default())?;
//!     let progress = ConsoleProgress::new();
//!
//!     let summary = session.catalog().import_into(
//!         Path::new("parks.geojson"),
//!         session.store_path(),
//!         &session.config().load_options(),
//!         &progress,
//!     )?;
//!     progress.finish("Done");
//!
//!     println!("{} features in {}", summary.features_written, summary.dataset);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gui;
pub mod import;
pub mod logging;
pub mod map;
pub mod progress;
pub mod shell;
pub mod store;
pub mod task;

// Re-export main types
pub use error::{NgViewError, Result};
pub use import::{ImportController, ImportReport};
pub use map::{Layer, LayerKind, MapDocument, MapModel};
pub use progress::{ConsoleProgress, ProgressReporter, ProgressState};
pub use shell::{Notice, NoticeLevel, Shell};
pub use store::{Catalog, ContainerInfo, ImportSummary, LoadOptions, Session};
pub use task::{OutcomeCode, RunnerState, TaskOutcome, TaskRunner};

use std::path::PathBuf;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format bytes as human-readable string
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::DECIMAL)
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the main store and the GUI log
    pub data_dir: PathBuf,
    /// File name of the main store container
    pub store_name: String,
    /// Store worker threads
    pub num_threads: usize,
    /// Verbose logging
    pub debug_mode: bool,
    /// Drop features without geometry on import
    pub skip_empty_geometry: bool,
    /// Features written per progress step
    pub batch_size: usize,
}

impl AppConfig {
    /// Path of the main store container
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_name)
    }

    /// Import options derived from this configuration
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            skip_empty_geometry: self.skip_empty_geometry,
            batch_size: self.batch_size,
            dataset_name: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tmp"),
            store_name: "main.ngst".to_string(),
            num_threads: 7,
            debug_mode: false,
            skip_empty_geometry: true,
            batch_size: store::options::DEFAULT_BATCH_SIZE,
        }
    }
}
