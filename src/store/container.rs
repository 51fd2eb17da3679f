//! Store container layout
//!
//! A container is a directory named `<name>.ngst` holding `catalog.json`
//! and one `<dataset>.jsonl` file per dataset (one GeoJSON feature per line).

use crate::error::{NgViewError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Container directory extension
pub const CONTAINER_EXTENSION: &str = "ngst";

/// Metadata file inside every container
pub const CATALOG_FILE: &str = "catalog.json";

/// Extension of dataset files
pub const DATASET_EXTENSION: &str = "jsonl";

/// Current container format version
pub const FORMAT_VERSION: u32 = 1;

/// A dataset stored in a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    /// Source the dataset was loaded from
    pub source: PathBuf,
    pub feature_count: u64,
    pub skipped_count: u64,
    /// Geometry type shared by all features, or "Mixed"/"None"
    pub geometry_type: String,
    pub bytes: u64,
    pub loaded: DateTime<Utc>,
}

/// Contents of `catalog.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub name: String,
    pub format_version: u32,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub datasets: Vec<DatasetInfo>,
}

impl ContainerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format_version: FORMAT_VERSION,
            created: Utc::now(),
            datasets: Vec::new(),
        }
    }

    /// Read and validate `catalog.json` of the container at `path`
    pub fn read(path: &Path) -> Result<Self> {
        let catalog = path.join(CATALOG_FILE);
        if !catalog.is_file() {
            return Err(NgViewError::InvalidContainer {
                path: path.to_path_buf(),
                reason: format!("missing {}", CATALOG_FILE),
            });
        }
        let text = fs::read_to_string(&catalog)?;
        let info: ContainerInfo = serde_json::from_str(&text).map_err(|e| {
            NgViewError::InvalidContainer {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        if info.format_version > FORMAT_VERSION {
            return Err(NgViewError::InvalidContainer {
                path: path.to_path_buf(),
                reason: format!("unsupported format version {}", info.format_version),
            });
        }
        Ok(info)
    }

    /// Write `catalog.json` through a temporary file
    pub fn write(&self, path: &Path) -> Result<()> {
        let tmp = path.join(format!("{}.tmp", CATALOG_FILE));
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path.join(CATALOG_FILE))?;
        Ok(())
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetInfo> {
        self.datasets.iter().find(|d| d.name == name)
    }

    /// `base`, or `base_1`, `base_2`, ... whichever is neither listed nor
    /// already on disk in the container at `path`
    pub fn unique_dataset_name(&self, path: &Path, base: &str) -> String {
        unique_name(base, |candidate| {
            self.dataset(candidate).is_some() || dataset_path(path, candidate).exists()
        })
    }

    pub fn total_features(&self) -> u64 {
        self.datasets.iter().map(|d| d.feature_count).sum()
    }
}

/// Path of a dataset file inside a container
pub fn dataset_path(container: &Path, dataset: &str) -> PathBuf {
    container.join(format!("{}.{}", dataset, DATASET_EXTENSION))
}

/// True if the path names a `.ngst` container (whether or not it exists)
pub fn is_container_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(CONTAINER_EXTENSION))
        .unwrap_or(false)
}

/// Container file name for `name`, adding the extension when missing
pub fn container_file_name(name: &str) -> String {
    if is_container_path(Path::new(name)) {
        name.to_string()
    } else {
        format!("{}.{}", name, CONTAINER_EXTENSION)
    }
}

/// Keep dataset names file-system safe
pub fn sanitize_dataset_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "dataset".to_string()
    } else {
        cleaned
    }
}

pub(crate) fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
