//! Map document and layers
//!
//! A map document is an ordered list of layers, each a named reference to a
//! data source. Documents are saved as pretty JSON (`.ngmd`).

use crate::error::{NgViewError, Result};
use crate::store::container::is_container_path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Map document file extension
pub const DOCUMENT_EXTENSION: &str = "ngmd";

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

const RASTER_EXTENSIONS: &[&str] = &["tif", "tiff", "img", "vrt", "png", "jpg", "jpeg", "jp2"];

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique document id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(u64);

impl MapId {
    fn next() -> Self {
        MapId(NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map#{}", self.0)
    }
}

/// What a layer's source is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Vector,
    Raster,
    /// Dataset inside a store container
    Store,
}

impl LayerKind {
    pub fn from_source(source: &Path) -> Self {
        if source.parent().map(is_container_path).unwrap_or(false) {
            return LayerKind::Store;
        }
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if RASTER_EXTENSIONS.contains(&ext.as_str()) {
            LayerKind::Raster
        } else {
            LayerKind::Vector
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Vector => "Vector",
            LayerKind::Raster => "Raster",
            LayerKind::Store => "Store",
        }
    }
}

/// A named reference to a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub source: PathBuf,
    pub kind: LayerKind,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        Self {
            name: name.into(),
            kind: LayerKind::from_source(&source),
            source,
            visible: true,
        }
    }
}

/// On-disk form of a document
#[derive(Debug, Serialize, Deserialize)]
struct DocumentFile {
    format_version: u32,
    name: String,
    #[serde(default)]
    description: String,
    created: DateTime<Utc>,
    #[serde(default)]
    layers: Vec<Layer>,
}

/// An open map document
#[derive(Debug, Clone)]
pub struct MapDocument {
    id: MapId,
    pub name: String,
    pub description: String,
    path: Option<PathBuf>,
    pub layers: Vec<Layer>,
    pub created: DateTime<Utc>,
}

impl MapDocument {
    /// Empty, unsaved document
    pub fn new() -> Self {
        Self {
            id: MapId::next(),
            name: "Untitled".to_string(),
            description: String::new(),
            path: None,
            layers: Vec::new(),
            created: Utc::now(),
        }
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    /// Where the document was last opened from or saved to
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read and validate a document. Nothing is returned unless the whole
    /// file is valid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let file: DocumentFile = serde_json::from_str(&text)
            .map_err(|e| NgViewError::InvalidDocument(format!("{}: {}", path.display(), e)))?;

        if file.format_version == 0 || file.format_version > DOCUMENT_VERSION {
            return Err(NgViewError::InvalidDocument(format!(
                "{}: unsupported format version {}",
                path.display(),
                file.format_version
            )));
        }
        if let Some(position) = file.layers.iter().position(|l| l.name.trim().is_empty()) {
            return Err(NgViewError::InvalidDocument(format!(
                "{}: layer {} has no name",
                path.display(),
                position
            )));
        }

        Ok(Self {
            id: MapId::next(),
            name: file.name,
            description: file.description,
            path: Some(path.to_path_buf()),
            layers: file.layers,
            created: file.created,
        })
    }

    /// Write the document to `path` and remember the path. An Untitled
    /// document takes the file stem as its name, on disk and in memory.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if self.name == "Untitled" => stem.to_string(),
            _ => self.name.clone(),
        };
        let file = DocumentFile {
            format_version: DOCUMENT_VERSION,
            name,
            description: self.description.clone(),
            created: self.created,
            layers: self.layers.clone(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(&file)?)?;

        self.name = file.name;
        self.path = Some(path.to_path_buf());
        Ok(())
    }
}

impl Default for MapDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = MapDocument::new();
        let b = MapDocument::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn layer_kind_from_source() {
        assert_eq!(LayerKind::from_source(Path::new("dem.TIF")), LayerKind::Raster);
        assert_eq!(LayerKind::from_source(Path::new("roads.geojson")), LayerKind::Vector);
        assert_eq!(LayerKind::from_source(Path::new("tmp/main.ngst/roads")), LayerKind::Store);
    }

    #[test]
    fn save_then_load_keeps_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("city.ngmd");

        let mut doc = MapDocument::new();
        doc.layers.push(Layer::new("Layer 0", "roads.geojson"));
        doc.layers.push(Layer::new("Layer 1", "dem.tif"));
        doc.save(&path).unwrap();
        assert_eq!(doc.path(), Some(path.as_path()));
        assert_eq!(doc.name, "city");

        let loaded = MapDocument::load(&path).unwrap();
        assert_ne!(loaded.id(), doc.id());
        assert_eq!(loaded.name, "city");
        assert_eq!(loaded.layers, doc.layers);
        assert_eq!(loaded.path(), Some(path.as_path()));
    }

    #[test]
    fn failed_save_keeps_name_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut doc = MapDocument::new();
        assert!(doc.save(&blocker.join("city.ngmd")).is_err());
        assert_eq!(doc.name, "Untitled");
        assert_eq!(doc.path(), None);
    }

    #[test]
    fn load_rejects_invalid_documents() {
        let dir = tempfile::tempdir().unwrap();

        let garbage = dir.path().join("garbage.ngmd");
        fs::write(&garbage, "not json").unwrap();
        assert!(matches!(MapDocument::load(&garbage), Err(NgViewError::InvalidDocument(_))));

        let future = dir.path().join("future.ngmd");
        fs::write(
            &future,
            r#"{"format_version":9,"name":"x","created":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(matches!(MapDocument::load(&future), Err(NgViewError::InvalidDocument(_))));

        let unnamed = dir.path().join("unnamed.ngmd");
        fs::write(
            &unnamed,
            r#"{"format_version":1,"name":"x","created":"2024-01-01T00:00:00Z",
                "layers":[{"name":"","source":"a.geojson","kind":"Vector"}]}"#,
        )
        .unwrap();
        assert!(MapDocument::load(&unnamed).is_err());

        assert!(matches!(
            MapDocument::load(&dir.path().join("missing.ngmd")),
            Err(NgViewError::Io(_))
        ));
    }
}
