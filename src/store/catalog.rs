//! Catalog: object lookup, container creation and data import
//!
//! The catalog is shared between the interactive thread and the import
//! worker. Failed operations record their message so the shell can show the
//! last error text after the fact.

use crate::error::{NgViewError, Result};
use crate::progress::ProgressReporter;
use crate::store::container::{
    container_file_name, dataset_path, is_container_path, sanitize_dataset_name, unique_name,
    ContainerInfo, DatasetInfo, CATALOG_FILE,
};
use crate::store::loader::{common_geometry_type, is_empty_geometry, read_features};
use crate::store::options::{CreateOptions, LoadOptions};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// Result of a finished import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub dataset: String,
    pub store: PathBuf,
    pub features_written: u64,
    pub features_skipped: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

impl ImportSummary {
    /// Catalog path of the imported dataset (`store.ngst/name`)
    pub fn dataset_path(&self) -> PathBuf {
        self.store.join(&self.dataset)
    }
}

/// Modification time and length of a `catalog.json`
type Stamp = (Option<SystemTime>, u64);

fn catalog_stamp(container: &Path) -> Option<Stamp> {
    let meta = fs::metadata(container.join(CATALOG_FILE)).ok()?;
    Some((meta.modified().ok(), meta.len()))
}

struct CachedContainer {
    stamp: Stamp,
    info: ContainerInfo,
}

/// Dataset file claimed by a running import. Removed on drop unless the
/// import committed it to the catalog.
struct PartialDataset {
    path: PathBuf,
    committed: bool,
}

impl PartialDataset {
    /// Create the file, failing if anything already sits at `path`
    fn claim(path: PathBuf) -> Result<(Self, File)> {
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok((Self { path, committed: false }, file))
    }
}

impl Drop for PartialDataset {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "cannot remove partial dataset");
            }
        }
    }
}

/// Entry point to stored objects
///
/// Several catalogs (or processes) may share a container. Imports always
/// read `catalog.json` fresh; the cache only serves lookups and listings and
/// is dropped whenever the file changes on disk.
pub struct Catalog {
    pool: ThreadPool,
    containers: DashMap<PathBuf, CachedContainer>,
    commit: Mutex<()>,
    last_error: Mutex<Option<String>>,
}

impl Catalog {
    pub fn new(pool: ThreadPool) -> Self {
        Self {
            pool,
            containers: DashMap::new(),
            commit: Mutex::new(()),
            last_error: Mutex::new(None),
        }
    }

    /// Text of the most recent failed operation, empty if none failed.
    /// Each import starts with a clean slate.
    pub fn last_error_message(&self) -> String {
        self.last_error.lock().clone().unwrap_or_default()
    }

    fn record<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !e.is_cancelled() {
                *self.last_error.lock() = Some(e.to_string());
            }
        }
        result
    }

    /// Does the object exist?
    ///
    /// Understands containers, datasets inside containers
    /// (`main.ngst/roads`) and plain files.
    pub fn object_exists(&self, path: &Path) -> bool {
        if is_container_path(path) {
            return self.container_info(path).is_ok();
        }
        if let Some(parent) = path.parent().filter(|p| is_container_path(p)) {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            return self
                .container_info(parent)
                .map(|info| info.dataset(name).is_some())
                .unwrap_or(false);
        }
        path.exists()
    }

    /// Container metadata. Served from the cache while `catalog.json` is
    /// unchanged on disk.
    pub fn container_info(&self, path: &Path) -> Result<ContainerInfo> {
        let stamp = catalog_stamp(path);
        if let (Some(stamp), Some(cached)) = (stamp, self.containers.get(path)) {
            if cached.stamp == stamp {
                return Ok(cached.info.clone());
            }
        }
        let info = ContainerInfo::read(path)?;
        self.remember(path, &info);
        Ok(info)
    }

    fn remember(&self, path: &Path, info: &ContainerInfo) {
        match catalog_stamp(path) {
            Some(stamp) => {
                self.containers.insert(
                    path.to_path_buf(),
                    CachedContainer { stamp, info: info.clone() },
                );
            }
            None => {
                self.containers.remove(path);
            }
        }
    }

    /// Create an empty container `name` inside `parent`. Returns its path.
    pub fn create_container(&self, parent: &Path, name: &str, options: CreateOptions) -> Result<PathBuf> {
        self.record(self.create_container_inner(parent, name, options))
    }

    fn create_container_inner(&self, parent: &Path, name: &str, options: CreateOptions) -> Result<PathBuf> {
        fs::create_dir_all(parent)?;
        let file_name = container_file_name(name);
        let stem = file_name
            .trim_end_matches(&format!(".{}", crate::store::container::CONTAINER_EXTENSION))
            .to_string();

        let path = if options.unique {
            let free = unique_name(&stem, |candidate| {
                parent.join(container_file_name(candidate)).exists()
            });
            parent.join(container_file_name(&free))
        } else {
            let path = parent.join(&file_name);
            if path.exists() {
                return Err(NgViewError::AlreadyExists(path));
            }
            path
        };

        fs::create_dir(&path)?;
        let container_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(stem.as_str())
            .to_string();
        let info = ContainerInfo::new(container_name);
        info.write(&path)?;
        self.remember(&path, &info);
        info!(path = %path.display(), "store container created");
        Ok(path)
    }

    /// Load `source` into the container at `dest`.
    ///
    /// Reports progress once per batch and stops with
    /// [`NgViewError::Cancelled`] when the reporter says so. A cancelled or
    /// failed import leaves no dataset behind.
    pub fn import_into(
        &self,
        source: &Path,
        dest: &Path,
        options: &LoadOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<ImportSummary> {
        *self.last_error.lock() = None;
        self.record(self.import_inner(source, dest, options, progress))
    }

    fn import_inner(
        &self,
        source: &Path,
        dest: &Path,
        options: &LoadOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<ImportSummary> {
        let start = Instant::now();
        // Fail early on a broken or missing container
        ContainerInfo::read(dest)?;

        if !progress.report(0.0, "Reading source...") {
            return Err(NgViewError::Cancelled);
        }
        let features = read_features(source)?;
        let total = features.len();

        let base = options.dataset_name.clone().unwrap_or_else(|| {
            source
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("dataset")
                .to_string()
        });
        let (dataset, mut partial, file) = self.claim_dataset(dest, &sanitize_dataset_name(&base))?;

        info!(
            source = %source.display(),
            dataset = %dataset,
            features = total,
            "import started"
        );

        let (features_written, bytes_written) =
            match self.write_dataset(&features, file, &partial.path, options, progress) {
                Ok(counts) => counts,
                Err(e) => {
                    if e.is_cancelled() {
                        info!(dataset = %dataset, "import cancelled");
                    }
                    return Err(e);
                }
            };

        let kept = features
            .iter()
            .filter(|f| !(options.skip_empty_geometry && is_empty_geometry(f.geometry.as_ref())));
        let geometry_type = common_geometry_type(kept);
        let features_skipped = total as u64 - features_written;

        let entry = DatasetInfo {
            name: dataset.clone(),
            source: source.to_path_buf(),
            feature_count: features_written,
            skipped_count: features_skipped,
            geometry_type,
            bytes: bytes_written,
            loaded: Utc::now(),
        };
        {
            let _commit = self.commit.lock();
            let mut updated = ContainerInfo::read(dest)?;
            if updated.dataset(&dataset).is_some() {
                return Err(NgViewError::AlreadyExists(dest.join(&dataset)));
            }
            updated.datasets.push(entry);
            updated.write(dest)?;
            partial.committed = true;
            self.remember(dest, &updated);
        }

        progress.report(100.0, "Done");
        let summary = ImportSummary {
            dataset,
            store: dest.to_path_buf(),
            features_written,
            features_skipped,
            bytes_written,
            elapsed: start.elapsed(),
        };
        info!(
            dataset = %summary.dataset,
            written = summary.features_written,
            skipped = summary.features_skipped,
            "import complete in {:.2}s",
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    /// Pick a free dataset name against the catalog on disk and create its file
    fn claim_dataset(&self, dest: &Path, base: &str) -> Result<(String, PartialDataset, File)> {
        let _commit = self.commit.lock();
        let name = ContainerInfo::read(dest)?.unique_dataset_name(dest, base);
        let (partial, file) = PartialDataset::claim(dataset_path(dest, &name))?;
        Ok((name, partial, file))
    }

    /// Write features in batches; returns (features written, bytes written)
    fn write_dataset(
        &self,
        features: &[geojson::Feature],
        file: File,
        target: &Path,
        options: &LoadOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<(u64, u64)> {
        let total = features.len();
        let batch_size = options.batch_size.max(1);
        let mut writer = BufWriter::new(file);
        let mut processed = 0usize;
        let mut written = 0u64;
        let mut bytes = 0u64;

        for batch in features.chunks(batch_size) {
            let lines = self.pool.install(|| {
                batch
                    .par_iter()
                    .filter(|f| !(options.skip_empty_geometry && is_empty_geometry(f.geometry.as_ref())))
                    .map(serde_json::to_string)
                    .collect::<std::result::Result<Vec<String>, _>>()
            })?;

            for line in &lines {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
                bytes += line.len() as u64 + 1;
            }
            written += lines.len() as u64;
            processed += batch.len();

            let percent = processed as f64 * 100.0 / total as f64;
            if !progress.report(percent, &format!("{}/{} features", processed, total)) {
                return Err(NgViewError::Cancelled);
            }
        }

        writer.flush()?;
        debug!(path = %target.display(), written, bytes, "dataset written");
        Ok((written, bytes))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::progress::ProgressState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn catalog() -> Catalog {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        Catalog::new(pool)
    }

    pub(crate) fn write_points(dir: &Path, name: &str, count: usize, empty_every: usize) -> PathBuf {
        let features: Vec<String> = (0..count)
            .map(|i| {
                if empty_every > 0 && i % empty_every == 0 {
                    format!(r#"{{"type":"Feature","geometry":null,"properties":{{"n":{}}}}}"#, i)
                } else {
                    format!(
                        r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{}.0,{}.5]}},"properties":{{"n":{}}}}}"#,
                        i, i, i
                    )
                }
            })
            .collect();
        let path = dir.join(name);
        fs::write(
            &path,
            format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features.join(",")),
        )
        .unwrap();
        path
    }

    struct StopAfter {
        calls: AtomicUsize,
        limit: usize,
    }

    impl ProgressReporter for StopAfter {
        fn report(&self, _percent: f64, _message: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) < self.limit
        }
    }

    #[test]
    fn create_container_unique_and_strict() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();

        let first = catalog
            .create_container(dir.path(), "main.ngst", CreateOptions { unique: true })
            .unwrap();
        assert_eq!(first, dir.path().join("main.ngst"));
        assert!(catalog.object_exists(&first));

        let second = catalog
            .create_container(dir.path(), "main", CreateOptions { unique: true })
            .unwrap();
        assert_eq!(second, dir.path().join("main_1.ngst"));

        let err = catalog
            .create_container(dir.path(), "main", CreateOptions::default())
            .unwrap_err();
        assert!(matches!(err, NgViewError::AlreadyExists(_)));
        assert!(catalog.last_error_message().contains("main.ngst"));
    }

    #[test]
    fn import_writes_dataset_and_registers_it() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();
        let store = catalog
            .create_container(dir.path(), "main", CreateOptions::default())
            .unwrap();
        let source = write_points(dir.path(), "points.geojson", 10, 5);
        let progress = ProgressState::new("load");

        let summary = catalog
            .import_into(&source, &store, &LoadOptions { batch_size: 3, ..LoadOptions::default() }, &progress)
            .unwrap();

        assert_eq!(summary.dataset, "points");
        assert_eq!(summary.features_written, 8);
        assert_eq!(summary.features_skipped, 2);
        assert_eq!(progress.snapshot().percent, 100.0);
        assert!(catalog.object_exists(&summary.dataset_path()));

        let lines = fs::read_to_string(dataset_path(&store, "points")).unwrap();
        assert_eq!(lines.lines().count(), 8);
        assert_eq!(summary.bytes_written, lines.len() as u64);

        let info = ContainerInfo::read(&store).unwrap();
        assert_eq!(info.dataset("points").unwrap().geometry_type, "Point");

        let again = catalog
            .import_into(&source, &store, &LoadOptions::from_pairs::<&str>(&[]).unwrap(), &progress)
            .unwrap();
        assert_eq!(again.dataset, "points_1");
        assert_eq!(again.features_written, 10);
    }

    #[test]
    fn cancelled_import_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();
        let store = catalog
            .create_container(dir.path(), "main", CreateOptions::default())
            .unwrap();
        let source = write_points(dir.path(), "many.geojson", 100, 0);
        let stop = StopAfter { calls: AtomicUsize::new(0), limit: 3 };

        let err = catalog
            .import_into(&source, &store, &LoadOptions { batch_size: 10, ..LoadOptions::default() }, &stop)
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!dataset_path(&store, "many").exists());
        assert!(!catalog.object_exists(&store.join("many")));
        assert_eq!(catalog.last_error_message(), "");
    }

    #[test]
    fn catalogs_sharing_a_store_see_each_others_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let viewer = catalog();
        let store = viewer
            .create_container(dir.path(), "main", CreateOptions::default())
            .unwrap();
        assert!(viewer.container_info(&store).unwrap().datasets.is_empty());

        let cli = catalog();
        let progress = ProgressState::new("load");
        let five = write_points(dir.path(), "parks.geojson", 5, 0);
        cli.import_into(&five, &store, &LoadOptions::default(), &progress)
            .unwrap();
        assert!(viewer.object_exists(&store.join("parks")));

        let two = write_points(dir.path(), "other.geojson", 2, 0);
        let options = LoadOptions::from_pairs(&["NAME=parks"]).unwrap();
        let summary = viewer.import_into(&two, &store, &options, &progress).unwrap();
        assert_eq!(summary.dataset, "parks_1");

        let info = ContainerInfo::read(&store).unwrap();
        let counts: Vec<(&str, u64)> = info
            .datasets
            .iter()
            .map(|d| (d.name.as_str(), d.feature_count))
            .collect();
        assert_eq!(counts, vec![("parks", 5), ("parks_1", 2)]);
        let kept = fs::read_to_string(dataset_path(&store, "parks")).unwrap();
        assert_eq!(kept.lines().count(), 5);
        assert_eq!(cli.container_info(&store).unwrap().datasets.len(), 2);
    }

    #[test]
    fn import_never_overwrites_unlisted_dataset_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();
        let store = catalog
            .create_container(dir.path(), "main", CreateOptions::default())
            .unwrap();
        fs::write(dataset_path(&store, "roads"), "keep me\n").unwrap();
        let source = write_points(dir.path(), "roads.geojson", 3, 0);

        let summary = catalog
            .import_into(&source, &store, &LoadOptions::default(), &ProgressState::new("load"))
            .unwrap();

        assert_eq!(summary.dataset, "roads_1");
        assert_eq!(fs::read_to_string(dataset_path(&store, "roads")).unwrap(), "keep me\n");
    }

    #[test]
    fn failed_catalog_write_removes_dataset_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();
        let store = catalog
            .create_container(dir.path(), "main", CreateOptions::default())
            .unwrap();
        fs::create_dir(store.join(format!("{}.tmp", CATALOG_FILE))).unwrap();
        let source = write_points(dir.path(), "roads.geojson", 4, 0);

        let err = catalog
            .import_into(&source, &store, &LoadOptions::default(), &ProgressState::new("load"))
            .unwrap_err();

        assert!(matches!(err, NgViewError::Io(_)));
        assert!(!dataset_path(&store, "roads").exists());
        assert!(ContainerInfo::read(&store).unwrap().datasets.is_empty());
        assert!(!catalog.last_error_message().is_empty());
    }

    #[test]
    fn failed_import_records_last_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();
        let store = catalog
            .create_container(dir.path(), "main", CreateOptions::default())
            .unwrap();
        let progress = ProgressState::new("load");

        let err = catalog
            .import_into(&dir.path().join("absent.geojson"), &store, &LoadOptions::default(), &progress)
            .unwrap_err();
        assert!(matches!(err, NgViewError::NotFound(_)));
        assert!(catalog.last_error_message().contains("absent.geojson"));

        let not_a_store = dir.path().join("plain");
        fs::create_dir(&not_a_store).unwrap();
        let source = write_points(dir.path(), "p.geojson", 1, 0);
        assert!(catalog
            .import_into(&source, &not_a_store, &LoadOptions::default(), &progress)
            .is_err());
    }
}
