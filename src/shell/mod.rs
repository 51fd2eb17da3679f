//! Application shell
//!
//! Owns the store session, the map model, the import controller and the
//! user-visible state (status line and pending notices). The GUI calls into
//! it for every action and renders what it exposes; nothing here depends on
//! the windowing toolkit.

pub mod status;

use crate::error::Result;
use crate::import::{ImportController, ImportReport};
use crate::map::MapModel;
use crate::store::Session;
use crate::task::TaskOutcome;
use status::StatusLine;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const READY_TIMEOUT: Duration = Duration::from_secs(30);
const ACTION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A modal message waiting to be acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub text: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            text: text.into(),
        }
    }
}

pub struct Shell {
    session: Session,
    map: MapModel,
    imports: ImportController,
    status: StatusLine,
    notices: VecDeque<Notice>,
}

impl Shell {
    pub fn new(session: Session) -> Self {
        let imports = ImportController::new(session.catalog().clone());
        let mut status = StatusLine::new();
        status.set("Ready", Some(READY_TIMEOUT));
        let mut map = MapModel::new();
        map.create();

        Self {
            session,
            map,
            imports,
            status,
            notices: VecDeque::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn map(&self) -> &MapModel {
        &self.map
    }

    pub fn imports(&self) -> &ImportController {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut ImportController {
        &mut self.imports
    }

    pub fn status_text(&self) -> &str {
        self.status.text()
    }

    pub fn set_status(&mut self, text: impl Into<String>, timeout: Option<Duration>) {
        self.status.set(text, timeout);
    }

    /// Oldest notice not yet acknowledged
    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    /// Discard the current document and start an empty one
    pub fn new_document(&mut self) {
        self.map.create();
        self.set_status("New map", Some(ACTION_TIMEOUT));
    }

    /// Open a map document. On failure the current document is kept.
    pub fn open_document(&mut self, path: &Path) -> bool {
        match self.map.open(path) {
            Ok(()) => {
                self.set_status("Map opened", Some(ACTION_TIMEOUT));
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "map load failed");
                self.notify(Notice::error(format!("Map load failed\n{}", e)));
                false
            }
        }
    }

    /// Save the map document to `path`
    pub fn save_document(&mut self, path: &Path) -> bool {
        match self.map.save(path) {
            Ok(()) => {
                self.set_status("Map saved", Some(ACTION_TIMEOUT));
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "map save failed");
                self.notify(Notice::error(format!("Map save failed\n{}", e)));
                false
            }
        }
    }

    /// Append a layer for `source`, named after the current layer count
    pub fn add_layer(&mut self, source: &Path) -> Option<usize> {
        if !self.session.catalog().object_exists(source) {
            self.notify(Notice::error(format!(
                "Add layer failed\nObject not found: {}",
                source.display()
            )));
            return None;
        }
        let name = format!("Layer {}", self.map.layer_count());
        match self.map.create_layer(&name, source) {
            Ok(position) => {
                self.set_status(format!("{} added", name), Some(ACTION_TIMEOUT));
                Some(position)
            }
            Err(e) => {
                self.notify(Notice::error(format!("Add layer failed\n{}", e)));
                None
            }
        }
    }

    /// Remove the layers at `positions` (positions before any removal).
    /// Returns how many were removed.
    pub fn remove_layers(&mut self, positions: &[usize]) -> usize {
        let removed = self.map.delete_layers(positions).len();
        if removed > 0 {
            self.set_status(format!("{} layer(s) removed", removed), Some(ACTION_TIMEOUT));
        }
        removed
    }

    /// Reorder the layer list; false if a position is out of range
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        let moved = self.map.move_layer(from, to);
        if moved && from != to {
            self.set_status("Layer moved", Some(ACTION_TIMEOUT));
        }
        moved
    }

    pub fn set_layer_visible(&mut self, position: usize, visible: bool) {
        self.map.set_layer_visible(position, visible);
    }

    /// Start loading `source` into the session's main store
    pub fn load_data(&mut self, source: &Path) -> Result<()> {
        let options = self.session.config().load_options();
        let store = self.session.store_path().to_path_buf();
        match self.imports.import_source(source, &store, options) {
            Ok(()) => {
                self.set_status(format!("Loading {}", source.display()), None);
                Ok(())
            }
            Err(e) => {
                self.notify(Notice::error(format!("Load to store failed.\nError: {}", e)));
                Err(e)
            }
        }
    }

    pub fn cancel_import(&mut self) {
        self.imports.cancel();
    }

    /// Pump background work; call once per frame on the interactive thread
    pub fn poll(&mut self) {
        self.imports.poll();
        for report in self.imports.take_reports() {
            self.apply_report(report);
        }
    }

    fn apply_report(&mut self, report: ImportReport) {
        if let Some(text) = report.error_text() {
            self.status.clear();
            self.notify(Notice::error(text));
            return;
        }
        match report.outcome {
            TaskOutcome::Completed(summary) => {
                info!(dataset = %summary.dataset, "load finished");
                self.set_status("Load finished", Some(ACTION_TIMEOUT));
                self.notify(Notice::info(
                    "Load finished",
                    format!(
                        "Loaded {} features into '{}' ({}, {} skipped) in {:.2}s",
                        summary.features_written,
                        summary.dataset,
                        crate::format_size(summary.bytes_written),
                        summary.features_skipped,
                        summary.elapsed.as_secs_f64()
                    ),
                ));
            }
            TaskOutcome::Canceled => {
                self.set_status("Load canceled", Some(ACTION_TIMEOUT));
            }
            TaskOutcome::Failed(_) => {}
        }
    }
}
