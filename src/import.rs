//! Import controller
//!
//! Loads a data source into a store container in the background: ensures
//! the container exists, opens a progress surface, runs the import on the
//! task runner and turns the outcome into an [`ImportReport`] once it is
//! delivered on the interactive thread.

use crate::error::{NgViewError, Result};
use crate::progress::ProgressState;
use crate::store::{Catalog, CreateOptions, ImportSummary, LoadOptions};
use crate::task::{RunnerState, TaskError, TaskOutcome, TaskRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Title of the progress surface
pub const PROGRESS_TITLE: &str = "Loading ...";

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Outcome of one import, ready to be shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub source: PathBuf,
    pub outcome: TaskOutcome<ImportSummary>,
}

impl ImportReport {
    /// Error text for a failed import, `None` otherwise
    pub fn error_text(&self) -> Option<String> {
        match &self.outcome {
            TaskOutcome::Failed(message) => {
                Some(format!("Load to store failed.\nError: {}", message))
            }
            _ => None,
        }
    }
}

pub struct ImportController {
    catalog: Arc<Catalog>,
    runner: TaskRunner<ImportSummary, ImportController>,
    progress: Option<Arc<ProgressState>>,
    reports: Vec<ImportReport>,
    waker: Option<Waker>,
}

impl ImportController {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            runner: TaskRunner::new("ngview-import"),
            progress: None,
            reports: Vec::new(),
            waker: None,
        }
    }

    /// Called whenever the progress surface changes (e.g. to request a repaint)
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_busy()
    }

    pub fn state(&self) -> RunnerState {
        self.runner.state()
    }

    /// The open progress surface, if an import is in flight
    pub fn progress(&self) -> Option<&Arc<ProgressState>> {
        self.progress.as_ref()
    }

    /// Ask the running import to stop at its next checkpoint
    pub fn cancel(&self) {
        if let Some(progress) = &self.progress {
            info!("import cancel requested");
            progress.request_cancel();
        }
    }

    /// Start loading `source` into the container at `destination`.
    ///
    /// Returns as soon as the worker is started. Fails with
    /// [`NgViewError::AlreadyRunning`] while another import is in flight.
    pub fn import_source(&mut self, source: &Path, destination: &Path, options: LoadOptions) -> Result<()> {
        if self.runner.is_busy() {
            return Err(NgViewError::AlreadyRunning);
        }
        self.ensure_store(destination)?;

        let mut state = ProgressState::new(PROGRESS_TITLE);
        if let Some(waker) = &self.waker {
            let waker = waker.clone();
            state = state.with_waker(move || waker());
        }
        let progress = Arc::new(state);

        let catalog = self.catalog.clone();
        let task_source = source.to_path_buf();
        let task_dest = destination.to_path_buf();
        let report_source = source.to_path_buf();

        self.runner.start(
            progress.clone(),
            move |reporter| {
                catalog
                    .import_into(&task_source, &task_dest, &options, reporter)
                    .map_err(TaskError::from)
            },
            move |controller: &mut ImportController, outcome| {
                controller.finish(report_source, outcome);
            },
        )?;

        info!(source = %source.display(), store = %destination.display(), "import queued");
        self.progress = Some(progress);
        Ok(())
    }

    fn ensure_store(&self, destination: &Path) -> Result<()> {
        if self.catalog.object_exists(destination) {
            return Ok(());
        }
        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        let name = destination
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NgViewError::NotFound(destination.to_path_buf()))?;
        self.catalog
            .create_container(parent, name, CreateOptions::default())?;
        Ok(())
    }

    /// Completion handler; runs on the interactive thread
    fn finish(&mut self, source: PathBuf, outcome: TaskOutcome<ImportSummary>) {
        let outcome = match outcome {
            TaskOutcome::Failed(message) => {
                let last = self.catalog.last_error_message();
                let text = if last.is_empty() { message } else { last };
                error!(source = %source.display(), "import failed: {}", text);
                TaskOutcome::Failed(text)
            }
            other => other,
        };

        if let Some(progress) = self.progress.take() {
            progress.dismiss();
        }
        self.reports.push(ImportReport { source, outcome });
    }

    /// Pump the runner. Returns true when an import finished this call.
    pub fn poll(&mut self) -> bool {
        match self.runner.poll() {
            Some(finished) => {
                finished.deliver(self);
                true
            }
            None => false,
        }
    }

    /// Reports produced since the last call
    pub fn take_reports(&mut self) -> Vec<ImportReport> {
        std::mem::take(&mut self.reports)
    }
}
