//! Single-slot background task runner
//!
//! Runs one long operation on a worker thread and hands its outcome back to
//! the interactive thread. The interactive thread never blocks: it calls
//! [`TaskRunner::poll`] once per frame, and when the task has finished it
//! receives a [`Finished`] whose completion handler it invokes with its own
//! state.
//!
//! State machine: `Idle -> Running -> {Completed, Canceled, Failed}`, back to
//! `Idle` once the outcome has been taken by `poll`.

use crate::error::{NgViewError, Result};
use crate::progress::{ProgressReporter, ProgressState};
use crossbeam_channel::{Receiver, TryRecvError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// How a task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCode {
    Completed,
    Canceled,
    Failed,
}

impl OutcomeCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCode::Completed => "Completed",
            OutcomeCode::Canceled => "Canceled",
            OutcomeCode::Failed => "Failed",
        }
    }
}

/// Outcome plus payload, delivered to the completion handler
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Completed(T),
    Canceled,
    Failed(String),
}

impl<T> TaskOutcome<T> {
    pub fn code(&self) -> OutcomeCode {
        match self {
            TaskOutcome::Completed(_) => OutcomeCode::Completed,
            TaskOutcome::Canceled => OutcomeCode::Canceled,
            TaskOutcome::Failed(_) => OutcomeCode::Failed,
        }
    }
}

/// Error a task returns to stop early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    Canceled,
    Failed(String),
}

impl From<NgViewError> for TaskError {
    fn from(err: NgViewError) -> Self {
        if err.is_cancelled() {
            TaskError::Canceled
        } else {
            TaskError::Failed(err.to_string())
        }
    }
}

/// Observable runner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Finished(OutcomeCode),
}

const RUNNING: u8 = 0;
const COMPLETED: u8 = 1;
const CANCELED: u8 = 2;
const FAILED: u8 = 3;

fn status_code(code: OutcomeCode) -> u8 {
    match code {
        OutcomeCode::Completed => COMPLETED,
        OutcomeCode::Canceled => CANCELED,
        OutcomeCode::Failed => FAILED,
    }
}

type Handler<T, C> = Box<dyn FnOnce(&mut C, TaskOutcome<T>)>;

struct Slot<T, C> {
    rx: Receiver<TaskOutcome<T>>,
    status: Arc<AtomicU8>,
    progress: Arc<ProgressState>,
    on_complete: Handler<T, C>,
}

/// A finished task waiting for its completion handler to run.
#[must_use = "the completion handler only runs when `deliver` is called"]
pub struct Finished<T, C> {
    outcome: TaskOutcome<T>,
    on_complete: Handler<T, C>,
}

impl<T, C> Finished<T, C> {
    pub fn code(&self) -> OutcomeCode {
        self.outcome.code()
    }

    /// Run the completion handler on the calling (interactive) thread
    pub fn deliver(self, ctx: &mut C) {
        (self.on_complete)(ctx, self.outcome)
    }
}

/// Runs at most one task at a time.
///
/// `T` is the task payload, `C` the state the completion handler mutates.
pub struct TaskRunner<T, C> {
    name: String,
    slot: Option<Slot<T, C>>,
}

impl<T: Send + 'static, C> TaskRunner<T, C> {
    /// `name` is used for the worker thread
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: None,
        }
    }

    pub fn state(&self) -> RunnerState {
        match &self.slot {
            None => RunnerState::Idle,
            Some(slot) => match slot.status.load(Ordering::SeqCst) {
                COMPLETED => RunnerState::Finished(OutcomeCode::Completed),
                CANCELED => RunnerState::Finished(OutcomeCode::Canceled),
                FAILED => RunnerState::Finished(OutcomeCode::Failed),
                _ => RunnerState::Running,
            },
        }
    }

    /// True until the outcome of the current task has been taken
    pub fn is_busy(&self) -> bool {
        self.slot.is_some()
    }

    /// Progress surface of the task in the slot, if any
    pub fn progress(&self) -> Option<&Arc<ProgressState>> {
        self.slot.as_ref().map(|slot| &slot.progress)
    }

    /// Start `task` on a worker thread and return immediately.
    ///
    /// Fails with [`NgViewError::AlreadyRunning`] while another task occupies
    /// the slot; the running task is left untouched.
    pub fn start<F, H>(&mut self, progress: Arc<ProgressState>, task: F, on_complete: H) -> Result<()>
    where
        F: FnOnce(&dyn ProgressReporter) -> std::result::Result<T, TaskError> + Send + 'static,
        H: FnOnce(&mut C, TaskOutcome<T>) + 'static,
    {
        if self.slot.is_some() {
            return Err(NgViewError::AlreadyRunning);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let status = Arc::new(AtomicU8::new(RUNNING));
        let worker_status = status.clone();
        let reporter = progress.clone();

        thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    task(&*reporter)
                }));
                let outcome = match result {
                    Ok(Ok(value)) => TaskOutcome::Completed(value),
                    Ok(Err(TaskError::Canceled)) => TaskOutcome::Canceled,
                    Ok(Err(TaskError::Failed(message))) => TaskOutcome::Failed(message),
                    Err(payload) => TaskOutcome::Failed(panic_message(payload.as_ref())),
                };
                // The task function has returned: no more progress calls from here on
                worker_status.store(status_code(outcome.code()), Ordering::SeqCst);
                let _ = tx.send(outcome);
            })?;

        debug!(task = %self.name, "task started");
        self.slot = Some(Slot {
            rx,
            status,
            progress,
            on_complete: Box::new(on_complete),
        });
        Ok(())
    }

    /// Take the finished task, if there is one. Never blocks.
    ///
    /// Each started task is returned exactly once; the runner is `Idle`
    /// afterwards.
    pub fn poll(&mut self) -> Option<Finished<T, C>> {
        let outcome = match self.slot.as_ref()?.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                warn!(task = %self.name, "worker exited without a result");
                TaskOutcome::Failed("worker thread exited without a result".to_string())
            }
        };
        let slot = self.slot.take()?;
        debug!(task = %self.name, outcome = outcome.code().as_str(), "task finished");
        Some(Finished {
            outcome,
            on_complete: slot.on_complete,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("task panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("task panicked: {}", s)
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::{Duration, Instant};

    /// Poll until the task finishes, as the frame loop would
    pub(crate) fn wait_for<T: Send + 'static, C>(runner: &mut TaskRunner<T, C>) -> Finished<T, C> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(finished) = runner.poll() {
                return finished;
            }
            assert!(Instant::now() < deadline, "task did not finish in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[derive(Default)]
    struct Ui {
        outcomes: Vec<TaskOutcome<u32>>,
        thread: Option<thread::ThreadId>,
    }

    fn record(ui: &mut Ui, outcome: TaskOutcome<u32>) {
        ui.outcomes.push(outcome);
        ui.thread = Some(thread::current().id());
    }

    #[test]
    fn completion_is_delivered_once_on_polling_thread() {
        let mut runner: TaskRunner<u32, Ui> = TaskRunner::new("test-worker");
        let mut ui = Ui::default();
        let progress = Arc::new(ProgressState::new("work"));

        runner
            .start(progress, |reporter| {
                for step in 0..=4 {
                    reporter.report(step as f64 * 25.0, "step");
                }
                Ok(7)
            }, record)
            .unwrap();
        assert!(runner.is_busy());

        wait_for(&mut runner).deliver(&mut ui);

        assert_eq!(ui.outcomes, vec![TaskOutcome::Completed(7)]);
        assert_eq!(ui.thread, Some(thread::current().id()));
        assert_eq!(runner.state(), RunnerState::Idle);
        assert!(runner.poll().is_none());
    }

    #[test]
    fn second_start_is_rejected_while_running() {
        let mut runner: TaskRunner<u32, Ui> = TaskRunner::new("test-worker");
        let mut ui = Ui::default();
        let release = Arc::new(AtomicBool::new(false));
        let gate = release.clone();

        runner
            .start(Arc::new(ProgressState::new("first")), move |_| {
                while !gate.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(1));
                }
                Ok(1)
            }, record)
            .unwrap();
        assert_eq!(runner.state(), RunnerState::Running);

        let second = runner.start(Arc::new(ProgressState::new("second")), |_| Ok(2), record);
        assert!(matches!(second, Err(NgViewError::AlreadyRunning)));
        assert_eq!(runner.progress().map(|p| p.title().to_string()), Some("first".to_string()));

        release.store(true, Ordering::SeqCst);
        wait_for(&mut runner).deliver(&mut ui);
        assert_eq!(ui.outcomes, vec![TaskOutcome::Completed(1)]);
    }

    #[test]
    fn cancel_request_ends_as_canceled() {
        let mut runner: TaskRunner<u32, Ui> = TaskRunner::new("test-worker");
        let mut ui = Ui::default();
        let progress = Arc::new(ProgressState::new("cancel me"));
        progress.request_cancel();

        runner
            .start(progress, |reporter| {
                for step in 0..100 {
                    if !reporter.report(step as f64, "") {
                        return Err(TaskError::Canceled);
                    }
                }
                Ok(0)
            }, record)
            .unwrap();

        let finished = wait_for(&mut runner);
        assert_eq!(finished.code(), OutcomeCode::Canceled);
        finished.deliver(&mut ui);
        assert_eq!(ui.outcomes, vec![TaskOutcome::Canceled]);
    }

    #[test]
    fn task_past_last_checkpoint_still_completes() {
        let mut runner: TaskRunner<u32, Ui> = TaskRunner::new("test-worker");
        let mut ui = Ui::default();
        let progress = Arc::new(ProgressState::new("late cancel"));
        let checkpoint_passed = Arc::new(AtomicBool::new(false));
        let passed = checkpoint_passed.clone();
        let cancel_seen = progress.clone();

        runner
            .start(progress.clone(), move |reporter| {
                if !reporter.report(100.0, "done") {
                    return Err(TaskError::Canceled);
                }
                passed.store(true, Ordering::SeqCst);
                while !cancel_seen.is_cancel_requested() {
                    thread::sleep(Duration::from_millis(1));
                }
                Ok(3)
            }, record)
            .unwrap();

        while !checkpoint_passed.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        progress.request_cancel();

        wait_for(&mut runner).deliver(&mut ui);
        assert_eq!(ui.outcomes, vec![TaskOutcome::Completed(3)]);
    }

    #[test]
    fn no_progress_after_completion() {
        let mut runner: TaskRunner<u32, Ui> = TaskRunner::new("test-worker");
        let mut ui = Ui::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let progress = Arc::new(ProgressState::new("count").with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        runner
            .start(progress, |reporter| {
                for step in 0..50 {
                    reporter.report(step as f64 * 2.0, "");
                }
                Ok(50)
            }, record)
            .unwrap();

        let finished = wait_for(&mut runner);
        let seen_at_delivery = calls.load(Ordering::SeqCst);
        finished.deliver(&mut ui);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(seen_at_delivery, 50);
        assert_eq!(calls.load(Ordering::SeqCst), seen_at_delivery);
    }

    #[test]
    fn failure_and_panic_become_failed() {
        let mut runner: TaskRunner<u32, Ui> = TaskRunner::new("test-worker");
        let mut ui = Ui::default();

        runner
            .start(Arc::new(ProgressState::new("fail")), |_| {
                Err(NgViewError::NotFound("missing.geojson".into()).into())
            }, record)
            .unwrap();
        wait_for(&mut runner).deliver(&mut ui);

        runner
            .start(Arc::new(ProgressState::new("panic")), |_| -> std::result::Result<u32, TaskError> {
                panic!("boom")
            }, record)
            .unwrap();
        let finished = wait_for(&mut runner);
        assert_eq!(runner.state(), RunnerState::Idle);
        finished.deliver(&mut ui);

        assert_eq!(ui.outcomes.len(), 2);
        assert!(matches!(&ui.outcomes[0], TaskOutcome::Failed(m) if m.contains("missing.geojson")));
        assert!(matches!(&ui.outcomes[1], TaskOutcome::Failed(m) if m.contains("boom")));
    }

    #[test]
    fn cancelled_error_maps_to_canceled() {
        assert_eq!(TaskError::from(NgViewError::Cancelled), TaskError::Canceled);
        assert!(matches!(
            TaskError::from(NgViewError::AlreadyRunning),
            TaskError::Failed(_)
        ));
    }
}
