//! Progress reporting with cooperative cancellation
//!
//! A running task receives a [`ProgressReporter`] and calls it at its own
//! checkpoints. The return value tells the task whether to keep going.
//! [`ProgressState`] is the shared implementation behind the GUI progress
//! dialog; [`ConsoleProgress`] drives an `indicatif` bar for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Capability handed to a long-running task.
pub trait ProgressReporter: Send + Sync {
    /// Report `percent` complete with a status `message`.
    ///
    /// Returns `false` when the task should stop as soon as possible.
    fn report(&self, percent: f64, message: &str) -> bool;
}

/// Clamp a reported percentage into `[0, 100]`. NaN counts as zero.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Point-in-time view of a [`ProgressState`] for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub percent: f64,
    pub message: String,
    pub cancel_requested: bool,
}

#[derive(Default)]
struct Shown {
    percent: f64,
    message: String,
}

type Waker = Box<dyn Fn() + Send + Sync>;

/// Shared progress surface state.
///
/// The worker writes through [`ProgressReporter::report`]; the interactive
/// thread reads [`ProgressState::snapshot`] and sets the cancel flag.
pub struct ProgressState {
    title: String,
    shown: Mutex<Shown>,
    cancelled: AtomicBool,
    dismissed: AtomicBool,
    waker: Option<Waker>,
}

impl ProgressState {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            shown: Mutex::new(Shown::default()),
            cancelled: AtomicBool::new(false),
            dismissed: AtomicBool::new(false),
            waker: None,
        }
    }

    /// Call `waker` after every accepted report (e.g. to request a repaint).
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Box::new(waker));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Ask the task to stop at its next checkpoint
    pub fn request_cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Close the surface. Returns `true` only for the first call.
    pub fn dismiss(&self) -> bool {
        !self.dismissed.swap(true, Ordering::SeqCst)
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let shown = self.shown.lock();
        ProgressSnapshot {
            percent: shown.percent,
            message: shown.message.clone(),
            cancel_requested: self.is_cancel_requested(),
        }
    }
}

impl ProgressReporter for ProgressState {
    fn report(&self, percent: f64, message: &str) -> bool {
        // A dismissed surface no longer shows anything
        if !self.is_dismissed() {
            {
                let mut shown = self.shown.lock();
                shown.percent = clamp_percent(percent);
                if !message.is_empty() {
                    shown.message = message.to_string();
                }
            }
            if let Some(waker) = &self.waker {
                waker();
            }
        }
        !self.is_cancel_requested()
    }
}

/// Terminal progress bar for the CLI. It never asks the task to stop;
/// interrupting the process ends the import.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// Hidden bar, for non-interactive output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    pub fn abandon(&self, message: impl Into<String>) {
        self.bar.abandon_with_message(message.into());
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, percent: f64, message: &str) -> bool {
        self.bar.set_position(clamp_percent(percent).round() as u64);
        if !message.is_empty() {
            self.bar.set_message(message.to_string());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn reported_percent_is_clamped() {
        let state = ProgressState::new("Loading ...");
        for (reported, shown) in [(-5.0, 0.0), (0.0, 0.0), (42.5, 42.5), (100.0, 100.0), (250.0, 100.0)] {
            assert!(state.report(reported, "step"));
            assert_eq!(state.snapshot().percent, shown);
        }
        state.report(f64::NAN, "");
        assert_eq!(state.snapshot().percent, 0.0);
        assert_eq!(state.snapshot().message, "step");
    }

    #[test]
    fn cancel_turns_report_false() {
        let state = ProgressState::new("Loading ...");
        assert!(state.report(10.0, "a"));
        state.request_cancel();
        assert!(!state.report(20.0, "b"));
        assert!(state.snapshot().cancel_requested);
    }

    #[test]
    fn reports_after_dismiss_are_ignored() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let state = ProgressState::new("Loading ...").with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        state.report(30.0, "half way");
        assert!(state.dismiss());
        assert!(!state.dismiss());

        assert!(state.report(90.0, "late"));
        let snap = state.snapshot();
        assert_eq!(snap.percent, 30.0);
        assert_eq!(snap.message, "half way");
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn console_progress_tracks_position() {
        let progress = ConsoleProgress::hidden();
        assert!(progress.report(150.0, "x"));
        assert_eq!(progress.bar.position(), 100);
        assert!(progress.report(49.6, "y"));
        assert_eq!(progress.bar.position(), 50);
    }
}
