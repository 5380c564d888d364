//! Shared plumbing for long-running collaborator jobs: cancellation,
//! progress reporting, partial-output cleanup and worker threads.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use reelkit_core::{MediaError, Result};
use tracing::{debug, warn};

/// Handle for cancelling an in-progress job.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MediaError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Fractional progress reporter handed to backends.
///
/// Values are clamped to `[0.0, 1.0]`; NaN, repeats and regressions are
/// dropped, so receivers only ever see a strictly increasing sequence.
#[derive(Debug)]
pub struct ProgressSink {
    tx: Option<Sender<f64>>,
    last: Mutex<f64>,
}

impl ProgressSink {
    /// A sink paired with the receiving end of an unbounded channel.
    pub fn channel() -> (Self, Receiver<f64>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Self {
                tx: Some(tx),
                last: Mutex::new(0.0),
            },
            rx,
        )
    }

    /// A sink that only tracks the latest value.
    pub fn discard() -> Self {
        Self {
            tx: None,
            last: Mutex::new(0.0),
        }
    }

    /// Report progress.
    pub fn report(&self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let mut last = self.last.lock();
        if fraction <= *last {
            return;
        }
        *last = fraction;
        if let Some(tx) = &self.tx {
            // Receiver may have been dropped; progress is best-effort.
            let _ = tx.send(fraction);
        }
    }

    /// Mark the job complete.
    pub fn finish(&self) {
        self.report(1.0);
    }

    /// Latest reported value.
    pub fn latest(&self) -> f64 {
        *self.last.lock()
    }
}

/// Output file that is deleted on drop unless committed.
#[derive(Debug)]
pub struct PartialOutput {
    path: PathBuf,
    committed: bool,
}

impl PartialOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            committed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file. Returns its path.
    pub fn commit(mut self) -> PathBuf {
        self.committed = true;
        std::mem::take(&mut self.path)
    }

    /// Move the file onto `target`, replacing whatever is there.
    ///
    /// If the rename fails the partial file is still removed and `target`
    /// is left as it was.
    pub fn persist(mut self, target: &Path) -> Result<PathBuf> {
        std::fs::rename(&self.path, target)?;
        self.committed = true;
        Ok(target.to_path_buf())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if self.committed || !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial output"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove partial output"),
        }
    }
}

/// A job running on a worker thread.
#[derive(Debug)]
pub struct JobHandle<T> {
    progress: Receiver<f64>,
    cancel: CancelToken,
    thread: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> JobHandle<T> {
    /// Run `job` on a named worker thread with a fresh progress channel and
    /// cancel token.
    pub(crate) fn spawn<F>(name: &str, job: F) -> Result<Self>
    where
        F: FnOnce(ProgressSink, CancelToken) -> Result<T> + Send + 'static,
    {
        let (sink, progress) = ProgressSink::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let thread = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || job(sink, worker_cancel))?;
        Ok(Self {
            progress,
            cancel,
            thread,
        })
    }

    /// Progress updates in `(0.0, 1.0]`, strictly increasing.
    pub fn progress(&self) -> &Receiver<f64> {
        &self.progress
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the job and return its result.
    pub fn join(self) -> Result<T> {
        self.thread
            .join()
            .map_err(|_| MediaError::Runtime("job thread panicked".into()))?
    }
}
