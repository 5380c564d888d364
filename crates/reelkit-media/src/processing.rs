//! Trim/filter processing contract.
//!
//! The actual transform runs in a platform backend. This module owns the
//! request shape, output naming, progress and cancellation handling, and
//! guarantees that a failed or cancelled run leaves no output file behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelkit_core::{MediaError, Result, TimeRange};
use reelkit_timeline::{Clip, Filter};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::job::{CancelToken, JobHandle, PartialOutput, ProgressSink};

/// Extension used when the source reference carries none.
const DEFAULT_EXTENSION: &str = "mp4";

/// What to cut out of a source and which filters to apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRequest {
    pub source: String,
    /// Source time window to keep.
    pub range: TimeRange,
    /// Applied in listed order.
    pub filters: Vec<Filter>,
}

impl ProcessRequest {
    pub fn new(source: impl Into<String>, range: TimeRange) -> Self {
        Self {
            source: source.into(),
            range,
            filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    /// Request rendering `clip`'s trim window with its filters.
    pub fn from_clip(clip: &Clip) -> Self {
        Self {
            source: clip.source().to_string(),
            range: clip.trim(),
            filters: clip.filters().to_vec(),
        }
    }

    /// Extension for the output, taken from the source reference.
    fn output_extension(&self) -> &str {
        Path::new(&self.source)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(DEFAULT_EXTENSION)
    }
}

/// Native transformer that writes the processed media to `output`.
///
/// Implementations should poll `cancel` regularly and return
/// `MediaError::Cancelled` once it is set.
pub trait ProcessBackend: Send + Sync {
    fn process(
        &self,
        request: &ProcessRequest,
        output: &Path,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<()>;
}

/// Runs processing requests against a backend.
#[derive(Debug)]
pub struct Processor<B> {
    backend: Arc<B>,
    output_dir: PathBuf,
}

impl<B: ProcessBackend + 'static> Processor<B> {
    /// Create a processor writing results into `output_dir`.
    pub fn new(backend: B, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Arc::new(backend),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process on the calling thread. Returns the new source reference.
    pub fn process(
        &self,
        request: &ProcessRequest,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<String> {
        run(&*self.backend, &self.output_dir, request, progress, cancel)
    }

    /// Process on a worker thread.
    pub fn spawn(&self, request: ProcessRequest) -> Result<JobHandle<String>> {
        let backend = Arc::clone(&self.backend);
        let output_dir = self.output_dir.clone();
        JobHandle::spawn("reelkit-process", move |sink, cancel| {
            run(&*backend, &output_dir, &request, &sink, &cancel)
        })
    }
}

fn run<B: ProcessBackend + ?Sized>(
    backend: &B,
    output_dir: &Path,
    request: &ProcessRequest,
    progress: &ProgressSink,
    cancel: &CancelToken,
) -> Result<String> {
    cancel.check()?;
    if request.range.is_empty() {
        return Err(MediaError::InvalidState(format!(
            "nothing to process in empty range {}",
            request.range
        )));
    }

    let output = output_dir.join(format!("{}.{}", Uuid::new_v4(), request.output_extension()));
    let Some(source_ref) = output.to_str().map(str::to_owned) else {
        return Err(MediaError::Config(format!(
            "output path {} is not valid UTF-8",
            output.display()
        )));
    };
    let guard = PartialOutput::new(&output);
    info!(
        source = %request.source,
        range = %request.range,
        filters = request.filters.len(),
        output = %output.display(),
        "processing"
    );

    backend.process(request, &output, progress, cancel)?;
    cancel.check()?;
    if !output.exists() {
        return Err(MediaError::Runtime(format!(
            "backend reported success but wrote no file at {}",
            output.display()
        )));
    }

    progress.finish();
    guard.commit();
    debug!(output = %source_ref, "processing finished");
    Ok(source_ref)
}
