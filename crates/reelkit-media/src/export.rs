//! Export pipeline contract for rendering projects to video files.
//!
//! Encoding is done by a platform backend. This module owns the export
//! configuration (loadable from JSON), size/time estimation, progress,
//! cancellation and the result record.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reelkit_core::{MediaError, Result};
use reelkit_timeline::Project;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::job::{CancelToken, JobHandle, PartialOutput, ProgressSink};

/// Pixels in a 1080p frame, the reference for time estimates.
const REFERENCE_PIXELS: f64 = 1920.0 * 1080.0;

/// Reference frame rate for time estimates.
const REFERENCE_FPS: f64 = 30.0;

/// Media seconds encoded per wall-clock second at 1080p30.
const REALTIME_FACTOR: f64 = 2.0;

// ── Format presets ──────────────────────────────────────────────

/// Target resolution preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "480p")]
    Sd480,
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    FullHd1080,
    #[serde(rename = "2160p")]
    Uhd2160,
}

impl Resolution {
    pub fn width(self) -> u32 {
        match self {
            Self::Sd480 => 854,
            Self::Hd720 => 1280,
            Self::FullHd1080 => 1920,
            Self::Uhd2160 => 3840,
        }
    }

    pub fn height(self) -> u32 {
        match self {
            Self::Sd480 => 480,
            Self::Hd720 => 720,
            Self::FullHd1080 => 1080,
            Self::Uhd2160 => 2160,
        }
    }

    /// `"WIDTHxHEIGHT"`.
    pub fn label(self) -> String {
        format!("{}x{}", self.width(), self.height())
    }

    fn pixel_count(self) -> f64 {
        self.width() as f64 * self.height() as f64
    }
}

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mp4,
    Mov,
    Webm,
}

impl ContainerFormat {
    /// File extension for this container.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Webm => "webm",
        }
    }

    /// Muxing overhead as a fraction of the stream payload.
    fn overhead(self) -> f64 {
        match self {
            Self::Mp4 => 0.01,
            Self::Mov => 0.015,
            Self::Webm => 0.008,
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub resolution: Resolution,
    /// Frames per second (1-240).
    pub frame_rate: u32,
    /// Target video bitrate in bits per second.
    pub bitrate_bps: u64,
    pub container: ContainerFormat,
    /// Multiplier on the bitrate, in (0.0, 2.0].
    pub quality: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::FullHd1080,
            frame_rate: 30,
            bitrate_bps: 8_000_000,
            container: ContainerFormat::Mp4,
            quality: 1.0,
        }
    }
}

impl ExportConfig {
    /// 4K preset for high-quality masters.
    pub fn uhd_master() -> Self {
        Self {
            resolution: Resolution::Uhd2160,
            frame_rate: 30,
            bitrate_bps: 35_000_000,
            container: ContainerFormat::Mov,
            quality: 1.5,
        }
    }

    /// Small web preview.
    pub fn web_preview() -> Self {
        Self {
            resolution: Resolution::Hd720,
            frame_rate: 30,
            bitrate_bps: 2_500_000,
            container: ContainerFormat::Webm,
            quality: 0.8,
        }
    }

    /// Check every field against its bounds.
    pub fn validate(&self) -> Result<()> {
        if !(1..=240).contains(&self.frame_rate) {
            return Err(MediaError::Config(format!(
                "frame rate {} outside 1-240",
                self.frame_rate
            )));
        }
        if self.bitrate_bps == 0 {
            return Err(MediaError::Config("bitrate must be positive".into()));
        }
        if !(self.quality > 0.0 && self.quality <= 2.0) {
            return Err(MediaError::Config(format!(
                "quality multiplier {} outside (0.0, 2.0]",
                self.quality
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| MediaError::Config(format!("Invalid export config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    /// Bitrate after applying the quality multiplier.
    pub fn effective_bitrate_bps(&self) -> f64 {
        self.bitrate_bps as f64 * self.quality
    }

    /// Expected output size for `duration_ms` of media. Fails on an
    /// invalid config.
    pub fn estimate_size_bytes(&self, duration_ms: u64) -> Result<u64> {
        self.validate()?;
        let seconds = duration_ms as f64 / 1000.0;
        let payload = self.effective_bitrate_bps() * seconds / 8.0;
        Ok((payload * (1.0 + self.container.overhead())).round() as u64)
    }

    /// Expected wall-clock time to encode `duration_ms` of media. Fails on
    /// an invalid config.
    pub fn estimate_export_time(&self, duration_ms: u64) -> Result<Duration> {
        self.validate()?;
        let seconds = duration_ms as f64 / 1000.0;
        let load = (self.resolution.pixel_count() / REFERENCE_PIXELS)
            * (self.frame_rate as f64 / REFERENCE_FPS);
        Duration::try_from_secs_f64(seconds * load / REALTIME_FACTOR)
            .map_err(|e| MediaError::Config(format!("export time out of range: {e}")))
    }
}

// ── Export job ───────────────────────────────────────────────────

/// Outcome of a finished export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportResult {
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub duration_ms: u64,
    /// `"WIDTHxHEIGHT"`.
    pub resolution: String,
    pub export_time: Duration,
}

/// Native encoder that renders a project snapshot into `output`.
pub trait ExportBackend: Send + Sync {
    fn render(
        &self,
        project: &Project,
        config: &ExportConfig,
        output: &Path,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<()>;
}

/// Runs exports against a backend.
#[derive(Debug)]
pub struct Exporter<B> {
    backend: Arc<B>,
}

impl<B: ExportBackend + 'static> Exporter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Estimated output size for `project`, without exporting.
    pub fn estimate_size_bytes(&self, project: &Project, config: &ExportConfig) -> Result<u64> {
        config.estimate_size_bytes(project.duration())
    }

    /// Estimated export time for `project`, without exporting.
    pub fn estimate_export_time(&self, project: &Project, config: &ExportConfig) -> Result<Duration> {
        config.estimate_export_time(project.duration())
    }

    /// Export on the calling thread.
    ///
    /// The output extension is forced to match the container. The backend
    /// renders into a sibling `.part` file that replaces the target only on
    /// success, so a failed or cancelled export leaves an existing file at
    /// the target untouched.
    pub fn export(
        &self,
        project: &Project,
        config: &ExportConfig,
        output_path: &Path,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ExportResult> {
        run(&*self.backend, project, config, output_path, progress, cancel)
    }

    /// Export a shared snapshot on a worker thread.
    pub fn spawn(
        &self,
        project: Arc<Project>,
        config: ExportConfig,
        output_path: PathBuf,
    ) -> Result<JobHandle<ExportResult>> {
        let backend = Arc::clone(&self.backend);
        JobHandle::spawn("reelkit-export", move |sink, cancel| {
            run(&*backend, &project, &config, &output_path, &sink, &cancel)
        })
    }
}

fn run<B: ExportBackend + ?Sized>(
    backend: &B,
    project: &Project,
    config: &ExportConfig,
    output_path: &Path,
    progress: &ProgressSink,
    cancel: &CancelToken,
) -> Result<ExportResult> {
    config.validate()?;
    cancel.check()?;
    let duration_ms = project.duration();
    if duration_ms == 0 {
        return Err(MediaError::InvalidState(format!(
            "project '{}' has nothing to export",
            project.name()
        )));
    }

    let extension = config.container.extension();
    let output = output_path.with_extension(extension);
    let part = output.with_extension(format!("{}.part.{extension}", Uuid::new_v4()));
    let guard = PartialOutput::new(part);
    let started = Instant::now();
    info!(
        project = %project.name(),
        duration_ms,
        resolution = %config.resolution.label(),
        output = %output.display(),
        "export started"
    );

    backend.render(project, config, guard.path(), progress, cancel)?;
    cancel.check()?;
    let size_bytes = std::fs::metadata(guard.path())
        .map_err(|e| MediaError::Runtime(format!("export produced no readable file: {e}")))?
        .len();

    let output_path = guard.persist(&output)?;
    progress.finish();
    let export_time = started.elapsed();
    info!(
        output = %output_path.display(),
        size_bytes,
        elapsed_ms = export_time.as_millis() as u64,
        "export finished"
    );

    Ok(ExportResult {
        output_path,
        size_bytes,
        duration_ms,
        resolution: config.resolution.label(),
        export_time,
    })
}
