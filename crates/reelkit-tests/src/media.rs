//! Integration tests for the media contracts.
//!
//! Drives the processing and export runners with fake backends, handing
//! them snapshots built with the timeline model.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reelkit_core::{MediaError, Result};
use reelkit_media::{
    CancelToken, ContainerFormat, ExportBackend, ExportConfig, Exporter, ProcessBackend,
    ProcessRequest, Processor, ProgressSink, Resolution,
};
use reelkit_timeline::{Clip, Filter, Project};

// ── Fake backends ──────────────────────────────────────────────

/// Writes one byte per clip, reporting progress per clip.
struct ByteExporter;

impl ExportBackend for ByteExporter {
    fn render(
        &self,
        project: &Project,
        _config: &ExportConfig,
        output: &Path,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<()> {
        let total = project.all_clips().count().max(1);
        let mut body = Vec::new();
        for (i, _) in project.all_clips().enumerate() {
            cancel.check()?;
            body.push(b'x');
            progress.report((i + 1) as f64 / total as f64);
        }
        std::fs::write(output, body)?;
        Ok(())
    }
}

/// Fails before writing anything.
struct RejectingExporter;

impl ExportBackend for RejectingExporter {
    fn render(
        &self,
        _: &Project,
        _: &ExportConfig,
        _: &Path,
        _: &ProgressSink,
        _: &CancelToken,
    ) -> Result<()> {
        Err(MediaError::Codec("no encoder for container".into()))
    }
}

/// Writes half a file, then waits to be cancelled.
struct StallingBackend;

impl StallingBackend {
    fn stall(output: &Path, progress: &ProgressSink, cancel: &CancelToken) -> Result<()> {
        std::fs::write(output, b"partial")?;
        progress.report(0.5);
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            cancel.check()?;
            std::thread::sleep(Duration::from_millis(5));
        }
        Err(MediaError::Runtime("never cancelled".into()))
    }
}

impl ExportBackend for StallingBackend {
    fn render(
        &self,
        _: &Project,
        _: &ExportConfig,
        output: &Path,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<()> {
        Self::stall(output, progress, cancel)
    }
}

impl ProcessBackend for StallingBackend {
    fn process(
        &self,
        _: &ProcessRequest,
        output: &Path,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<()> {
        Self::stall(output, progress, cancel)
    }
}

// ── Helpers ────────────────────────────────────────────────────

fn demo_project() -> Project {
    let project = Project::new("Demo");
    let track_id = project.tracks()[0].id();
    project
        .update_track(track_id, |t| {
            t.add_clip(Clip::new("media/intro.mp4", 0, 5000)?)?
                .add_clip(Clip::new("media/body.mp4", 5000, 10_000)?)
        })
        .unwrap()
}

// ── Export ─────────────────────────────────────────────────────

#[test]
fn export_produces_result_record() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let dir = tmp.path();
    let project = demo_project();
    let exporter = Exporter::new(ByteExporter);
    let config = ExportConfig {
        container: ContainerFormat::Mov,
        ..ExportConfig::default()
    };

    let (sink, rx) = ProgressSink::channel();
    let result = exporter
        .export(&project, &config, &dir.join("demo.mp4"), &sink, &CancelToken::new())
        .unwrap();

    assert_eq!(result.output_path, dir.join("demo.mov"));
    assert_eq!(result.size_bytes, 2);
    assert_eq!(result.duration_ms, 10_000);
    assert_eq!(result.resolution, "1920x1080");
    let progress: Vec<f64> = rx.try_iter().collect();
    assert_eq!(progress, vec![0.5, 1.0]);
}

#[test]
fn export_of_empty_project_fails() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let dir = tmp.path();
    let exporter = Exporter::new(ByteExporter);
    let err = exporter
        .export(
            &Project::new("Empty"),
            &ExportConfig::default(),
            &dir.join("empty.mp4"),
            &ProgressSink::discard(),
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, MediaError::InvalidState(_)));
}

#[test]
fn invalid_config_fails_before_rendering() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let dir = tmp.path();
    let config = ExportConfig {
        quality: 3.0,
        ..ExportConfig::default()
    };
    let err = Exporter::new(ByteExporter)
        .export(
            &demo_project(),
            &config,
            &dir.join("out.mp4"),
            &ProgressSink::discard(),
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, MediaError::Config(_)));
    assert_eq!(std::fs::read_dir(dir).unwrap().count(), 0);
}

#[test]
fn cancelled_export_leaves_no_file() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let dir = tmp.path();
    let output = dir.join("cancelled.mp4");
    let exporter = Exporter::new(StallingBackend);

    let handle = exporter
        .spawn(Arc::new(demo_project()), ExportConfig::default(), output.clone())
        .unwrap();
    let first = handle.progress().recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(first, 0.5);
    // The backend renders next to the target, not into it.
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(dir).unwrap().count(), 1);

    handle.cancel();
    let err = handle.join().unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(std::fs::read_dir(dir).unwrap().count(), 0);
}

#[test]
fn failed_export_keeps_previous_output() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let existing = tmp.path().join("final.mp4");
    std::fs::write(&existing, b"last week's cut").unwrap();

    let err = Exporter::new(RejectingExporter)
        .export(
            &demo_project(),
            &ExportConfig::default(),
            &existing,
            &ProgressSink::discard(),
            &CancelToken::new(),
        )
        .unwrap_err();

    assert!(matches!(err, MediaError::Codec(_)));
    assert_eq!(std::fs::read(&existing).unwrap(), b"last week's cut");
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[test]
fn cancelled_export_keeps_previous_output() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let existing = tmp.path().join("final.mp4");
    std::fs::write(&existing, b"last week's cut").unwrap();

    let handle = Exporter::new(StallingBackend)
        .spawn(Arc::new(demo_project()), ExportConfig::default(), existing.clone())
        .unwrap();
    handle.progress().recv_timeout(Duration::from_secs(5)).unwrap();
    handle.cancel();
    assert!(handle.join().unwrap_err().is_cancelled());

    assert_eq!(std::fs::read(&existing).unwrap(), b"last week's cut");
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[test]
fn successful_export_replaces_previous_output() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let existing = tmp.path().join("final.mp4");
    std::fs::write(&existing, b"last week's cut").unwrap();

    let result = Exporter::new(ByteExporter)
        .export(
            &demo_project(),
            &ExportConfig::default(),
            &existing,
            &ProgressSink::discard(),
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(result.output_path, existing);
    assert_eq!(std::fs::read(&existing).unwrap(), b"xx");
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[test]
fn estimates_do_not_touch_the_backend() {
    let project = demo_project();
    let exporter = Exporter::new(StallingBackend);
    let config = ExportConfig {
        resolution: Resolution::Hd720,
        bitrate_bps: 4_000_000,
        quality: 1.0,
        container: ContainerFormat::Webm,
        ..ExportConfig::default()
    };

    // 10s at 4 Mbit/s = 5 MB + 0.8% overhead
    assert_eq!(exporter.estimate_size_bytes(&project, &config).unwrap(), 5_040_000);
    assert!(exporter.estimate_export_time(&project, &config).unwrap() < Duration::from_secs(5));
}

#[test]
fn estimates_reject_invalid_config() {
    let exporter = Exporter::new(ByteExporter);
    let config = ExportConfig {
        quality: f64::NAN,
        ..ExportConfig::default()
    };
    assert!(matches!(
        exporter.estimate_size_bytes(&demo_project(), &config),
        Err(MediaError::Config(_))
    ));
    assert!(matches!(
        exporter.estimate_export_time(&demo_project(), &config),
        Err(MediaError::Config(_))
    ));
}

// ── Processing ─────────────────────────────────────────────────

#[test]
fn cancelled_processing_leaves_no_file() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let dir = tmp.path();
    let clip = Clip::new("media/a.mp4", 0, 3000)
        .unwrap()
        .add_filter(Filter::brightness(0.2).unwrap())
        .unwrap();
    let processor = Processor::new(StallingBackend, dir);

    let handle = processor.spawn(ProcessRequest::from_clip(&clip)).unwrap();
    handle.progress().recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(std::fs::read_dir(dir).unwrap().count(), 1);

    handle.cancel();
    assert!(handle.join().unwrap_err().is_cancelled());
    assert_eq!(std::fs::read_dir(dir).unwrap().count(), 0);
}

#[test]
fn processed_output_can_feed_a_new_clip() {
    struct CopyBackend;

    impl ProcessBackend for CopyBackend {
        fn process(
            &self,
            request: &ProcessRequest,
            output: &Path,
            _: &ProgressSink,
            _: &CancelToken,
        ) -> Result<()> {
            std::fs::write(output, request.source.as_bytes())?;
            Ok(())
        }
    }

    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let dir = tmp.path();
    let original = Clip::new("media/a.mp4", 1000, 4000).unwrap();
    let processor = Processor::new(CopyBackend, dir);
    let new_source = processor
        .process(
            &ProcessRequest::from_clip(&original),
            &ProgressSink::discard(),
            &CancelToken::new(),
        )
        .unwrap();

    let replaced = original.clone().with_source(new_source.clone());
    assert_eq!(replaced.id(), original.id());
    assert_eq!(replaced.source(), new_source);
    assert_eq!(std::fs::read_to_string(&new_source).unwrap(), "media/a.mp4");
}
