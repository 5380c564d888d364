//! ReelKit - demo driver for the timeline model
//!
//! Builds the demo project through the copy-on-write edit API, then reports
//! its duration and export estimates for the configured export settings.
//!
//! Usage: `reelkit [export-config.json]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use reelkit_media::ExportConfig;
use reelkit_timeline::{Clip, Filter, History, Project};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("ReelKit starting...");

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => ExportConfig::load_from_file(&path)
            .with_context(|| format!("loading export config from {}", path.display()))?,
        None => ExportConfig::default(),
    };

    let mut history = History::new(Project::new("Demo"), 50);
    let track_id = history.current().tracks()[0].id();

    let intro = Clip::new("media/intro.mp4", 0, 5000)?;
    history.apply(|p| p.update_track(track_id, |t| t.add_clip(intro)))?;
    info!(duration_ms = history.current().duration(), "added intro");

    let body = Clip::new("media/body.mp4", 5000, 10_000)?
        .with_speed(1.5)?
        .add_filter(Filter::brightness(0.15)?)?
        .add_filter(Filter::saturation(-0.2)?)?;
    history.apply(|p| p.update_track(track_id, |t| t.add_clip(body)))?;

    let project = history.current();
    info!(
        project = %project.name(),
        tracks = project.tracks().len(),
        clips = project.all_clips().count(),
        duration_ms = project.duration(),
        "timeline assembled"
    );

    for clip in project.all_clips() {
        if !clip.speed_within_convention() {
            warn!(clip = %clip.id(), speed = clip.speed(), "speed outside conventional range");
        }
        info!(
            source = %clip.source(),
            start_ms = clip.start_time_ms(),
            end_ms = clip.end_time_ms(),
            source_ms = clip.source_duration(),
            filters = clip.filters().len(),
            "clip"
        );
    }

    let size_bytes = config.estimate_size_bytes(project.duration())?;
    let export_time = config.estimate_export_time(project.duration())?;
    info!(
        resolution = %config.resolution.label(),
        size_bytes,
        export_secs = export_time.as_secs_f64(),
        "export estimate"
    );

    Ok(())
}
