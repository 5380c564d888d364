//! Clip types for the timeline.

use reelkit_core::limits::{MAX_SPEED, MIN_SPEED};
use reelkit_core::{TimeRange, ValidationError, ValidationResult};
use serde::Serialize;
use uuid::Uuid;

use crate::edit::{self, Identified};
use crate::filter::Filter;

/// A timed placement of a trimmed segment of source media.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    id: Uuid,
    /// Opaque path or URI of the source media. Never opened by the model.
    source: String,
    /// Position on the timeline.
    placement: TimeRange,
    /// Window into the source media.
    trim: TimeRange,
    /// Applied in listed order.
    filters: Vec<Filter>,
    volume: f64,
    speed: f64,
}

impl Clip {
    /// Create a clip placed at `[start_ms, end_ms)` with full volume, normal
    /// speed, no filters, and a source window matching its length.
    pub fn new(source: impl Into<String>, start_ms: u64, end_ms: u64) -> ValidationResult<Self> {
        let placement = TimeRange::new(start_ms, end_ms)?;
        Ok(Self {
            id: Uuid::new_v4(),
            source: source.into(),
            placement,
            trim: TimeRange::new(0, placement.duration_ms())?,
            filters: Vec::new(),
            volume: 1.0,
            speed: 1.0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placement(&self) -> TimeRange {
        self.placement
    }

    pub fn start_time_ms(&self) -> u64 {
        self.placement.start_ms()
    }

    pub fn end_time_ms(&self) -> u64 {
        self.placement.end_ms()
    }

    pub fn trim(&self) -> TimeRange {
        self.trim
    }

    pub fn trim_start_ms(&self) -> u64 {
        self.trim.start_ms()
    }

    pub fn trim_end_ms(&self) -> u64 {
        self.trim.end_ms()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Time the clip occupies on the timeline.
    pub fn playback_duration(&self) -> u64 {
        self.placement.duration_ms()
    }

    /// Milliseconds of source media consumed while the clip plays.
    ///
    /// At speed `s` the clip reads `s` source milliseconds per timeline
    /// millisecond. Fractional results are kept.
    pub fn source_duration(&self) -> f64 {
        self.playback_duration() as f64 * self.speed
    }

    /// True when the speed lies in the conventional `[0.25, 4.0]` band.
    pub fn speed_within_convention(&self) -> bool {
        (MIN_SPEED..=MAX_SPEED).contains(&self.speed)
    }

    // ── Withers ─────────────────────────────────────────────────

    /// Move the clip on the timeline.
    pub fn with_placement(self, start_ms: u64, end_ms: u64) -> ValidationResult<Self> {
        Ok(Self {
            placement: TimeRange::new(start_ms, end_ms)?,
            ..self
        })
    }

    /// Set the source window.
    pub fn with_trim(self, trim_start_ms: u64, trim_end_ms: u64) -> ValidationResult<Self> {
        let trim = TimeRange::new(trim_start_ms, trim_end_ms)
            .map_err(|e| ValidationError::new(format!("trim: {}", e.reason())))?;
        Ok(Self { trim, ..self })
    }

    /// Set the volume, which must lie in `[0.0, 1.0]`.
    pub fn with_volume(self, volume: f64) -> ValidationResult<Self> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ValidationError::new(format!(
                "volume {volume} outside [0.0, 1.0]"
            )));
        }
        Ok(Self { volume, ..self })
    }

    /// Set the playback speed. Must be finite and positive.
    pub fn with_speed(self, speed: f64) -> ValidationResult<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ValidationError::new(format!(
                "speed {speed} must be finite and greater than 0"
            )));
        }
        Ok(Self { speed, ..self })
    }

    /// Point the clip at different source media.
    pub fn with_source(self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..self
        }
    }

    // ── Filter edits ────────────────────────────────────────────

    /// Copy with `filter` applied after the existing ones.
    pub fn add_filter(&self, filter: Filter) -> ValidationResult<Self> {
        Ok(Self {
            filters: edit::append_unique(&self.filters, filter)?,
            ..self.clone()
        })
    }

    /// Copy without the filter matching `filter_id`. Unchanged if absent.
    pub fn remove_filter(&self, filter_id: Uuid) -> Self {
        match edit::remove_by_id(&self.filters, filter_id) {
            Some(filters) => Self {
                filters,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Copy with the matching filter replaced by `transform(filter)`.
    /// Unchanged if absent.
    pub fn update_filter<F>(&self, filter_id: Uuid, transform: F) -> ValidationResult<Self>
    where
        F: FnOnce(Filter) -> ValidationResult<Filter>,
    {
        Ok(match edit::update_by_id(&self.filters, filter_id, transform)? {
            Some(filters) => Self {
                filters,
                ..self.clone()
            },
            None => self.clone(),
        })
    }
}

impl Identified for Clip {
    const KIND: &'static str = "clip";

    fn id(&self) -> Uuid {
        self.id
    }
}
