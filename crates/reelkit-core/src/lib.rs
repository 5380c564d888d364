//! ReelKit Core - Foundation types shared across the editor
//!
//! This crate provides:
//! - The validation and media error taxonomy
//! - Millisecond time ranges used by the timeline and its collaborators

pub mod error;
pub mod time;

pub use error::{MediaError, Result, ValidationError, ValidationResult};
pub use time::TimeRange;

/// Conventional bounds shared by the model and the media contracts.
pub mod limits {
    /// Lowest conventional playback speed.
    pub const MIN_SPEED: f64 = 0.25;

    /// Highest conventional playback speed.
    pub const MAX_SPEED: f64 = 4.0;

    /// Filter magnitudes are normalized to this symmetric bound.
    pub const FILTER_MAGNITUDE: f64 = 1.0;
}
