//! Millisecond time ranges.
//!
//! Timeline positions and source offsets are whole milliseconds. A range
//! has an inclusive start and an exclusive end, and can never be inverted.

use serde::Serialize;
use std::fmt;

use crate::error::{ValidationError, ValidationResult};

/// A half-open `[start, end)` interval in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TimeRange {
    start_ms: u64,
    end_ms: u64,
}

impl TimeRange {
    /// Create a range, failing if `end_ms < start_ms`.
    pub fn new(start_ms: u64, end_ms: u64) -> ValidationResult<Self> {
        if end_ms < start_ms {
            return Err(ValidationError::new(format!(
                "end {end_ms}ms is before start {start_ms}ms"
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    /// Range starting at `start_ms` lasting `duration_ms`.
    pub fn from_start_duration(start_ms: u64, duration_ms: u64) -> ValidationResult<Self> {
        let end_ms = start_ms
            .checked_add(duration_ms)
            .ok_or_else(|| ValidationError::new("range end overflows u64 milliseconds"))?;
        Ok(Self { start_ms, end_ms })
    }

    /// Start time (inclusive).
    #[inline]
    pub fn start_ms(self) -> u64 {
        self.start_ms
    }

    /// End time (exclusive).
    #[inline]
    pub fn end_ms(self) -> u64 {
        self.end_ms
    }

    /// Length of the range. Never negative.
    #[inline]
    pub fn duration_ms(self) -> u64 {
        self.end_ms - self.start_ms
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start_ms == self.end_ms
    }

    /// Check if a time is within this range.
    #[inline]
    pub fn contains(self, time_ms: u64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Check if two ranges overlap.
    pub fn overlaps(self, other: Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// Compute the intersection of two ranges, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Self {
            start_ms: self.start_ms.max(other.start_ms),
            end_ms: self.end_ms.min(other.end_ms),
        })
    }

    /// Empty range starting at zero.
    pub const EMPTY: Self = Self {
        start_ms: 0,
        end_ms: 0,
    };
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}ms, {}ms)", self.start_ms, self.end_ms)
    }
}
