//! Track types for the timeline.

use reelkit_core::{ValidationError, ValidationResult};
use serde::Serialize;
use uuid::Uuid;

use crate::clip::Clip;
use crate::edit::{self, Identified};

/// An ordered, independently visible layer of clips.
///
/// Clip order is insertion order. Clips may overlap or leave gaps; the
/// track imposes no ordering beyond sequence position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    id: Uuid,
    name: String,
    clips: Vec<Clip>,
    /// Is track locked (prevent edits in the UI)
    locked: bool,
    visible: bool,
    opacity: f64,
}

impl Track {
    /// Create an empty, visible, fully opaque track.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            clips: Vec::new(),
            locked: false,
            visible: true,
            opacity: 1.0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Latest end time among the clips, 0 when empty.
    pub fn duration(&self) -> u64 {
        self.clips
            .iter()
            .map(Clip::end_time_ms)
            .max()
            .unwrap_or(0)
    }

    /// Find a clip by id. Returns (index, &Clip).
    pub fn find_clip(&self, id: Uuid) -> Option<(usize, &Clip)> {
        self.clips.iter().enumerate().find(|(_, clip)| clip.id() == id)
    }

    /// Clips whose placement covers `time_ms`, in track order.
    pub fn clips_at(&self, time_ms: u64) -> impl Iterator<Item = &Clip> + '_ {
        self.clips
            .iter()
            .filter(move |clip| clip.placement().contains(time_ms))
    }

    // ── Withers ─────────────────────────────────────────────────

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Set the opacity, which must lie in `[0.0, 1.0]`.
    pub fn with_opacity(self, opacity: f64) -> ValidationResult<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ValidationError::new(format!(
                "opacity {opacity} outside [0.0, 1.0]"
            )));
        }
        Ok(Self { opacity, ..self })
    }

    pub fn with_visible(self, visible: bool) -> Self {
        Self { visible, ..self }
    }

    pub fn with_locked(self, locked: bool) -> Self {
        Self { locked, ..self }
    }

    // ── Clip edits ──────────────────────────────────────────────

    /// Copy with `clip` appended to the end of the sequence.
    pub fn add_clip(&self, clip: Clip) -> ValidationResult<Self> {
        Ok(Self {
            clips: edit::append_unique(&self.clips, clip)?,
            ..self.clone()
        })
    }

    /// Copy without the clip matching `clip_id`. Removing an absent clip
    /// returns an equal track.
    pub fn remove_clip(&self, clip_id: Uuid) -> Self {
        match edit::remove_by_id(&self.clips, clip_id) {
            Some(clips) => Self {
                clips,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Copy with the matching clip replaced by `transform(clip)`. Unchanged
    /// if absent; on error no clip is replaced.
    pub fn update_clip<F>(&self, clip_id: Uuid, transform: F) -> ValidationResult<Self>
    where
        F: FnOnce(Clip) -> ValidationResult<Clip>,
    {
        Ok(match edit::update_by_id(&self.clips, clip_id, transform)? {
            Some(clips) => Self {
                clips,
                ..self.clone()
            },
            None => self.clone(),
        })
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new("Track 1")
    }
}

impl Identified for Track {
    const KIND: &'static str = "track";

    fn id(&self) -> Uuid {
        self.id
    }
}
