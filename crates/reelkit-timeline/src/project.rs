//! Project: the top-level editable unit.

use std::time::{SystemTime, UNIX_EPOCH};

use reelkit_core::ValidationResult;
use serde::Serialize;
use uuid::Uuid;

use crate::clip::Clip;
use crate::edit;
use crate::track::Track;

/// A project containing an ordered sequence of tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    id: Uuid,
    name: String,
    tracks: Vec<Track>,
    /// Creation timestamp (unix milliseconds).
    created_at_ms: u64,
    /// Last structural change (unix milliseconds).
    modified_at_ms: u64,
    locked: bool,
}

impl Project {
    /// Create a project holding one empty default track.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tracks: vec![Track::default()],
            created_at_ms: now,
            modified_at_ms: now,
            locked: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn modified_at_ms(&self) -> u64 {
        self.modified_at_ms
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Longest track duration, 0 when there are no clips.
    pub fn duration(&self) -> u64 {
        self.tracks.iter().map(Track::duration).max().unwrap_or(0)
    }

    /// Every clip, in track order then clip order.
    pub fn all_clips(&self) -> impl Iterator<Item = &Clip> + '_ {
        self.tracks.iter().flat_map(|track| track.clips().iter())
    }

    /// Find a track by id.
    pub fn find_track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id() == id)
    }

    // ── Withers ─────────────────────────────────────────────────

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
        .touched()
    }

    pub fn with_locked(self, locked: bool) -> Self {
        Self { locked, ..self }.touched()
    }

    // ── Track edits ─────────────────────────────────────────────

    /// Copy with `track` appended after the existing tracks.
    pub fn add_track(&self, track: Track) -> ValidationResult<Self> {
        Ok(Self {
            tracks: edit::append_unique(&self.tracks, track)?,
            ..self.clone()
        }
        .touched())
    }

    /// Copy without the matching track. Unchanged if absent.
    pub fn remove_track(&self, track_id: Uuid) -> Self {
        match edit::remove_by_id(&self.tracks, track_id) {
            Some(tracks) => Self {
                tracks,
                ..self.clone()
            }
            .touched(),
            None => self.clone(),
        }
    }

    /// Copy with the matching track replaced by `transform(track)`.
    /// Unchanged if absent; on error no track is replaced.
    pub fn update_track<F>(&self, track_id: Uuid, transform: F) -> ValidationResult<Self>
    where
        F: FnOnce(Track) -> ValidationResult<Track>,
    {
        Ok(match edit::update_by_id(&self.tracks, track_id, transform)? {
            Some(tracks) => Self {
                tracks,
                ..self.clone()
            }
            .touched(),
            None => self.clone(),
        })
    }

    fn touched(self) -> Self {
        Self {
            modified_at_ms: now_ms().max(self.modified_at_ms),
            ..self
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new("Untitled Project")
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
