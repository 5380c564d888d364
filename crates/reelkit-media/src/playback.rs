//! Playback state machine over a native player backend.
//!
//! `Player` is shareable across threads: the UI drives it through `&self`
//! methods while the backend's own thread reports completion and errors via
//! [`Player::notify_completed`] and [`Player::notify_error`].

use parking_lot::Mutex;
use reelkit_core::{MediaError, Result, ValidationError};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Player lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Error,
}

/// Native player. Calls are serialized by [`Player`].
///
/// A backend may report completion or errors to its [`Player`] from inside
/// one of these calls. It must not drive the player's controls from there,
/// since the backend lock is held for the duration of the call.
pub trait PlaybackBackend: Send {
    /// Open `source` and return its duration in milliseconds.
    fn open(&mut self, source: &str) -> Result<u64>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek(&mut self, position_ms: u64) -> Result<()>;
    fn set_volume(&mut self, volume: f64) -> Result<()>;
    fn position_ms(&self) -> u64;
}

type CompletionCallback = Box<dyn FnMut() + Send>;
type ErrorCallback = Box<dyn FnMut(&MediaError) + Send>;

/// A replaceable callback. The generation changes on every replacement so a
/// callback that is running can tell whether it was swapped out meanwhile.
struct CallbackSlot<C: ?Sized> {
    callback: Option<Box<C>>,
    generation: u64,
}

impl<C: ?Sized> CallbackSlot<C> {
    fn empty() -> Mutex<Self> {
        Mutex::new(Self {
            callback: None,
            generation: 0,
        })
    }
}

#[derive(Debug)]
struct Status {
    state: PlaybackState,
    source: Option<String>,
    duration_ms: u64,
    volume: f64,
}

/// State machine wrapper around a [`PlaybackBackend`].
pub struct Player<B> {
    backend: Mutex<B>,
    status: Mutex<Status>,
    on_completion: Mutex<CallbackSlot<dyn FnMut() + Send>>,
    on_error: Mutex<CallbackSlot<dyn FnMut(&MediaError) + Send>>,
}

impl<B: PlaybackBackend> Player<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Mutex::new(backend),
            status: Mutex::new(Status {
                state: PlaybackState::Idle,
                source: None,
                duration_ms: 0,
                volume: 1.0,
            }),
            on_completion: CallbackSlot::empty(),
            on_error: CallbackSlot::empty(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.status.lock().state
    }

    pub fn source(&self) -> Option<String> {
        self.status.lock().source.clone()
    }

    /// Duration of the loaded media, 0 before a successful load.
    pub fn duration_ms(&self) -> u64 {
        self.status.lock().duration_ms
    }

    pub fn volume(&self) -> f64 {
        self.status.lock().volume
    }

    pub fn position_ms(&self) -> u64 {
        self.backend.lock().position_ms()
    }

    // ── Callback slots ──────────────────────────────────────────

    /// Replace the completion callback. `None` clears it.
    pub fn set_on_completion(&self, callback: Option<CompletionCallback>) {
        replace(&self.on_completion, callback);
    }

    /// Replace the error callback. `None` clears it.
    pub fn set_on_error(&self, callback: Option<ErrorCallback>) {
        replace(&self.on_error, callback);
    }

    // ── Controls ────────────────────────────────────────────────

    /// Load a source reference. Allowed from any state.
    pub fn load(&self, source: &str) -> Result<()> {
        {
            let mut status = self.status.lock();
            status.state = PlaybackState::Loading;
            status.source = Some(source.to_string());
            status.duration_ms = 0;
        }
        info!(source, "loading media");

        let mut backend = self.backend.lock();
        let opened = backend.open(source).and_then(|duration_ms| {
            let volume = self.status.lock().volume;
            backend.set_volume(volume)?;
            Ok(duration_ms)
        });
        drop(backend);

        match opened {
            Ok(duration_ms) => {
                let mut status = self.status.lock();
                status.state = PlaybackState::Ready;
                status.duration_ms = duration_ms;
                Ok(())
            }
            Err(e) => {
                self.enter_error(&e);
                Err(e)
            }
        }
    }

    /// Start or resume playback. Restarts from 0 after the end.
    pub fn play(&self) -> Result<()> {
        let mut backend = self.backend.lock();
        let from = self.state();
        match from {
            PlaybackState::Playing => return Ok(()),
            PlaybackState::Ready | PlaybackState::Paused => {}
            PlaybackState::Ended => backend.seek(0)?,
            other => return Err(transition_error(other, "play")),
        }
        backend.play()?;
        self.settle(from, PlaybackState::Playing);
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        let mut backend = self.backend.lock();
        let from = self.state();
        match from {
            PlaybackState::Paused => return Ok(()),
            PlaybackState::Playing => {}
            other => return Err(transition_error(other, "pause")),
        }
        backend.pause()?;
        self.settle(from, PlaybackState::Paused);
        Ok(())
    }

    /// Seek to `position_ms`, clamped to the media duration. Seeking after
    /// the end leaves the player paused at the new position.
    pub fn seek(&self, position_ms: u64) -> Result<()> {
        let mut backend = self.backend.lock();
        let (from, duration_ms) = {
            let status = self.status.lock();
            (status.state, status.duration_ms)
        };
        match from {
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused => {}
            PlaybackState::Ended => {}
            other => return Err(transition_error(other, "seek")),
        }
        let target = position_ms.min(duration_ms);
        backend.seek(target)?;
        if from == PlaybackState::Ended {
            self.settle(from, PlaybackState::Paused);
        }
        debug!(target, "seeked");
        Ok(())
    }

    /// Set the volume in `[0.0, 1.0]`. Before a load the value is kept and
    /// applied once media opens.
    pub fn set_volume(&self, volume: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ValidationError::new(format!("volume {volume} outside [0.0, 1.0]")).into());
        }
        let mut backend = self.backend.lock();
        if !matches!(
            self.state(),
            PlaybackState::Idle | PlaybackState::Loading | PlaybackState::Error
        ) {
            backend.set_volume(volume)?;
        }
        self.status.lock().volume = volume;
        Ok(())
    }

    /// Move from `from` to `to` after a backend call, unless a notification
    /// changed the state during that call.
    fn settle(&self, from: PlaybackState, to: PlaybackState) {
        let mut status = self.status.lock();
        if status.state == from {
            status.state = to;
        } else {
            debug!(expected = ?from, actual = ?status.state, "state changed during backend call");
        }
    }

    // ── Backend notifications ───────────────────────────────────

    /// The backend reached the end of the media.
    ///
    /// Fires the completion callback once; repeated notifications while
    /// already ended are ignored.
    pub fn notify_completed(&self) {
        {
            let mut status = self.status.lock();
            if status.state != PlaybackState::Playing {
                debug!(state = ?status.state, "ignoring completion outside playback");
                return;
            }
            status.state = PlaybackState::Ended;
        }
        fire(&self.on_completion, |callback| callback());
    }

    /// The backend failed asynchronously.
    pub fn notify_error(&self, error: MediaError) {
        self.enter_error(&error);
    }

    fn enter_error(&self, error: &MediaError) {
        {
            let mut status = self.status.lock();
            if status.state == PlaybackState::Error {
                debug!(%error, "already in error state");
                return;
            }
            status.state = PlaybackState::Error;
        }
        warn!(%error, "playback error");
        fire(&self.on_error, |callback| callback(error));
    }
}

fn replace<C: ?Sized>(slot: &Mutex<CallbackSlot<C>>, callback: Option<Box<C>>) {
    let mut slot = slot.lock();
    slot.callback = callback;
    slot.generation = slot.generation.wrapping_add(1);
}

/// Run the callback in `slot` without holding its lock, so the callback may
/// replace or clear the slot itself.
fn fire<C: ?Sized>(slot: &Mutex<CallbackSlot<C>>, call: impl FnOnce(&mut Box<C>)) {
    let (mut callback, generation) = {
        let mut slot = slot.lock();
        match slot.callback.take() {
            Some(callback) => (callback, slot.generation),
            None => return,
        }
    };
    call(&mut callback);
    let mut slot = slot.lock();
    if slot.generation == generation {
        slot.callback = Some(callback);
    }
}

fn transition_error(state: PlaybackState, action: &str) -> MediaError {
    match state {
        PlaybackState::Idle => MediaError::NotInitialized(format!("cannot {action}: no media loaded")),
        other => MediaError::InvalidState(format!("cannot {action} while {other:?}")),
    }
}
