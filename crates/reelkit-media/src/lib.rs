//! ReelKit Media - contracts for the native media collaborators
//!
//! This crate handles:
//! - Playback state machine over a native player
//! - Trim/filter processing jobs
//! - Project export with size and time estimation
//!
//! Decoding, filtering and encoding happen in platform backends supplied by
//! the host through the `*Backend` traits. The model is handed over as an
//! immutable snapshot, so jobs can run on worker threads without locking.

pub mod export;
pub mod job;
pub mod playback;
pub mod processing;

pub use export::{ContainerFormat, ExportBackend, ExportConfig, ExportResult, Exporter, Resolution};
pub use job::{CancelToken, JobHandle, PartialOutput, ProgressSink};
pub use playback::{PlaybackBackend, PlaybackState, Player};
pub use processing::{ProcessBackend, ProcessRequest, Processor};
