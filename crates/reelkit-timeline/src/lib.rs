//! ReelKit Timeline - Timeline data model
//!
//! Implements the immutable project tree:
//! - Projects containing tracks
//! - Tracks containing clips
//! - Clips carrying ordered filters
//! - Copy-on-write edit operations and a snapshot history
//!
//! No value is ever mutated after construction. Every edit borrows its
//! input and returns a new tree, so a `Project` can be shared across threads
//! (typically behind an `Arc`) without locking.

pub mod clip;
pub mod edit;
pub mod filter;
pub mod project;
pub mod track;

pub use clip::Clip;
pub use edit::{History, Identified};
pub use filter::{Filter, FilterKind};
pub use project::Project;
pub use track::Track;
