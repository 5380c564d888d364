//! Integration test crate for ReelKit.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the model and the media contracts to verify they work
//! together.

#[cfg(test)]
mod media;

#[cfg(test)]
mod timeline;
