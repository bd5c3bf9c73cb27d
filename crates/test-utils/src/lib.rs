//! Shared test utilities for the storm climatology workspace.
//!
//! Straight-line synthetic tracks, a deterministic season generator, and a
//! helper that buckets track rows into an in-memory track store.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! ```ignore
//! use test_utils::{store_from_tracks, synthetic_season};
//! ```

pub mod generators;
pub mod tracks;

pub use generators::*;
pub use tracks::*;
