//! Cache implementations for climatology runs.

mod table_cache;

pub use table_cache::{CacheStats, TrackTableCache};
