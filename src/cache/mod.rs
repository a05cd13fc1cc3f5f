//! Cache module for storing forecast responses to disk
//!
//! Each forecast request is persisted to its own file with a configurable TTL
//! (time-to-live). Expired entries are still returned with an `is_expired`
//! flag, so the application can keep showing a stale forecast while the API is
//! unreachable.

mod manager;

pub use manager::{CacheManager, CachedForecast};
