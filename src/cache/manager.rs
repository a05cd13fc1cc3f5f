//! On-disk forecast cache
//!
//! Each forecast request owns one JSON file holding the last successful
//! response, the request it answers and an expiry timestamp. Expired entries
//! are still handed back so a stale forecast can stand in when the API is down.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::data::{Forecast, ForecastRequest};

/// One cached forecast as stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<F> {
    /// Canonical query of the request this forecast answers
    request: String,
    forecast: F,
    /// When the forecast was cached
    cached_at: DateTime<Utc>,
    /// When the forecast stops being fresh
    expires_at: DateTime<Utc>,
}

/// A forecast read back from the cache
#[derive(Debug)]
pub struct CachedForecast {
    pub forecast: Forecast,
    /// When the forecast was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the TTL has passed
    pub is_expired: bool,
}

/// Manages reading and writing cached forecasts to disk
///
/// Files live in an XDG-compliant cache directory (`~/.cache/wxpanel/` on
/// Linux). A file is only returned for the exact request that wrote it.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "wxpanel")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Directory where cache files are stored
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Builds a file name from key parts without collisions
    ///
    /// ASCII letters and digits are kept, every other byte is written as
    /// `_` plus two hex digits and parts are joined with `-`. Since neither
    /// `-` nor `_` survives unescaped, distinct part lists never share a key:
    /// `["1", "5.2"]` is `1-5_2e2` while `["1.5", "2"]` is `1_2e5-2`.
    pub fn key(parts: &[&str]) -> String {
        let mut key = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                key.push('-');
            }
            for byte in part.bytes() {
                if byte.is_ascii_alphanumeric() {
                    key.push(char::from(byte));
                } else {
                    key.push_str(&format!("_{:02x}", byte));
                }
            }
        }
        key
    }

    /// Returns the path to the cache file for a request
    fn cache_path(&self, request: &ForecastRequest) -> PathBuf {
        self.cache_dir.join(format!("{}.json", request.cache_key()))
    }

    /// Ensures the cache directory exists
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Stores `forecast` as the answer to `request`, fresh for `ttl_minutes`
    pub fn write(
        &self,
        request: &ForecastRequest,
        forecast: &Forecast,
        ttl_minutes: u64,
    ) -> std::io::Result<()> {
        self.ensure_dir()?;

        let now = Utc::now();
        let ttl = i64::try_from(ttl_minutes).unwrap_or(i64::MAX / 60_000);
        let entry = CacheEntry {
            request: request.cache_identity(),
            forecast,
            cached_at: now,
            expires_at: now + Duration::minutes(ttl),
        };

        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.cache_path(request), json)
    }

    /// Reads the cached forecast for `request`
    ///
    /// Returns `None` if nothing is cached, the file cannot be parsed, or the
    /// file was written for a different request. Expired entries come back
    /// with `is_expired = true`.
    pub fn read(&self, request: &ForecastRequest) -> Option<CachedForecast> {
        let path = self.cache_path(request);
        let content = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry<Forecast> = serde_json::from_str(&content).ok()?;

        let identity = request.cache_identity();
        if entry.request != identity {
            debug!(
                path = %path.display(),
                cached = %entry.request,
                requested = %identity,
                "Ignoring cache entry written for another request"
            );
            return None;
        }

        Some(CachedForecast {
            forecast: entry.forecast,
            cached_at: entry.cached_at,
            is_expired: Utc::now() > entry.expires_at,
        })
    }
}
