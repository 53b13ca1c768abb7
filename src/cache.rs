//! File-based standings cache with TTL support.
//!
//! Sits in front of the pure standings computation. Entries are keyed by a
//! canonical form of the filter (season, sorted team tokens, sorted driver
//! numbers) and expire after a fixed TTL or on explicit invalidation.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::standings::ranking::normalize_team_tokens;
use crate::standings::StandingsFilter;

/// Bumped when the cached value's shape changes
const KEY_VERSION: &str = "standings-v1";

/// Cache entry with timestamp
#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    key: String,
    data: T,
    cached_at: DateTime<Utc>,
}

/// Canonical cache key for a standings filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    canonical: String,
}

#[derive(Serialize)]
struct CanonicalFilter<'a> {
    version: &'a str,
    season: Option<i32>,
    exclude_teams: Vec<String>,
    exclude_driver_numbers: Vec<u32>,
}

impl CacheKey {
    /// Filters that select the same standings map to the same key
    pub fn for_filter(filter: &StandingsFilter) -> Self {
        let mut exclude_teams = normalize_team_tokens(&filter.exclude_teams);
        exclude_teams.sort();
        exclude_teams.dedup();

        let mut exclude_driver_numbers = filter.exclude_driver_numbers.clone();
        exclude_driver_numbers.sort_unstable();
        exclude_driver_numbers.dedup();

        let canonical = serde_json::to_string(&CanonicalFilter {
            version: KEY_VERSION,
            season: filter.season,
            exclude_teams,
            exclude_driver_numbers,
        })
        .unwrap_or_default();

        Self { canonical }
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// File-system safe digest of the canonical key
    fn file_stem(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// File-based standings cache
pub struct StandingsCache {
    base_dir: PathBuf,
    ttl: Duration,
    enabled: bool,
}

impl StandingsCache {
    /// Create a new cache with the given base directory
    pub fn new(base_dir: PathBuf, ttl: Duration) -> Self {
        Self {
            base_dir,
            ttl,
            enabled: true,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let ttl = Duration::seconds(config.ttl_secs.min(i64::MAX as u64 / 1000) as i64);
        Self {
            enabled: config.enabled,
            ..Self::new(PathBuf::from(&config.dir), ttl)
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self {
            base_dir: PathBuf::new(),
            ttl: Duration::zero(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get cache file path for a key
    fn cache_path(&self, key: &CacheKey) -> PathBuf {
        self.base_dir.join(format!("{}.json", key.file_stem()))
    }

    /// Get cached data if present and fresh
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let path = self.cache_path(key);
        if !path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry<T> = serde_json::from_str(&content).ok()?;

        if entry.key != key.canonical {
            return None;
        }

        if Utc::now() - entry.cached_at > self.ttl {
            let _ = std::fs::remove_file(&path);
            return None;
        }

        Some(entry.data)
    }

    /// Store data under a key
    pub fn set<T: Serialize>(&self, key: &CacheKey, data: &T) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        std::fs::create_dir_all(&self.base_dir)?;

        let entry = CacheEntry {
            key: key.canonical.clone(),
            data,
            cached_at: Utc::now(),
        };

        let content = serde_json::to_string(&entry)?;
        std::fs::write(self.cache_path(key), content)?;
        Ok(())
    }

    /// Return the cached value for `key` or compute, store and return it.
    ///
    /// Errors are passed through and never cached. A failed write is logged
    /// and the computed value is still returned.
    pub fn get_or_compute<T, E, F>(&self, key: &CacheKey, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get(key) {
            debug!(key = key.as_str(), "Standings cache hit");
            return Ok(hit);
        }

        let value = compute()?;
        if let Err(e) = self.set(key, &value) {
            warn!(key = key.as_str(), "Failed to write standings cache: {:#}", e);
        }
        Ok(value)
    }

    /// Drop every entry; returns the number of entries removed
    pub fn invalidate(&self) -> Result<usize> {
        if !self.base_dir.exists() || self.base_dir.as_os_str().is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn cache(dir: &tempfile::TempDir) -> StandingsCache {
        StandingsCache::new(dir.path().join("standings"), Duration::hours(1))
    }

    #[test]
    fn test_key_is_canonical() {
        let a = StandingsFilter {
            exclude_teams: vec!["Red Bull".to_string(), " mclaren ".to_string()],
            exclude_driver_numbers: vec![44, 1, 44],
            season: Some(2024),
        };
        let b = StandingsFilter {
            exclude_teams: vec!["mclaren".to_string(), "red bull".to_string(), "".to_string()],
            exclude_driver_numbers: vec![1, 44],
            season: Some(2024),
        };
        assert_eq!(CacheKey::for_filter(&a), CacheKey::for_filter(&b));

        let other_season = StandingsFilter {
            season: Some(2023),
            ..b.clone()
        };
        assert_ne!(CacheKey::for_filter(&b), CacheKey::for_filter(&other_season));
        assert_ne!(
            CacheKey::for_filter(&b),
            CacheKey::for_filter(&StandingsFilter::default())
        );
    }

    #[test]
    fn test_file_stem_is_sha256_hex() {
        let key = CacheKey::for_filter(&StandingsFilter::default());
        let stem = key.file_stem();
        assert_eq!(stem.len(), 64);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        // sha256("abc")
        let abc = CacheKey {
            canonical: "abc".to_string(),
        };
        assert_eq!(
            abc.file_stem(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_get_or_compute_hits_after_first_call() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let key = CacheKey::for_filter(&StandingsFilter::default());
        let calls = Cell::new(0);

        let compute = || -> Result<Vec<u32>, String> {
            calls.set(calls.get() + 1);
            Ok(vec![25, 18, 15])
        };

        assert_eq!(cache.get_or_compute(&key, compute).unwrap(), vec![25, 18, 15]);
        assert_eq!(cache.get_or_compute(&key, compute).unwrap(), vec![25, 18, 15]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let key = CacheKey::for_filter(&StandingsFilter::default());

        let failed: Result<Vec<u32>, &str> = cache.get_or_compute(&key, || Err("no data"));
        assert!(failed.is_err());
        assert!(cache.get::<Vec<u32>>(&key).is_none());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StandingsCache::new(dir.path().to_path_buf(), Duration::seconds(-1));
        let key = CacheKey::for_filter(&StandingsFilter::default());

        cache.set(&key, &vec![1u32]).unwrap();
        assert!(cache.get::<Vec<u32>>(&key).is_none());
        assert!(!cache.cache_path(&key).exists());
    }

    #[test]
    fn test_invalidate_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let a = CacheKey::for_filter(&StandingsFilter::default());
        let b = CacheKey::for_filter(&StandingsFilter {
            season: Some(2023),
            ..Default::default()
        });

        cache.set(&a, &1u32).unwrap();
        cache.set(&b, &2u32).unwrap();
        assert_eq!(cache.invalidate().unwrap(), 2);
        assert!(cache.get::<u32>(&a).is_none());
        assert_eq!(cache.invalidate().unwrap(), 0);
    }

    #[test]
    fn test_disabled_cache_always_computes() {
        let cache = StandingsCache::disabled();
        let key = CacheKey::for_filter(&StandingsFilter::default());
        let calls = Cell::new(0);
        for _ in 0..2 {
            let value: Result<u32, String> = cache.get_or_compute(&key, || {
                calls.set(calls.get() + 1);
                Ok(3)
            });
            assert_eq!(value.unwrap(), 3);
        }
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.invalidate().unwrap(), 0);
    }
}
