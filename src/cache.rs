//! Best-effort persistence of raw scan results for offline reuse.
//!
//! The file is a serialized [`ScanResult`] with no compatibility guarantees:
//! anything that fails to load is treated as a cache miss.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::models::ScanResult;

pub trait ScanCache {
    fn load(&self) -> Option<ScanResult>;
    fn save(&self, result: &ScanResult);
}

/// Cache that never hits and never stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ScanCache for NoCache {
    fn load(&self) -> Option<ScanResult> {
        None
    }

    fn save(&self, _result: &ScanResult) {}
}

/// Pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ScanCache for JsonFileCache {
    fn load(&self) -> Option<ScanResult> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "scan cache miss");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(result) => {
                debug!(path = %self.path.display(), "scan cache hit");
                Some(result)
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable scan cache");
                None
            }
        }
    }

    fn save(&self, result: &ScanResult) {
        let write = || -> anyhow::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.path, serde_json::to_string_pretty(result)?)?;
            Ok(())
        };
        match write() {
            Ok(()) => debug!(path = %self.path.display(), "saved scan cache"),
            Err(err) => warn!(path = %self.path.display(), "failed to save scan cache: {:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PackageRecord;
    use tempfile::TempDir;

    fn sample() -> ScanResult {
        let mut result = ScanResult::empty();
        result.total_packages = 1;
        result.total_filtered = 1;
        result.license_counts.insert("MIT".to_string(), 1);
        result.packages.push(PackageRecord {
            name: "ms".to_string(),
            version: "2.1.3".to_string(),
            license: "MIT".to_string(),
            repository_url: Some("vercel/ms".to_string()),
            is_private: false,
            license_file_path: Some(PathBuf::from("node_modules/ms/license.md")),
            license_file_text: Some("The MIT License (MIT)".to_string()),
            license_file_error: None,
            directory_path: PathBuf::from("node_modules/ms"),
        });
        result
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(tmp.path().join(".license-audit").join("licenses.json"));
        assert!(cache.load().is_none());

        let result = sample();
        cache.save(&result);
        assert_eq!(cache.load(), Some(result));
    }

    #[test]
    fn test_corrupt_cache_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("licenses.json");
        std::fs::write(&path, "{\"generatedAt\": 42}").unwrap();
        assert!(JsonFileCache::new(path).load().is_none());
    }

    #[test]
    fn test_no_cache() {
        NoCache.save(&sample());
        assert!(NoCache.load().is_none());
    }
}
