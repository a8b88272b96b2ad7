use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::feed::Feed;
use crate::error::{Error, Result};

/// Last fetched response body per feed, for offline syncs
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache_dir: PathBuf,
}

impl ResponseCache {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => default_cache_dir()?,
        };

        fs::create_dir_all(&cache_dir).map_err(|source| Error::DirectoryCreate {
            path: cache_dir.clone(),
            source,
        })?;

        Ok(Self { cache_dir })
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get path to the cached body of a feed
    pub fn feed_path(&self, feed: Feed) -> PathBuf {
        self.cache_dir.join(format!("{}.json", feed.key()))
    }

    /// Check if a feed is already cached
    pub fn is_cached(&self, feed: Feed) -> bool {
        self.feed_path(feed).exists()
    }

    pub fn store(&self, feed: Feed, body: &str) -> Result<()> {
        let path = self.feed_path(feed);
        // Readers only ever see a complete body
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        debug!(feed = %feed, path = %path.display(), "Cached feed response");
        Ok(())
    }

    pub fn load(&self, feed: Feed) -> Result<String> {
        let path = self.feed_path(feed);
        if !path.exists() {
            return Err(Error::CacheMiss {
                feed: feed.to_string(),
                path,
            });
        }
        Ok(fs::read_to_string(&path)?)
    }

    /// Remove every cached feed
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for feed in Feed::ALL {
            let path = self.feed_path(feed);
            if path.exists() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Platform cache directory for rocket-launches
pub fn default_cache_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "rocket-launches").ok_or_else(|| {
        Error::ConfigValidation {
            message: "could not determine cache directory".to_string(),
        }
    })?;
    Ok(proj_dirs.cache_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(Some(dir.path().join("nested"))).unwrap();

        assert!(!cache.is_cached(Feed::Past));
        cache.store(Feed::Past, "[]").unwrap();
        assert!(cache.is_cached(Feed::Past));
        assert_eq!(cache.load(Feed::Past).unwrap(), "[]");
        assert!(cache.feed_path(Feed::Past).ends_with("past.json"));
    }

    #[test]
    fn test_missing_feed_is_cache_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(Some(dir.path().to_path_buf())).unwrap();

        let err = cache.load(Feed::Upcoming).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(Some(dir.path().to_path_buf())).unwrap();
        cache.store(Feed::All, "[]").unwrap();
        cache.store(Feed::Latest, "{}").unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert!(!cache.is_cached(Feed::All));
    }
}
