//! Memoization of derived transformation URLs.
//!
//! Keys are `<source>-<canonical request json>`; values are shared strings so
//! repeated lookups hand back the same allocation.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::error::Result;
use crate::models::ImageTransformations;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Storage for previously derived URLs, injected into builders that memoize.
pub trait UrlCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<str>>;
    fn insert(&self, key: String, url: Arc<str>);
    fn len(&self) -> usize;

    /// Return the cached URL for `key`, or run `build` and cache its result.
    /// Lookup and insert happen atomically, so concurrent callers for one key
    /// all receive the same allocation.
    fn get_or_try_insert_with(
        &self,
        key: String,
        build: &mut dyn FnMut() -> Result<Arc<str>>,
    ) -> Result<Arc<str>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache key for a (source, request) pair.
pub fn cache_key(source_url: &str, transformations: &ImageTransformations) -> Result<String> {
    let canonical = serde_json::to_string(transformations)?;
    Ok(format!("{source_url}-{canonical}"))
}

/// Bounded cache evicting the least recently used entry once full.
pub struct LruUrlCache {
    inner: Mutex<LruCache<String, Arc<str>>>,
}

impl LruUrlCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for LruUrlCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl UrlCache for LruUrlCache {
    fn get(&self, key: &str) -> Option<Arc<str>> {
        self.inner.lock().get(key).cloned()
    }

    fn insert(&self, key: String, url: Arc<str>) {
        push_logged(&mut self.inner.lock(), key, url);
    }

    fn get_or_try_insert_with(
        &self,
        key: String,
        build: &mut dyn FnMut() -> Result<Arc<str>>,
    ) -> Result<Arc<str>> {
        let mut cache = self.inner.lock();
        if let Some(hit) = cache.get(&key) {
            tracing::debug!(key = %key, "derived url cache hit");
            return Ok(Arc::clone(hit));
        }
        tracing::debug!(key = %key, "derived url cache miss");
        let url = build()?;
        push_logged(&mut cache, key, Arc::clone(&url));
        Ok(url)
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

fn push_logged(cache: &mut LruCache<String, Arc<str>>, key: String, url: Arc<str>) {
    if let Some((evicted, _)) = cache.push(key.clone(), url)
        && evicted != key
    {
        tracing::debug!(key = %evicted, "evicted derived url from cache");
    }
}
