//! In-memory per-file caching for repeated analysis passes
//!
//! Multi-phase runs and IDE hosts visit the same files repeatedly. The cache
//! keys parsed values by path and validates them against the file's
//! modification time, so a file edited between passes is transparently
//! reloaded.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

struct CacheEntry<V> {
    /// Modification time at load. `None` when the filesystem could not
    /// provide one; such entries never validate and are always reloaded.
    modified: Option<SystemTime>,
    value: Arc<V>,
}

/// A modification-time validated cache of per-file values.
///
/// Values are handed out as `Arc`s so callers can hold onto contents while
/// the cache evolves underneath them.
pub struct FileCache<V> {
    entries: HashMap<PathBuf, CacheEntry<V>>,
}

impl<V> Default for FileCache<V> {
    fn default() -> Self {
        FileCache {
            entries: HashMap::new(),
        }
    }
}

impl<V> FileCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the cached value for `path`, or compute it with `loader`.
    ///
    /// The cached value is reused only while the file's modification time is
    /// unchanged. Loader errors are not cached.
    pub fn get_or_load<E>(
        &mut self,
        path: &Path,
        loader: impl FnOnce(&Path) -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
        if let Some(entry) = self.entries.get(path) {
            if entry.modified.is_some() && entry.modified == modified {
                return Ok(entry.value.clone());
            }
        }
        let value = Arc::new(loader(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                value: value.clone(),
            },
        );
        Ok(value)
    }

    /// Look up a value without loading.
    pub fn get(&self, path: &Path) -> Option<Arc<V>> {
        self.entries.get(path).map(|e| e.value.clone())
    }

    /// Drop the entry for `path`, if any.
    pub fn evict(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn second_lookup_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();

        let mut cache: FileCache<String> = FileCache::new();
        let mut loads = 0;
        for _ in 0..2 {
            let value = cache
                .get_or_load::<Infallible>(&file, |p| {
                    loads += 1;
                    Ok(fs::read_to_string(p).unwrap())
                })
                .unwrap();
            assert_eq!(value.as_str(), "hello");
        }
        assert_eq!(loads, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn eviction_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "one").unwrap();

        let mut cache: FileCache<String> = FileCache::new();
        let mut loads = 0;
        let mut load = |cache: &mut FileCache<String>| {
            cache
                .get_or_load::<Infallible>(&file, |p| {
                    loads += 1;
                    Ok(fs::read_to_string(p).unwrap())
                })
                .unwrap()
        };
        load(&mut cache);
        cache.evict(&file);
        load(&mut cache);
        assert_eq!(loads, 2);
    }
}
