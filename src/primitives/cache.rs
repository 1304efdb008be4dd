//! Compute-once caches for grammars and themes
//!
//! Values are built outside of any lock and published with
//! `entry().or_insert`, so two threads racing on the same key may both run
//! the factory but every observer ends up with the single published value.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use super::grammar_registry::{Grammar, LoadedTheme, Registry, ThemeId};
use crate::error::Result;

/// Concurrent map with get-or-populate and clear
#[derive(Debug)]
pub struct ConcurrentCache<K, V> {
    map: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for ConcurrentCache<K, V> {
    fn default() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> ConcurrentCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        map.get(key).cloned()
    }

    /// Return the cached value for `key`, building it with `make` on a miss
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let value = make();
        self.publish(key, value)
    }

    /// Fallible variant of [`get_or_insert_with`]; failures are not cached
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        make: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<V, E> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = make()?;
        Ok(self.publish(key, value))
    }

    fn publish(&self, key: K, value: V) -> V {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(key).or_insert(value).clone()
    }

    pub fn clear(&self) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grammar and theme cache
///
/// Unknown grammars are cached as `None` so repeated misses stay cheap.
#[derive(Debug, Default)]
pub struct TextMateCache {
    themes: ConcurrentCache<ThemeId, Arc<LoadedTheme>>,
    grammars: ConcurrentCache<String, Option<Arc<Grammar>>>,
}

static GLOBAL_CACHE: Lazy<Arc<TextMateCache>> = Lazy::new(|| Arc::new(TextMateCache::new()));

impl TextMateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache instance
    pub fn global() -> Arc<TextMateCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Get (or load) a theme, paired with the registry used to build grammars
    pub fn get_theme(&self, id: &ThemeId) -> Result<(Registry, Arc<LoadedTheme>)> {
        let theme = self.themes.get_or_try_insert_with(id.clone(), || {
            tracing::debug!("Theme cache miss: {}", id);
            LoadedTheme::load(id).map(Arc::new)
        })?;
        Ok((Registry::shared(), theme))
    }

    /// Get a grammar by language id or file extension
    ///
    /// Returns `None` when the registry does not know the id; callers decide
    /// whether that is fatal.
    pub fn get_grammar(
        &self,
        registry: &Registry,
        id: &str,
        is_extension: bool,
    ) -> Option<Arc<Grammar>> {
        let key = format!("{}_{}", id, is_extension);
        self.grammars.get_or_insert_with(key, || {
            let grammar = if is_extension {
                registry.grammar_for_extension(id)
            } else {
                registry.grammar_for_language(id)
            };
            tracing::debug!(
                "Grammar cache miss: {} (extension: {}) -> {:?}",
                id,
                is_extension,
                grammar.as_ref().map(|g| g.name())
            );
            grammar.map(Arc::new)
        })
    }

    /// Drop every cached grammar and theme
    pub fn clear(&self) {
        tracing::debug!(
            "Clearing grammar/theme cache ({} themes, {} grammars)",
            self.themes.len(),
            self.grammars.len()
        );
        self.themes.clear();
        self.grammars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::grammar_registry::ThemeName;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_get_or_insert_runs_factory_once() {
        let cache: ConcurrentCache<&str, usize> = ConcurrentCache::new();
        let calls = AtomicUsize::new(0);

        let a = cache.get_or_insert_with("k", || {
            calls.fetch_add(1, Ordering::SeqCst);
            1
        });
        let b = cache.get_or_insert_with("k", || {
            calls.fetch_add(1, Ordering::SeqCst);
            2
        });

        assert_eq!(a, 1);
        assert_eq!(b, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_factory_is_not_cached() {
        let cache: ConcurrentCache<u8, u8> = ConcurrentCache::new();
        let err: std::result::Result<u8, &str> = cache.get_or_try_insert_with(1, || Err("boom"));
        assert!(err.is_err());
        assert!(cache.is_empty());

        let ok: std::result::Result<u8, &str> = cache.get_or_try_insert_with(1, || Ok(7));
        assert_eq!(ok, Ok(7));
    }

    #[test]
    fn test_concurrent_population_publishes_one_winner() {
        let cache: Arc<ConcurrentCache<u32, Arc<String>>> = Arc::new(ConcurrentCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_insert_with(0, || Arc::new(i.to_string())))
            })
            .collect();

        let results: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winner = cache.get(&0).unwrap();
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &winner)));
    }

    #[test]
    fn test_theme_identity_and_clear() {
        let cache = TextMateCache::new();
        let id = ThemeId::Builtin(ThemeName::default());

        let (_, first) = cache.get_theme(&id).unwrap();
        let (_, second) = cache.get_theme(&id).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.clear();
        let (_, third) = cache.get_theme(&id).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_grammar_lookup_caches_misses() {
        let cache = TextMateCache::new();
        let (registry, _) = cache
            .get_theme(&ThemeId::Builtin(ThemeName::default()))
            .unwrap();

        let rust = cache.get_grammar(&registry, "rs", true).unwrap();
        let again = cache.get_grammar(&registry, "rs", true).unwrap();
        assert!(Arc::ptr_eq(&rust, &again));

        assert!(cache.get_grammar(&registry, "unknown_xyz", true).is_none());
        assert!(cache.get_grammar(&registry, "unknown_xyz", false).is_none());
        assert_eq!(cache.grammars.len(), 3);
    }
}
