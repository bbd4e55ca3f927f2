/*!
 * Translation caching functionality.
 *
 * Identical text runs are common on slides (repeated headers, table labels).
 * Caching successful translations keeps repeated runs consistent and avoids
 * redundant API calls.
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;
use log::debug;

/// Cache key combining source text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source_text: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_lowercase(),
            target_language: target_language.to_lowercase(),
        }
    }
}

/// Entries plus their insertion order, oldest first
#[derive(Default)]
struct Entries {
    map: HashMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
}

/// Translation cache for storing and retrieving translations
///
/// Clones share the same storage. Once `max_entries` is reached the oldest
/// entry is dropped for every new one.
#[derive(Clone)]
pub struct TranslationCache {
    cache: Arc<RwLock<Entries>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
    enabled: bool,
    max_entries: usize,
}

impl TranslationCache {
    /// Default bound on cached translations
    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

    /// Create a new translation cache with the default size bound
    pub fn new(enabled: bool) -> Self {
        Self::with_max_entries(enabled, Self::DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache holding at most `max_entries` translations
    pub fn with_max_entries(enabled: bool, max_entries: usize) -> Self {
        Self {
            cache: Arc::new(RwLock::new(Entries::default())),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
            enabled: enabled && max_entries > 0,
            max_entries,
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let found = self.cache.read().map.get(&key).cloned();

        match &found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}' ({} -> {})",
                       truncate_text(source_text, 30), source_language, target_language);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        found
    }

    /// Store a translation in the cache
    pub fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let mut entries = self.cache.write();
        if entries.map.insert(key.clone(), translation.to_string()).is_some() {
            return;
        }
        entries.order.push_back(key);

        let mut evicted = 0;
        while entries.map.len() > self.max_entries {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.map.remove(&oldest);
            evicted += 1;
        }
        if evicted > 0 {
            debug!("Evicted {} cached translations (max {})", evicted, self.max_entries);
        }
    }

    /// Get cache statistics as `(hits, misses, hit_rate)`
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        let mut entries = self.cache.write();
        entries.map.clear();
        entries.order.clear();
        drop(entries);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Translation cache cleared");
    }

    pub fn len(&self) -> usize {
        self.cache.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().map.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
