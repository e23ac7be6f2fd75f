//! Content-addressed cache of computed styles.
//!
//! Entries are keyed on the class name plus the serialized chunk tree and
//! context, so structurally identical renders hit the same entry even when the
//! caller rebuilt every value. Eviction is strict LRU by access order.

use log::trace;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use style_core::{ConfigHandle, EvaluationContext, StyleChunk, serialize_chunks};

/// A memoized style computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// Final compiled CSS text.
    pub css: String,
    /// Utility classes produced alongside the CSS.
    pub utility_classes: Vec<String>,
    /// Last time the entry was written or read.
    pub timestamp: Instant,
    /// Number of hits since insertion.
    pub hit_count: u64,
}

/// Aggregate cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of live entries.
    pub size: usize,
    /// Sum of hit counts over live entries.
    pub total_hits: u64,
    /// `total_hits / size`, zero when empty.
    pub average_hits: f64,
}

/// Build the cache key for a render.
pub fn cache_key(
    chunks: &[StyleChunk],
    context: &EvaluationContext,
    class_name: Option<&str>,
) -> String {
    let mut key = String::from(class_name.unwrap_or_default());
    key.push_str(&serialize_chunks(chunks));
    key.push_str(&context.canonical());
    key
}

#[derive(Debug)]
struct Stored {
    entry: CacheEntry,
    /// Position in `recency`.
    tick: u64,
}

/// Bounded LRU store of computed styles.
///
/// Capacity and the enable flag are read from the shared configuration on
/// every call, never snapshotted.
#[derive(Debug)]
pub struct StyleCache {
    config: ConfigHandle,
    entries: FxHashMap<String, Stored>,
    /// Keys by last access tick, least recently used first.
    recency: BTreeMap<u64, String>,
    clock: u64,
}

impl StyleCache {
    /// Empty cache reading `config`.
    pub fn new(config: ConfigHandle) -> Self {
        Self {
            config,
            entries: FxHashMap::default(),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    /// Look up a previous computation.
    ///
    /// Returns `None` when caching is disabled. A hit becomes the most recently
    /// used entry. The returned entry is a copy.
    pub fn get(
        &mut self,
        chunks: &[StyleChunk],
        context: &EvaluationContext,
        class_name: Option<&str>,
    ) -> Option<CacheEntry> {
        if !self.config.get().enable_cache {
            self.drop_all();
            return None;
        }
        let key = cache_key(chunks, context, class_name);
        let tick = self.tick();
        let Some(stored) = self.entries.get_mut(&key) else {
            trace!("style cache miss for {:?}", class_name.unwrap_or_default());
            return None;
        };
        stored.entry.hit_count += 1;
        stored.entry.timestamp = Instant::now();
        let copy = stored.entry.clone();
        let previous = std::mem::replace(&mut stored.tick, tick);
        self.recency.remove(&previous);
        self.recency.insert(tick, key);
        trace!(
            "style cache hit for {:?} ({} hits)",
            class_name.unwrap_or_default(),
            copy.hit_count
        );
        Some(copy)
    }

    /// Record a computation, evicting the least recently used entry when full.
    pub fn set(
        &mut self,
        chunks: &[StyleChunk],
        context: &EvaluationContext,
        css: &str,
        utility_classes: &[String],
        class_name: Option<&str>,
    ) {
        let config = self.config.get();
        if !config.enable_cache {
            self.drop_all();
            return;
        }
        let key = cache_key(chunks, context, class_name);
        if self.entries.len() as i64 >= config.cache_size {
            self.evict_lru();
        }
        let tick = self.tick();
        let stored = Stored {
            entry: CacheEntry {
                css: css.to_owned(),
                utility_classes: utility_classes.to_vec(),
                timestamp: Instant::now(),
                hit_count: 0,
            },
            tick,
        };
        if let Some(replaced) = self.entries.insert(key.clone(), stored) {
            self.recency.remove(&replaced.tick);
        }
        self.recency.insert(tick, key);
    }

    /// Aggregate counters.
    pub fn stats(&self) -> CacheStats {
        let size = self.entries.len();
        let total_hits = self
            .entries
            .values()
            .map(|stored| stored.entry.hit_count)
            .sum();
        let average_hits = if size == 0 {
            0.0
        } else {
            total_hits as f64 / size as f64
        };
        CacheStats {
            size,
            total_hits,
            average_hits,
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.drop_all();
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_all(&mut self) {
        if !self.entries.is_empty() {
            trace!("style cache cleared ({} entries)", self.entries.len());
        }
        self.entries.clear();
        self.recency.clear();
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        if let Some((_, oldest)) = self.recency.pop_first() {
            self.entries.remove(&oldest);
            trace!("style cache evicted {oldest}");
        }
    }
}
