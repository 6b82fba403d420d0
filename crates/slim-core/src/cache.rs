// Dweve SLiM Tools - Editor intelligence for SLiM and Eidos scripts
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Version-keyed document cache with LRU eviction.
//!
//! Every editor request for a document goes through this cache, so the split
//! lines, the tracking state and the diagnostics of a document version are
//! computed once and shared by hover, completion, definitions and the rest.
//!
//! # Design
//!
//! - **One entry per URI**: an entry holds a version and up to three derived
//!   fields. All fields present in an entry belong to that version.
//! - **Version checks**: a request for version V against an entry at V' != V
//!   is a miss. A write for a newer version replaces the whole entry; a
//!   write for an older version is ignored, so the highest version wins.
//! - **Incremental fill**: fields computed under the same version are added
//!   to the existing entry one at a time.
//! - **LRU**: every read or write touches the entry. When an insert would
//!   exceed the capacity, the least recently touched URI is evicted.
//! - **Single-flight**: [`DocumentCache::get_or_track`] serialises tracking
//!   per URI and version, so concurrent misses for one version run the pass
//!   once. Passes for different versions of a URI do not wait on each other.
//!
//! # Thread Safety
//!
//! All state sits behind `parking_lot` mutexes. Derived values are handed
//! out as `Arc`s and are never modified after they are stored.

use crate::config::EngineConfig;
use crate::constants::{DEFAULT_CACHE_CAPACITY, MIN_CACHE_CAPACITY};
use crate::text::split_lines;
use crate::tracking::TrackingState;
use crate::validation::{validate_structure, Diagnostic};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// A document as seen by the cache: identity, version and full text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDocument<'a> {
    pub uri: &'a str,
    pub version: i32,
    pub text: &'a str,
}

impl<'a> TextDocument<'a> {
    pub fn new(uri: &'a str, version: i32, text: &'a str) -> Self {
        Self { uri, version, text }
    }
}

/// Derived artifacts of one document version.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub version: i32,
    pub lines: Option<Arc<Vec<String>>>,
    pub tracking_state: Option<Arc<TrackingState>>,
    pub diagnostics: Option<Arc<Vec<Diagnostic>>>,
}

impl CacheEntry {
    fn empty(version: i32) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }
}

/// Cache counters, as reported by [`DocumentCache::stats`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheStatistics {
    /// Number of entries currently held.
    pub size: usize,
    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub hit_rate: f64,
    pub evictions: u64,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    tick: u64,
}

#[derive(Debug)]
struct Inner {
    slots: HashMap<String, Slot>,
    /// Access tick to URI. The first key is the least recently used entry.
    order: BTreeMap<u64, String>,
    next_tick: u64,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Inner {
    fn touch(&mut self, uri: &str) {
        let tick = self.next_tick;
        if let Some(slot) = self.slots.get_mut(uri) {
            self.order.remove(&slot.tick);
            slot.tick = tick;
            self.order.insert(tick, uri.to_string());
            self.next_tick += 1;
        }
    }

    /// Read a field, counting a hit or a miss.
    fn lookup<T>(
        &mut self,
        doc: &TextDocument<'_>,
        field: impl Fn(&CacheEntry) -> Option<T>,
    ) -> Option<T> {
        let found = self.peek(doc, field);
        if self.slots.contains_key(doc.uri) {
            self.touch(doc.uri);
        }
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Read a field without touching counters or access order.
    fn peek<T>(&self, doc: &TextDocument<'_>, field: impl Fn(&CacheEntry) -> Option<T>) -> Option<T> {
        self.slots
            .get(doc.uri)
            .filter(|slot| slot.entry.version == doc.version)
            .and_then(|slot| field(&slot.entry))
    }

    /// Apply `update` to the entry for `uri` at `version`.
    ///
    /// Returns false when the cached entry already holds a newer version.
    fn write(&mut self, uri: &str, version: i32, update: impl FnOnce(&mut CacheEntry)) -> bool {
        if let Some(slot) = self.slots.get_mut(uri) {
            if slot.entry.version > version {
                debug!(
                    "Ignoring stale write for {}: version {} < cached {}",
                    uri, version, slot.entry.version
                );
                return false;
            }
            if slot.entry.version < version {
                slot.entry = CacheEntry::empty(version);
            }
            update(&mut slot.entry);
            self.touch(uri);
            return true;
        }

        while self.slots.len() >= self.capacity {
            if !self.evict_lru() {
                break;
            }
        }

        let mut entry = CacheEntry::empty(version);
        update(&mut entry);
        let tick = self.next_tick;
        self.next_tick += 1;
        self.order.insert(tick, uri.to_string());
        self.slots.insert(uri.to_string(), Slot { entry, tick });
        true
    }

    fn evict_lru(&mut self) -> bool {
        let Some((&tick, _)) = self.order.iter().next() else {
            return false;
        };
        let Some(uri) = self.order.remove(&tick) else {
            return false;
        };
        self.slots.remove(&uri);
        self.evictions += 1;
        warn!(
            "Cache limit reached ({}), evicted least recently used document: {}",
            self.capacity, uri
        );
        true
    }

    fn remove(&mut self, uri: &str) -> bool {
        match self.slots.remove(uri) {
            Some(slot) => {
                self.order.remove(&slot.tick);
                true
            }
            None => false,
        }
    }
}

/// Capacity-bounded cache of per-document derived artifacts.
///
/// # Example
///
/// ```
/// use slim_core::{DocumentCache, TextDocument};
///
/// let cache = DocumentCache::new(2);
/// let doc = TextDocument::new("file:///a.slim", 1, "x = 1;\ny = 2;");
/// assert_eq!(cache.get_or_create_lines(&doc).len(), 2);
/// assert_eq!(cache.stats().misses, 1);
/// ```
#[derive(Debug)]
pub struct DocumentCache {
    inner: Mutex<Inner>,
    /// Locks held while a tracking pass runs, keyed by URI and version.
    in_flight: Mutex<HashMap<FlightKey, Arc<Mutex<()>>>>,
}

type FlightKey = (String, i32);

/// Membership in the flight for one URI and version.
///
/// Dropping the last member removes the flight from the map, including when
/// the tracking closure panics.
struct Flight<'a> {
    in_flight: &'a Mutex<HashMap<FlightKey, Arc<Mutex<()>>>>,
    key: FlightKey,
    lock: Arc<Mutex<()>>,
}

impl<'a> Flight<'a> {
    fn join(in_flight: &'a Mutex<HashMap<FlightKey, Arc<Mutex<()>>>>, doc: &TextDocument<'_>) -> Self {
        let key = (doc.uri.to_string(), doc.version);
        let lock = Arc::clone(
            in_flight
                .lock()
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        Self { in_flight, key, lock }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut flights = self.in_flight.lock();
        // One reference is held by the map and one by this member.
        if Arc::strong_count(&self.lock) <= 2 {
            flights.remove(&self.key);
        }
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl DocumentCache {
    /// Create a cache holding at most `capacity` documents.
    ///
    /// A capacity below 1 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                order: BTreeMap::new(),
                next_tick: 0,
                capacity: capacity.max(MIN_CACHE_CAPACITY),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.inner.lock().slots.contains_key(uri)
    }

    /// Version of the entry cached for `uri`, if any.
    pub fn cached_version(&self, uri: &str) -> Option<i32> {
        self.inner.lock().slots.get(uri).map(|slot| slot.entry.version)
    }

    /// Snapshot of the entry for `uri`, without counting an access.
    pub fn entry(&self, uri: &str) -> Option<CacheEntry> {
        self.inner.lock().slots.get(uri).map(|slot| slot.entry.clone())
    }

    pub fn lines(&self, doc: &TextDocument<'_>) -> Option<Arc<Vec<String>>> {
        self.inner.lock().lookup(doc, |e| e.lines.clone())
    }

    pub fn set_lines(&self, doc: &TextDocument<'_>, lines: Arc<Vec<String>>) -> bool {
        self.inner
            .lock()
            .write(doc.uri, doc.version, |e| e.lines = Some(lines))
    }

    /// Lines of `doc`, splitting its text on a miss.
    pub fn get_or_create_lines(&self, doc: &TextDocument<'_>) -> Arc<Vec<String>> {
        if let Some(lines) = self.lines(doc) {
            return lines;
        }
        let lines = Arc::new(split_lines(doc.text));
        self.set_lines(doc, Arc::clone(&lines));
        lines
    }

    pub fn tracking_state(&self, doc: &TextDocument<'_>) -> Option<Arc<TrackingState>> {
        self.inner.lock().lookup(doc, |e| e.tracking_state.clone())
    }

    pub fn set_tracking_state(&self, doc: &TextDocument<'_>, state: Arc<TrackingState>) -> bool {
        self.inner
            .lock()
            .write(doc.uri, doc.version, |e| e.tracking_state = Some(state))
    }

    pub fn diagnostics(&self, doc: &TextDocument<'_>) -> Option<Arc<Vec<Diagnostic>>> {
        self.inner.lock().lookup(doc, |e| e.diagnostics.clone())
    }

    pub fn set_diagnostics(&self, doc: &TextDocument<'_>, diagnostics: Arc<Vec<Diagnostic>>) -> bool {
        self.inner
            .lock()
            .write(doc.uri, doc.version, |e| e.diagnostics = Some(diagnostics))
    }

    /// Tracking state of `doc`, computing it with `track` on a miss.
    ///
    /// Concurrent callers missing on the same URI and version wait for the
    /// first one and then read its result, so `track` runs once per version.
    ///
    /// # Arguments
    ///
    /// * `doc` - The document version to track
    /// * `track` - The tracking pass, called with the document's lines
    ///
    /// # Returns
    ///
    /// The cached or freshly computed state. A state computed for a version
    /// older than the cached one is returned but not stored.
    pub fn get_or_track<F>(&self, doc: &TextDocument<'_>, track: F) -> Arc<TrackingState>
    where
        F: FnOnce(&[String]) -> TrackingState,
    {
        if let Some(state) = self.tracking_state(doc) {
            return state;
        }

        let flight = Flight::join(&self.in_flight, doc);
        let _running = flight.lock.lock();

        if let Some(state) = self.inner.lock().peek(doc, |e| e.tracking_state.clone()) {
            return state;
        }

        let lines = self.get_or_create_lines(doc);
        let state = Arc::new(track(lines.as_slice()));
        self.set_tracking_state(doc, Arc::clone(&state));
        state
    }

    /// Diagnostics of `doc`, running the structure check on a miss.
    pub fn get_or_validate(&self, doc: &TextDocument<'_>) -> Arc<Vec<Diagnostic>> {
        if let Some(diagnostics) = self.diagnostics(doc) {
            return diagnostics;
        }
        let lines = self.get_or_create_lines(doc);
        let diagnostics = Arc::new(validate_structure(lines.as_slice()));
        self.set_diagnostics(doc, Arc::clone(&diagnostics));
        diagnostics
    }

    /// Drop the entry for `uri`. Returns true if one existed.
    pub fn delete(&self, uri: &str) -> bool {
        self.inner.lock().remove(uri)
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.slots.clear();
        inner.order.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
    }

    pub fn stats(&self) -> CacheStatistics {
        let inner = self.inner.lock();
        let lookups = inner.hits + inner.misses;
        CacheStatistics {
            size: inner.slots.len(),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                inner.hits as f64 / lookups as f64
            },
            evictions: inner.evictions,
            max_size: inner.capacity,
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}
