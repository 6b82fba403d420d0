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

//! Open documents, the shared document cache and the tracking engine.
//!
//! # Responsibilities
//!
//! - Storage of the editor's current text for each open document
//! - Version ordering: a change older than the stored version is dropped
//! - Size limits on incoming text
//! - Access to the core [`DocumentCache`] and [`TrackingEngine`]
//!
//! The manager is shared between the protocol handlers and the debounce
//! tasks that publish diagnostics, so every field allows concurrent access.

use crate::analysis::{to_lsp_diagnostics, AnalyzedDocument};
use crate::config::ServerConfig;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use ropey::Rope;
use slim_core::{CacheStatistics, DocumentCache, DocumentationStore, TextDocument, TrackingEngine};
use std::sync::Arc;
use tower_lsp::lsp_types::{Diagnostic, Url};
use tracing::{debug, warn};

/// The editor's view of one open document.
pub struct OpenDocument {
    /// Version last accepted from the client.
    pub version: i32,
    /// Current content as a Rope for cheap snapshots of large documents.
    pub rope: Rope,
}

/// Snapshot of an open document taken for one request.
///
/// Requests work on a snapshot so that the document lock is released before
/// any tracking pass runs.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub version: i32,
    pub text: String,
}

/// Open documents plus the cache and engine serving them.
///
/// The DocumentManager is the single source of truth for document state in
/// the server. Derived state (lines, tracking state, diagnostics) lives in
/// the core [`DocumentCache`], keyed by URI and version.
///
/// # Thread Safety
///
/// Documents sit in a `DashMap` with a `parking_lot::Mutex` per document.
/// The cache and engine are swapped atomically on reconfiguration, and
/// requests hold their own `Arc` clones, so a request in progress keeps
/// working against the configuration it started with.
///
/// # Example
///
/// ```no_run
/// use slim_core::EmptyDocumentationStore;
/// use slim_lsp::{DocumentManager, ServerConfig};
/// use std::sync::Arc;
///
/// let manager = DocumentManager::new(&ServerConfig::default(), Arc::new(EmptyDocumentationStore));
/// assert_eq!(manager.open_document_count(), 0);
/// ```
pub struct DocumentManager {
    /// Document store: URI -> document state.
    documents: DashMap<Url, Arc<Mutex<OpenDocument>>>,
    /// Derived state per document version.
    cache: RwLock<Arc<DocumentCache>>,
    /// Tracking engine holding the documentation store.
    engine: RwLock<Arc<TrackingEngine>>,
    /// Maximum document size in bytes.
    max_document_size: RwLock<usize>,
}

impl DocumentManager {
    /// Create a document manager.
    ///
    /// # Parameters
    ///
    /// - `config`: Cache capacity, look-ahead and size limit
    /// - `docs`: Documentation store used by the tracking engine
    pub fn new(config: &ServerConfig, docs: Arc<dyn DocumentationStore>) -> Self {
        Self {
            documents: DashMap::new(),
            cache: RwLock::new(Arc::new(DocumentCache::from_config(&config.engine_config()))),
            engine: RwLock::new(Arc::new(TrackingEngine::with_config(
                docs,
                config.engine_config(),
            ))),
            max_document_size: RwLock::new(config.max_document_size),
        }
    }

    /// Apply a new configuration.
    ///
    /// Cached tracking results depend on the documentation, so the cache is
    /// rebuilt along with the engine.
    pub fn reconfigure(&self, config: &ServerConfig, docs: Arc<dyn DocumentationStore>) {
        let engine_config = config.engine_config();
        debug!(
            "Rebuilding document cache with capacity {}",
            engine_config.cache_capacity
        );
        *self.cache.write() = Arc::new(DocumentCache::from_config(&engine_config));
        *self.engine.write() = Arc::new(TrackingEngine::with_config(docs, engine_config));
        *self.max_document_size.write() = config.max_document_size;
    }

    /// The document cache currently in use.
    pub fn cache(&self) -> Arc<DocumentCache> {
        self.cache.read().clone()
    }

    pub fn engine(&self) -> Arc<TrackingEngine> {
        self.engine.read().clone()
    }

    /// The documentation store of the current engine.
    pub fn docs(&self) -> Arc<dyn DocumentationStore> {
        Arc::clone(self.engine.read().docs())
    }

    pub fn max_document_size(&self) -> usize {
        *self.max_document_size.read()
    }

    /// Get current cache statistics.
    ///
    /// This method provides a snapshot of cache performance metrics.
    pub fn statistics(&self) -> CacheStatistics {
        self.cache.read().stats()
    }

    pub fn open_document_count(&self) -> usize {
        self.documents.len()
    }

    /// Insert or update a document.
    ///
    /// # Parameters
    ///
    /// - `uri`: Document identity
    /// - `version`: Client version of `text`
    /// - `text`: Full document content
    ///
    /// # Version Handling
    ///
    /// A version older than the stored one is dropped. New text under the
    /// stored version (a save that carries text) replaces the content and
    /// deletes the cache entry, because cache entries are keyed by version.
    ///
    /// # Returns
    ///
    /// - `true`: The document was stored
    /// - `false`: The text exceeds the size limit or the version is stale
    pub fn insert_or_update(&self, uri: &Url, version: i32, text: &str) -> bool {
        let max_size = self.max_document_size();
        if text.len() > max_size {
            warn!(
                "Document size limit exceeded for {}: {} bytes > {} bytes maximum (rejected)",
                uri,
                text.len(),
                max_size
            );
            return false;
        }

        if let Some(existing) = self.documents.get(uri) {
            let mut doc = existing.lock();
            if version < doc.version {
                debug!(
                    "Ignoring stale change for {}: version {} < {}",
                    uri, version, doc.version
                );
                return false;
            }
            // Cache entries are keyed by version, so new text under the same
            // version (a save with text) must not hit the old entry.
            if version == doc.version && doc.rope != text {
                self.cache.read().delete(uri.as_str());
            }
            doc.version = version;
            doc.rope = Rope::from_str(text);
            return true;
        }

        debug!(
            "New document registered: {} ({} bytes, version {})",
            uri,
            text.len(),
            version
        );
        self.documents.insert(
            uri.clone(),
            Arc::new(Mutex::new(OpenDocument {
                version,
                rope: Rope::from_str(text),
            })),
        );
        true
    }

    /// Copy of the current version and text of `uri`, if it is open.
    pub fn snapshot(&self, uri: &Url) -> Option<DocumentSnapshot> {
        self.documents.get(uri).map(|entry| {
            let doc = entry.lock();
            DocumentSnapshot {
                version: doc.version,
                text: doc.rope.to_string(),
            }
        })
    }

    /// Analysis of the current version of `uri`, served from the cache
    /// when that version was already tracked.
    pub fn analyze(&self, uri: &Url) -> Option<AnalyzedDocument> {
        let snapshot = self.snapshot(uri)?;
        let engine = self.engine();
        let cache = self.cache();
        Some(AnalyzedDocument::analyze(
            &engine,
            &cache,
            uri.as_str(),
            snapshot.version,
            &snapshot.text,
        ))
    }

    /// Cached lines of the current version of `uri`, without a tracking pass.
    pub fn lines(&self, uri: &Url) -> Option<Arc<Vec<String>>> {
        let snapshot = self.snapshot(uri)?;
        let doc = TextDocument::new(uri.as_str(), snapshot.version, &snapshot.text);
        Some(self.cache().get_or_create_lines(&doc))
    }

    /// Structure diagnostics of the current version of `uri`.
    pub fn diagnostics(&self, uri: &Url) -> Option<Vec<Diagnostic>> {
        let snapshot = self.snapshot(uri)?;
        let cache = self.cache();
        let doc = TextDocument::new(uri.as_str(), snapshot.version, &snapshot.text);
        let lines = cache.get_or_create_lines(&doc);
        let diagnostics = cache.get_or_validate(&doc);
        Some(to_lsp_diagnostics(&lines, &diagnostics))
    }

    /// Forget an open document and its cache entry.
    ///
    /// # Returns
    ///
    /// `true` if the document was open.
    pub fn remove(&self, uri: &Url) -> bool {
        self.cache.read().delete(uri.as_str());
        self.documents.remove(uri).is_some()
    }

    /// Drop every cache entry. Open documents are kept.
    pub fn clear_cache(&self) {
        self.cache.read().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slim_core::EmptyDocumentationStore;

    fn manager() -> DocumentManager {
        DocumentManager::new(&ServerConfig::default(), Arc::new(EmptyDocumentationStore))
    }

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///{}", name)).unwrap()
    }

    #[test]
    fn test_stale_version_is_ignored() {
        let manager = manager();
        let u = uri("a.slim");
        assert!(manager.insert_or_update(&u, 2, "x = 1;"));
        assert!(!manager.insert_or_update(&u, 1, "x = 0;"));

        let snapshot = manager.snapshot(&u).unwrap();
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.text, "x = 1;");
    }

    #[test]
    fn test_oversized_text_is_rejected() {
        let config = ServerConfig {
            max_document_size: 4,
            ..ServerConfig::default()
        };
        let manager = DocumentManager::new(&config, Arc::new(EmptyDocumentationStore));
        assert!(!manager.insert_or_update(&uri("big.slim"), 1, "12345"));
        assert_eq!(manager.open_document_count(), 0);
    }

    #[test]
    fn test_analysis_is_cached_per_version() {
        let manager = manager();
        let u = uri("b.slim");
        manager.insert_or_update(&u, 1, "1 early() {\n    inds = p1.individuals;\n}");

        let first = manager.analyze(&u).unwrap();
        let second = manager.analyze(&u).unwrap();
        assert!(Arc::ptr_eq(&first.state, &second.state));
        assert!(first.state.type_of("inds").is_some());

        manager.insert_or_update(&u, 2, "x = 1;");
        let third = manager.analyze(&u).unwrap();
        assert_eq!(third.version, 2);
        assert!(third.state.type_of("inds").is_none());
    }

    #[test]
    fn test_diagnostics_and_remove() {
        let manager = manager();
        let u = uri("c.slim");
        manager.insert_or_update(&u, 1, "initialize() {");

        let diagnostics = manager.diagnostics(&u).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(manager.cache().contains(u.as_str()));

        assert!(manager.remove(&u));
        assert!(!manager.cache().contains(u.as_str()));
        assert!(manager.diagnostics(&u).is_none());
    }

    #[test]
    fn test_reconfigure_rebuilds_cache() {
        let manager = manager();
        let config = ServerConfig {
            cache_capacity: 3,
            ..ServerConfig::default()
        };
        manager.reconfigure(&config, Arc::new(EmptyDocumentationStore));
        assert_eq!(manager.statistics().max_size, 3);
    }
}
