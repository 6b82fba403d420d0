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

//! LSP backend implementation.
//!
//! # Request Flow
//!
//! Every request reads the current text of the document from the
//! [`DocumentManager`] and asks the core [`DocumentCache`] for the lines and
//! tracking state of that version. Several requests for one keystroke
//! (completion, signature help, inlay hints) therefore share one tracking
//! pass.
//!
//! # Diagnostics
//!
//! Diagnostics are published right away on open and save. On change they
//! are debounced by 200ms per document so that a burst of keystrokes
//! validates only the last version.
//!
//! [`DocumentCache`]: slim_core::DocumentCache

use crate::completion::get_completions;
use crate::config::ServerConfig;
use crate::constants::{
    BYTES_PER_MEGABYTE, COMPLETION_TRIGGERS, DEBOUNCE_MS, LANGUAGE_IDS, SIGNATURE_TRIGGERS,
};
use crate::definition::find_definition;
use crate::document_manager::DocumentManager;
use crate::folding_range::get_folding_ranges;
use crate::hover::get_hover;
use crate::inlay_hints::get_inlay_hints;
use crate::references::find_references;
use crate::signature_help::get_signature_help;
use crate::symbols::get_document_symbols;
use dashmap::DashMap;
use parking_lot::RwLock;
use slim_core::{CacheStatistics, DocumentationStore, EmptyDocumentationStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

/// SLiM Language Server backend.
pub struct SlimLanguageServer {
    /// LSP client connection.
    client: Client,
    config: RwLock<ServerConfig>,
    /// Open documents, the document cache and the tracking engine.
    document_manager: Arc<DocumentManager>,
    /// Debounce channels: URI -> sender for triggering validation.
    debounce_channels: DashMap<Url, mpsc::UnboundedSender<()>>,
}

impl SlimLanguageServer {
    /// Create a server with default configuration and no documentation.
    pub fn new(client: Client) -> Self {
        Self::with_config(client, ServerConfig::default())
    }

    /// Create a server, loading documentation from `config.docs_path`.
    ///
    /// A documentation directory that fails to load is logged and replaced
    /// by an empty store.
    pub fn with_config(client: Client, config: ServerConfig) -> Self {
        let docs = match config.load_documentation() {
            Ok(docs) => docs,
            Err(e) => {
                warn!("Failed to load documentation, continuing without it: {}", e);
                Arc::new(EmptyDocumentationStore)
            }
        };
        Self::with_documentation(client, config, docs)
    }

    /// Create a server around an already loaded documentation store.
    pub fn with_documentation(
        client: Client,
        config: ServerConfig,
        docs: Arc<dyn DocumentationStore>,
    ) -> Self {
        Self {
            client,
            document_manager: Arc::new(DocumentManager::new(&config, docs)),
            config: RwLock::new(config),
            debounce_channels: DashMap::new(),
        }
    }

    /// Get current cache statistics.
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.document_manager.statistics()
    }

    pub fn open_document_count(&self) -> usize {
        self.document_manager.open_document_count()
    }

    pub fn config(&self) -> ServerConfig {
        self.config.read().clone()
    }

    fn apply_initialization_options(&self, options: &serde_json::Value) {
        let current = self.config();
        let mut merged = current.clone();
        if let Err(e) = merged.merge_initialization_options(options) {
            warn!("Ignoring initialization options: {}", e);
            return;
        }
        if merged == current {
            return;
        }

        let docs = if merged.docs_path != current.docs_path {
            match merged.load_documentation() {
                Ok(docs) => docs,
                Err(e) => {
                    warn!("Failed to load documentation, keeping the current store: {}", e);
                    self.document_manager.docs()
                }
            }
        } else {
            self.document_manager.docs()
        };

        info!(
            "Applying initialization options: cache capacity {}, max document size {} bytes",
            merged.cache_capacity, merged.max_document_size
        );
        self.document_manager.reconfigure(&merged, docs);
        *self.config.write() = merged;
    }

    async fn publish_diagnostics(&self, uri: &Url) {
        match self.document_manager.diagnostics(uri) {
            Some(diagnostics) => {
                debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
                self.client
                    .publish_diagnostics(uri.clone(), diagnostics, None)
                    .await;
            }
            None => warn!("Cannot validate non-existent document: {} (may have been closed)", uri),
        }
    }

    /// Start debounced validation for a document.
    fn schedule_diagnostics(&self, uri: Url) {
        let tx = if let Some(entry) = self.debounce_channels.get(&uri) {
            entry.clone()
        } else {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let uri_clone = uri.clone();
            let client = self.client.clone();
            let document_manager = Arc::clone(&self.document_manager);

            tokio::spawn(async move {
                while rx.recv().await.is_some() {
                    sleep(Duration::from_millis(DEBOUNCE_MS)).await;

                    // Drain any additional signals during debounce
                    while rx.try_recv().is_ok() {}

                    let Some(diagnostics) = document_manager.diagnostics(&uri_clone) else {
                        continue;
                    };
                    debug!("Debounced validation for: {}", uri_clone);
                    client
                        .publish_diagnostics(uri_clone.clone(), diagnostics, None)
                        .await;
                }
            });

            self.debounce_channels.insert(uri.clone(), tx.clone());
            tx
        };

        let _ = tx.send(());
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for SlimLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("SLiM Language Server initializing");
        if let Some(options) = &params.initialization_options {
            self.apply_initialization_options(options);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        will_save: None,
                        will_save_wait_until: None,
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(
                        COMPLETION_TRIGGERS.iter().map(|s| s.to_string()).collect(),
                    ),
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(
                        SIGNATURE_TRIGGERS.iter().map(|s| s.to_string()).collect(),
                    ),
                    retrigger_characters: None,
                    work_done_progress_options: Default::default(),
                }),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                inlay_hint_provider: Some(OneOf::Left(true)),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "slim-lsp".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("SLiM Language Server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        let stats = self.cache_statistics();
        info!(
            "SLiM Language Server shutting down (cache: {} entries, {:.1}% hit rate, {} evictions)",
            stats.size,
            stats.hit_rate * 100.0,
            stats.evictions
        );
        self.document_manager.clear_cache();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let content_len = doc.text.len();

        info!(
            "Document opened: {} ({} bytes, {} lines)",
            doc.uri,
            content_len,
            doc.text.lines().count()
        );
        if !LANGUAGE_IDS.contains(&doc.language_id.as_str()) {
            debug!("Unexpected language id '{}' for {}", doc.language_id, doc.uri);
        }

        let max_size = self.document_manager.max_document_size();
        if content_len > max_size {
            error!(
                "Document size limit exceeded on open: {} has {} bytes > {} bytes maximum",
                doc.uri, content_len, max_size
            );
            self.client
                .show_message(
                    MessageType::ERROR,
                    format!(
                        "Document too large: {} bytes exceeds maximum of {} bytes ({} MB)",
                        content_len,
                        max_size,
                        max_size / BYTES_PER_MEGABYTE
                    ),
                )
                .await;
            return;
        }

        if self
            .document_manager
            .insert_or_update(&doc.uri, doc.version, &doc.text)
        {
            self.publish_diagnostics(&doc.uri).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        let Some(change) = params.content_changes.into_iter().last() else {
            warn!("Document change event for {} had no content changes", uri);
            return;
        };

        if self
            .document_manager
            .insert_or_update(&uri, version, &change.text)
        {
            debug!("Document {} updated to version {}, scheduling validation", uri, version);
            self.schedule_diagnostics(uri);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document saved: {}", uri);
        if let Some(text) = params.text {
            let version = self
                .document_manager
                .snapshot(&uri)
                .map(|s| s.version)
                .unwrap_or_default();
            self.document_manager.insert_or_update(&uri, version, &text);
        }
        self.publish_diagnostics(&uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document closed: {}", uri);
        self.document_manager.remove(&uri);
        self.debounce_channels.remove(&uri);
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(analysis) = self.document_manager.analyze(uri) else {
            debug!("No completion available for {} (document not open)", uri);
            return Ok(None);
        };
        let docs = self.document_manager.docs();
        let items = get_completions(&analysis, docs.as_ref(), position);
        debug!(
            "Providing {} completion items for {} at {}:{}",
            items.len(),
            uri,
            position.line,
            position.character
        );
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self.document_manager.analyze(uri).and_then(|analysis| {
            let docs = self.document_manager.docs();
            get_hover(&analysis, docs.as_ref(), position)
        }))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self.document_manager.analyze(uri).and_then(|analysis| {
            let docs = self.document_manager.docs();
            get_signature_help(&analysis, docs.as_ref(), position)
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self
            .document_manager
            .analyze(uri)
            .and_then(|analysis| find_definition(&analysis, uri, position))
            .map(GotoDefinitionResponse::Scalar))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        Ok(self.document_manager.analyze(uri).map(|analysis| {
            find_references(
                &analysis,
                uri,
                position,
                params.context.include_declaration,
            )
        }))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        Ok(self
            .document_manager
            .analyze(&params.text_document.uri)
            .map(|analysis| DocumentSymbolResponse::Nested(get_document_symbols(&analysis))))
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let config = self.config.read().inlay_hints;
        Ok(self
            .document_manager
            .analyze(&params.text_document.uri)
            .map(|analysis| {
                let docs = self.document_manager.docs();
                get_inlay_hints(&analysis, docs.as_ref(), params.range, &config)
            }))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        Ok(self
            .document_manager
            .lines(&params.text_document.uri)
            .map(|lines| get_folding_ranges(lines.as_slice())))
    }
}
