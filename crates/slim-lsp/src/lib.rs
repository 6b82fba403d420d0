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

//! SLiM Language Server Protocol (LSP) Implementation
//!
//! This crate provides IDE integration for SLiM and Eidos scripts through the
//! Language Server Protocol, built on the lexical tracking engine in
//! `slim-core`.
//!
//! # Features
//!
//! - **Diagnostics**: Unbalanced braces, parentheses and brackets, and
//!   missing semicolons
//! - **Autocomplete**: Members of the inferred class after `.`, and functions,
//!   constructors, callbacks, user functions and variables elsewhere
//! - **Hover**: Inferred types, member documentation, property provenance and
//!   callback pseudo-parameters
//! - **Signature Help**: Active parameter tracking across nested calls
//! - **Go to Definition**: Constants, types, subpopulations, functions,
//!   parameters, assignments and loop variables
//! - **Find References**: Whole-word and quoted-id references outside
//!   comments and strings
//! - **Inlay Hints**: Inferred types and parameter names
//! - **Document Symbols**: Callbacks and functions with their declarations
//! - **Folding**: Multi-line brace blocks and comment runs
//!
//! # Performance
//!
//! 1. **Debouncing** (200ms): Diagnostics on change are validated once per
//!    burst of keystrokes.
//! 2. **Shared Cache**: Lines, tracking state and diagnostics are cached per
//!    document version in an LRU cache, so all requests for one version
//!    share a single tracking pass.
//! 3. **Single-flight Tracking**: Concurrent requests for an untracked version
//!    wait for one pass instead of repeating it.
//!
//! # Usage
//!
//! ## Running the Server
//!
//! ```bash
//! # Run the language server (stdio transport)
//! slim-lsp --docs /path/to/docs
//!
//! # With debug logging
//! RUST_LOG=debug slim-lsp
//! ```
//!
//! ## Programmatic Usage
//!
//! ```no_run
//! use slim_lsp::{ServerConfig, SlimLanguageServer};
//! use tower_lsp::{LspService, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stdin = tokio::io::stdin();
//!     let stdout = tokio::io::stdout();
//!
//!     let config = ServerConfig {
//!         cache_capacity: 50,
//!         ..ServerConfig::default()
//!     };
//!     let (service, socket) = LspService::new(move |client| {
//!         SlimLanguageServer::with_config(client, config)
//!     });
//!
//!     Server::new(stdin, stdout, socket).serve(service).await;
//! }
//! ```
//!
//! # Architecture
//!
//! - `backend`: LSP protocol handlers and debounced diagnostics
//! - [`document_manager`]: Open documents, document cache and tracking engine
//! - [`analysis`]: Per-request view of one tracked document version
//! - [`completion`], [`hover`], [`signature_help`], [`definition`],
//!   [`references`], [`inlay_hints`], [`symbols`]: Request providers
//! - [`config`]: Server settings and `initializationOptions`
//! - [`utils`]: UTF-16 position conversion and UTF-8 safe slicing

pub mod analysis;
mod backend;
pub mod completion;
pub mod config;
pub mod constants;
pub mod definition;
pub mod document_manager;
pub mod error;
pub mod folding_range;
pub mod hover;
pub mod inlay_hints;
pub mod references;
pub mod signature_help;
pub mod symbols;
pub mod utils;

pub use backend::SlimLanguageServer;
pub use config::{InlayHintConfig, ServerConfig};
pub use document_manager::DocumentManager;
pub use error::{LspError, LspResult};

/// LSP server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
