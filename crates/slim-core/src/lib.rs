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

//! Lexical tracking engine and document cache for SLiM and Eidos scripts.
//!
//! This crate infers what an editor needs to know about a simulation script
//! without parsing it into a syntax tree: the type of each variable, loop
//! scopes, the callback containing each line, declared constants and types,
//! and user-defined functions.
//!
//! # Tracking
//!
//! [`TrackingEngine`] runs one forward pass over a document's lines and
//! returns an immutable [`TrackingState`]. The pass is built from small,
//! independent pieces:
//!
//! - [`patterns`]: line-level detectors for declarations, assignments and loops
//! - [`resolver`]: expression text to [`TypeName`], through property chains
//!   and array indexing
//! - [`callbacks`]: which callback block contains each line
//! - [`scope`]: loop-variable scopes, including nested and shadowed loops
//!
//! # Caching
//!
//! [`DocumentCache`] keeps the split lines, tracking state and diagnostics of
//! recently used documents, keyed by URI and version, with LRU eviction.
//!
//! # Collaborators
//!
//! - [`docs`]: the read-only reference documentation store
//! - [`position`]: word and completion context under a cursor
//! - [`validation`]: brace and semicolon checks

pub mod cache;
pub mod callbacks;
mod config;
pub mod constants;
pub mod docs;
mod error;
pub mod patterns;
pub mod position;
pub mod resolver;
pub mod scope;
pub mod text;
pub mod tracking;
mod types;
pub mod validation;

pub use cache::{CacheEntry, CacheStatistics, DocumentCache, TextDocument};
pub use config::EngineConfig;
pub use docs::{DocumentationStore, EmptyDocumentationStore, JsonDocumentationStore};
pub use error::{SlimError, SlimResult};
pub use patterns::ModelType;
pub use position::{completion_context, word_at, CompletionContext, WordAtPosition};
pub use resolver::{TypeLookup, TypeResolver};
pub use scope::{loop_scope_for, variables_in_scope, LineScope, LoopScope};
pub use tracking::{PropertySource, TrackingEngine, TrackingState, UserFunction};
pub use types::{BaseType, ClassName, Primitive, TypeName};
pub use validation::{validate_structure, Diagnostic, Severity};
