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

//! Server configuration.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. Command-line flags of the `slim-lsp` binary
//! 3. The client's `initializationOptions`
//!
//! ```json
//! {
//!   "cacheCapacity": 40,
//!   "maxDocumentSize": 8388608,
//!   "docsPath": "/opt/slim/docs",
//!   "inlayHints": { "types": true, "parameterNames": false }
//! }
//! ```

use crate::constants::DEFAULT_MAX_DOCUMENT_SIZE;
use crate::error::{LspError, LspResult};
use serde::{Deserialize, Serialize};
use slim_core::constants::DEFAULT_CACHE_CAPACITY;
use slim_core::{DocumentationStore, EmptyDocumentationStore, EngineConfig, JsonDocumentationStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Which inlay hints the server produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlayHintConfig {
    /// `: Type` after assigned and loop variables.
    pub types: bool,
    /// `name:` before call arguments.
    pub parameter_names: bool,
}

impl Default for InlayHintConfig {
    fn default() -> Self {
        Self {
            types: true,
            parameter_names: true,
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub cache_capacity: usize,
    /// Documents larger than this many bytes are not tracked.
    pub max_document_size: usize,
    /// Directory holding the JSON documentation files.
    pub docs_path: Option<PathBuf>,
    pub inlay_hints: InlayHintConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            docs_path: None,
            inlay_hints: InlayHintConfig::default(),
        }
    }
}

/// `initializationOptions` as sent by a client. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializationOptions {
    cache_capacity: Option<usize>,
    max_document_size: Option<usize>,
    docs_path: Option<PathBuf>,
    inlay_hints: Option<InlayHintOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlayHintOptions {
    types: Option<bool>,
    parameter_names: Option<bool>,
}

impl ServerConfig {
    /// Overlay the keys present in a client's `initializationOptions`.
    ///
    /// `null` leaves the configuration unchanged. On error nothing is applied.
    pub fn merge_initialization_options(&mut self, options: &serde_json::Value) -> LspResult<()> {
        if options.is_null() {
            return Ok(());
        }
        let options = InitializationOptions::deserialize(options)?;

        let mut merged = self.clone();
        if let Some(capacity) = options.cache_capacity {
            merged.cache_capacity = capacity;
        }
        if let Some(size) = options.max_document_size {
            merged.max_document_size = size;
        }
        if let Some(path) = options.docs_path {
            merged.docs_path = Some(path);
        }
        if let Some(hints) = options.inlay_hints {
            if let Some(types) = hints.types {
                merged.inlay_hints.types = types;
            }
            if let Some(names) = hints.parameter_names {
                merged.inlay_hints.parameter_names = names;
            }
        }

        merged.validate()?;
        *self = merged;
        Ok(())
    }

    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default().with_cache_capacity(self.cache_capacity)
    }

    pub fn validate(&self) -> LspResult<()> {
        self.engine_config().validate()?;
        if self.max_document_size == 0 {
            return Err(LspError::InvalidConfig(
                "maximum document size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Load the documentation store named by `docs_path`.
    ///
    /// Without a path the server runs on an empty store: tracking and
    /// navigation still work, documentation-driven hovers do not.
    pub fn load_documentation(&self) -> LspResult<Arc<dyn DocumentationStore>> {
        match &self.docs_path {
            Some(path) => {
                let store = JsonDocumentationStore::load_dir(path)?;
                info!("Loaded documentation from {}", path.display());
                Ok(Arc::new(store))
            }
            None => {
                info!("No documentation directory configured");
                Ok(Arc::new(EmptyDocumentationStore))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.cache_capacity, 25);
        assert!(config.inlay_hints.types);
        assert!(config.inlay_hints.parameter_names);
        assert!(config.docs_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_partial_options() {
        let mut config = ServerConfig {
            cache_capacity: 10,
            ..ServerConfig::default()
        };
        config
            .merge_initialization_options(&json!({
                "inlayHints": { "parameterNames": false },
                "docsPath": "/tmp/docs"
            }))
            .unwrap();

        assert_eq!(config.cache_capacity, 10);
        assert!(config.inlay_hints.types);
        assert!(!config.inlay_hints.parameter_names);
        assert_eq!(config.docs_path, Some(PathBuf::from("/tmp/docs")));
    }

    #[test]
    fn test_null_options_are_ignored() {
        let mut config = ServerConfig::default();
        config.merge_initialization_options(&serde_json::Value::Null).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_invalid_options_leave_config_unchanged() {
        let mut config = ServerConfig::default();
        assert!(config
            .merge_initialization_options(&json!({ "cacheCapacity": "many" }))
            .is_err());
        assert!(config
            .merge_initialization_options(&json!({ "cacheCapacity": 0 }))
            .is_err());
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_full_config_round_trips_through_json() {
        let config: ServerConfig = serde_json::from_value(json!({
            "cacheCapacity": 3,
            "inlayHints": { "types": false }
        }))
        .unwrap();
        assert_eq!(config.cache_capacity, 3);
        assert!(!config.inlay_hints.types);
        assert!(config.inlay_hints.parameter_names);
    }

    #[test]
    fn test_missing_docs_dir_falls_back_to_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            docs_path: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let docs = config.load_documentation().unwrap();
        assert!(docs.functions().is_empty());
    }
}
