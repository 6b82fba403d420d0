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

//! Error types for the collaborators around the tracking engine.
//!
//! The tracking pass itself never fails: a detector that finds nothing simply
//! has no effect. Errors only arise at the edges, when documentation files are
//! read from disk or configuration values are validated.

use std::path::PathBuf;
use thiserror::Error;

/// An error raised while loading documentation or validating configuration.
#[derive(Debug, Error)]
pub enum SlimError {
    /// A documentation file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A documentation file is not valid JSON for the expected shape.
    #[error("invalid documentation JSON in {path}: {source}")]
    Json {
        /// File with the malformed content.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SlimError {
    /// Create an I/O error for the file at `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a JSON error for the documentation file at `path`.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use slim_core::SlimError;
    ///
    /// let err = SlimError::invalid_config("cache capacity must be at least 1");
    /// assert_eq!(err.to_string(), "invalid configuration: cache capacity must be at least 1");
    /// ```
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type alias for fallible collaborator operations.
pub type SlimResult<T> = Result<T, SlimError>;
