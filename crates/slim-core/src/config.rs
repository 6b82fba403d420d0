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

//! Engine configuration.
//!
//! The server embeds [`EngineConfig`] in its own settings. Fields missing
//! from JSON input keep their defaults.

use crate::constants::{CONSTANT_LOOKAHEAD_LINES, DEFAULT_CACHE_CAPACITY, MIN_CACHE_CAPACITY};
use crate::error::{SlimError, SlimResult};
use serde::{Deserialize, Serialize};

/// Tunables for the tracking engine and document cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum number of documents kept in the cache.
    pub cache_capacity: usize,
    /// Lines scanned after an unfinished `defineConstant(` for its value.
    pub constant_lookahead_lines: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            constant_lookahead_lines: CONSTANT_LOOKAHEAD_LINES,
        }
    }
}

impl EngineConfig {
    /// Set the cache capacity, builder style.
    ///
    /// The value is not checked here; call [`validate`](Self::validate).
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// [`SlimError::InvalidConfig`] when the cache capacity is below 1.
    pub fn validate(&self) -> SlimResult<()> {
        if self.cache_capacity < MIN_CACHE_CAPACITY {
            return Err(SlimError::invalid_config(format!(
                "cache capacity must be at least {}, got {}",
                MIN_CACHE_CAPACITY, self.cache_capacity
            )));
        }
        Ok(())
    }
}
