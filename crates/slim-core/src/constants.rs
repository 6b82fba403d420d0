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

//! Engine and cache constants.
//!
//! # Organization
//!
//! - **Cache**: Document cache sizing
//! - **Tracking**: Limits applied during the line pass
//! - **Diagnostics**: Identity of diagnostics produced by the core

// ============================================================================
// Cache
// ============================================================================

/// Default number of documents held by the [`DocumentCache`](crate::DocumentCache).
///
/// **Rationale**: An editor session rarely has more than a couple of dozen
/// simulation scripts open at once. Each entry holds the split lines, one
/// tracking snapshot and one diagnostics list, so 25 entries keep memory small
/// while every open tab stays warm.
pub const DEFAULT_CACHE_CAPACITY: usize = 25;

/// Smallest capacity accepted by the cache.
///
/// A capacity of zero would evict the entry that is being inserted.
pub const MIN_CACHE_CAPACITY: usize = 1;

// ============================================================================
// Tracking
// ============================================================================

/// Number of lines after a `defineConstant(` call that are scanned for the
/// end of the bound value when it does not close on the same line.
pub const CONSTANT_LOOKAHEAD_LINES: usize = 3;

/// Identifier bound to the simulation handle in every document.
pub const SIM_HANDLE: &str = "sim";

/// Identifier bound to the community handle in every document.
pub const COMMUNITY_HANDLE: &str = "community";

// ============================================================================
// Diagnostics
// ============================================================================

/// Source string attached to every diagnostic produced by the core.
pub const DIAGNOSTIC_SOURCE: &str = "slim-tools";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasonable_limits() {
        assert!(DEFAULT_CACHE_CAPACITY >= MIN_CACHE_CAPACITY);
        assert!(DEFAULT_CACHE_CAPACITY <= 1000, "Cache too large for editor usage");
        assert!(CONSTANT_LOOKAHEAD_LINES >= 1);
    }

    #[test]
    fn test_handles_are_identifiers() {
        for handle in [SIM_HANDLE, COMMUNITY_HANDLE] {
            assert!(handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }
}
