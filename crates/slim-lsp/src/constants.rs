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

//! LSP constants.
//!
//! # Organization
//!
//! - **Performance Tuning**: Debounce delays
//! - **Memory Limits**: Document size constraints
//! - **LSP Protocol**: Protocol-specific values
//! - **Display Constants**: Completion ordering and trigger characters

// ============================================================================
// Performance Tuning
// ============================================================================

/// Debounce delay for diagnostics after an edit (in milliseconds).
///
/// **Rationale**: 200ms batches a burst of keystrokes into one validation
/// pass while staying under the delay a user notices. Open and save events
/// are not debounced.
pub const DEBOUNCE_MS: u64 = 200;

// ============================================================================
// Memory Limits
// ============================================================================

/// Bytes per megabyte (1024 * 1024).
pub const BYTES_PER_MEGABYTE: usize = 1024 * 1024;

/// Default maximum document size in bytes (64 MB).
///
/// **Rationale**: Simulation scripts are small. Anything this large is a
/// data file opened by mistake, and tracking it line by line on every edit
/// would stall the server.
///
/// **Trade-offs**:
/// - Larger limits accept generated scripts but risk long passes
/// - Smaller limits protect latency but may reject real models
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 64 * BYTES_PER_MEGABYTE;

// ============================================================================
// LSP Protocol Constants
// ============================================================================

/// Zero position for line/character start.
pub const POSITION_ZERO: u32 = 0;

/// Language identifiers accepted for open documents.
pub const LANGUAGE_IDS: [&str; 2] = ["slim", "eidos"];

// ============================================================================
// Display Constants
// ============================================================================

/// Sort prefix for completions of functions defined in the document.
///
/// **Rationale**: Editors sort completion items by `sortText`. Prefixing user
/// functions with `0_` lists them ahead of the hundreds of built-in functions,
/// whose sort text is their plain name.
pub const USER_FUNCTION_SORT_PREFIX: &str = "0_";

/// Characters that trigger completion.
pub const COMPLETION_TRIGGERS: [&str; 1] = ["."];

/// Characters that trigger signature help.
pub const SIGNATURE_TRIGGERS: [&str; 2] = ["(", ","];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasonable_limits() {
        assert!(DEBOUNCE_MS >= 50, "Debounce too short");
        assert!(DEBOUNCE_MS <= 1000, "Debounce too long");
        assert!(DEFAULT_MAX_DOCUMENT_SIZE >= BYTES_PER_MEGABYTE);
    }

    #[test]
    fn test_user_functions_sort_first() {
        let user = format!("{}zzz", USER_FUNCTION_SORT_PREFIX);
        assert!(user.as_str() < "abs");
        assert!(user.as_str() < "_private");
    }
}
