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

//! Property-based tests for the tracking engine and document cache.
//!
//! # Property Categories
//!
//! 1. **Crash Resistance**: no panics on any input
//! 2. **Determinism**: equal input gives equal tracking state
//! 3. **Scope Invariants**: every scope is closed and well ordered
//! 4. **Cache Invariants**: the cache never exceeds its capacity

use proptest::prelude::*;
use slim_core::text::split_lines;
use slim_core::{
    completion_context, validate_structure, word_at, DocumentCache, EmptyDocumentationStore,
    TextDocument, TrackingEngine,
};
use std::sync::Arc;

fn engine() -> TrackingEngine {
    TrackingEngine::new(Arc::new(EmptyDocumentationStore))
}

/// Lines that exercise every detector, the callback tracker and loop scopes.
fn script_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("initialize() {".to_string()),
        Just("1 early() {".to_string()),
        Just("s1 10:20 late() {".to_string()),
        Just("2 mutationEffect(m1)".to_string()),
        Just("}".to_string()),
        Just("{".to_string()),
        Just("    initializeMutationType(\"m1\", 0.5, \"f\", 0.0);".to_string()),
        Just("    sim.addSubpop(\"p1\", 100);".to_string()),
        Just("    defineConstant(\"K\",".to_string()),
        Just("    500);".to_string()),
        Just("    for (ind in p1.individuals) {".to_string()),
        Just("    for (i in 1:3) x = i;".to_string()),
        Just("    muts = sim.mutationsOfType(m1);".to_string()),
        Just("    mut = muts[0];".to_string()),
        Just("    g = ind.genomes[0];".to_string()),
        Just("function (float)f(float x) {".to_string()),
        Just("/* open comment".to_string()),
        Just("close comment */".to_string()),
        Just("    s = \"unterminated {".to_string()),
        "[a-z]{1,6} = [a-z0-9.\\[\\]()]{0,20};",
    ]
}

proptest! {
    #[test]
    fn prop_tracking_never_panics(content in ".*") {
        let lines = split_lines(&content);
        let _ = engine().track_lines(&lines);
        let _ = validate_structure(&lines);
    }

    #[test]
    fn prop_tracking_is_deterministic(lines in prop::collection::vec(script_line(), 0..40)) {
        let engine = engine();
        let first = engine.track_lines(&lines);
        let second = engine.track_lines(&lines);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_one_callback_entry_per_line(lines in prop::collection::vec(script_line(), 0..40)) {
        let state = engine().track_lines(&lines);
        prop_assert_eq!(state.line_count(), lines.len());
    }

    #[test]
    fn prop_scopes_are_closed_and_ordered(lines in prop::collection::vec(script_line(), 1..40)) {
        let state = engine().track_lines(&lines);
        let mut previous_start = 0;
        for scope in &state.loop_scopes {
            let end = scope.end_line;
            prop_assert!(end.is_some());
            prop_assert!(end.unwrap_or(0) >= scope.start_line);
            prop_assert!(end.unwrap_or(0) < lines.len());
            prop_assert!(scope.start_line >= previous_start);
            previous_start = scope.start_line;
        }
    }

    #[test]
    fn prop_position_helpers_never_panic(
        content in ".*",
        line in 0usize..5,
        character in 0usize..80
    ) {
        let _ = word_at(&content, line, character);
        let _ = completion_context(&content, line, character);
    }

    #[test]
    fn prop_lines_round_trip(content in "[^\r]*") {
        prop_assert_eq!(split_lines(&content).join("\n"), content);
    }

    #[test]
    fn prop_cache_never_exceeds_capacity(
        capacity in 1usize..8,
        accesses in prop::collection::vec((0usize..16, 1i32..4), 0..64)
    ) {
        let cache = DocumentCache::new(capacity);
        for (id, version) in accesses {
            let uri = format!("file:///doc{}.slim", id);
            cache.get_or_create_lines(&TextDocument::new(&uri, version, "x = 1;"));
            prop_assert!(cache.len() <= capacity);
        }
        let stats = cache.stats();
        prop_assert!(stats.size <= stats.max_size);
    }
}
