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

//! Property-based testing for slim-lsp providers.
//!
//! # Property Categories
//!
//! 1. **Crash Resistance**: no provider panics on any text or position
//! 2. **Position Safety**: returned ranges stay on existing lines
//! 3. **UTF-16 Safety**: multi-byte text never splits a character

use proptest::prelude::*;
use slim_core::{EmptyDocumentationStore, TrackingEngine};
use slim_lsp::analysis::AnalyzedDocument;
use slim_lsp::completion::get_completions;
use slim_lsp::definition::find_definition;
use slim_lsp::folding_range::get_folding_ranges;
use slim_lsp::hover::get_hover;
use slim_lsp::inlay_hints::get_inlay_hints;
use slim_lsp::references::find_references;
use slim_lsp::signature_help::get_signature_help;
use slim_lsp::symbols::get_document_symbols;
use slim_lsp::InlayHintConfig;
use std::sync::Arc;
use tower_lsp::lsp_types::*;

fn analyze(content: &str) -> AnalyzedDocument {
    let engine = TrackingEngine::new(Arc::new(EmptyDocumentationStore));
    AnalyzedDocument::from_text(&engine, content)
}

/// Script fragments that reach every provider's interesting paths.
fn script() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("initialize() {".to_string()),
            Just("    defineConstant(\"K\", 10);".to_string()),
            Just("    initializeMutationType(\"m1\", 0.5, \"f\", 0.0);".to_string()),
            Just("1 early() {".to_string()),
            Just("    sim.addSubpop(\"p1\", 100);".to_string()),
            Just("    for (ind in p1.individuals) {".to_string()),
            Just("    x = rnorm(1, c(2, 3), \"é\");".to_string()),
            Just("function (float)f(float y) {".to_string()),
            Just("    return f(y);".to_string()),
            Just("}".to_string()),
            Just("// p1 ind".to_string()),
            "[a-zé_ .(),\"{}=]{0,24}",
        ],
        0..20,
    )
    .prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn prop_providers_never_panic(
        content in script(),
        line in 0u32..24,
        character in 0u32..40
    ) {
        let analysis = analyze(&content);
        let docs = EmptyDocumentationStore;
        let uri = Url::parse("file:///prop.slim").unwrap();
        let position = Position { line, character };

        let _ = get_hover(&analysis, &docs, position);
        let _ = get_completions(&analysis, &docs, position);
        let _ = get_signature_help(&analysis, &docs, position);
        let _ = find_definition(&analysis, &uri, position);
        let _ = find_references(&analysis, &uri, position, true);
        let _ = get_document_symbols(&analysis);
        let range = Range { start: Position { line: 0, character: 0 }, end: position };
        let _ = get_inlay_hints(&analysis, &docs, range, &InlayHintConfig::default());
    }

    #[test]
    fn prop_arbitrary_text_never_panics(
        content in ".*",
        line in 0u32..4,
        character in 0u32..80
    ) {
        let analysis = analyze(&content);
        let docs = EmptyDocumentationStore;
        let uri = Url::parse("file:///prop.slim").unwrap();
        let position = Position { line, character };

        let _ = get_hover(&analysis, &docs, position);
        let _ = get_signature_help(&analysis, &docs, position);
        let _ = find_references(&analysis, &uri, position, false);
    }

    #[test]
    fn prop_reference_ranges_are_on_document_lines(
        content in script(),
        line in 0u32..20,
        character in 0u32..30
    ) {
        let analysis = analyze(&content);
        let uri = Url::parse("file:///prop.slim").unwrap();
        for location in find_references(&analysis, &uri, Position { line, character }, true) {
            let start = location.range.start;
            prop_assert!((start.line as usize) < analysis.lines.len());
            prop_assert!(start.character <= location.range.end.character);
        }
    }

    #[test]
    fn prop_symbol_ranges_are_ordered(content in script()) {
        let analysis = analyze(&content);
        for symbol in get_document_symbols(&analysis) {
            prop_assert!(symbol.range.start.line <= symbol.range.end.line);
            prop_assert!((symbol.range.end.line as usize) < analysis.lines.len());
        }
    }

    #[test]
    fn prop_folding_ranges_span_document_lines(content in script()) {
        let analysis = analyze(&content);
        for range in get_folding_ranges(analysis.lines.as_slice()) {
            prop_assert!(range.start_line < range.end_line);
            prop_assert!((range.end_line as usize) < analysis.lines.len());
        }
    }
}
