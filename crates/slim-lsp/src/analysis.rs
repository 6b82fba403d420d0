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

//! Per-request view of a tracked document.
//!
//! An [`AnalyzedDocument`] pairs the cached lines of one document version
//! with the tracking state the engine built for it. Both come from the
//! [`DocumentCache`], so building one for a version that is already cached
//! costs two lookups and no tracking pass.

use crate::utils::{char_column, utf16_of_char};
use slim_core::{
    variables_in_scope, DocumentCache, LineScope, Severity, TextDocument, TrackingEngine, TrackingState,
    TypeName,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_lsp::lsp_types::{self, DiagnosticSeverity, NumberOrString, Position, Range};

/// One document version with its tracking state.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    pub version: i32,
    pub lines: Arc<Vec<String>>,
    pub state: Arc<TrackingState>,
}

impl AnalyzedDocument {
    /// Look up or compute the analysis of `text` at `version`.
    pub fn analyze(
        engine: &TrackingEngine,
        cache: &DocumentCache,
        uri: &str,
        version: i32,
        text: &str,
    ) -> Self {
        let doc = TextDocument::new(uri, version, text);
        let lines = cache.get_or_create_lines(&doc);
        let state = engine.track(&doc, cache);
        Self {
            version,
            lines,
            state,
        }
    }

    /// Analysis of raw text, bypassing any cache.
    pub fn from_text(engine: &TrackingEngine, text: &str) -> Self {
        let lines = slim_core::text::split_lines(text);
        let state = engine.track_lines(&lines);
        Self {
            version: 0,
            lines: Arc::new(lines),
            state: Arc::new(state),
        }
    }

    pub fn line(&self, index: u32) -> Option<&str> {
        self.lines.get(index as usize).map(String::as_str)
    }

    /// Character column of an LSP position on its line.
    pub fn column(&self, position: Position) -> Option<usize> {
        self.line(position.line)
            .map(|line| char_column(line, position.character))
    }

    /// Name lookup for `line`, loop variables included, without copying the
    /// global bindings.
    pub fn scope_at(&self, line: usize) -> LineScope<'_> {
        LineScope::new(&self.state, line)
    }

    /// Variables visible on `line`, loop variables included.
    pub fn variables_at(&self, line: usize) -> HashMap<String, TypeName> {
        variables_in_scope(&self.state, line)
    }
}

/// Convert structure diagnostics to LSP diagnostics.
pub fn to_lsp_diagnostics(
    lines: &[String],
    diagnostics: &[slim_core::Diagnostic],
) -> Vec<lsp_types::Diagnostic> {
    diagnostics
        .iter()
        .map(|diag| {
            let text = lines.get(diag.line).map(String::as_str).unwrap_or("");
            let line = diag.line as u32;
            lsp_types::Diagnostic {
                range: Range {
                    start: Position {
                        line,
                        character: utf16_of_char(text, diag.start),
                    },
                    end: Position {
                        line,
                        character: utf16_of_char(text, diag.end),
                    },
                },
                severity: Some(match diag.severity {
                    Severity::Error => DiagnosticSeverity::ERROR,
                    Severity::Warning => DiagnosticSeverity::WARNING,
                }),
                code: Some(NumberOrString::String(
                    match diag.severity {
                        Severity::Error => "structure",
                        Severity::Warning => "style",
                    }
                    .to_string(),
                )),
                source: Some(diag.source.clone()),
                message: diag.message.clone(),
                ..Default::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slim_core::{validate_structure, EmptyDocumentationStore, TypeLookup};

    fn engine() -> TrackingEngine {
        TrackingEngine::new(Arc::new(EmptyDocumentationStore))
    }

    #[test]
    fn test_analyze_reuses_cached_version() {
        let cache = DocumentCache::new(4);
        let text = "1 early() {\n    ind = p1.individuals[0];\n}";
        let first = AnalyzedDocument::analyze(&engine(), &cache, "file:///a.slim", 1, text);
        let second = AnalyzedDocument::analyze(&engine(), &cache, "file:///a.slim", 1, text);

        assert!(Arc::ptr_eq(&first.state, &second.state));
        assert!(Arc::ptr_eq(&first.lines, &second.lines));
        assert_eq!(first.lines.len(), 3);
    }

    #[test]
    fn test_variables_at_includes_loop_variable() {
        let analysis = AnalyzedDocument::from_text(
            &engine(),
            "for (ind in p1.individuals) {\n    x = ind;\n}",
        );
        let vars = analysis.variables_at(1);
        assert_eq!(vars.get("ind").map(ToString::to_string), Some("Individual".to_string()));
        assert!(!analysis.variables_at(0).contains_key("ind"));
    }

    #[test]
    fn test_scope_at_matches_variables_at() {
        let analysis = AnalyzedDocument::from_text(
            &engine(),
            "ind = p1;\nfor (ind in p1.individuals) {\n    x = ind;\n}\ny = ind;",
        );
        for line in 0..analysis.lines.len() {
            let vars = analysis.variables_at(line);
            let scope = analysis.scope_at(line);
            for name in ["ind", "x", "y", "missing"] {
                assert_eq!(scope.type_of(name), vars.get(name), "{} on line {}", name, line);
            }
        }
        assert_eq!(
            analysis.scope_at(2).type_of("ind").map(ToString::to_string),
            Some("Individual".to_string())
        );
    }

    #[test]
    fn test_diagnostic_conversion() {
        let lines: Vec<String> = vec!["x = 1".to_string()];
        let diagnostics = validate_structure(&lines);
        let converted = to_lsp_diagnostics(&lines, &diagnostics);

        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(converted[0].source.as_deref(), Some("slim-tools"));
        assert_eq!(converted[0].range.end.character, 5);
    }
}
