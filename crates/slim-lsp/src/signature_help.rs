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

//! Signature help for function calls.

use crate::analysis::AnalyzedDocument;
use crate::utils::byte_offset;
use once_cell::sync::Lazy;
use regex::Regex;
use slim_core::docs::{clean_signature, parse_parameters};
use slim_core::text::count_top_level_commas;
use slim_core::DocumentationStore;
use tower_lsp::lsp_types::*;

static TRAILING_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*$").expect("static pattern must compile")
});

/// Signature of the innermost call around the cursor.
///
/// The callee is looked up among built-in functions first and functions
/// defined in the document second.
pub fn get_signature_help(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    position: Position,
) -> Option<SignatureHelp> {
    let line = analysis.line(position.line)?;
    let before = &line[..byte_offset(line, position.character)];

    let open = innermost_open_paren(before)?;
    let name = TRAILING_IDENTIFIER
        .captures(&before[..open])?
        .get(1)?
        .as_str();

    let (label, description) = if let Some(function) = docs.function(name) {
        (function.signature.clone(), function.description.clone())
    } else {
        let function = analysis.state.user_functions.get(name)?;
        let label = format!("{}({})", function.name, function.parameters);
        (label, function.doc_comment.clone().unwrap_or_default())
    };

    let parameters = parse_parameters(&label);
    let variadic = parameters.iter().any(|p| p.variadic);
    let commas = count_top_level_commas(&before[open + 1..]);
    let active = if variadic || commas >= parameters.len() {
        commas
    } else {
        commas.min(parameters.len().saturating_sub(1))
    };

    let label = clean_signature(&label);
    Some(SignatureHelp {
        signatures: vec![SignatureInformation {
            documentation: Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("```slim\n{}\n```\n\n{}", label, description),
            })),
            parameters: Some(
                parameters
                    .into_iter()
                    .map(|p| ParameterInformation {
                        label: ParameterLabel::Simple(clean_signature(&p.label)),
                        documentation: None,
                    })
                    .collect(),
            ),
            active_parameter: None,
            label,
        }],
        active_signature: Some(0),
        active_parameter: Some(active as u32),
    })
}

/// Byte offset of the last `(` in `text` that is not closed before its end.
fn innermost_open_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in text.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' if depth == 0 => return Some(index),
            '(' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use slim_core::docs::DocSource;
    use slim_core::{EmptyDocumentationStore, JsonDocumentationStore, TrackingEngine};
    use std::sync::Arc;

    const FUNCTIONS: &str = r#"{
        "Distributions": {
            "rnorm": {
                "signatures": ["(float)rnorm(integer$ n, [numeric mean = 0], [numeric sd = 1])"],
                "description": "Normal draws."
            },
            "c": {"signatures": ["(*)c(...)"], "description": "Concatenates."}
        }
    }"#;

    fn help(docs: Arc<dyn DocumentationStore>, text: &str, character: u32) -> Option<SignatureHelp> {
        let engine = TrackingEngine::new(Arc::clone(&docs));
        let analysis = AnalyzedDocument::from_text(&engine, text);
        let line = (analysis.lines.len() - 1) as u32;
        get_signature_help(&analysis, docs.as_ref(), Position { line, character })
    }

    fn store() -> Arc<dyn DocumentationStore> {
        let mut store = JsonDocumentationStore::new();
        store.add_functions_json(FUNCTIONS, DocSource::Eidos).unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_active_parameter_counts_top_level_commas() {
        let text = "x = rnorm(10, abs(1, 2), ";
        let help = help(store(), text, text.len() as u32).unwrap();
        assert_eq!(help.active_parameter, Some(2));
        let params = help.signatures[0].parameters.as_ref().unwrap();
        assert_eq!(params.len(), 3);
        assert!(help.signatures[0].label.starts_with("rnorm("));
    }

    #[test]
    fn test_nested_call_uses_inner_function() {
        let text = "x = c(rnorm(";
        let help = help(store(), text, text.len() as u32).unwrap();
        assert!(help.signatures[0].label.starts_with("rnorm("));
        assert_eq!(help.active_parameter, Some(0));
    }

    #[test]
    fn test_variadic_is_not_clamped() {
        let text = "x = c(1, 2, 3, ";
        let help = help(store(), text, text.len() as u32).unwrap();
        assert_eq!(help.active_parameter, Some(3));
    }

    #[test]
    fn test_user_function_signature() {
        let text = "function (float)scale(float x, float factor) {\n}\ny = scale(1.0, ";
        let help = help(Arc::new(EmptyDocumentationStore), text, 15).unwrap();
        assert_eq!(help.signatures[0].label, "scale(float x, float factor)");
        assert_eq!(help.active_parameter, Some(1));
    }

    #[test]
    fn test_closed_call_has_no_help() {
        let text = "x = rnorm(10);";
        assert!(help(store(), text, text.len() as u32).is_none());
    }
}
