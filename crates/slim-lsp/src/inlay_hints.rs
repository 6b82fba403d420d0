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

//! Inlay hints: inferred variable types and parameter names at call sites.

use crate::analysis::AnalyzedDocument;
use crate::config::InlayHintConfig;
use crate::utils::{find_word_from, utf16_of_byte};
use once_cell::sync::Lazy;
use regex::Regex;
use slim_core::docs::{parse_parameters, Parameter};
use slim_core::patterns::{detect_assignments, detect_for_in, detect_function};
use slim_core::text::{
    comment_start, find_matching_close, is_in_string, is_pure_comment_line, split_top_level_args,
};
use slim_core::{DocumentationStore, TypeResolver};
use tower_lsp::lsp_types::*;

static CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\(").expect("static pattern must compile"));

static NAMED_ARGUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+\s*=[^=]").expect("static pattern must compile"));

const CONTROL_KEYWORDS: [&str; 8] = ["if", "for", "while", "do", "else", "return", "function", "in"];

/// Hints for the lines covered by `range`.
pub fn get_inlay_hints(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    range: Range,
    config: &InlayHintConfig,
) -> Vec<InlayHint> {
    let mut hints = Vec::new();
    if !config.types && !config.parameter_names {
        return hints;
    }

    let resolver = TypeResolver::new(docs);
    let first = range.start.line as usize;
    let last = (range.end.line as usize).min(analysis.lines.len().saturating_sub(1));

    for index in first..=last {
        let Some(line) = analysis.lines.get(index) else {
            break;
        };
        if line.trim().is_empty() || is_pure_comment_line(line) {
            continue;
        }
        let code = &line[..comment_start(line).unwrap_or(line.len())];

        if config.types {
            type_hints(analysis, &resolver, index, line, code, &mut hints);
        }
        if config.parameter_names {
            parameter_hints(analysis, docs, index, line, code, &mut hints);
        }
    }

    hints
}

fn type_hints(
    analysis: &AnalyzedDocument,
    resolver: &TypeResolver<'_>,
    index: usize,
    line: &str,
    code: &str,
    hints: &mut Vec<InlayHint>,
) {
    let vars = analysis.scope_at(index);

    let mut search = 0;
    for assignment in detect_assignments(code) {
        let Some(at) = find_word_from(code, &assignment.name, search) else {
            continue;
        };
        search = at + assignment.name.len();
        if let Some(resolved) = resolver.resolve_type(&assignment.expression, &vars) {
            hints.push(type_hint(index, line, search, resolved.to_string()));
        }
    }

    if let Some(for_in) = detect_for_in(code) {
        if let Some(element) = resolver.loop_variable_type(&for_in.collection, &vars) {
            if let Some(at) = find_word_from(code, &for_in.variable, 0) {
                let end = at + for_in.variable.len();
                hints.push(type_hint(index, line, end, element.to_string()));
            }
        }
    }
}

fn type_hint(index: usize, line: &str, byte: usize, type_name: String) -> InlayHint {
    InlayHint {
        position: Position {
            line: index as u32,
            character: utf16_of_byte(line, byte),
        },
        label: InlayHintLabel::String(format!(": {}", type_name)),
        kind: Some(InlayHintKind::TYPE),
        text_edits: None,
        tooltip: None,
        padding_left: Some(false),
        padding_right: Some(true),
        data: None,
    }
}

fn parameter_hints(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    index: usize,
    line: &str,
    code: &str,
    hints: &mut Vec<InlayHint>,
) {
    let header = detect_function(code);
    let defined_here = header.as_ref().map(|f| f.name.as_str());

    for caps in CALL.captures_iter(code) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();
        if CONTROL_KEYWORDS.contains(&name) || is_in_string(code, whole.start()) {
            continue;
        }
        if code[..whole.start()].trim_end().ends_with('.') || defined_here == Some(name) {
            continue;
        }

        let parameters = call_parameters(analysis, docs, name);
        if parameters.is_empty() {
            continue;
        }

        let open = whole.end() - 1;
        let Some(close) = find_matching_close(code, open) else {
            continue;
        };
        let arguments = split_top_level_args(&code[open + 1..close]);

        let mut search = open + 1;
        for (argument, parameter) in arguments.iter().zip(parameters.iter()) {
            if parameter.variadic {
                break;
            }
            if argument.is_empty() {
                continue;
            }
            let Some(found) = code[search..close].find(argument.as_str()) else {
                break;
            };
            let at = search + found;
            search = at + argument.len();

            if parameter.name.is_empty()
                || argument == &parameter.name
                || NAMED_ARGUMENT.is_match(argument)
            {
                continue;
            }

            hints.push(InlayHint {
                position: Position {
                    line: index as u32,
                    character: utf16_of_byte(line, at),
                },
                label: InlayHintLabel::String(format!("{}:", parameter.name)),
                kind: Some(InlayHintKind::PARAMETER),
                text_edits: None,
                tooltip: None,
                padding_left: Some(false),
                padding_right: Some(true),
                data: None,
            });
        }
    }
}

fn call_parameters(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    name: &str,
) -> Vec<Parameter> {
    if let Some(function) = docs.function(name) {
        return parse_parameters(&function.signature);
    }
    analysis
        .state
        .user_functions
        .get(name)
        .map(|f| parse_parameters(&f.parameters))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slim_core::docs::DocSource;
    use slim_core::{JsonDocumentationStore, TrackingEngine};
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

    fn hints(text: &str, config: InlayHintConfig) -> Vec<(u32, u32, String, InlayHintKind)> {
        let mut store = JsonDocumentationStore::new();
        store.add_functions_json(FUNCTIONS, DocSource::Eidos).unwrap();
        let docs: Arc<dyn DocumentationStore> = Arc::new(store);
        let engine = TrackingEngine::new(Arc::clone(&docs));
        let analysis = AnalyzedDocument::from_text(&engine, text);
        let range = Range {
            start: Position { line: 0, character: 0 },
            end: Position { line: analysis.lines.len() as u32, character: 0 },
        };
        get_inlay_hints(&analysis, docs.as_ref(), range, &config)
            .into_iter()
            .map(|h| {
                let label = match h.label {
                    InlayHintLabel::String(s) => s,
                    InlayHintLabel::LabelParts(_) => String::new(),
                };
                (h.position.line, h.position.character, label, h.kind.unwrap())
            })
            .collect()
    }

    fn parameters_only(text: &str) -> Vec<(u32, u32, String)> {
        hints(text, InlayHintConfig::default())
            .into_iter()
            .filter(|h| h.3 == InlayHintKind::PARAMETER)
            .map(|h| (h.0, h.1, h.2))
            .collect()
    }

    #[test]
    fn test_parameter_names_for_builtin_call() {
        let found = parameters_only("x = rnorm(10, 0.5, sd);");
        assert_eq!(
            found,
            vec![(0, 10, "n:".to_string()), (0, 14, "mean:".to_string())]
        );
    }

    #[test]
    fn test_named_and_variadic_arguments_get_no_hint() {
        assert!(parameters_only("x = rnorm(n = 10);").is_empty());
        assert!(parameters_only("x = c(1, 2, 3);").is_empty());
    }

    #[test]
    fn test_methods_and_strings_are_skipped() {
        assert!(parameters_only("x = p1.rnorm(10);").is_empty());
        assert!(parameters_only("s = \"rnorm(10)\";").is_empty());
        assert!(parameters_only("// rnorm(10)").is_empty());
    }

    #[test]
    fn test_user_function_parameters() {
        let text = "function (float)scale(float x, float factor) {\n    return x * factor;\n}\ny = scale(1.0, 2.0);";
        let found = parameters_only(text);
        assert_eq!(
            found,
            vec![(3, 10, "x:".to_string()), (3, 15, "factor:".to_string())]
        );
    }

    #[test]
    fn test_type_hints_for_assignment_and_loop() {
        let text = "1 early() {\n    inds = p1.individuals;\n    for (ind in inds) {\n    }\n}";
        let found: Vec<_> = hints(text, InlayHintConfig::default())
            .into_iter()
            .filter(|h| h.3 == InlayHintKind::TYPE)
            .map(|h| (h.0, h.1, h.2))
            .collect();
        assert_eq!(
            found,
            vec![
                (1, 8, ": Individual[]".to_string()),
                (2, 12, ": Individual".to_string()),
            ]
        );
    }

    #[test]
    fn test_config_disables_hint_kinds() {
        let text = "inds = p1.individuals; x = rnorm(10);";
        let none = InlayHintConfig {
            types: false,
            parameter_names: false,
        };
        assert!(hints(text, none).is_empty());

        let types_only = InlayHintConfig {
            types: true,
            parameter_names: false,
        };
        assert!(hints(text, types_only)
            .iter()
            .all(|h| h.3 == InlayHintKind::TYPE));
    }
}
