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

//! Find-references.
//!
//! References are whole-word matches outside comments and string literals.
//! When the cursor sits on a quoted id such as `"p1"`, quoted occurrences are
//! reported too, with a range covering the quotes.
//!
//! Declaration sites are left out unless the client asks for them:
//! - the left-hand side of an assignment
//! - the name of a function definition and its parameters
//! - a `for` loop variable
//! - the quoted id of a declaring call (`defineConstant("K", ...)`,
//!   `initializeMutationType("m1", ...)`, `addSubpop("p1", ...)`)

use crate::analysis::AnalyzedDocument;
use crate::utils::byte_range;
use once_cell::sync::Lazy;
use regex::Regex;
use slim_core::docs::parse_parameters;
use slim_core::patterns::detect_function;
use slim_core::position::word_at_in_line;
use slim_core::text::{comment_start, is_in_string, is_pure_comment_line};
use tower_lsp::lsp_types::*;

static QUOTED_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:defineConstant|initialize(?:MutationTypeNuc|MutationType|GenomicElementType|InteractionType)|addSubpop(?:Split)?|register\w*(?:Callback|Event))\s*\(\s*(?:\w+\s*=\s*)?$",
    )
    .expect("static pattern must compile")
});

static FUNCTION_NAME_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfunction\s*\([^)]*\)\s*$").expect("static pattern must compile")
});

static FOR_VARIABLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfor\s*\(\s*$").expect("static pattern must compile"));

/// All references to the identifier at `position`.
pub fn find_references(
    analysis: &AnalyzedDocument,
    uri: &Url,
    position: Position,
    include_declaration: bool,
) -> Vec<Location> {
    let Some(line) = analysis.line(position.line) else {
        return Vec::new();
    };
    let Some(word) = analysis
        .column(position)
        .and_then(|column| word_at_in_line(line, column))
    else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    if word.is_quoted {
        quoted_references(&analysis.lines, &word.word, include_declaration, &mut ranges);
    }
    unquoted_references(&analysis.lines, &word.word, include_declaration, &mut ranges);

    ranges.sort_by_key(|r| (r.start.line, r.start.character));
    ranges
        .into_iter()
        .map(|range| Location {
            uri: uri.clone(),
            range,
        })
        .collect()
}

fn quoted_references(lines: &[String], word: &str, include_declaration: bool, out: &mut Vec<Range>) {
    let pattern = match Regex::new(&format!(r#"["']{}["']"#, regex::escape(word))) {
        Ok(pattern) => pattern,
        Err(_) => return,
    };

    for (index, text) in lines.iter().enumerate() {
        if is_pure_comment_line(text) {
            continue;
        }
        let limit = comment_start(text).unwrap_or(text.len());
        for found in pattern.find_iter(&text[..limit]) {
            let quote = &text[found.start()..found.start() + 1];
            if !found.as_str().ends_with(quote) {
                continue;
            }
            if !include_declaration && QUOTED_DECLARATION.is_match(&text[..found.start()]) {
                continue;
            }
            out.push(byte_range(index, text, found.start(), found.end()));
        }
    }
}

fn unquoted_references(lines: &[String], word: &str, include_declaration: bool, out: &mut Vec<Range>) {
    let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(word))) {
        Ok(pattern) => pattern,
        Err(_) => return,
    };

    for (index, text) in lines.iter().enumerate() {
        if is_pure_comment_line(text) {
            continue;
        }
        let limit = comment_start(text).unwrap_or(text.len());
        for found in pattern.find_iter(&text[..limit]) {
            if is_in_string(text, found.start()) {
                continue;
            }
            if !include_declaration && is_declaration(text, word, found.start()) {
                continue;
            }
            out.push(byte_range(index, text, found.start(), found.end()));
        }
    }
}

/// True if the occurrence of `word` at byte `at` declares it.
fn is_declaration(text: &str, word: &str, at: usize) -> bool {
    let before = text[..at].trim_end();
    let after = text[at + word.len()..].trim_start();

    if after.starts_with('=') && !after.starts_with("==") {
        let compound = before
            .chars()
            .next_back()
            .is_some_and(|c| "+-*/<>!&|.".contains(c));
        if !compound {
            return true;
        }
    }

    if FUNCTION_NAME_PREFIX.is_match(before) {
        return true;
    }

    if FOR_VARIABLE_PREFIX.is_match(before) && after.starts_with("in") {
        return true;
    }

    if let Some(function) = detect_function(text) {
        let in_parameters = text
            .find(&format!("{}(", function.name))
            .is_some_and(|name_at| at > name_at + function.name.len());
        if in_parameters && parse_parameters(&function.parameters).iter().any(|p| p.name == word) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use slim_core::{EmptyDocumentationStore, TrackingEngine};
    use std::sync::Arc;

    const MODEL: &str = "\
initialize() {
    initializeMutationType(\"m1\", 0.5, \"f\", 0.0);
}
1 early() {
    sim.addSubpop(\"p1\", 100);
    // p1 is the founder population
    p1.setSubpopulationSize(200);
    x = p1;
    x = x + 1;
    s = \"x marks p1\";
    if (x == 2) print(x);
}";

    fn references(line: u32, character: u32, include_declaration: bool) -> Vec<(u32, u32, u32)> {
        let engine = TrackingEngine::new(Arc::new(EmptyDocumentationStore));
        let analysis = AnalyzedDocument::from_text(&engine, MODEL);
        let uri = Url::parse("file:///model.slim").unwrap();
        find_references(&analysis, &uri, Position { line, character }, include_declaration)
            .into_iter()
            .map(|l| (l.range.start.line, l.range.start.character, l.range.end.character))
            .collect()
    }

    #[test]
    fn test_unquoted_references_skip_comments_and_strings() {
        // `p1` in `x = p1;`
        let found = references(7, 9, false);
        assert_eq!(found, vec![(6, 4, 6), (7, 8, 10)]);
    }

    #[test]
    fn test_quoted_word_adds_quoted_matches() {
        // `p1` inside `addSubpop("p1", 100)`
        let without = references(4, 20, false);
        assert_eq!(without, vec![(6, 4, 6), (7, 8, 10)]);

        let with = references(4, 20, true);
        assert_eq!(with, vec![(4, 18, 22), (6, 4, 6), (7, 8, 10)]);
    }

    #[test]
    fn test_assignment_is_declaration() {
        // `x` in `print(x)`
        let without = references(10, 22, false);
        assert_eq!(without, vec![(8, 8, 9), (10, 8, 9), (10, 22, 23)]);

        let with = references(10, 22, true);
        assert_eq!(with.len(), 5);
    }

    #[test]
    fn test_function_and_parameters_are_declarations() {
        let text = "function (float)f(float y) {\n    return y;\n}\nz = f(1.0);";
        let engine = TrackingEngine::new(Arc::new(EmptyDocumentationStore));
        let analysis = AnalyzedDocument::from_text(&engine, text);
        let uri = Url::parse("file:///f.slim").unwrap();

        let y = find_references(&analysis, &uri, Position { line: 1, character: 11 }, false);
        assert_eq!(y.len(), 1);
        assert_eq!(y[0].range.start.line, 1);

        let f = find_references(&analysis, &uri, Position { line: 3, character: 4 }, false);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].range.start.line, 3);
    }
}
