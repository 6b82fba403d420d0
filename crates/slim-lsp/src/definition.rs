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

//! Go-to-definition.
//!
//! Candidates are tried in a fixed order and the first hit wins:
//!
//! 1. Callback pseudo-parameter: the header of the enclosing callback
//! 2. Constant: the name inside `defineConstant("X", ...)`
//! 3. Mutation, genomic-element or interaction type id
//! 4. Subpopulation id
//! 5. Species name
//! 6. Function defined in the document
//! 7. Parameter of the enclosing function
//! 8. First assignment at or above the cursor
//! 9. `for` loop variable
//!
//! Declarations found through the tracking state are located by searching
//! upward from the cursor first and downward second.

use crate::analysis::AnalyzedDocument;
use crate::utils::{byte_range, find_word, line_range};
use once_cell::sync::Lazy;
use regex::Regex;
use slim_core::callbacks::pseudo_parameters;
use slim_core::docs::parse_parameters;
use slim_core::patterns::{
    detect_assignments, detect_callback_header, detect_constant, detect_for_in, detect_function,
    detect_species, detect_subpopulation, detect_type_initializer,
};
use slim_core::position::word_at_in_line;
use slim_core::text::{comment_start, is_pure_comment_line};
use slim_core::{loop_scope_for, TrackingState};
use tower_lsp::lsp_types::*;

static NUMERIC_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[pmgi](\d+)$").expect("static pattern must compile"));

/// Find the definition of the identifier at `position`.
pub fn find_definition(analysis: &AnalyzedDocument, uri: &Url, position: Position) -> Option<Location> {
    let line = analysis.line(position.line)?;
    let column = analysis.column(position)?;
    let word = word_at_in_line(line, column)?.word;

    let finder = DefinitionFinder {
        lines: &analysis.lines,
        state: &analysis.state,
        cursor: position.line as usize,
    };
    let range = finder.find(&word)?;
    Some(Location {
        uri: uri.clone(),
        range,
    })
}

struct DefinitionFinder<'a> {
    lines: &'a [String],
    state: &'a TrackingState,
    cursor: usize,
}

impl DefinitionFinder<'_> {
    fn find(&self, word: &str) -> Option<Range> {
        let state = self.state;

        if let Some(range) = self.pseudo_parameter(word) {
            return Some(range);
        }
        if state.defined_constants.contains(word) {
            if let Some(range) = self.declaration(word, |code| {
                detect_constant(code).is_some_and(|m| m.name == word)
            }) {
                return Some(range);
            }
        }
        if state.defined_mutation_types.contains(word)
            || state.defined_genomic_element_types.contains(word)
            || state.defined_interaction_types.contains(word)
        {
            if let Some(range) = self.declaration(word, |code| {
                detect_type_initializer(code).is_some_and(|m| m.id == word)
            }) {
                return Some(range);
            }
        }
        if state.defined_subpopulations.contains(word) {
            if let Some(range) =
                self.declaration(word, |code| detect_subpopulation(code).as_deref() == Some(word))
            {
                return Some(range);
            }
        }
        if state.defined_species.contains(word) {
            if let Some(range) =
                self.declaration(word, |code| detect_species(code).as_deref() == Some(word))
            {
                return Some(range);
            }
        }
        if let Some(function) = state.user_functions.get(word) {
            let text = self.lines.get(function.line)?;
            let code = code_of(text);
            if let Some(at) = code.find(')').and_then(|close| {
                find_word(&code[close..], word).map(|offset| close + offset)
            }) {
                return Some(byte_range(function.line, text, at, at + word.len()));
            }
        }
        if let Some(range) = self.parameter(word) {
            return Some(range);
        }
        if let Some(range) = self.assignment(word) {
            return Some(range);
        }
        self.loop_variable(word)
    }

    fn pseudo_parameter(&self, word: &str) -> Option<Range> {
        let callback = self.state.callback_at(self.cursor)?;
        if !pseudo_parameters(callback).iter().any(|(name, _)| *name == word) {
            return None;
        }
        (0..=self.cursor.min(self.lines.len().saturating_sub(1)))
            .rev()
            .find(|&index| {
                let text = &self.lines[index];
                !is_pure_comment_line(text)
                    && detect_callback_header(code_of(text)).is_some_and(|h| h.name == callback)
            })
            .map(|index| line_range(index, &self.lines[index]))
    }

    /// Locate the declaration of an id on the nearest line matching `declares`.
    fn declaration(&self, word: &str, declares: impl Fn(&str) -> bool) -> Option<Range> {
        let last = self.lines.len().checked_sub(1)?;
        let cursor = self.cursor.min(last);
        let upward = (0..=cursor).rev();
        let downward = cursor + 1..self.lines.len();

        upward.chain(downward).find_map(|index| {
            let text = &self.lines[index];
            let code = code_of(text);
            if !declares(code) {
                return None;
            }
            let (start, end) = id_span(code, word)?;
            Some(byte_range(index, text, start, end))
        })
    }

    fn parameter(&self, word: &str) -> Option<Range> {
        let last = self.lines.len().checked_sub(1)?;
        (0..=self.cursor.min(last)).rev().find_map(|index| {
            let text = &self.lines[index];
            let code = code_of(text);
            let function = detect_function(code)?;
            if !parse_parameters(&function.parameters)
                .iter()
                .any(|p| p.name == word)
            {
                return None;
            }
            let name_at = find_word(code, &function.name)?;
            let open = name_at + code[name_at..].find('(')?;
            let at = open + find_word(&code[open..], word)?;
            Some(byte_range(index, text, at, at + word.len()))
        })
    }

    fn assignment(&self, word: &str) -> Option<Range> {
        let last = self.lines.len().checked_sub(1)?;
        (0..=self.cursor.min(last)).find_map(|index| {
            let text = &self.lines[index];
            let code = code_of(text);
            if !detect_assignments(code).iter().any(|a| a.name == word) {
                return None;
            }
            let at = find_word(code, word)?;
            Some(byte_range(index, text, at, at + word.len()))
        })
    }

    /// The loop binding `word` around the cursor, or the first loop binding it.
    fn loop_variable(&self, word: &str) -> Option<Range> {
        let scoped = loop_scope_for(self.state, word, self.cursor).map(|scope| scope.start_line);
        let candidates = scoped.into_iter().chain(0..self.lines.len());

        for index in candidates {
            let Some(text) = self.lines.get(index) else {
                continue;
            };
            let code = code_of(text);
            if detect_for_in(code).is_some_and(|f| f.variable == word) {
                let open = code.find("for")?;
                let at = open + find_word(&code[open..], word)?;
                return Some(byte_range(index, text, at, at + word.len()));
            }
        }
        None
    }
}

/// The line without a trailing `//` comment.
fn code_of(text: &str) -> &str {
    match comment_start(text) {
        Some(at) => &text[..at],
        None => text,
    }
}

/// Byte span of `id` as declared on `code`: the quoted name, or the number
/// of a numeric id such as `m1` declared as `initializeMutationType(1, ...)`.
fn id_span(code: &str, id: &str) -> Option<(usize, usize)> {
    for quote in ['"', '\''] {
        let quoted = format!("{}{}{}", quote, id, quote);
        if let Some(at) = code.find(&quoted) {
            return Some((at + 1, at + 1 + id.len()));
        }
    }
    if let Some(number) = NUMERIC_ID.captures(id).and_then(|c| c.get(1)) {
        let open = code.find('(')?;
        let at = open + find_word(&code[open..], number.as_str())?;
        return Some((at, at + number.as_str().len()));
    }
    // `species name ...`
    find_word(code, id).map(|at| (at, at + id.len()))
}
