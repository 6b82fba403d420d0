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

//! Document symbols for the outline view.
//!
//! Callbacks and user functions are containers spanning their block. The
//! constants, subpopulations and nominal types declared inside a block are
//! listed as its children; declarations outside any block are top-level.

use crate::analysis::AnalyzedDocument;
use crate::constants::POSITION_ZERO;
use crate::utils::{byte_range, find_word, line_range};
use slim_core::patterns::{
    detect_callback_header, detect_constant, detect_function, detect_subpopulation,
    detect_type_initializer, CallbackHeader, TypeKind,
};
use slim_core::text::{comment_start, is_pure_comment_line, strip_strings_and_comments};
use tower_lsp::lsp_types::*;
use tracing::debug;

/// An open container and the last line of its block.
struct Container {
    symbol: DocumentSymbol,
    end_line: usize,
}

/// Get document symbols for outline view.
#[allow(deprecated)]
pub fn get_document_symbols(analysis: &AnalyzedDocument) -> Vec<DocumentSymbol> {
    let lines = analysis.lines.as_slice();
    let mut symbols = Vec::new();
    let mut current: Option<Container> = None;

    for (index, line) in lines.iter().enumerate() {
        if current.as_ref().is_some_and(|c| index > c.end_line) {
            flush(&mut current, &mut symbols);
        }
        if line.trim().is_empty() || is_pure_comment_line(line) {
            continue;
        }
        let code = &line[..comment_start(line).unwrap_or(line.len())];

        if let Some(symbol) = function_symbol(lines, index, line, code) {
            flush(&mut current, &mut symbols);
            current = Some(container(symbol));
            continue;
        }
        if let Some(header) = detect_callback_header(code) {
            flush(&mut current, &mut symbols);
            current = Some(container(callback_symbol(lines, index, line, code, &header)));
            continue;
        }

        for symbol in declaration_symbols(index, line, code) {
            match current.as_mut() {
                Some(container) => container
                    .symbol
                    .children
                    .get_or_insert_with(Vec::new)
                    .push(symbol),
                None => symbols.push(symbol),
            }
        }
    }
    flush(&mut current, &mut symbols);

    debug!("Extracted {} top-level symbols", symbols.len());
    symbols
}

fn container(symbol: DocumentSymbol) -> Container {
    let end_line = symbol.range.end.line as usize;
    Container { symbol, end_line }
}

fn flush(current: &mut Option<Container>, symbols: &mut Vec<DocumentSymbol>) {
    if let Some(container) = current.take() {
        symbols.push(container.symbol);
    }
}

#[allow(deprecated)]
fn function_symbol(lines: &[String], index: usize, line: &str, code: &str) -> Option<DocumentSymbol> {
    let function = detect_function(code)?;
    let name_at = code.find(&format!("{}(", function.name))?;

    Some(DocumentSymbol {
        name: format!(
            "({}) {}({})",
            function.return_type, function.name, function.parameters
        ),
        detail: Some("function".to_string()),
        kind: SymbolKind::FUNCTION,
        tags: None,
        deprecated: None,
        range: block_range(lines, index),
        selection_range: byte_range(index, line, name_at, name_at + function.name.len()),
        children: None,
    })
}

#[allow(deprecated)]
fn callback_symbol(
    lines: &[String],
    index: usize,
    line: &str,
    code: &str,
    header: &CallbackHeader,
) -> DocumentSymbol {
    let mut parts = Vec::new();
    if let Some(species) = &header.species {
        parts.push(format!("species {}", species));
    }
    if let Some(id) = &header.block_id {
        parts.push(id.clone());
    }
    if let Some(ticks) = &header.ticks {
        parts.push(ticks.clone());
    }
    parts.push(format!("{}()", header.name));

    let selection_range = match find_word(code, &header.name) {
        Some(at) => byte_range(index, line, at, (at + header.name.len() + 2).min(code.len())),
        None => line_range(index, line),
    };

    DocumentSymbol {
        name: parts.join(" "),
        detail: Some("callback".to_string()),
        kind: SymbolKind::METHOD,
        tags: None,
        deprecated: None,
        range: block_range(lines, index),
        selection_range,
        children: None,
    }
}

#[allow(deprecated)]
fn declaration_symbols(index: usize, line: &str, code: &str) -> Vec<DocumentSymbol> {
    let mut found = Vec::new();

    if let Some(constant) = detect_constant(code) {
        let detail = if constant.value.is_empty() {
            "constant".to_string()
        } else {
            format!("= {}", constant.value)
        };
        found.push((constant.name, detail, SymbolKind::CONSTANT));
    }
    if let Some(initializer) = detect_type_initializer(code) {
        let detail = match initializer.kind {
            TypeKind::Mutation => "mutation type",
            TypeKind::GenomicElement => "genomic element type",
            TypeKind::Interaction => "interaction type",
        };
        found.push((initializer.id, detail.to_string(), SymbolKind::STRUCT));
    }
    if let Some(id) = detect_subpopulation(code) {
        found.push((id, "subpopulation".to_string(), SymbolKind::OBJECT));
    }

    found
        .into_iter()
        .map(|(name, detail, kind)| {
            let selection_range = match find_word(code, &name) {
                Some(at) => byte_range(index, line, at, at + name.len()),
                None => line_range(index, line),
            };
            DocumentSymbol {
                name,
                detail: Some(detail),
                kind,
                tags: None,
                deprecated: None,
                range: line_range(index, line),
                selection_range,
                children: None,
            }
        })
        .collect()
}

/// Range from `start` to the line holding the brace that closes the first
/// block opened at or after it. A header with no block spans its own line.
fn block_range(lines: &[String], start: usize) -> Range {
    let mut depth = 0i64;
    let mut opened = false;

    for (index, line) in lines.iter().enumerate().skip(start) {
        if is_pure_comment_line(line) {
            continue;
        }
        for c in strip_strings_and_comments(line).chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth -= 1;
                    if opened && depth == 0 {
                        return Range {
                            start: Position {
                                line: start as u32,
                                character: POSITION_ZERO,
                            },
                            end: line_range(index, line).end,
                        };
                    }
                }
                _ => {}
            }
        }
    }

    line_range(start, &lines[start])
}
