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

//! Folding ranges for brace blocks and comment runs.
//!
//! A brace block folds when its closing brace sits on a later line than its
//! opening brace. Callback, `initialize()` and function blocks are tagged as
//! regions. Two or more consecutive comment lines fold as a comment block.

use slim_core::patterns::{detect_callback_header, detect_function};
use slim_core::text::{is_pure_comment_line, scan_line, strip_strings_and_comments};
use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind};

/// An unmatched `{` and the kind of block it opened.
struct OpenBrace {
    line: usize,
    kind: Option<FoldingRangeKind>,
}

/// Folding ranges of a document, brace blocks first, in closing order.
pub fn get_folding_ranges<S: AsRef<str>>(lines: &[S]) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();
    let mut stack: Vec<OpenBrace> = Vec::new();
    let mut in_block_comment = false;

    for (index, line) in lines.iter().enumerate() {
        let scanned = scan_line(line.as_ref(), &mut in_block_comment);
        if scanned.opens == 0 && scanned.closes == 0 {
            continue;
        }

        let code = strip_strings_and_comments(&scanned.code);
        let kind = block_kind(&code);
        for c in code.chars() {
            match c {
                '{' => stack.push(OpenBrace {
                    line: index,
                    kind: kind.clone(),
                }),
                '}' => {
                    let Some(open) = stack.pop() else {
                        continue;
                    };
                    if index > open.line {
                        ranges.push(FoldingRange {
                            start_line: open.line as u32,
                            end_line: index as u32,
                            kind: open.kind,
                            ..Default::default()
                        });
                    }
                }
                _ => {}
            }
        }
    }

    ranges.extend(comment_blocks(lines));
    ranges
}

fn block_kind(code: &str) -> Option<FoldingRangeKind> {
    if detect_callback_header(code).is_some() || detect_function(code).is_some() {
        Some(FoldingRangeKind::Region)
    } else {
        None
    }
}

fn comment_blocks<S: AsRef<str>>(lines: &[S]) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();
    let mut start: Option<usize> = None;

    for index in 0..=lines.len() {
        let is_comment = lines
            .get(index)
            .is_some_and(|line| is_pure_comment_line(line.as_ref()));
        match (is_comment, start) {
            (true, None) => start = Some(index),
            (false, Some(first)) => {
                if index - first > 1 {
                    ranges.push(FoldingRange {
                        start_line: first as u32,
                        end_line: (index - 1) as u32,
                        kind: Some(FoldingRangeKind::Comment),
                        ..Default::default()
                    });
                }
                start = None;
            }
            _ => {}
        }
    }

    ranges
}
