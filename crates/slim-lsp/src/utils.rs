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

//! Position conversion between LSP and line text.
//!
//! LSP positions count UTF-16 code units. The core engine counts characters
//! and regex matches report byte offsets. Every conversion here clamps to the
//! line instead of panicking on out-of-range input.

use tower_lsp::lsp_types::{Position, Range};

/// Safely get a string slice up to a byte offset.
///
/// An offset inside a multi-byte character rounds down to the previous
/// character boundary.
///
/// ```
/// use slim_lsp::utils::safe_slice_to;
///
/// let s = "x = \"é\";";
/// assert_eq!(safe_slice_to(s, 6), "x = \"");
/// ```
pub fn safe_slice_to(s: &str, byte: usize) -> &str {
    &s[..floor_boundary(s, byte)]
}

fn floor_boundary(s: &str, byte: usize) -> usize {
    if byte >= s.len() {
        return s.len();
    }
    let mut pos = byte;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Byte offset of a UTF-16 column.
pub fn byte_offset(line: &str, utf16: u32) -> usize {
    let mut units = 0u32;
    for (index, c) in line.char_indices() {
        if units >= utf16 {
            return index;
        }
        units += c.len_utf16() as u32;
    }
    line.len()
}

/// Character column of a UTF-16 column.
pub fn char_column(line: &str, utf16: u32) -> usize {
    let mut units = 0u32;
    for (count, c) in line.chars().enumerate() {
        if units >= utf16 {
            return count;
        }
        units += c.len_utf16() as u32;
    }
    line.chars().count()
}

/// UTF-16 column of a character column.
pub fn utf16_of_char(line: &str, column: usize) -> u32 {
    line.chars().take(column).map(|c| c.len_utf16() as u32).sum()
}

/// UTF-16 column of a byte offset.
pub fn utf16_of_byte(line: &str, byte: usize) -> u32 {
    safe_slice_to(line, byte).encode_utf16().count() as u32
}

/// Range on one line between two byte offsets.
pub fn byte_range(line_index: usize, line: &str, start: usize, end: usize) -> Range {
    Range {
        start: Position {
            line: line_index as u32,
            character: utf16_of_byte(line, start),
        },
        end: Position {
            line: line_index as u32,
            character: utf16_of_byte(line, end),
        },
    }
}

/// Range on one line between two character columns.
pub fn char_range(line_index: usize, line: &str, start: usize, end: usize) -> Range {
    Range {
        start: Position {
            line: line_index as u32,
            character: utf16_of_char(line, start),
        },
        end: Position {
            line: line_index as u32,
            character: utf16_of_char(line, end),
        },
    }
}

/// Range covering a whole line.
pub fn line_range(line_index: usize, line: &str) -> Range {
    byte_range(line_index, line, 0, line.len())
}

/// Byte offset of the first whole-word occurrence of `word` in `text`.
pub fn find_word(text: &str, word: &str) -> Option<usize> {
    find_word_from(text, word, 0)
}

/// Like [`find_word`], starting the search at byte `from`.
pub fn find_word_from(text: &str, word: &str, from: usize) -> Option<usize> {
    if word.is_empty() {
        return None;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut search = floor_boundary(text, from);
    while let Some(found) = text[search..].find(word) {
        let start = search + found;
        let end = start + word.len();
        let before_ok = !text[..start].chars().next_back().is_some_and(is_word);
        let after_ok = !text[end..].chars().next().is_some_and(is_word);
        if before_ok && after_ok {
            return Some(start);
        }
        search = end;
    }
    None
}
