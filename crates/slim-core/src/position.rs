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

//! Word-at-position utilities.
//!
//! Columns are character indices, not bytes, matching how the server maps
//! editor positions onto lines.

/// The identifier under a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAtPosition {
    pub word: String,
    /// First column of the word.
    pub start: usize,
    /// Column one past the last character of the word.
    pub end: usize,
    /// True when the word sits inside a string literal, as in `"p1"`.
    pub is_quoted: bool,
    /// The receiver expression when the word follows a `.`.
    ///
    /// For `p1.individuals[0].age` with the cursor on `age` this is
    /// `p1.individuals[0]`.
    pub object: Option<String>,
}

/// Where a completion request was triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// Right after `object.`, possibly with part of a member name typed.
    Member { object: String, partial: String },
    /// Anywhere else.
    Global { partial: String },
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Find the identifier at `character` on `line` of `text`.
///
/// A cursor placed just after the last character of a word still finds it.
pub fn word_at(text: &str, line: usize, character: usize) -> Option<WordAtPosition> {
    let line_text = text.split('\n').nth(line)?;
    let line_text = line_text.strip_suffix('\r').unwrap_or(line_text);
    word_at_in_line(line_text, character)
}

/// Same as [`word_at`] for a single line.
pub fn word_at_in_line(line: &str, character: usize) -> Option<WordAtPosition> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() || character > chars.len() {
        return None;
    }

    let anchor = if character < chars.len() && is_word_char(chars[character]) {
        character
    } else if character > 0 && is_word_char(chars[character - 1]) {
        character - 1
    } else {
        return None;
    };

    let mut start = anchor;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = anchor + 1;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }

    let word: String = chars[start..end].iter().collect();
    let is_quoted = in_string_at(&chars, start);
    let object = if !is_quoted && start > 0 && chars[start - 1] == '.' {
        receiver_before(&chars, start - 1)
    } else {
        None
    };

    Some(WordAtPosition {
        word,
        start,
        end,
        is_quoted,
        object,
    })
}

/// Classify the text before the cursor for completion.
pub fn completion_context(text: &str, line: usize, character: usize) -> CompletionContext {
    let line_text = text
        .split('\n')
        .nth(line)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or("");
    let chars: Vec<char> = line_text.chars().take(character).collect();

    let mut start = chars.len();
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let partial: String = chars[start..].iter().collect();

    if start > 0 && chars[start - 1] == '.' {
        if let Some(object) = receiver_before(&chars, start - 1) {
            return CompletionContext::Member { object, partial };
        }
    }

    CompletionContext::Global { partial }
}

/// The receiver expression ending just before the `.` at `dot`.
///
/// Walks back over identifiers, dots and balanced `(...)`/`[...]` groups.
fn receiver_before(chars: &[char], dot: usize) -> Option<String> {
    let mut index = dot;
    let mut depth = 0i32;

    while index > 0 {
        let c = chars[index - 1];
        match c {
            ')' | ']' => depth += 1,
            '(' | '[' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            _ if depth > 0 => {}
            _ if is_word_char(c) || c == '.' => {}
            _ => break,
        }
        index -= 1;
    }

    let receiver: String = chars[index..dot].iter().collect();
    let receiver = receiver.trim_start_matches('.');
    if receiver.is_empty() || !receiver.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        return None;
    }
    Some(receiver.to_string())
}

fn in_string_at(chars: &[char], index: usize) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for &c in &chars[..index] {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => quote = Some(c),
            None => {}
        }
    }

    quote.is_some()
}
