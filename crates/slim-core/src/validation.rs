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

//! Brace and semicolon checks.
//!
//! A line-by-line balance check, independent of the tracking pass. It reports
//! stray closing braces, braces left open at the end of the document, and
//! statements that look like they are missing a `;`. The semicolon check is a
//! heuristic and only fires when none of the "clearly fine" rules apply.

use crate::constants::DIAGNOSTIC_SOURCE;
use crate::patterns::{detect_callback_header, detect_function};
use crate::text::{is_pure_comment_line, scan_line, strip_strings_and_comments};
use once_cell::sync::Lazy;
use regex::Regex;

static CONTROL_FLOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:if|else|while|for|do|switch|case|default)\b").expect("static pattern must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found on one line. Columns are character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: usize,
    pub start: usize,
    pub end: usize,
    pub message: String,
    pub source: String,
}

impl Diagnostic {
    fn whole_line(severity: Severity, line: usize, text: &str, message: &str) -> Self {
        Self {
            severity,
            line,
            start: 0,
            end: text.chars().count(),
            message: message.to_string(),
            source: DIAGNOSTIC_SOURCE.to_string(),
        }
    }
}

pub const UNEXPECTED_CLOSING_BRACE: &str = "Unexpected closing brace";
pub const UNCLOSED_BRACES: &str = "Unclosed brace(s)";
pub const MISSING_SEMICOLON: &str = "Statement might be missing a semicolon";

/// Check the brace balance and statement endings of a document.
pub fn validate_structure<S: AsRef<str>>(lines: &[S]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut depth: i64 = 0;
    let mut paren_balance: i64 = 0;
    let mut in_block_comment = false;

    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let was_in_comment = in_block_comment;
        let scanned = scan_line(line, &mut in_block_comment);
        let code = scanned.code.trim();

        if code.is_empty() {
            continue;
        }

        depth += scanned.net_braces();
        if depth < 0 {
            diagnostics.push(Diagnostic::whole_line(
                Severity::Error,
                index,
                line,
                UNEXPECTED_CLOSING_BRACE,
            ));
            depth = 0;
        }

        if was_in_comment || is_pure_comment_line(line) {
            continue;
        }

        let (needs_semicolon, balance) = missing_semicolon(code, paren_balance);
        paren_balance = balance;
        if needs_semicolon {
            diagnostics.push(Diagnostic::whole_line(
                Severity::Warning,
                index,
                line,
                MISSING_SEMICOLON,
            ));
        }
    }

    if depth > 0 {
        if let Some(last) = lines.len().checked_sub(1) {
            diagnostics.push(Diagnostic::whole_line(
                Severity::Error,
                last,
                lines[last].as_ref(),
                UNCLOSED_BRACES,
            ));
        }
    }

    diagnostics
}

/// Decide whether a comment-free, trimmed code line lacks a `;`.
///
/// `paren_balance` carries unclosed parentheses from earlier lines; a
/// statement that continues onto the next line is never flagged.
fn missing_semicolon(code: &str, paren_balance: i64) -> (bool, i64) {
    let bare = strip_strings_and_comments(code);
    let opens = bare.matches('(').count() as i64;
    let closes = bare.matches(')').count() as i64;
    let net = (paren_balance + opens - closes).max(0);

    let safe = code.ends_with(';')
        || code.ends_with('{')
        || code.ends_with('}')
        || net > 0
        || CONTROL_FLOW.is_match(code)
        || detect_callback_header(code).is_some()
        || detect_function(code).is_some();

    (!safe, net)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(lines: &[&str]) -> Vec<(usize, &'static str)> {
        validate_structure(lines)
            .into_iter()
            .map(|d| {
                let message = match d.message.as_str() {
                    UNEXPECTED_CLOSING_BRACE => UNEXPECTED_CLOSING_BRACE,
                    UNCLOSED_BRACES => UNCLOSED_BRACES,
                    _ => MISSING_SEMICOLON,
                };
                (d.line, message)
            })
            .collect()
    }

    #[test]
    fn test_balanced_document_is_clean() {
        let lines = [
            "initialize() {",
            "    if (x > 0) {",
            "        y = 10;",
            "    }",
            "}",
        ];
        assert!(validate_structure(&lines).is_empty());
    }

    #[test]
    fn test_unclosed_brace() {
        let diagnostics = validate_structure(&["initialize() {", "    x = 5;"]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].message, UNCLOSED_BRACES);
        assert_eq!(diagnostics[0].line, 1);
        assert_eq!(diagnostics[0].source, "slim-tools");
    }

    #[test]
    fn test_unexpected_closing_brace() {
        assert_eq!(
            messages(&["x = 5;", "}"]),
            vec![(1, UNEXPECTED_CLOSING_BRACE)]
        );
    }

    #[test]
    fn test_braces_in_comments_and_strings() {
        let lines = [
            "initialize() {",
            "    // This { is in a comment",
            "    /* and } this */",
            "    s = \"{\";",
            "}",
        ];
        assert!(validate_structure(&lines).is_empty());
    }

    #[test]
    fn test_missing_semicolon() {
        assert_eq!(
            messages(&["1 early() {", "    x = 5", "}"]),
            vec![(1, MISSING_SEMICOLON)]
        );
    }

    #[test]
    fn test_multi_line_call_is_not_flagged() {
        let lines = [
            "initialize() {",
            "    initializeMutationType(\"m1\", 0.5,",
            "        \"f\", 0.0);",
            "}",
        ];
        assert!(validate_structure(&lines).is_empty());
    }

    #[test]
    fn test_headers_are_safe() {
        let lines = [
            "s1 10 late()",
            "{",
            "}",
            "function (void)report(integer n)",
            "{",
            "}",
            "else",
        ];
        assert!(validate_structure(&lines).is_empty());
    }

    #[test]
    fn test_block_comment_body_is_skipped() {
        let lines = ["/*", " a comment line without semicolon", "*/", "x = 1;"];
        assert!(validate_structure(&lines).is_empty());
    }
}
