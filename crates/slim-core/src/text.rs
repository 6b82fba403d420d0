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

//! Line-level text processing.
//!
//! All helpers here are string-aware: braces, commas and comment markers that
//! appear inside `"..."` or `'...'` literals are ignored. An unterminated
//! string simply runs to the end of the line.

/// A line with comments removed and its code braces counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedLine {
    /// The line without comments. String literals are kept verbatim.
    pub code: String,
    /// Number of `{` outside strings and comments.
    pub opens: usize,
    /// Number of `}` outside strings and comments.
    pub closes: usize,
}

impl ScannedLine {
    pub fn net_braces(&self) -> i64 {
        self.opens as i64 - self.closes as i64
    }
}

/// Scan one line, carrying block-comment state across lines.
///
/// `in_block_comment` is true on entry when a previous line opened a `/*`
/// that has not been closed yet, and is updated for the next line.
pub fn scan_line(line: &str, in_block_comment: &mut bool) -> ScannedLine {
    let mut scanned = ScannedLine {
        code: String::with_capacity(line.len()),
        ..Default::default()
    };
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if *in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block_comment = false;
            }
            continue;
        }

        if let Some(q) = quote {
            scanned.code.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                scanned.code.push(c);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_block_comment = true;
            }
            '{' => {
                scanned.opens += 1;
                scanned.code.push(c);
            }
            '}' => {
                scanned.closes += 1;
                scanned.code.push(c);
            }
            _ => scanned.code.push(c),
        }
    }

    scanned
}

/// Remove comments from a single line, keeping string literals.
pub fn strip_comments(line: &str) -> String {
    let mut in_block = false;
    scan_line(line, &mut in_block).code
}

/// Remove comments and the contents of string literals from a single line.
///
/// The quotes themselves are kept so that `f("a", b)` becomes `f("", b)`.
pub fn strip_strings_and_comments(line: &str) -> String {
    let code = strip_comments(line);
    let mut out = String::with_capacity(code.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in code.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                    out.push(c);
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }

    out
}

/// True if the line holds nothing but a comment.
pub fn is_pure_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// True if the byte offset `index` falls inside a string literal of `line`.
pub fn is_in_string(line: &str, index: usize) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if i >= index {
            break;
        }
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

/// Byte offset where a `//` comment starts, outside string literals.
pub fn comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let bytes = line.as_bytes();

    for (i, c) in line.char_indices() {
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
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                } else if c == '/' && bytes.get(i + 1) == Some(&b'/') {
                    return Some(i);
                }
            }
        }
    }

    None
}

/// Byte offset of the delimiter closing the one at `open`.
///
/// Works for `(`, `[` and `{`, nesting any of the three and skipping string
/// literals. Returns `None` when the delimiter is not closed on this text.
pub fn find_matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let (open_ch, close_ch) = match bytes.get(open)? {
        b'(' => (b'(', b')'),
        b'[' => (b'[', b']'),
        b'{' => (b'{', b'}'),
        _ => return None,
    };

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            _ if b == open_ch => depth += 1,
            _ if b == close_ch => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Split an argument list on commas that are not nested in brackets or strings.
///
/// Each argument is trimmed. An empty or blank input yields no arguments.
pub fn split_top_level_args(args: &str) -> Vec<String> {
    if args.trim().is_empty() {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in args.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                result.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    result.push(current.trim().to_string());

    result
}

/// Count commas at nesting depth zero.
pub fn count_top_level_commas(text: &str) -> usize {
    let mut depth = 0i32;
    let mut count = 0;
    let mut quote: Option<char> = None;

    for c in text.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => count += 1,
            _ => {}
        }
    }

    count
}

/// Extract the documentation comment written directly above `target`.
///
/// Walks upward from the line before `target`, skipping blank lines and
/// collecting `//` lines and `/* ... */` blocks until the first code line.
/// Collected lines are joined with `\n` in source order.
pub fn extract_doc_comment<S: AsRef<str>>(lines: &[S], target: usize) -> Option<String> {
    let mut collected: Vec<String> = Vec::new();
    let mut index = target.min(lines.len());

    while index > 0 {
        index -= 1;
        let trimmed = lines[index].as_ref().trim();

        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("//") {
            let text = rest.strip_prefix(' ').unwrap_or(rest).trim();
            collected.push(text.to_string());
            continue;
        }

        if trimmed.ends_with("*/") {
            let (block, start) = collect_block_comment(lines, index);
            // Pushed in reverse so the final reverse restores source order.
            collected.extend(block.into_iter().rev());
            index = start;
            continue;
        }

        break;
    }

    if collected.is_empty() {
        return None;
    }

    collected.reverse();
    Some(collected.join("\n"))
}

/// Collect a block comment ending on `end`, returning its lines and start line.
fn collect_block_comment<S: AsRef<str>>(lines: &[S], end: usize) -> (Vec<String>, usize) {
    let mut block = Vec::new();
    let mut index = end;

    loop {
        let line = lines[index].as_ref();
        if let Some(open) = line.find("/*") {
            let content = clean_block_line(&line[open + 2..]);
            if !content.is_empty() {
                block.push(content);
            }
            break;
        }

        let content = clean_block_line(line);
        if !content.is_empty() {
            block.push(content);
        }

        if index == 0 {
            break;
        }
        index -= 1;
    }

    block.reverse();
    (block, index)
}

fn clean_block_line(line: &str) -> String {
    let mut content = line.trim();
    content = content.strip_suffix("*/").unwrap_or(content).trim();
    if let Some(rest) = content.strip_prefix('*') {
        content = rest.strip_prefix(' ').unwrap_or(rest);
    }
    content.trim().to_string()
}

/// Split document text into lines.
///
/// Splits on `\n` and drops a trailing `\r`, so line indices match editor
/// positions for both LF and CRLF files. A trailing newline yields a final
/// empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_counts_code_braces_only() {
        let mut in_block = false;
        let scanned = scan_line(r#"x = "{"; if (y) { // }"#, &mut in_block);
        assert_eq!(scanned.opens, 1);
        assert_eq!(scanned.closes, 0);
        assert_eq!(scanned.code, r#"x = "{"; if (y) { "#);
    }

    #[test]
    fn test_scan_block_comment_across_lines() {
        let mut in_block = false;
        let first = scan_line("a { /* start {", &mut in_block);
        assert!(in_block);
        assert_eq!(first.opens, 1);

        let second = scan_line("still } comment */ }", &mut in_block);
        assert!(!in_block);
        assert_eq!(second.closes, 1);
        assert_eq!(second.code.trim(), "}");
    }

    #[test]
    fn test_scan_escaped_quote() {
        let mut in_block = false;
        let scanned = scan_line(r#"s = "a\"{"; }"#, &mut in_block);
        assert_eq!(scanned.opens, 0);
        assert_eq!(scanned.closes, 1);
    }

    #[test]
    fn test_scan_same_line_block_comment() {
        let mut in_block = false;
        let scanned = scan_line("a { /* } */ b } // {", &mut in_block);
        assert_eq!((scanned.opens, scanned.closes), (1, 1));
        assert!(!in_block);
    }

    #[test]
    fn test_strip_strings_and_comments() {
        assert_eq!(
            strip_strings_and_comments(r#"f("a{b", 'c') // tail"#),
            r#"f("", '') "#
        );
    }

    #[test]
    fn test_is_in_string() {
        let line = r#"x = "p1"; p1"#;
        assert!(is_in_string(line, 5));
        assert!(!is_in_string(line, 10));
    }

    #[test]
    fn test_comment_start_ignores_strings() {
        assert_eq!(comment_start(r#"s = "http://x"; // c"#), Some(16));
        assert_eq!(comment_start("x = 1;"), None);
    }

    #[test]
    fn test_find_matching_close() {
        let text = "f(a, g(b), \")\")[0]";
        assert_eq!(find_matching_close(text, 1), Some(14));
        assert_eq!(find_matching_close(text, 15), Some(17));
        assert_eq!(find_matching_close("f(a", 1), None);
    }

    #[test]
    fn test_split_top_level_args() {
        assert_eq!(
            split_top_level_args(r#"1, c(2, 3), "a,b", x[1, 2]"#),
            vec!["1", "c(2, 3)", r#""a,b""#, "x[1, 2]"]
        );
        assert!(split_top_level_args("   ").is_empty());
    }

    #[test]
    fn test_count_top_level_commas() {
        assert_eq!(count_top_level_commas("a, f(b, c), "), 2);
    }

    #[test]
    fn test_doc_comment_single_lines() {
        let lines = [
            "// This is a helper function",
            "// It does something useful",
            "function (void)myFunc() {",
        ];
        assert_eq!(
            extract_doc_comment(&lines, 2).as_deref(),
            Some("This is a helper function\nIt does something useful")
        );
    }

    #[test]
    fn test_doc_comment_block() {
        let lines = [
            "/* This is a multi-line",
            " * comment describing",
            " * the function */",
            "function (float)calculate(float x) {",
        ];
        let doc = extract_doc_comment(&lines, 3).unwrap();
        assert_eq!(doc, "This is a multi-line\ncomment describing\nthe function");
    }

    #[test]
    fn test_doc_comment_absent() {
        let lines = ["", "function (void)noComment() {"];
        assert_eq!(extract_doc_comment(&lines, 1), None);
    }

    #[test]
    fn test_doc_comment_skips_blank_lines() {
        let lines = [
            "// Comment with blank line below",
            "",
            "function (integer)withBlank() {",
        ];
        assert_eq!(
            extract_doc_comment(&lines, 2).as_deref(),
            Some("Comment with blank line below")
        );
    }

    #[test]
    fn test_doc_comment_stops_at_code() {
        let lines = [
            "x = 5;",
            "// Only this comment should be captured",
            "function (void)partialComment() {",
        ];
        assert_eq!(
            extract_doc_comment(&lines, 2).as_deref(),
            Some("Only this comment should be captured")
        );
    }

    #[test]
    fn test_split_lines_crlf() {
        assert_eq!(split_lines("a\r\nb\n"), vec!["a", "b", ""]);
    }
}
