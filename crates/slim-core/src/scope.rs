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

//! Loop-variable scopes.
//!
//! A scope covers the lines of a `for (x in ...)` body. Its variable is in
//! scope on lines `start_line + 1 ..= end_line`; the `for` line itself is
//! excluded. Scopes are recorded in declaration order, so an inner scope
//! always follows the scope that encloses it.

use crate::resolver::TypeLookup;
use crate::tracking::TrackingState;
use crate::types::TypeName;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopScope {
    pub variable: String,
    pub variable_type: Option<TypeName>,
    pub start_line: usize,
    /// Last line of the body; `None` while the scope is still open.
    pub end_line: Option<usize>,
    /// Brace depth before the `for` line's own braces.
    pub brace_depth: i64,
}

impl LoopScope {
    /// True if the loop variable is visible on `line`.
    pub fn contains(&self, line: usize) -> bool {
        line > self.start_line && self.end_line.map_or(true, |end| line <= end)
    }
}

/// Opens and closes loop scopes during the tracking pass.
///
/// The engine calls [`open`](Self::open) when it meets a `for (x in ...)`
/// line, [`after_line`](Self::after_line) once per line with the brace depth
/// after that line, and [`finish`](Self::finish) at the end of the document.
/// While the pass runs, [`view`](Self::view) gives the resolver the names
/// visible on the current line.
///
/// # Nesting
///
/// Each scope records the brace depth before its `for` line. A closing brace
/// that brings the depth back to that level ends the scope. A new loop at the
/// same or a shallower depth ends any sibling still open, which covers loops
/// whose body never opened a brace.
#[derive(Debug, Default)]
pub struct ScopeManager {
    scopes: Vec<LoopScope>,
    /// Indices into `scopes` of scopes still open, in opening order.
    open: Vec<usize>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope for a loop on `line`.
    ///
    /// Open scopes at the same or a deeper brace depth are siblings that
    /// ended before this loop; they are closed at `line - 1`. A single-line
    /// loop is closed on its own line.
    ///
    /// # Arguments
    ///
    /// * `variable` - The loop variable
    /// * `variable_type` - Element type of the collection, if it resolved
    /// * `line` - Line of the `for` header
    /// * `brace_depth` - Depth before the header's own braces
    /// * `single_line` - True for `for (x in y) stmt;` without a brace
    pub fn open(
        &mut self,
        variable: String,
        variable_type: Option<TypeName>,
        line: usize,
        brace_depth: i64,
        single_line: bool,
    ) {
        let scopes = &mut self.scopes;
        self.open.retain(|&index| {
            let scope = &mut scopes[index];
            if scope.brace_depth >= brace_depth {
                scope.end_line = Some(line.saturating_sub(1).max(scope.start_line));
                false
            } else {
                true
            }
        });

        let index = self.scopes.len();
        self.scopes.push(LoopScope {
            variable,
            variable_type,
            start_line: line,
            end_line: single_line.then_some(line),
            brace_depth,
        });
        if !single_line {
            self.open.push(index);
        }
    }

    /// Close scopes ended by the closing braces on `line`.
    ///
    /// A scope ends when the depth after the line falls to or below the depth
    /// at which it was opened.
    ///
    /// # Arguments
    ///
    /// * `line` - The line just processed
    /// * `depth_after` - Brace depth after the line
    /// * `had_closing` - True if the line contained a `}`
    pub fn after_line(&mut self, line: usize, depth_after: i64, had_closing: bool) {
        if !had_closing {
            return;
        }
        let scopes = &mut self.scopes;
        self.open.retain(|&index| {
            let scope = &mut scopes[index];
            if depth_after <= scope.brace_depth {
                scope.end_line = Some(line);
                false
            } else {
                true
            }
        });
    }

    /// Close every scope still open at the end of the document.
    pub fn finish(mut self, last_line: usize) -> Vec<LoopScope> {
        for index in self.open.drain(..) {
            let scope = &mut self.scopes[index];
            scope.end_line = Some(last_line.max(scope.start_line));
        }
        self.scopes
    }

    /// Lookup of names visible on `line` during the pass.
    pub fn view<'a>(&'a self, globals: &'a HashMap<String, TypeName>, line: usize) -> ScopeView<'a> {
        ScopeView {
            globals,
            manager: self,
            line,
        }
    }
}

/// Names visible on one line while the pass is running.
///
/// Open loop scopes shadow the global bindings, innermost first.
pub struct ScopeView<'a> {
    globals: &'a HashMap<String, TypeName>,
    manager: &'a ScopeManager,
    line: usize,
}

impl TypeLookup for ScopeView<'_> {
    fn type_of(&self, name: &str) -> Option<&TypeName> {
        self.manager
            .open
            .iter()
            .rev()
            .map(|&index| &self.manager.scopes[index])
            .filter(|scope| scope.start_line < self.line && scope.variable == name)
            .find_map(|scope| scope.variable_type.as_ref())
            .or_else(|| self.globals.get(name))
    }
}

/// Names visible on one line of a finished pass.
///
/// Answers the same questions as [`variables_in_scope`] without cloning the
/// global bindings: loop scopes containing the line are searched latest
/// first, then the globals.
#[derive(Debug, Clone, Copy)]
pub struct LineScope<'a> {
    state: &'a TrackingState,
    line: usize,
}

impl<'a> LineScope<'a> {
    pub fn new(state: &'a TrackingState, line: usize) -> Self {
        Self { state, line }
    }
}

impl TypeLookup for LineScope<'_> {
    fn type_of(&self, name: &str) -> Option<&TypeName> {
        self.state
            .loop_scopes
            .iter()
            .rev()
            .filter(|scope| scope.variable == name && scope.contains(self.line))
            .find_map(|scope| scope.variable_type.as_ref())
            .or_else(|| self.state.instance_definitions.get(name))
    }
}

/// All variables visible on `line` of a finished pass.
///
/// Starts from the global bindings and overlays each loop scope containing
/// the line. When several scopes bind the same name the later one wins.
/// Use [`LineScope`] when only single lookups are needed.
pub fn variables_in_scope(state: &TrackingState, line: usize) -> HashMap<String, TypeName> {
    let mut vars = state.instance_definitions.clone();
    for scope in state.loop_scopes.iter().filter(|s| s.contains(line)) {
        if let Some(ty) = &scope.variable_type {
            vars.insert(scope.variable.clone(), ty.clone());
        }
    }
    vars
}

/// The innermost loop scope binding `name` on `line`, if any.
pub fn loop_scope_for<'a>(state: &'a TrackingState, name: &str, line: usize) -> Option<&'a LoopScope> {
    state
        .loop_scopes
        .iter()
        .rev()
        .find(|scope| scope.variable == name && scope.contains(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassName;

    fn ty(class: ClassName) -> Option<TypeName> {
        Some(TypeName::class(class))
    }

    #[test]
    fn test_block_scope_closes_on_matching_brace() {
        let mut manager = ScopeManager::new();
        manager.open("ind".into(), ty(ClassName::Individual), 1, 1, false);
        manager.after_line(2, 2, false);
        manager.after_line(3, 1, true);
        let scopes = manager.finish(10);
        assert_eq!(scopes[0].end_line, Some(3));
        assert!(!scopes[0].contains(1));
        assert!(scopes[0].contains(2));
        assert!(scopes[0].contains(3));
        assert!(!scopes[0].contains(4));
    }

    #[test]
    fn test_single_line_scope() {
        let mut manager = ScopeManager::new();
        manager.open("x".into(), None, 4, 0, true);
        let scopes = manager.finish(10);
        assert_eq!(scopes[0].end_line, Some(4));
        assert!(!scopes[0].contains(4));
    }

    #[test]
    fn test_sibling_closes_previous() {
        let mut manager = ScopeManager::new();
        manager.open("a".into(), None, 2, 1, false);
        manager.open("b".into(), None, 6, 1, false);
        let scopes = manager.finish(9);
        assert_eq!(scopes[0].end_line, Some(5));
        assert_eq!(scopes[1].end_line, Some(9));
    }

    #[test]
    fn test_nested_scope_keeps_outer_open() {
        let mut manager = ScopeManager::new();
        manager.open("outer".into(), None, 1, 1, false);
        manager.open("inner".into(), None, 2, 2, false);
        manager.after_line(3, 2, true);
        manager.after_line(4, 1, true);
        let scopes = manager.finish(6);
        assert_eq!(scopes[0].end_line, Some(4));
        assert_eq!(scopes[1].end_line, Some(3));
    }

    #[test]
    fn test_view_prefers_innermost() {
        let mut manager = ScopeManager::new();
        let mut globals = HashMap::new();
        globals.insert("x".to_string(), TypeName::class(ClassName::Species));
        manager.open("x".into(), ty(ClassName::Subpopulation), 1, 0, false);
        manager.open("x".into(), ty(ClassName::Individual), 2, 1, false);

        assert_eq!(
            manager.view(&globals, 3).type_of("x"),
            Some(&TypeName::class(ClassName::Individual))
        );
        assert_eq!(
            manager.view(&globals, 2).type_of("x"),
            Some(&TypeName::class(ClassName::Subpopulation))
        );
        assert_eq!(
            manager.view(&globals, 1).type_of("x"),
            Some(&TypeName::class(ClassName::Species))
        );
    }
}
