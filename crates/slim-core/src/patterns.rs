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

//! Pattern catalogue: one line-local detector per recognised construct.
//!
//! Every detector is a pure function from a comment-free line to an optional
//! match. Each one first checks for a cheap literal fragment with
//! `str::contains` and only then runs its regex, so the common case of a line
//! that declares nothing costs a handful of substring scans.
//!
//! The regexes are compiled once into `Lazy` statics.

use crate::text::find_matching_close;
use once_cell::sync::Lazy;
use regex::Regex;

// The patterns below are literals; construction cannot fail at runtime.
macro_rules! pattern {
    ($re:expr) => {
        Lazy::new(|| Regex::new($re).expect("static pattern must compile"))
    };
}

static CONSTANT: Lazy<Regex> =
    pattern!(r#"defineConstant\s*\(\s*(?:symbol\s*=\s*)?["']([A-Za-z_]\w*)["']\s*,"#);

static TYPE_INITIALIZER: Lazy<Regex> = pattern!(
    r#"initialize(MutationTypeNuc|MutationType|GenomicElementType|InteractionType)\s*\(\s*(?:id\s*=\s*)?(?:"(\w+)"|'(\w+)'|(\d+))"#
);

static SUBPOPULATION: Lazy<Regex> =
    pattern!(r#"addSubpop(?:Split)?\s*\(\s*(?:subpopID\s*=\s*)?(?:"(\w+)"|'(\w+)'|(\d+))"#);

static SCRIPT_BLOCK: Lazy<Regex> = pattern!(
    r#"register\w*(?:Callback|Event)\s*\(\s*(?:id\s*=\s*)?(?:"(\w+)"|'(\w+)'|(\d+)|NULL)"#
);

static FUNCTION: Lazy<Regex> =
    pattern!(r"^\s*function\s*\(([^)]*)\)\s*([A-Za-z_]\w*)\s*\(([^)]*)\)");

static ASSIGNMENT: Lazy<Regex> = pattern!(r"(?:^|[;{}]\s*)\s*([A-Za-z_]\w*)\s*=([^=][^;]*)");

static FOR_IN: Lazy<Regex> = pattern!(r"\bfor\s*\(\s*([A-Za-z_]\w*)\s+in\s+");

static CALLBACK_HEADER: Lazy<Regex> = pattern!(
    r"^\s*(?:species\s+(\w+)\s+)?(?:ticks\s+\w+\s+)?(?:(s\d+)\s+)?(?:(\d+(?::\w*)?|:\w+|[A-Z_][A-Z0-9_]*(?::\w*)?)\s+)?(initialize|first|early|late|fitnessEffect|mutationEffect|interaction|mateChoice|modifyChild|recombination|mutation|survival|reproduction|fitness)\s*\("
);

static SPECIES: Lazy<Regex> = pattern!(r"^\s*species\s+([A-Za-z_]\w*)\s+");

static MODEL_TYPE: Lazy<Regex> =
    pattern!(r#"initializeSLiMModelType\s*\(\s*(?:modelType\s*=\s*)?["'](WF|nonWF)["']"#);

/// Simulation timing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Wright-Fisher.
    Wf,
    NonWf,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wf => "WF",
            Self::NonWf => "nonWF",
        }
    }
}

/// A `defineConstant("NAME", value)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantMatch {
    pub name: String,
    /// Text after the first comma, up to the closing paren when it is on this line.
    pub value: String,
    /// True when the call's closing paren is on this line.
    pub complete: bool,
}

/// Which nominal type an `initialize*Type` call declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Mutation,
    GenomicElement,
    Interaction,
}

impl TypeKind {
    /// Prefix used to build an identifier from a numeric id.
    pub fn prefix(&self) -> char {
        match self {
            Self::Mutation => 'm',
            Self::GenomicElement => 'g',
            Self::Interaction => 'i',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInitializerMatch {
    pub kind: TypeKind,
    pub id: String,
}

/// A user function definition header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMatch {
    pub name: String,
    pub return_type: String,
    pub parameters: String,
    /// `(returnType)name(params)` as written, whitespace normalised.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentMatch {
    pub name: String,
    /// Right-hand side, trimmed, without the trailing `;`.
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForInMatch {
    pub variable: String,
    pub collection: String,
    /// True for `for (x in y) stmt;` with no brace.
    pub single_line: bool,
}

/// A callback or event block header such as `s1 1:100 late() {`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackHeader {
    pub name: String,
    pub block_id: Option<String>,
    pub ticks: Option<String>,
    pub species: Option<String>,
}

/// Match `defineConstant("NAME", ...)`.
pub fn detect_constant(line: &str) -> Option<ConstantMatch> {
    if !line.contains("defineConstant") {
        return None;
    }
    let caps = CONSTANT.captures(line)?;
    let name = caps.get(1)?.as_str().to_string();
    let whole = caps.get(0)?;
    let call_open = whole.start() + whole.as_str().find('(')?;
    let value_start = whole.end();

    match find_matching_close(line, call_open) {
        Some(close) if close >= value_start => Some(ConstantMatch {
            name,
            value: line[value_start..close].trim().to_string(),
            complete: true,
        }),
        _ => Some(ConstantMatch {
            name,
            value: line[value_start..].trim().to_string(),
            complete: false,
        }),
    }
}

/// Match `initializeMutationType`, `initializeMutationTypeNuc`,
/// `initializeGenomicElementType` and `initializeInteractionType`.
///
/// Numeric ids are turned into `m<N>`, `g<N>` or `i<N>`.
pub fn detect_type_initializer(line: &str) -> Option<TypeInitializerMatch> {
    if !line.contains("initialize") || !line.contains("Type") {
        return None;
    }
    let caps = TYPE_INITIALIZER.captures(line)?;
    let kind = match caps.get(1)?.as_str() {
        "MutationType" | "MutationTypeNuc" => TypeKind::Mutation,
        "GenomicElementType" => TypeKind::GenomicElement,
        _ => TypeKind::Interaction,
    };
    let id = quoted_or_numeric(&caps, 2, kind.prefix())?;
    Some(TypeInitializerMatch { kind, id })
}

/// Match `addSubpop` and `addSubpopSplit`, returning the subpopulation identifier.
pub fn detect_subpopulation(line: &str) -> Option<String> {
    if !line.contains("addSubpop") {
        return None;
    }
    let caps = SUBPOPULATION.captures(line)?;
    quoted_or_numeric(&caps, 1, 'p')
}

/// Match `register*Callback(...)` and `register*Event(...)`.
///
/// Returns `None` for registrations with a `NULL` id.
pub fn detect_script_block(line: &str) -> Option<String> {
    if !line.contains("register") || !(line.contains("Callback") || line.contains("Event")) {
        return None;
    }
    let caps = SCRIPT_BLOCK.captures(line)?;
    quoted_or_numeric(&caps, 1, 's')
}

/// Read an id captured as `"x"`, `'x'` or a bare number starting at group `first`.
fn quoted_or_numeric(caps: &regex::Captures<'_>, first: usize, prefix: char) -> Option<String> {
    if let Some(quoted) = caps.get(first).or_else(|| caps.get(first + 1)) {
        return Some(quoted.as_str().to_string());
    }
    caps.get(first + 2).map(|n| format!("{}{}", prefix, n.as_str()))
}

pub fn detect_function(line: &str) -> Option<FunctionMatch> {
    if !line.contains("function") {
        return None;
    }
    let caps = FUNCTION.captures(line)?;
    let return_type = caps.get(1)?.as_str().trim().to_string();
    let name = caps.get(2)?.as_str().to_string();
    let parameters = caps.get(3)?.as_str().trim().to_string();
    let signature = format!("({}){}({})", return_type, name, parameters);
    Some(FunctionMatch {
        name,
        return_type,
        parameters,
        signature,
    })
}

/// All `name = expression` statements on a line.
///
/// Comparisons (`==`), compound operators and keyword arguments inside calls
/// are not assignments and are skipped.
pub fn detect_assignments(line: &str) -> Vec<AssignmentMatch> {
    if !line.contains('=') {
        return Vec::new();
    }
    ASSIGNMENT
        .captures_iter(line)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let expression = caps.get(2)?.as_str().trim();
            if expression.is_empty() || is_keyword(name) {
                return None;
            }
            Some(AssignmentMatch {
                name: name.to_string(),
                expression: expression.to_string(),
            })
        })
        .collect()
}

fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "if" | "else" | "for" | "while" | "do" | "return" | "function" | "in" | "next" | "break"
    )
}

/// Match `for (var in collection)`.
pub fn detect_for_in(line: &str) -> Option<ForInMatch> {
    if !line.contains("for") || !line.contains(" in ") {
        return None;
    }
    let caps = FOR_IN.captures(line)?;
    let variable = caps.get(1)?.as_str().to_string();
    let whole = caps.get(0)?;
    let open_paren = whole.start() + whole.as_str().find('(')?;
    let collection_start = whole.end();

    let (collection, rest) = match find_matching_close(line, open_paren) {
        Some(close) => (&line[collection_start..close], &line[close + 1..]),
        None => (&line[collection_start..], ""),
    };

    let single_line = !rest.contains('{') && rest.trim_end().ends_with(';');

    Some(ForInMatch {
        variable,
        collection: collection.trim().to_string(),
        single_line,
    })
}

pub fn detect_callback_header(line: &str) -> Option<CallbackHeader> {
    if !line.contains('(') {
        return None;
    }
    let caps = CALLBACK_HEADER.captures(line)?;
    Some(CallbackHeader {
        name: caps.get(4)?.as_str().to_string(),
        block_id: caps.get(2).map(|m| m.as_str().to_string()),
        ticks: caps.get(3).map(|m| m.as_str().to_string()),
        species: caps.get(1).map(|m| m.as_str().to_string()),
    })
}

/// Match a `species NAME ...` block prefix. `species all` is not a declaration.
pub fn detect_species(line: &str) -> Option<String> {
    if !line.contains("species") {
        return None;
    }
    let name = SPECIES.captures(line)?.get(1)?.as_str();
    if name == "all" {
        return None;
    }
    Some(name.to_string())
}

pub fn detect_model_type(line: &str) -> Option<ModelType> {
    if !line.contains("initializeSLiMModelType") {
        return None;
    }
    match MODEL_TYPE.captures(line)?.get(1)?.as_str() {
        "WF" => Some(ModelType::Wf),
        _ => Some(ModelType::NonWf),
    }
}
