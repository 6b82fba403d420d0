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

//! Callback context tracking.
//!
//! A three-state machine advanced once per line. It answers "which callback
//! block contains this line" and reports when a block is entered, so the
//! engine can bind that callback's pseudo-parameters.

use crate::patterns::detect_callback_header;
use crate::text::ScannedLine;
use crate::types::{ClassName, Primitive, TypeName};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallbackState {
    #[default]
    NoCallback,
    /// A header was seen but its opening brace has not been reached yet.
    Pending { name: String },
    InCallback { name: String, depth: i64 },
}

/// Outcome of advancing the tracker over one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallbackStep {
    /// Callback containing the line, if any.
    pub current: Option<String>,
    /// Set on the line where a callback body is entered.
    pub entered: Option<String>,
}

#[derive(Debug, Default)]
pub struct CallbackTracker {
    state: CallbackState,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance over one line.
    ///
    /// `code` is the line with comments removed, `scanned` its brace counts.
    /// The line that closes a callback still reports that callback.
    pub fn advance(&mut self, code: &str, scanned: &ScannedLine) -> CallbackStep {
        let header = detect_callback_header(code);
        let net = scanned.net_braces();

        let state = std::mem::take(&mut self.state);
        let (next, step) = match (state, header) {
            (CallbackState::NoCallback, Some(header))
            | (CallbackState::Pending { .. }, Some(header)) => {
                if scanned.opens > 0 {
                    Self::enter(header.name, net, scanned)
                } else {
                    let name = header.name;
                    (
                        CallbackState::Pending { name: name.clone() },
                        CallbackStep {
                            current: Some(name),
                            entered: None,
                        },
                    )
                }
            }
            (CallbackState::Pending { name }, None) => {
                if scanned.opens > 0 {
                    Self::enter(name, net, scanned)
                } else {
                    (
                        CallbackState::Pending { name: name.clone() },
                        CallbackStep {
                            current: Some(name),
                            entered: None,
                        },
                    )
                }
            }
            (CallbackState::InCallback { name, depth }, _) => {
                let depth = depth + net;
                let step = CallbackStep {
                    current: Some(name.clone()),
                    entered: None,
                };
                if depth <= 0 && scanned.closes > 0 {
                    (CallbackState::NoCallback, step)
                } else {
                    (CallbackState::InCallback { name, depth }, step)
                }
            }
            (CallbackState::NoCallback, None) => (CallbackState::NoCallback, CallbackStep::default()),
        };

        self.state = next;
        step
    }

    fn enter(name: String, net: i64, scanned: &ScannedLine) -> (CallbackState, CallbackStep) {
        let step = CallbackStep {
            current: Some(name.clone()),
            entered: Some(name.clone()),
        };
        // `1 early() { x(); }` opens and closes on the header line.
        if net <= 0 && scanned.closes > 0 {
            (CallbackState::NoCallback, step)
        } else {
            (CallbackState::InCallback { name, depth: net }, step)
        }
    }
}

/// Variables implicitly bound inside a callback body.
///
/// Every callback binds `self` to its script block.
pub fn pseudo_parameters(callback: &str) -> Vec<(&'static str, TypeName)> {
    use ClassName::*;
    let class = TypeName::class;
    let prim = TypeName::primitive;

    let mut params = vec![("self", class(ScriptBlock))];
    params.extend(match callback {
        "mutationEffect" => vec![
            ("mut", class(Mutation)),
            ("homozygous", prim(Primitive::Logical)),
            ("effect", prim(Primitive::Float)),
            ("individual", class(Individual)),
            ("subpop", class(Subpopulation)),
        ],
        "fitnessEffect" | "reproduction" => vec![
            ("individual", class(Individual)),
            ("subpop", class(Subpopulation)),
        ],
        "interaction" => vec![
            ("distance", prim(Primitive::Float)),
            ("strength", prim(Primitive::Float)),
            ("receiver", class(Individual)),
            ("exerter", class(Individual)),
        ],
        "mateChoice" => vec![
            ("individual", class(Individual)),
            ("subpop", class(Subpopulation)),
            ("sourceSubpop", class(Subpopulation)),
            ("weights", prim(Primitive::Float).to_vector()),
        ],
        "modifyChild" => vec![
            ("child", class(Individual)),
            ("parent1", class(Individual)),
            ("parent2", class(Individual)),
            ("isCloning", prim(Primitive::Logical)),
            ("isSelfing", prim(Primitive::Logical)),
            ("subpop", class(Subpopulation)),
            ("sourceSubpop", class(Subpopulation)),
        ],
        "recombination" => vec![
            ("individual", class(Individual)),
            ("haplosome1", class(Haplosome)),
            ("haplosome2", class(Haplosome)),
            ("subpop", class(Subpopulation)),
            ("breakpoints", prim(Primitive::Integer).to_vector()),
        ],
        "mutation" => vec![
            ("mut", class(Mutation)),
            ("haplosome", class(Haplosome)),
            ("element", class(GenomicElement)),
            ("originalNuc", prim(Primitive::Integer)),
            ("parent", class(Individual)),
            ("subpop", class(Subpopulation)),
        ],
        "survival" => vec![
            ("individual", class(Individual)),
            ("subpop", class(Subpopulation)),
            ("surviving", prim(Primitive::Logical)),
            ("fitness", prim(Primitive::Float)),
            ("draw", prim(Primitive::Float)),
        ],
        "fitness" => vec![
            ("mut", class(Mutation)),
            ("homozygous", prim(Primitive::Logical)),
            ("relFitness", prim(Primitive::Float)),
            ("individual", class(Individual)),
            ("subpop", class(Subpopulation)),
            ("genome1", class(Haplosome)),
            ("genome2", class(Haplosome)),
        ],
        _ => Vec::new(),
    });
    params
}
