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

//! The lexical tracking engine.
//!
//! One forward pass over a document's lines builds a [`TrackingState`]: the
//! inferred type of every assigned identifier, the declared constants and
//! nominal types, user functions, loop scopes and the callback containing
//! each line.
//!
//! # Pass structure
//!
//! For each line, in order:
//!
//! 1. Scan the line, removing comments and counting code braces.
//! 2. Advance the callback tracker and record the line's callback. Entering a
//!    callback binds its pseudo-parameters.
//! 3. Run every detector of the pattern catalogue. Detectors are independent
//!    and any number may fire on one line.
//! 4. Update the brace depth and close loop scopes ended by this line.
//!
//! The pass never fails. Unbalanced braces or unterminated strings only skew
//! the depth counters used to close scopes.
//!
//! # Example
//!
//! ```
//! use slim_core::{EmptyDocumentationStore, TrackingEngine};
//! use std::sync::Arc;
//!
//! let engine = TrackingEngine::new(Arc::new(EmptyDocumentationStore));
//! let state = engine.track_lines(&[
//!     "1 early() {",
//!     "    sim.addSubpop(\"p1\", 1000);",
//!     "    ind = p1.individuals[0];",
//!     "}",
//! ]);
//! assert_eq!(state.type_of("ind").map(|t| t.to_string()).as_deref(), Some("Individual"));
//! ```

use crate::cache::{DocumentCache, TextDocument};
use crate::callbacks::{pseudo_parameters, CallbackTracker};
use crate::config::EngineConfig;
use crate::constants::{COMMUNITY_HANDLE, SIM_HANDLE};
use crate::docs::DocumentationStore;
use crate::patterns::{self, ModelType, TypeKind};
use crate::resolver::{literal_type, TypeResolver};
use crate::scope::{LoopScope, ScopeManager};
use crate::text::{extract_doc_comment, scan_line, strip_comments};
use crate::types::{ClassName, TypeName};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

static BARE_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_]\w*)\s*\.\s*([A-Za-z_]\w*)$").expect("static pattern must compile")
});

/// A function defined in the document with `function (type)name(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFunction {
    pub name: String,
    /// `(returnType)name(params)`.
    pub signature: String,
    pub return_type: String,
    /// Parameter list as written, without the parentheses.
    pub parameters: String,
    /// Comment block directly above the definition.
    pub doc_comment: Option<String>,
    pub line: usize,
}

/// Where a variable assigned from `object.property` got its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    pub class_name: String,
    pub property_name: String,
}

/// Everything the engine learned about one version of a document.
///
/// A state is never modified after the pass that built it returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackingState {
    /// Identifier to inferred type. A later assignment replaces an earlier one.
    pub instance_definitions: HashMap<String, TypeName>,
    /// Names passed to `defineConstant`, typed or not.
    pub defined_constants: HashSet<String>,
    /// Mutation type ids such as `m1`, from quoted or numeric initializers.
    pub defined_mutation_types: HashSet<String>,
    /// Genomic element type ids such as `g1`.
    pub defined_genomic_element_types: HashSet<String>,
    /// Interaction type ids such as `i1`.
    pub defined_interaction_types: HashSet<String>,
    /// Subpopulation ids from `addSubpop` and `addSubpopSplit`.
    pub defined_subpopulations: HashSet<String>,
    /// Script block ids from `register*Callback` and `register*Event`.
    pub defined_script_blocks: HashSet<String>,
    /// Species named in `species NAME` block prefixes.
    pub defined_species: HashSet<String>,
    /// User-defined functions by name. A redefinition replaces the earlier one.
    pub user_functions: HashMap<String, UserFunction>,
    /// Mutation instance to the mutation type it was drawn from.
    pub mutation_type_by_instance: HashMap<String, String>,
    /// Variables assigned from a bare property access.
    pub property_assignments: HashMap<String, PropertySource>,
    /// Loop scopes in declaration order.
    pub loop_scopes: Vec<LoopScope>,
    /// Callback containing each line, indexed by line.
    pub callback_context_by_line: Vec<Option<String>>,
    /// Model type from `initializeSLiMModelType`, if declared.
    pub model_type: Option<ModelType>,
}

impl TrackingState {
    /// Inferred type of a global binding. Loop variables are not included;
    /// see [`crate::LineScope`] for lookups at a given line.
    pub fn type_of(&self, name: &str) -> Option<&TypeName> {
        self.instance_definitions.get(name)
    }

    /// Name of the callback containing `line`, such as `early` or `mutationEffect`.
    ///
    /// # Returns
    ///
    /// `None` outside any callback or past the end of the document.
    pub fn callback_at(&self, line: usize) -> Option<&str> {
        self.callback_context_by_line.get(line)?.as_deref()
    }

    /// Number of lines the pass covered.
    pub fn line_count(&self) -> usize {
        self.callback_context_by_line.len()
    }

    /// True if `name` is declared by any declaration form.
    pub fn is_declared(&self, name: &str) -> bool {
        self.defined_constants.contains(name)
            || self.defined_mutation_types.contains(name)
            || self.defined_genomic_element_types.contains(name)
            || self.defined_interaction_types.contains(name)
            || self.defined_subpopulations.contains(name)
            || self.defined_script_blocks.contains(name)
            || self.defined_species.contains(name)
    }
}

/// Builds [`TrackingState`]s.
///
/// The engine holds no per-document state. It can be shared across threads
/// and used for any number of documents.
#[derive(Clone)]
pub struct TrackingEngine {
    docs: Arc<dyn DocumentationStore>,
    config: EngineConfig,
}

impl std::fmt::Debug for TrackingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TrackingEngine {
    pub fn new(docs: Arc<dyn DocumentationStore>) -> Self {
        Self::with_config(docs, EngineConfig::default())
    }

    pub fn with_config(docs: Arc<dyn DocumentationStore>, config: EngineConfig) -> Self {
        Self { docs, config }
    }

    pub fn docs(&self) -> &Arc<dyn DocumentationStore> {
        &self.docs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one pass over `lines`.
    ///
    /// Pure: identical input always yields an equal state.
    pub fn track_lines<S: AsRef<str>>(&self, lines: &[S]) -> TrackingState {
        let mut builder = StateBuilder::new(self.docs.as_ref(), &self.config);
        for index in 0..lines.len() {
            builder.process_line(lines, index);
        }
        let state = builder.finish(lines.len());

        debug!(
            lines = lines.len(),
            definitions = state.instance_definitions.len(),
            scopes = state.loop_scopes.len(),
            functions = state.user_functions.len(),
            "Tracked document"
        );

        state
    }

    /// Tracking state for `doc`, from `cache` when its version is current.
    ///
    /// On a miss the pass runs once per URI and version even when several
    /// threads ask at the same time.
    pub fn track(&self, doc: &TextDocument<'_>, cache: &DocumentCache) -> Arc<TrackingState> {
        cache.get_or_track(doc, |lines| self.track_lines(lines))
    }
}

/// Mutable state threaded through the pass.
struct StateBuilder<'a> {
    resolver: TypeResolver<'a>,
    lookahead: usize,
    state: TrackingState,
    scopes: ScopeManager,
    callbacks: CallbackTracker,
    depth: i64,
    in_block_comment: bool,
}

impl<'a> StateBuilder<'a> {
    fn new(docs: &'a dyn DocumentationStore, config: &EngineConfig) -> Self {
        let mut state = TrackingState::default();
        state
            .instance_definitions
            .insert(SIM_HANDLE.to_string(), TypeName::class(ClassName::Species));
        state
            .instance_definitions
            .insert(COMMUNITY_HANDLE.to_string(), TypeName::class(ClassName::Community));

        Self {
            resolver: TypeResolver::new(docs),
            lookahead: config.constant_lookahead_lines,
            state,
            scopes: ScopeManager::new(),
            callbacks: CallbackTracker::new(),
            depth: 0,
            in_block_comment: false,
        }
    }

    fn process_line<S: AsRef<str>>(&mut self, lines: &[S], index: usize) {
        let scanned = scan_line(lines[index].as_ref(), &mut self.in_block_comment);
        let code = scanned.code.as_str();

        let step = self.callbacks.advance(code, &scanned);
        if let Some(entered) = &step.entered {
            for (name, ty) in pseudo_parameters(entered) {
                self.state.instance_definitions.insert(name.to_string(), ty);
            }
        }
        self.state.callback_context_by_line.push(step.current);

        if !code.trim().is_empty() {
            self.detect_declarations(lines, index, code);
            self.detect_assignments(index, code);
            self.detect_loop(index, code);
        }

        self.depth += scanned.net_braces();
        self.scopes.after_line(index, self.depth, scanned.closes > 0);
    }

    fn detect_declarations<S: AsRef<str>>(&mut self, lines: &[S], index: usize, code: &str) {
        let state = &mut self.state;

        if let Some(model) = patterns::detect_model_type(code) {
            state.model_type = Some(model);
        }

        if let Some(species) = patterns::detect_species(code) {
            state
                .instance_definitions
                .insert(species.clone(), TypeName::class(ClassName::Species));
            state.defined_species.insert(species);
        }

        if let Some(header) = patterns::detect_callback_header(code) {
            if let Some(id) = header.block_id {
                state
                    .instance_definitions
                    .insert(id.clone(), TypeName::class(ClassName::ScriptBlock));
                state.defined_script_blocks.insert(id);
            }
        }

        if let Some(init) = patterns::detect_type_initializer(code) {
            let (set, class) = match init.kind {
                TypeKind::Mutation => (&mut state.defined_mutation_types, ClassName::MutationType),
                TypeKind::GenomicElement => (
                    &mut state.defined_genomic_element_types,
                    ClassName::GenomicElementType,
                ),
                TypeKind::Interaction => {
                    (&mut state.defined_interaction_types, ClassName::InteractionType)
                }
            };
            set.insert(init.id.clone());
            state.instance_definitions.insert(init.id, TypeName::class(class));
        }

        if let Some(id) = patterns::detect_subpopulation(code) {
            state
                .instance_definitions
                .insert(id.clone(), TypeName::class(ClassName::Subpopulation));
            state.defined_subpopulations.insert(id);
        }

        if let Some(id) = patterns::detect_script_block(code) {
            state
                .instance_definitions
                .insert(id.clone(), TypeName::class(ClassName::ScriptBlock));
            state.defined_script_blocks.insert(id);
        }

        if let Some(function) = patterns::detect_function(code) {
            let doc_comment = extract_doc_comment(lines, index);
            state.user_functions.insert(
                function.name.clone(),
                UserFunction {
                    name: function.name,
                    signature: function.signature,
                    return_type: function.return_type,
                    parameters: function.parameters,
                    doc_comment,
                    line: index,
                },
            );
        }

        if let Some(constant) = patterns::detect_constant(code) {
            self.define_constant(lines, index, code, constant);
        }
    }

    /// Record a constant, reading ahead when its value spans several lines.
    fn define_constant<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        index: usize,
        code: &str,
        constant: patterns::ConstantMatch,
    ) {
        let mut value = constant.value;
        if !constant.complete {
            let mut joined = code.to_string();
            for next in lines.iter().skip(index + 1).take(self.lookahead) {
                joined.push(' ');
                joined.push_str(strip_comments(next.as_ref()).trim());
                if let Some(m) = patterns::detect_constant(&joined) {
                    if m.complete {
                        value = m.value;
                        break;
                    }
                }
            }
        }

        let ty = literal_type(&value).or_else(|| {
            let view = self.scopes.view(&self.state.instance_definitions, index);
            self.resolver.resolve_type(&value, &view)
        });
        if let Some(ty) = ty {
            self.state
                .instance_definitions
                .insert(constant.name.clone(), ty);
        }
        self.state.defined_constants.insert(constant.name);
    }

    fn detect_assignments(&mut self, index: usize, code: &str) {
        for assignment in patterns::detect_assignments(code) {
            let (resolved, provenance, mutation_type) = {
                let view = self.scopes.view(&self.state.instance_definitions, index);
                let resolved = self.resolver.resolve_type(&assignment.expression, &view);

                let provenance = BARE_PROPERTY
                    .captures(&assignment.expression)
                    .and_then(|caps| {
                        let object = caps.get(1)?.as_str();
                        let property = caps.get(2)?.as_str();
                        let owner = self.resolver.resolve_class_name(object, &view)?;
                        Some(PropertySource {
                            class_name: owner.class_name()?.to_string(),
                            property_name: property.to_string(),
                        })
                    });

                let mutation_type = match &resolved {
                    Some(ty) if ty.is_class(&ClassName::Mutation) => self.resolver.mutation_type_source(
                        &assignment.expression,
                        &view,
                        &self.state.defined_mutation_types,
                        &self.state.mutation_type_by_instance,
                    ),
                    _ => None,
                };

                (resolved, provenance, mutation_type)
            };

            let name = assignment.name;
            if let Some(source) = provenance {
                self.state.property_assignments.insert(name.clone(), source);
            }
            // An unresolved right-hand side keeps whatever was known before.
            if let Some(ty) = resolved {
                match mutation_type {
                    Some(mt) => {
                        self.state.mutation_type_by_instance.insert(name.clone(), mt);
                    }
                    None => {
                        self.state.mutation_type_by_instance.remove(&name);
                    }
                }
                self.state.instance_definitions.insert(name, ty);
            }
        }
    }

    fn detect_loop(&mut self, index: usize, code: &str) {
        let Some(found) = patterns::detect_for_in(code) else {
            return;
        };

        let (variable_type, mutation_type) = {
            let view = self.scopes.view(&self.state.instance_definitions, index);
            let variable_type = self.resolver.loop_variable_type(&found.collection, &view);
            let mutation_type = match &variable_type {
                Some(ty) if ty.is_class(&ClassName::Mutation) => self.resolver.mutation_type_source(
                    &found.collection,
                    &view,
                    &self.state.defined_mutation_types,
                    &self.state.mutation_type_by_instance,
                ),
                _ => None,
            };
            (variable_type, mutation_type)
        };

        if let Some(mt) = mutation_type {
            self.state
                .mutation_type_by_instance
                .insert(found.variable.clone(), mt);
        }

        self.scopes.open(
            found.variable,
            variable_type,
            index,
            self.depth,
            found.single_line,
        );
    }

    fn finish(mut self, line_count: usize) -> TrackingState {
        self.state.loop_scopes = self.scopes.finish(line_count.saturating_sub(1));
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::EmptyDocumentationStore;
    use crate::types::Primitive;

    fn track(text: &str) -> TrackingState {
        let lines: Vec<&str> = text.lines().collect();
        TrackingEngine::new(Arc::new(EmptyDocumentationStore)).track_lines(&lines)
    }

    fn type_name(state: &TrackingState, name: &str) -> Option<String> {
        state.type_of(name).map(|t| t.to_string())
    }

    #[test]
    fn test_ambient_handles() {
        let state = track("");
        assert_eq!(type_name(&state, "sim").as_deref(), Some("Species"));
        assert_eq!(type_name(&state, "community").as_deref(), Some("Community"));
    }

    #[test]
    fn test_constants() {
        let state = track(
            "initialize() {\n    defineConstant(\"K\", 500);\n    defineConstant(\"MU\", 1e-7);\n    defineConstant(\"NAME\", \"run\");\n}",
        );
        assert!(state.defined_constants.contains("K"));
        assert_eq!(state.type_of("K"), Some(&TypeName::primitive(Primitive::Integer)));
        assert_eq!(state.type_of("MU"), Some(&TypeName::primitive(Primitive::Float)));
        assert_eq!(state.type_of("NAME"), Some(&TypeName::primitive(Primitive::String)));
    }

    #[test]
    fn test_multi_line_constant() {
        let state = track("defineConstant(\"P\",\n    5\n);");
        assert!(state.defined_constants.contains("P"));
        assert_eq!(type_name(&state, "P").as_deref(), Some("integer"));
    }

    #[test]
    fn test_constant_lookahead_limit() {
        // The value closes on the third line after the call.
        let within = track("defineConstant(\"D\",\n\n\n    2.5);");
        assert_eq!(type_name(&within, "D").as_deref(), Some("float"));

        // One line further is past the look-ahead: defined, but untyped.
        let beyond = track("defineConstant(\"D\",\n\n\n\n    2.5);");
        assert!(beyond.defined_constants.contains("D"));
        assert_eq!(type_name(&beyond, "D"), None);

        let lines = ["defineConstant(\"D\",", "", "", "", "    2.5);"];
        let config = EngineConfig {
            constant_lookahead_lines: 4,
            ..EngineConfig::default()
        };
        let wider = TrackingEngine::with_config(Arc::new(EmptyDocumentationStore), config)
            .track_lines(&lines);
        assert_eq!(type_name(&wider, "D").as_deref(), Some("float"));
    }

    #[test]
    fn test_constant_from_object_expression() {
        let state = track("defineConstant(\"POP\", sim.subpopulations[0]);");
        assert_eq!(type_name(&state, "POP").as_deref(), Some("Subpopulation"));
    }

    #[test]
    fn test_nominal_types() {
        let state = track(
            "initialize() {\n    initializeMutationType(\"m1\", 0.5, \"f\", 0.0);\n    initializeGenomicElementType(\"g1\", m1, 1.0);\n    initializeInteractionType(1, \"xy\");\n}",
        );
        assert!(state.defined_mutation_types.contains("m1"));
        assert!(state.defined_genomic_element_types.contains("g1"));
        assert!(state.defined_interaction_types.contains("i1"));
        assert_eq!(type_name(&state, "m1").as_deref(), Some("MutationType"));
        assert_eq!(type_name(&state, "g1").as_deref(), Some("GenomicElementType"));
        assert_eq!(type_name(&state, "i1").as_deref(), Some("InteractionType"));
    }

    #[test]
    fn test_script_blocks_and_species() {
        let state = track(
            "species fox initialize() {\n}\ns4 10 late() {\n    community.registerLateEvent(\"s7\", \"{}\", 20);\n}",
        );
        assert!(state.defined_species.contains("fox"));
        assert_eq!(type_name(&state, "fox").as_deref(), Some("Species"));
        assert!(state.defined_script_blocks.contains("s4"));
        assert!(state.defined_script_blocks.contains("s7"));
        assert_eq!(type_name(&state, "s7").as_deref(), Some("SLiMEidosBlock"));
    }

    #[test]
    fn test_model_type() {
        let state = track("initialize() {\n    initializeSLiMModelType(\"nonWF\");\n}");
        assert_eq!(state.model_type, Some(ModelType::NonWf));
    }

    #[test]
    fn test_user_function_with_doc() {
        let state = track(
            "// Computes a value\n// from x\nfunction (float)calc(float x) {\n    return x * 2;\n}",
        );
        let f = state.user_functions.get("calc").unwrap();
        assert_eq!(f.return_type, "float");
        assert_eq!(f.parameters, "float x");
        assert_eq!(f.signature, "(float)calc(float x)");
        assert_eq!(f.line, 2);
        assert_eq!(f.doc_comment.as_deref(), Some("Computes a value\nfrom x"));
    }

    #[test]
    fn test_callback_context_and_pseudo_parameters() {
        let state = track("1 early() {\n}\n5 mutationEffect(m1) {\n    return effect;\n}\n");
        assert_eq!(state.callback_at(0), Some("early"));
        assert_eq!(state.callback_at(2), Some("mutationEffect"));
        assert_eq!(state.callback_at(3), Some("mutationEffect"));
        assert_eq!(state.callback_at(5), None);
        assert_eq!(type_name(&state, "effect").as_deref(), Some("float"));
        assert_eq!(type_name(&state, "self").as_deref(), Some("SLiMEidosBlock"));
    }

    #[test]
    fn test_property_provenance() {
        let state = track("1 early() {\n    n = p1.individualCount;\n}");
        let source = state.property_assignments.get("n").unwrap();
        assert_eq!(source.class_name, "Subpopulation");
        assert_eq!(source.property_name, "individualCount");
        assert!(state.type_of("n").is_none());
    }

    #[test]
    fn test_unresolved_assignment_keeps_binding() {
        let state = track("a = p1.individuals;\na = foo(3);");
        assert_eq!(type_name(&state, "a").as_deref(), Some("Individual[]"));
    }

    #[test]
    fn test_comments_are_ignored() {
        let state = track("// x = p1.individuals;\n/* y = p1.individuals;\n z = p1; */");
        assert!(state.type_of("x").is_none());
        assert!(state.type_of("y").is_none());
        assert!(state.type_of("z").is_none());
    }

    #[test]
    fn test_unbalanced_input_does_not_abort() {
        let state = track("}}}\n\"unterminated {\nfor (i in 1:3) {\nx = p1.individuals;");
        assert_eq!(type_name(&state, "x").as_deref(), Some("Individual[]"));
        assert_eq!(state.loop_scopes.len(), 1);
        assert_eq!(state.loop_scopes[0].end_line, Some(3));
    }
}
