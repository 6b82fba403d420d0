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

//! Completion for SLiM and Eidos scripts.
//!
//! After `object.` the members of the object's inferred class are offered.
//! Everywhere else the list holds built-in functions, class constructors,
//! callbacks, operators, functions defined in the document and the variables
//! visible at the cursor.

use crate::analysis::AnalyzedDocument;
use crate::constants::USER_FUNCTION_SORT_PREFIX;
use slim_core::docs::{clean_signature, split_return_type};
use slim_core::position::completion_context;
use slim_core::{CompletionContext, DocumentationStore, TypeResolver};
use tower_lsp::lsp_types::*;
use tracing::debug;

/// Get completion items for a position.
pub fn get_completions(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    position: Position,
) -> Vec<CompletionItem> {
    let Some(line) = analysis.line(position.line) else {
        return Vec::new();
    };
    let column = analysis.column(position).unwrap_or(0);

    match completion_context(line, 0, column) {
        CompletionContext::Member { object, .. } => {
            member_completions(analysis, docs, position.line as usize, &object)
        }
        CompletionContext::Global { .. } => {
            global_completions(analysis, docs, position.line as usize)
        }
    }
}

fn member_completions(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    line: usize,
    object: &str,
) -> Vec<CompletionItem> {
    let vars = analysis.scope_at(line);
    let class = match TypeResolver::new(docs).resolve_type(object, &vars) {
        Some(ty) => match ty.class_name() {
            Some(class) => class.as_str().to_string(),
            None => return Vec::new(),
        },
        None => object.to_string(),
    };
    let Some(class_doc) = docs.class(&class) else {
        debug!("No documentation for class {} of {}", class, object);
        return Vec::new();
    };

    let methods = class_doc.methods.iter().map(|(name, method)| {
        let (_, signature) = split_return_type(&method.signature);
        CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::METHOD),
            detail: Some(clean_signature(&signature)),
            documentation: Some(markdown(format!(
                "**{}.{}** (method)\n\n```slim\n{}\n```\n\n{}",
                class,
                name,
                clean_signature(&method.signature),
                method.description
            ))),
            ..Default::default()
        }
    });
    let properties = class_doc.properties.iter().map(|(name, property)| CompletionItem {
        label: name.clone(),
        kind: Some(CompletionItemKind::PROPERTY),
        detail: Some(format!("Type: {}", clean_signature(&property.type_name))),
        documentation: Some(markdown(format!(
            "**{}.{}** (property)\n\n{}",
            class, name, property.description
        ))),
        ..Default::default()
    });

    methods.chain(properties).collect()
}

fn global_completions(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    line: usize,
) -> Vec<CompletionItem> {
    let mut items = Vec::new();

    for (name, function) in docs.functions() {
        items.push(CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(clean_signature(&function.signature)),
            documentation: Some(markdown(function.description.clone())),
            ..Default::default()
        });
    }

    for (name, class) in docs.classes() {
        if let Some(signature) = class.constructor_signature() {
            items.push(CompletionItem {
                label: name.clone(),
                kind: Some(CompletionItemKind::CONSTRUCTOR),
                detail: Some(signature),
                documentation: class
                    .constructor
                    .as_ref()
                    .and_then(|c| c.description.clone())
                    .map(markdown),
                ..Default::default()
            });
        }
    }

    for (key, callback) in docs.callbacks() {
        let label = key.split('(').next().unwrap_or(key).trim();
        let label = label.rsplit(' ').next().unwrap_or(label);
        items.push(CompletionItem {
            label: label.to_string(),
            kind: Some(CompletionItemKind::EVENT),
            detail: Some(clean_signature(&callback.signature)),
            documentation: Some(markdown(callback.description.clone())),
            ..Default::default()
        });
    }

    for (symbol, operator) in docs.operators() {
        items.push(CompletionItem {
            label: symbol.clone(),
            kind: Some(CompletionItemKind::OPERATOR),
            detail: Some(operator.signature.clone()),
            documentation: Some(markdown(operator.description.clone())),
            ..Default::default()
        });
    }

    for function in analysis.state.user_functions.values() {
        items.push(CompletionItem {
            label: function.name.clone(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(function.signature.clone()),
            documentation: function.doc_comment.clone().map(markdown),
            sort_text: Some(format!("{}{}", USER_FUNCTION_SORT_PREFIX, function.name)),
            ..Default::default()
        });
    }

    for (name, ty) in analysis.variables_at(line) {
        let detail = match analysis.state.mutation_type_by_instance.get(&name) {
            Some(mutation_type) => format!("{} ({})", ty, mutation_type),
            None => ty.to_string(),
        };
        items.push(CompletionItem {
            label: name,
            kind: Some(CompletionItemKind::VARIABLE),
            detail: Some(detail),
            ..Default::default()
        });
    }

    items
}

fn markdown(value: String) -> Documentation {
    Documentation::MarkupContent(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    })
}
