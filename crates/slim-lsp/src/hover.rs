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

//! Hover information for SLiM and Eidos scripts.
//!
//! # Resolution Order
//!
//! 1. An object bound in scope: its inferred class
//! 2. A member after `.`: method or property documentation of the receiver's class
//! 3. A variable assigned from `object.property`: where its value came from
//! 4. A built-in function
//! 5. A function defined in the document
//! 6. A callback name
//! 7. An Eidos type name
//! 8. A pseudo-parameter of the enclosing callback

use crate::analysis::AnalyzedDocument;
use crate::utils::char_range;
use slim_core::callbacks::pseudo_parameters;
use slim_core::docs::{
    clean_signature, split_return_type, DocSource, FunctionDoc, MethodDoc, PropertyDoc,
};
use slim_core::position::word_at_in_line;
use slim_core::{ClassName, DocumentationStore, TypeLookup, TypeName, TypeResolver, UserFunction};
use tower_lsp::lsp_types::*;

/// Get hover information for a position.
///
/// Returns `None` when the cursor is not on an identifier or nothing is
/// known about it.
pub fn get_hover(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    position: Position,
) -> Option<Hover> {
    let line_index = position.line as usize;
    let line = analysis.line(position.line)?;
    let column = analysis.column(position)?;
    let word = word_at_in_line(line, column)?;

    let vars = analysis.scope_at(line_index);
    let markdown = hover_markdown(analysis, docs, &vars, &word.word, word.object.as_deref(), line_index)?;

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: markdown,
        }),
        range: Some(char_range(line_index, line, word.start, word.end)),
    })
}

fn hover_markdown(
    analysis: &AnalyzedDocument,
    docs: &dyn DocumentationStore,
    vars: &dyn TypeLookup,
    word: &str,
    object: Option<&str>,
    line: usize,
) -> Option<String> {
    let state = &analysis.state;

    if let Some(object) = object {
        if let Some(markdown) = member_markdown(docs, vars, object, word) {
            return Some(markdown);
        }
    } else if let Some(ty) = vars.type_of(word).filter(|ty| ty.class_name().is_some()) {
        return Some(instance_markdown(
            word,
            ty,
            state.mutation_type_by_instance.get(word).map(String::as_str),
        ));
    }

    if let Some(source) = state.property_assignments.get(word) {
        if let Some(property) = docs.property(&source.class_name, &source.property_name) {
            return Some(format!(
                "**{}** ← `{}.{}`\n\n**Type:** `{}`\n\n{}",
                word,
                source.class_name,
                source.property_name,
                clean_signature(&property.type_name),
                property.description
            ));
        }
    }

    if let Some(function) = docs.function(word) {
        return Some(function_markdown(word, function));
    }

    if let Some(function) = state.user_functions.get(word) {
        return Some(user_function_markdown(function));
    }

    if let Some(callback) = docs.callback_by_name(word) {
        let signature = if callback.signature.is_empty() {
            format!("{}()", word)
        } else {
            clean_signature(&callback.signature)
        };
        return Some(format!(
            "**{}()** (callback)\n\n```slim\n{}\n```\n\n{}",
            word, signature, callback.description
        ));
    }

    if let Some(type_doc) = docs.type_doc(word) {
        return Some(format!("**{}** (type)\n\n{}", word, type_doc.description));
    }

    let callback = state.callback_at(line)?;
    let (_, ty) = pseudo_parameters(callback)
        .into_iter()
        .find(|(name, _)| *name == word)?;
    Some(format!(
        "**{}** (pseudo-parameter of `{}()`)\n\n**Type:** `{}`",
        word, callback, ty
    ))
}

/// Documentation for `object.word`.
///
/// `LogFile` members not documented on the class itself are looked up on
/// `Dictionary`, which it extends.
fn member_markdown(
    docs: &dyn DocumentationStore,
    vars: &dyn TypeLookup,
    object: &str,
    word: &str,
) -> Option<String> {
    let resolver = TypeResolver::new(docs);
    let class = match resolver.resolve_type(object, vars) {
        Some(ty) => ty.class_name()?.as_str().to_string(),
        None if docs.class(object).is_some() => object.to_string(),
        None => return None,
    };

    let dictionary = ClassName::Dictionary;
    let mut owners = vec![class.as_str()];
    if ClassName::from_name(&class) == ClassName::LogFile {
        owners.push(dictionary.as_str());
    }

    owners.into_iter().find_map(|owner| {
        if let Some(method) = docs.method(owner, word) {
            return Some(method_markdown(&class, word, method));
        }
        docs.property(owner, word)
            .map(|property| property_markdown(&class, word, property))
    })
}

fn instance_markdown(word: &str, ty: &TypeName, mutation_type: Option<&str>) -> String {
    let mut markdown = format!("**{}** (instance of {})", word, ty);
    if let Some(mutation_type) = mutation_type {
        markdown.push_str(&format!("\n\n**Mutation type:** `{}`", mutation_type));
    }
    markdown
}

fn method_markdown(class: &str, name: &str, method: &MethodDoc) -> String {
    let (return_type, signature) = split_return_type(&method.signature);
    format!(
        "**{}.{}** (method)\n\n**Return Type:** `{}`\n\n```slim\n{}\n```\n\n{}",
        class,
        name,
        clean_signature(&return_type),
        clean_signature(&signature),
        method.description
    )
}

fn property_markdown(class: &str, name: &str, property: &PropertyDoc) -> String {
    format!(
        "**{}.{}** (property)\n\n**Type:** `{}`\n\n{}",
        class,
        name,
        clean_signature(&property.type_name),
        property.description
    )
}

fn function_markdown(name: &str, function: &FunctionDoc) -> String {
    let source = match function.source {
        DocSource::Eidos => "Eidos",
        DocSource::Slim => "SLiM",
    };
    format!(
        "**{}** ({} function)\n\n**Return Type:** `{}`\n\n```slim\n{}\n```\n\n{}",
        name,
        source,
        clean_signature(&function.return_type),
        clean_signature(&function.signature),
        function.description
    )
}

fn user_function_markdown(function: &UserFunction) -> String {
    let mut markdown = format!(
        "**{}** (user-defined function)\n\n**Return Type:** `{}`\n\n```slim\n{}({})\n```",
        function.name,
        clean_signature(&function.return_type),
        function.name,
        function.parameters
    );
    if let Some(doc) = &function.doc_comment {
        markdown.push_str("\n\n");
        markdown.push_str(doc);
    }
    markdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use slim_core::{EmptyDocumentationStore, JsonDocumentationStore, TrackingEngine};
    use std::sync::Arc;

    const CLASSES: &str = r#"{
        "Individual": {
            "properties": {
                "age": {"type": "integer$", "description": "The age of the individual."}
            },
            "methods": {
                "countOfMutationsOfType": {
                    "signature": "(integer$)countOfMutationsOfType(io<MutationType>$ mutType)",
                    "description": "Counts mutations."
                }
            }
        }
    }"#;

    fn store() -> Arc<dyn DocumentationStore> {
        let mut store = JsonDocumentationStore::new();
        store.add_classes_json(CLASSES, DocSource::Slim).unwrap();
        Arc::new(store)
    }

    fn hover_text(docs: Arc<dyn DocumentationStore>, text: &str, line: u32, character: u32) -> Option<String> {
        let engine = TrackingEngine::new(Arc::clone(&docs));
        let analysis = AnalyzedDocument::from_text(&engine, text);
        let hover = get_hover(&analysis, docs.as_ref(), Position { line, character })?;
        match hover.contents {
            HoverContents::Markup(content) => Some(content.value),
            _ => None,
        }
    }

    #[test]
    fn test_instance_hover() {
        let text = "1 early() {\n    ind = p1.individuals[0];\n}";
        let value = hover_text(Arc::new(EmptyDocumentationStore), text, 1, 5).unwrap();
        assert_eq!(value, "**ind** (instance of Individual)");
    }

    #[test]
    fn test_member_hover_uses_receiver_class() {
        let text = "ind = p1.individuals[0];\nx = ind.age;";
        let value = hover_text(store(), text, 1, 9).unwrap();
        assert!(value.starts_with("**Individual.age** (property)"));
        assert!(value.contains("`integer`"));
    }

    #[test]
    fn test_property_provenance() {
        let text = "ind = p1.individuals[0];\nvalue = ind.age;\ny = value;";
        let value = hover_text(store(), text, 2, 5).unwrap();
        assert!(value.starts_with("**value** ← `Individual.age`"));
    }

    #[test]
    fn test_user_function_hover_with_doc_comment() {
        let text = "// Doubles its input.\nfunction (float)twice(float x) {\n    return 2 * x;\n}\ny = twice(2.0);";
        let value = hover_text(Arc::new(EmptyDocumentationStore), text, 4, 5).unwrap();
        assert!(value.starts_with("**twice** (user-defined function)"));
        assert!(value.contains("**Return Type:** `float`"));
        assert!(value.contains("twice(float x)"));
        assert!(value.ends_with("Doubles its input."));
    }

    #[test]
    fn test_pseudo_parameter_hover() {
        let text = "2 mutationEffect(m1) {\n    return effect * 1.1;\n}";
        let value = hover_text(Arc::new(EmptyDocumentationStore), text, 1, 13).unwrap();
        assert!(value.contains("pseudo-parameter of `mutationEffect()`"));
        assert!(value.contains("`float`"));
    }

    #[test]
    fn test_no_hover_on_whitespace() {
        let text = "x = 1;\n\n";
        assert!(hover_text(Arc::new(EmptyDocumentationStore), text, 1, 0).is_none());
    }
}
