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

//! Reference documentation store.
//!
//! The store is a read-only map from identifier to documentation record. The
//! tracking engine consults it for member return types and the language
//! server renders its descriptions in hover and completion.
//!
//! # File layout
//!
//! [`JsonDocumentationStore::load_dir`] reads the following files from one
//! directory. Any of them may be missing.
//!
//! | File | Shape |
//! |------|-------|
//! | `slim_functions.json`, `eidos_functions.json` | `category -> name -> {signatures, description}` |
//! | `slim_classes.json`, `eidos_classes.json` | `class -> {constructor, methods, properties}` |
//! | `slim_callbacks.json` | `name -> {signature, description}` |
//! | `eidos_types.json` | `name -> {description}` |
//! | `eidos_operators.json` | `key -> {signature, description}` |

use crate::error::{SlimError, SlimResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Which dialect a documentation record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocSource {
    #[default]
    Eidos,
    Slim,
}

/// A built-in function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionDoc {
    /// First signature without its return type, e.g. `rnorm(integer$ n, ...)`.
    pub signature: String,
    /// All overloads as written in the documentation.
    pub signatures: Vec<String>,
    pub description: String,
    /// Return type of the first overload, e.g. `float`.
    pub return_type: String,
    pub source: DocSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MethodDoc {
    /// Signature with a leading return type, e.g. `(object<Individual>)sampleIndividuals(...)`.
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyDoc {
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConstructorDoc {
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassDoc {
    #[serde(default)]
    pub constructor: Option<ConstructorDoc>,
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDoc>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDoc>,
    #[serde(default)]
    pub source: DocSource,
}

impl ClassDoc {
    /// Cleaned constructor signature, if the class can be constructed.
    pub fn constructor_signature(&self) -> Option<String> {
        let raw = self.constructor.as_ref()?.signature.as_deref()?.trim();
        if raw.is_empty() || raw == "None" {
            return None;
        }
        Some(clean_signature(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallbackDoc {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDoc {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatorDoc {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub description: String,
}

/// Read-only access to reference documentation.
///
/// Implementors only provide the five maps. Single-name lookups have
/// default implementations on top of them.
pub trait DocumentationStore: Send + Sync {
    fn functions(&self) -> &BTreeMap<String, FunctionDoc>;
    fn classes(&self) -> &BTreeMap<String, ClassDoc>;
    fn callbacks(&self) -> &BTreeMap<String, CallbackDoc>;
    fn types(&self) -> &BTreeMap<String, TypeDoc>;
    fn operators(&self) -> &BTreeMap<String, OperatorDoc>;

    fn function(&self, name: &str) -> Option<&FunctionDoc> {
        self.functions().get(name)
    }

    fn class(&self, name: &str) -> Option<&ClassDoc> {
        self.classes().get(name)
    }

    fn callback(&self, name: &str) -> Option<&CallbackDoc> {
        self.callbacks().get(name)
    }

    fn type_doc(&self, name: &str) -> Option<&TypeDoc> {
        self.types().get(name)
    }

    fn operator(&self, name: &str) -> Option<&OperatorDoc> {
        self.operators().get(name)
    }

    fn method(&self, class: &str, name: &str) -> Option<&MethodDoc> {
        self.class(class)?.methods.get(name)
    }

    fn property(&self, class: &str, name: &str) -> Option<&PropertyDoc> {
        self.class(class)?.properties.get(name)
    }

    /// Look a callback up by the name used in block headers, e.g. `early`.
    ///
    /// Documentation keys callbacks by their full signature
    /// (`early() events`), so this matches on the signature prefix.
    fn callback_by_name(&self, name: &str) -> Option<&CallbackDoc> {
        if let Some(doc) = self.callback(name) {
            return Some(doc);
        }
        self.callbacks().iter().find_map(|(key, doc)| {
            let head = key.split('(').next().unwrap_or(key).trim();
            let head = head.rsplit(' ').next().unwrap_or(head);
            (head == name).then_some(doc)
        })
    }
}

static EMPTY_FUNCTIONS: BTreeMap<String, FunctionDoc> = BTreeMap::new();
static EMPTY_CLASSES: BTreeMap<String, ClassDoc> = BTreeMap::new();
static EMPTY_CALLBACKS: BTreeMap<String, CallbackDoc> = BTreeMap::new();
static EMPTY_TYPES: BTreeMap<String, TypeDoc> = BTreeMap::new();
static EMPTY_OPERATORS: BTreeMap<String, OperatorDoc> = BTreeMap::new();

/// A store with no entries, used when no documentation is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDocumentationStore;

impl DocumentationStore for EmptyDocumentationStore {
    fn functions(&self) -> &BTreeMap<String, FunctionDoc> {
        &EMPTY_FUNCTIONS
    }

    fn classes(&self) -> &BTreeMap<String, ClassDoc> {
        &EMPTY_CLASSES
    }

    fn callbacks(&self) -> &BTreeMap<String, CallbackDoc> {
        &EMPTY_CALLBACKS
    }

    fn types(&self) -> &BTreeMap<String, TypeDoc> {
        &EMPTY_TYPES
    }

    fn operators(&self) -> &BTreeMap<String, OperatorDoc> {
        &EMPTY_OPERATORS
    }
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    #[serde(default)]
    signatures: Vec<String>,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawOperator {
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    description: String,
}

/// Documentation loaded from JSON files.
#[derive(Debug, Clone, Default)]
pub struct JsonDocumentationStore {
    functions: BTreeMap<String, FunctionDoc>,
    classes: BTreeMap<String, ClassDoc>,
    callbacks: BTreeMap<String, CallbackDoc>,
    types: BTreeMap<String, TypeDoc>,
    operators: BTreeMap<String, OperatorDoc>,
}

impl JsonDocumentationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every known documentation file from `dir`.
    ///
    /// Missing files are skipped with a warning. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load_dir(dir: impl AsRef<Path>) -> SlimResult<Self> {
        let dir = dir.as_ref();
        let mut store = Self::new();

        if let Some(text) = read_optional(&dir.join("slim_functions.json"))? {
            store
                .add_functions_json(&text, DocSource::Slim)
                .map_err(|e| SlimError::json(dir.join("slim_functions.json"), e))?;
        }
        if let Some(text) = read_optional(&dir.join("eidos_functions.json"))? {
            store
                .add_functions_json(&text, DocSource::Eidos)
                .map_err(|e| SlimError::json(dir.join("eidos_functions.json"), e))?;
        }
        if let Some(text) = read_optional(&dir.join("slim_classes.json"))? {
            store
                .add_classes_json(&text, DocSource::Slim)
                .map_err(|e| SlimError::json(dir.join("slim_classes.json"), e))?;
        }
        if let Some(text) = read_optional(&dir.join("eidos_classes.json"))? {
            store
                .add_classes_json(&text, DocSource::Eidos)
                .map_err(|e| SlimError::json(dir.join("eidos_classes.json"), e))?;
        }
        if let Some(text) = read_optional(&dir.join("slim_callbacks.json"))? {
            store
                .add_callbacks_json(&text)
                .map_err(|e| SlimError::json(dir.join("slim_callbacks.json"), e))?;
        }
        if let Some(text) = read_optional(&dir.join("eidos_types.json"))? {
            store
                .add_types_json(&text)
                .map_err(|e| SlimError::json(dir.join("eidos_types.json"), e))?;
        }
        if let Some(text) = read_optional(&dir.join("eidos_operators.json"))? {
            store
                .add_operators_json(&text)
                .map_err(|e| SlimError::json(dir.join("eidos_operators.json"), e))?;
        }

        debug!(
            functions = store.functions.len(),
            classes = store.classes.len(),
            callbacks = store.callbacks.len(),
            types = store.types.len(),
            operators = store.operators.len(),
            "Loaded documentation from {}",
            dir.display()
        );

        Ok(store)
    }

    /// Add functions from a `category -> name -> {signatures, description}` document.
    ///
    /// The first signature provides the return type; the stored signature has
    /// the return type stripped.
    pub fn add_functions_json(
        &mut self,
        json: &str,
        source: DocSource,
    ) -> Result<(), serde_json::Error> {
        let raw: BTreeMap<String, BTreeMap<String, RawFunction>> = serde_json::from_str(json)?;
        for (name, entry) in raw.into_values().flatten() {
            let first = entry.signatures.first().cloned().unwrap_or_default();
            let (return_type, signature) = split_return_type(&first);
            self.functions.insert(
                name,
                FunctionDoc {
                    signature,
                    signatures: entry.signatures,
                    description: entry.description,
                    return_type,
                    source,
                },
            );
        }
        Ok(())
    }

    pub fn add_classes_json(&mut self, json: &str, source: DocSource) -> Result<(), serde_json::Error> {
        let raw: BTreeMap<String, ClassDoc> = serde_json::from_str(json)?;
        for (name, mut class) in raw {
            class.source = source;
            self.classes.insert(name, class);
        }
        Ok(())
    }

    /// Add callbacks; a trailing ` callbacks` or ` events` is dropped from signatures.
    pub fn add_callbacks_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let raw: BTreeMap<String, CallbackDoc> = serde_json::from_str(json)?;
        for (name, mut callback) in raw {
            let trimmed = callback.signature.trim_end();
            let trimmed = trimmed
                .strip_suffix(" callbacks")
                .or_else(|| trimmed.strip_suffix(" events"))
                .unwrap_or(trimmed);
            callback.signature = trimmed.to_string();
            self.callbacks.insert(name, callback);
        }
        Ok(())
    }

    pub fn add_types_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let raw: BTreeMap<String, TypeDoc> = serde_json::from_str(json)?;
        self.types.extend(raw);
        Ok(())
    }

    /// Add operators. One record may document several operators listed in
    /// its signature (`"+, -"`); each gets its own key.
    pub fn add_operators_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let raw: BTreeMap<String, RawOperator> = serde_json::from_str(json)?;
        for entry in raw.into_values() {
            let signature = entry.signature.unwrap_or_default();
            for key in signature.split(',') {
                let key: String = key.trim().chars().filter(|c| *c != '"' && *c != '\'').collect();
                if key.is_empty() {
                    continue;
                }
                self.operators.insert(
                    key,
                    OperatorDoc {
                        signature: signature.clone(),
                        description: entry.description.clone(),
                    },
                );
            }
        }
        Ok(())
    }
}

impl DocumentationStore for JsonDocumentationStore {
    fn functions(&self) -> &BTreeMap<String, FunctionDoc> {
        &self.functions
    }

    fn classes(&self) -> &BTreeMap<String, ClassDoc> {
        &self.classes
    }

    fn callbacks(&self) -> &BTreeMap<String, CallbackDoc> {
        &self.callbacks
    }

    fn types(&self) -> &BTreeMap<String, TypeDoc> {
        &self.types
    }

    fn operators(&self) -> &BTreeMap<String, OperatorDoc> {
        &self.operators
    }
}

fn read_optional(path: &Path) -> SlimResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Documentation file not found: {}", path.display());
            Ok(None)
        }
        Err(e) => Err(SlimError::io(path, e)),
    }
}

/// Split `(float)rnorm(integer$ n)` into `("float", "rnorm(integer$ n)")`.
///
/// A signature without a leading return type returns `void`.
pub fn split_return_type(signature: &str) -> (String, String) {
    let trimmed = signature.trim();
    if let Some(rest) = trimmed.strip_prefix('(') {
        if let Some(close) = rest.find(')') {
            let return_type = rest[..close].trim().to_string();
            let remainder = rest[close + 1..].trim_start().to_string();
            return (return_type, remainder);
        }
    }
    ("void".to_string(), trimmed.to_string())
}

/// One parameter of a documented or user-defined signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub type_name: String,
    pub name: String,
    /// True for `[type name = default]`.
    pub optional: bool,
    pub default: Option<String>,
    /// True for the `...` ellipsis.
    pub variadic: bool,
    /// The parameter as written.
    pub label: String,
}

/// Parse the parameter list of a signature.
///
/// Accepts either the whole signature (`name(type x, [type y = 1])`) or just
/// the text between its parentheses. A lone `void` means no parameters.
pub fn parse_parameters(text: &str) -> Vec<Parameter> {
    let text = text.trim();
    let text = if text.starts_with('(') {
        split_return_type(text).1
    } else {
        text.to_string()
    };

    let inner = match text.find('(') {
        Some(open) if is_identifier(text[..open].trim()) => {
            match crate::text::find_matching_close(&text, open) {
                Some(close) => &text[open + 1..close],
                None => &text[open + 1..],
            }
        }
        _ => text.as_str(),
    };

    crate::text::split_top_level_args(inner)
        .into_iter()
        .filter(|p| !p.is_empty() && p != "void")
        .map(|label| {
            if label == "..." {
                return Parameter {
                    type_name: String::new(),
                    name: "...".to_string(),
                    optional: true,
                    default: None,
                    variadic: true,
                    label,
                };
            }
            let optional = label.starts_with('[') && label.ends_with(']');
            let body = if optional {
                &label[1..label.len() - 1]
            } else {
                label.as_str()
            };
            let (decl, default) = match body.split_once('=') {
                Some((decl, default)) => (decl.trim(), Some(default.trim().to_string())),
                None => (body.trim(), None),
            };
            let (type_name, name) = match decl.rsplit_once(char::is_whitespace) {
                Some((ty, name)) => (ty.trim().to_string(), name.trim().to_string()),
                None => (decl.to_string(), String::new()),
            };
            Parameter {
                type_name,
                name,
                optional,
                default,
                variadic: false,
                label,
            }
        })
        .collect()
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

static SINGLETON_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+(?:<[^>]+>)?)\$").expect("static pattern must compile"));
static OBJECT_WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bobject<([^>]+)>").expect("static pattern must compile"));
static NULLABLE_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bNo<([^>]+)>").expect("static pattern must compile"));

static ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bNlif\b", "logical or integer or float"),
        (r"\bNlis\b", "logical or integer or string"),
        (r"\bNiso\b", "integer or string or object"),
        (r"\bNif\b", "integer or float"),
        (r"\bNis\b", "integer or string"),
        (r"\bNio\b", "integer or object"),
        (r"\bNfs\b", "float or string"),
        (r"\bNli\b", "logical or integer"),
        (r"\bNlo\b", "logical or object"),
        (r"\bNi\b", "integer"),
        (r"\bNl\b", "logical"),
        (r"\bNs\b", "string"),
        (r"\bNf\b", "float"),
        (r"\bNo\b", "object"),
    ]
    .into_iter()
    .map(|(re, text)| (Regex::new(re).expect("static pattern must compile"), text))
    .collect()
});

/// Make a documentation signature readable.
///
/// Drops singleton `$` markers, expands nullable type abbreviations such as
/// `Nif` and rewrites `object<Foo>` to `<Foo>`.
pub fn clean_signature(signature: &str) -> String {
    let text = SINGLETON_MARK.replace_all(signature, "$1");
    let mut text = NULLABLE_OBJECT.replace_all(&text, "object<$1>").into_owned();
    for (re, replacement) in ABBREVIATIONS.iter() {
        text = re.replace_all(&text, *replacement).into_owned();
    }
    OBJECT_WRAPPER.replace_all(&text, "<$1>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUNCTIONS: &str = r#"{
        "Distribution drawing": {
            "rnorm": {
                "signatures": ["(float)rnorm(integer$ n, [numeric mean = 0], [numeric sd = 1])"],
                "description": "Returns a vector of n normal draws."
            }
        }
    }"#;

    const CLASSES: &str = r#"{
        "Subpopulation": {
            "constructor": {"signature": "None"},
            "methods": {
                "sampleIndividuals": {
                    "signature": "(object<Individual>)sampleIndividuals(integer$ size)",
                    "description": "Samples individuals."
                }
            },
            "properties": {
                "individuals": {"type": "object<Individual>", "description": "All individuals."}
            }
        }
    }"#;

    #[test]
    fn test_functions_strip_return_type() {
        let mut store = JsonDocumentationStore::new();
        store.add_functions_json(FUNCTIONS, DocSource::Eidos).unwrap();
        let rnorm = store.function("rnorm").unwrap();
        assert_eq!(rnorm.return_type, "float");
        assert!(rnorm.signature.starts_with("rnorm(integer$ n"));
        assert_eq!(rnorm.signatures.len(), 1);
    }

    #[test]
    fn test_classes_methods_and_properties() {
        let mut store = JsonDocumentationStore::new();
        store.add_classes_json(CLASSES, DocSource::Slim).unwrap();
        assert!(store.method("Subpopulation", "sampleIndividuals").is_some());
        assert_eq!(
            store.property("Subpopulation", "individuals").unwrap().type_name,
            "object<Individual>"
        );
        assert_eq!(store.class("Subpopulation").unwrap().constructor_signature(), None);
        assert_eq!(store.class("Subpopulation").unwrap().source, DocSource::Slim);
    }

    #[test]
    fn test_callbacks_drop_suffix_and_lookup_by_name() {
        let mut store = JsonDocumentationStore::new();
        store
            .add_callbacks_json(
                r#"{"early() events": {"signature": "early() events", "description": "Early."}}"#,
            )
            .unwrap();
        let doc = store.callback_by_name("early").unwrap();
        assert_eq!(doc.signature, "early()");
        assert!(store.callback_by_name("late").is_none());
    }

    #[test]
    fn test_operators_split_keys() {
        let mut store = JsonDocumentationStore::new();
        store
            .add_operators_json(r#"{"arith": {"signature": "+, -", "description": "Math."}}"#)
            .unwrap();
        assert!(store.operator("+").is_some());
        assert!(store.operator("-").is_some());
    }

    #[test]
    fn test_load_dir_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("eidos_functions.json"), FUNCTIONS).unwrap();
        let store = JsonDocumentationStore::load_dir(dir.path()).unwrap();
        assert_eq!(store.functions().len(), 1);
        assert!(store.classes().is_empty());
    }

    #[test]
    fn test_load_dir_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("slim_classes.json"), "{ not json").unwrap();
        let err = JsonDocumentationStore::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SlimError::Json { .. }));
    }

    #[test]
    fn test_empty_store() {
        let store = EmptyDocumentationStore;
        assert!(store.function("rnorm").is_none());
        assert!(store.classes().is_empty());
    }

    #[test]
    fn test_parse_parameters() {
        let params = parse_parameters("rnorm(integer$ n, [numeric mean = 0], ...)");
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "n");
        assert_eq!(params[0].type_name, "integer$");
        assert!(params[1].optional);
        assert_eq!(params[1].default.as_deref(), Some("0"));
        assert!(params[2].variadic);

        assert!(parse_parameters("void").is_empty());
        assert_eq!(parse_parameters("float x, string y").len(), 2);

        let with_call_default = parse_parameters("float x, [float y = c(1, 2)]");
        assert_eq!(with_call_default.len(), 2);
        assert_eq!(with_call_default[1].default.as_deref(), Some("c(1, 2)"));

        let with_return = parse_parameters("(void)f(integer a)");
        assert_eq!(with_return.len(), 1);
        assert_eq!(with_return[0].name, "a");
    }

    #[test]
    fn test_clean_signature() {
        assert_eq!(
            clean_signature("(object<Individual>$)f(Nif x, No<Mutation>$ m)"),
            "(<Individual>)f(integer or float x, <Mutation> m)"
        );
    }
}
