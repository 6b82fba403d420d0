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

//! Expression type resolution.
//!
//! The resolver maps an expression's text to a [`TypeName`] without parsing
//! it. It works in four steps:
//!
//! 1. Reject expressions that are clearly numeric or logical: calls to
//!    aggregate or arithmetic builtins, and any top-level operator.
//! 2. Resolve the leading identifier through the variables in scope, a
//!    small table of conventional names and per-class naming patterns.
//! 3. Walk the chain of `.property`, `.method(...)` and `[index]` suffixes,
//!    looking members up in the documentation store first and the built-in
//!    member table second. Indexing turns a vector into a singleton.
//! 4. When the chain cannot be followed, fall back to the terminal member
//!    name alone (`x.y.individuals[0]` still yields `Individual`).
//!
//! An expression that matches none of this is unresolved. The resolver never
//! guesses.

use crate::docs::{split_return_type, DocumentationStore};
use crate::text::find_matching_close;
use crate::types::{BaseType, ClassName, Primitive, TypeName};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// A read-only name to type lookup.
///
/// Implemented by plain maps and by the scope view the tracking engine uses
/// during its pass, so resolution never has to materialise a merged map.
pub trait TypeLookup {
    fn type_of(&self, name: &str) -> Option<&TypeName>;
}

impl TypeLookup for HashMap<String, TypeName> {
    fn type_of(&self, name: &str) -> Option<&TypeName> {
        self.get(name)
    }
}

macro_rules! pattern {
    ($re:expr) => {
        Lazy::new(|| Regex::new($re).expect("static pattern must compile"))
    };
}

static NUMERIC_CALL: Lazy<Regex> = pattern!(
    r"^(?:size|length|sum|mean|max|min|range|sd|var|abs|sqrt|exp|log|log10|log2|round|floor|ceil|trunc|asInteger|asFloat|asString|asLogical|isNULL|isFloat|isInteger|isString|isLogical|isObject|exists|any|all|nchar|which|whichMax|whichMin|cumSum|cumProduct|product|tabulate|integerDiv|integerMod|rbinom|rnorm|runif|rpois|rexp|rgamma|rbeta|rdunif|rgeom|rlnorm|rcauchy|dnorm|identical|isFinite|isNAN|isInfinite|seq|seqLen|seqAlong|paste|paste0|format|strsplit|substr|nchar|cor|cov|median|quantile|ttest)\s*\("
);

static NUMERIC_METHOD_TAIL: Lazy<Regex> = pattern!(
    r"\.(?:size|length|sum|mean|count|countOfMutationsOfType|sumOfMutationsOfType|relatedness|sharedParentCount|contains|containsMutations|containsMarkerMutation|isNULL|nucleotides|positionsOfMutationsOfType|mutationFrequenciesInHaplosomes|mutationCountsInHaplosomes|mutationFrequencies|mutationCounts|cachedFitness|drawBreakpoints|distance|strength|totalOfNeighborStrengths|interactingNeighborCount)\s*\([^()]*\)\s*$"
);

static OPERATOR: Lazy<Regex> = pattern!(r"==|!=|<=|>=|&&|\|\||[-+*/%^<>!&|?:]");

static LEADING_IDENTIFIER: Lazy<Regex> = pattern!(r"^([A-Za-z_]\w*)");

static MEMBER_ACCESS: Lazy<Regex> = pattern!(r"\.([A-Za-z_]\w*)");

static SUBPOPULATION_ID: Lazy<Regex> = pattern!(r"^p\d+$");
static MUTATION_TYPE_ID: Lazy<Regex> = pattern!(r"^m\d+$");
static GENOMIC_ELEMENT_TYPE_ID: Lazy<Regex> = pattern!(r"^g\d+$");
static INTERACTION_TYPE_ID: Lazy<Regex> = pattern!(r"^i\d+$");

static MUTATIONS_OF_TYPE: Lazy<Regex> =
    pattern!(r"\b(?:unique[Mm]|m)utationsOfType\s*\(\s*([A-Za-z_]\w*)\s*\)");

static BARE_OR_INDEXED: Lazy<Regex> = pattern!(r"^([A-Za-z_]\w*)\s*(?:\[[^\]:]*\])?$");

static INTEGER_RANGE: Lazy<Regex> = pattern!(r"\d+\s*:\s*\d+");

static INTEGER_LITERAL: Lazy<Regex> = pattern!(r"^-?\d+$");
static FLOAT_LITERAL: Lazy<Regex> = pattern!(r"^-?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][-+]?\d+)?$");

/// Class of a conventional variable name, used only when the name is unbound.
fn conventional_class(name: &str) -> Option<ClassName> {
    match name {
        "sim" => Some(ClassName::Species),
        "community" => Some(ClassName::Community),
        "ind" | "individual" => Some(ClassName::Individual),
        "subpop" => Some(ClassName::Subpopulation),
        "genome" | "haplosome" => Some(ClassName::Haplosome),
        "mut" => Some(ClassName::Mutation),
        _ => None,
    }
}

/// Result type of a member when the documentation store has no entry for it.
fn builtin_member(class: &ClassName, member: &str) -> Option<TypeName> {
    use ClassName::*;
    let vector = |c: ClassName| Some(TypeName::class_vector(c));
    let single = |c: ClassName| Some(TypeName::class(c));

    match (class, member) {
        (Species, "subpopulations" | "subpopulationsWithIDs" | "subpopulationsWithNames") => {
            vector(Subpopulation)
        }
        (Species, "mutations" | "mutationsOfType") => vector(Mutation),
        (Species, "chromosomes") => vector(Chromosome),
        (Species, "chromosome") => single(Chromosome),
        (Species, "mutationTypes") => vector(MutationType),
        (Species, "genomicElementTypes") => vector(GenomicElementType),
        (Species, "substitutions") => vector(Substitution),
        (Species, "individualsWithPedigreeIDs") => vector(Individual),
        (Species, "addSubpop" | "addSubpopSplit") => single(Subpopulation),
        (Community, "allSpecies") => vector(Species),
        (Community, "allSubpopulations") => vector(Subpopulation),
        (Community, "allMutationTypes") => vector(MutationType),
        (Community, "allGenomicElementTypes") => vector(GenomicElementType),
        (Community, "allInteractionTypes") => vector(InteractionType),
        (Community, "logFiles") => vector(LogFile),
        (Community, "createLogFile") => single(LogFile),
        (Subpopulation, "individuals" | "sampleIndividuals" | "individualsWithPedigreeIDs") => {
            vector(Individual)
        }
        (Subpopulation, "subpopulations" | "subpopulationsWithIDs" | "subpopulationsWithNames") => {
            vector(Subpopulation)
        }
        (Subpopulation, "haplosomes" | "genomes") => vector(Haplosome),
        (Subpopulation, "species") => single(Species),
        (Individual, "genomes" | "haplosomes" | "genome1" | "genome2") => vector(Haplosome),
        (Individual, "subpopulation") => single(Subpopulation),
        (Individual, "uniqueMutations" | "uniqueMutationsOfType") => vector(Mutation),
        (Haplosome, "mutations" | "mutationsOfType" | "uniqueMutationsOfType") => vector(Mutation),
        (Haplosome, "individual") => single(Individual),
        (Mutation, "mutationType") => single(MutationType),
        (GenomicElementType, "mutationTypes") => vector(MutationType),
        (Chromosome, "genomicElements") => vector(GenomicElement),
        _ => None,
    }
}

/// Collection class of a member name, regardless of its receiver.
fn member_collection(member: &str) -> Option<TypeName> {
    let class = match member {
        "subpopulations" | "allSubpopulations" => ClassName::Subpopulation,
        "individuals" | "sampleIndividuals" => ClassName::Individual,
        "genomes" | "genome1" | "genome2" | "haplosomes" => ClassName::Haplosome,
        "mutations" | "mutationsOfType" | "uniqueMutationsOfType" => ClassName::Mutation,
        "mutationTypes" | "allMutationTypes" => ClassName::MutationType,
        "genomicElementTypes" | "allGenomicElementTypes" => ClassName::GenomicElementType,
        "interactionTypes" | "allInteractionTypes" => ClassName::InteractionType,
        "chromosomes" => ClassName::Chromosome,
        "logFiles" => ClassName::LogFile,
        "substitutions" => ClassName::Substitution,
        _ => return None,
    };
    Some(TypeName::class_vector(class))
}

/// Type of a literal: integer, float, string or logical.
pub fn literal_type(expression: &str) -> Option<TypeName> {
    let expr = expression.trim().trim_end_matches(';').trim();
    let primitive = if INTEGER_LITERAL.is_match(expr) {
        Primitive::Integer
    } else if FLOAT_LITERAL.is_match(expr) {
        Primitive::Float
    } else if (expr.starts_with('"') && expr.ends_with('"') && expr.len() >= 2)
        || (expr.starts_with('\'') && expr.ends_with('\'') && expr.len() >= 2)
    {
        Primitive::String
    } else if matches!(expr, "T" | "F" | "TRUE" | "FALSE") {
        Primitive::Logical
    } else {
        return None;
    };
    Some(TypeName::primitive(primitive))
}

/// Replace the contents of `(...)`, `[...]` and string literals with nothing.
///
/// `f(a + b)[i - 1].x` becomes `f()[].x`, so operator checks only see the
/// top level of an expression.
fn skeleton(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in expr.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
                if depth == 0 {
                    out.push(c);
                }
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                if depth == 0 {
                    out.push(c);
                }
            }
            '(' | '[' => {
                if depth == 0 {
                    out.push(c);
                }
                depth += 1;
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    out.push(c);
                }
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out
}

/// Resolves expression text to types.
pub struct TypeResolver<'a> {
    docs: &'a dyn DocumentationStore,
}

impl<'a> TypeResolver<'a> {
    pub fn new(docs: &'a dyn DocumentationStore) -> Self {
        Self { docs }
    }

    /// Resolve an identifier to a type.
    ///
    /// Order: bound variables, conventional names (`sim`, `ind`, ...), then
    /// naming patterns (`p1` is a `Subpopulation`, `m1` a `MutationType`).
    pub fn resolve_class_name(&self, name: &str, vars: &dyn TypeLookup) -> Option<TypeName> {
        if let Some(bound) = vars.type_of(name) {
            return Some(bound.clone());
        }
        if let Some(class) = conventional_class(name) {
            return Some(TypeName::class(class));
        }
        let class = if SUBPOPULATION_ID.is_match(name) {
            ClassName::Subpopulation
        } else if MUTATION_TYPE_ID.is_match(name) {
            ClassName::MutationType
        } else if GENOMIC_ELEMENT_TYPE_ID.is_match(name) {
            ClassName::GenomicElementType
        } else if INTERACTION_TYPE_ID.is_match(name) {
            ClassName::InteractionType
        } else {
            return None;
        };
        Some(TypeName::class(class))
    }

    /// Resolve the type of an expression, or `None` when it is unknown or
    /// clearly not an object.
    pub fn resolve_type(&self, expression: &str, vars: &dyn TypeLookup) -> Option<TypeName> {
        let expr = expression.trim();
        let expr = expr.strip_suffix(';').unwrap_or(expr).trim();
        if expr.is_empty() {
            return None;
        }

        if NUMERIC_CALL.is_match(expr) || NUMERIC_METHOD_TAIL.is_match(expr) {
            return None;
        }
        if OPERATOR.is_match(&skeleton(expr)) {
            return None;
        }

        if let Some(caps) = LEADING_IDENTIFIER.captures(expr) {
            let head = caps.get(1)?;
            let rest = &expr[head.end()..];
            let next = rest.trim_start().chars().next();

            match next {
                None => return self.resolve_class_name(head.as_str(), vars),
                Some('.') | Some('[') => {
                    if let Some(base) = self.resolve_class_name(head.as_str(), vars) {
                        if let Some(resolved) = self.walk_chain(base, rest) {
                            return Some(resolved);
                        }
                    }
                }
                Some('(') => {
                    if let Some(constructed) = self.constructor_type(head.as_str()) {
                        if rest.trim_start().starts_with('(') && is_single_call(rest) {
                            return Some(constructed);
                        }
                    }
                }
                _ => {}
            }
        }

        self.terminal_member_type(expr)
    }

    /// Type of each element of a `for` loop's collection.
    pub fn loop_variable_type(&self, collection: &str, vars: &dyn TypeLookup) -> Option<TypeName> {
        let checks: [(&str, ClassName); 6] = [
            (".individuals", ClassName::Individual),
            (".genomes", ClassName::Haplosome),
            (".haplosomes", ClassName::Haplosome),
            (".mutations", ClassName::Mutation),
            (".subpopulations", ClassName::Subpopulation),
            (".chromosomes", ClassName::Chromosome),
        ];
        for (fragment, class) in checks {
            if collection.contains(fragment) {
                return Some(TypeName::class(class));
            }
        }

        if INTEGER_RANGE.is_match(collection) {
            return Some(TypeName::primitive(Primitive::Integer));
        }
        if collection.contains("seqLen(") {
            return Some(TypeName::primitive(Primitive::Integer));
        }
        if collection.contains("seq(") {
            return Some(TypeName::primitive(Primitive::Numeric));
        }

        self.resolve_type(collection, vars).map(|t| t.singleton())
    }

    /// The mutation type that the mutations produced by `expression` belong to.
    ///
    /// Two shapes are recognised: a `mutationsOfType(X)` call where `X` is a
    /// declared mutation type, and a bare or indexed identifier that already
    /// carries a mutation type. Slices such as `x[0:5]` are not followed.
    pub fn mutation_type_source(
        &self,
        expression: &str,
        vars: &dyn TypeLookup,
        defined_mutation_types: &HashSet<String>,
        mutation_type_by_instance: &HashMap<String, String>,
    ) -> Option<String> {
        let expr = expression.trim().trim_end_matches(';').trim();

        if let Some(caps) = MUTATIONS_OF_TYPE.captures(expr) {
            let id = caps.get(1)?.as_str();
            let is_declared = defined_mutation_types.contains(id)
                || vars
                    .type_of(id)
                    .is_some_and(|t| *t == TypeName::class(ClassName::MutationType));
            if is_declared {
                return Some(id.to_string());
            }
        }

        let caps = BARE_OR_INDEXED.captures(expr)?;
        mutation_type_by_instance.get(caps.get(1)?.as_str()).cloned()
    }

    fn walk_chain(&self, base: TypeName, chain: &str) -> Option<TypeName> {
        let bytes = chain.as_bytes();
        let mut current = base;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'.' => {
                    let start = i + 1;
                    let mut end = start;
                    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                        end += 1;
                    }
                    if end == start {
                        return None;
                    }
                    let name = &chain[start..end];
                    let mut after = end;
                    while after < bytes.len() && bytes[after].is_ascii_whitespace() {
                        after += 1;
                    }
                    if bytes.get(after) == Some(&b'(') {
                        let close = find_matching_close(chain, after)?;
                        current = self.member_type(&current, name, true)?;
                        i = close + 1;
                    } else {
                        current = self.member_type(&current, name, false)?;
                        i = end;
                    }
                }
                b'[' => {
                    let close = find_matching_close(chain, i)?;
                    current = current.singleton();
                    i = close + 1;
                }
                b if b.is_ascii_whitespace() => i += 1,
                _ => return None,
            }
        }

        Some(current)
    }

    /// Result type of `receiver.member`, from documentation first.
    fn member_type(&self, receiver: &TypeName, member: &str, is_call: bool) -> Option<TypeName> {
        let class = receiver.class_name()?;

        let documented = if is_call {
            self.docs
                .method(class.as_str(), member)
                .map(|m| split_return_type(&m.signature).0)
        } else {
            self.docs
                .property(class.as_str(), member)
                .map(|p| p.type_name.clone())
        };

        if let Some(resolved) = documented.as_deref().and_then(TypeName::from_doc) {
            if resolved.base != BaseType::Primitive(Primitive::Object) {
                return Some(resolved);
            }
        }

        builtin_member(class, member)
    }

    fn constructor_type(&self, name: &str) -> Option<TypeName> {
        let class = ClassName::from_name(name);
        if class.is_built_in() || self.docs.class(name).is_some() {
            Some(TypeName::class(class))
        } else {
            None
        }
    }

    /// Fallback on the last `.member` of the expression, or its leading call.
    fn terminal_member_type(&self, expr: &str) -> Option<TypeName> {
        let (member, after) = match MEMBER_ACCESS.captures_iter(expr).last() {
            Some(caps) => {
                let m = caps.get(1)?;
                (m.as_str(), &expr[m.end()..])
            }
            None => {
                let caps = LEADING_IDENTIFIER.captures(expr)?;
                let m = caps.get(1)?;
                if !expr[m.end()..].trim_start().starts_with('(') {
                    return None;
                }
                (m.as_str(), &expr[m.end()..])
            }
        };

        let collection = member_collection(member)?;

        let mut rest = after.trim_start();
        if rest.starts_with('(') {
            let close = find_matching_close(rest, 0)?;
            rest = rest[close + 1..].trim_start();
        }
        if rest.starts_with('[') {
            Some(collection.singleton())
        } else {
            Some(collection)
        }
    }
}

/// True if `text` is exactly one parenthesised group, as in `(a, b)`.
fn is_single_call(text: &str) -> bool {
    let text = text.trim();
    matches!(find_matching_close(text, 0), Some(close) if close + 1 == text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::{DocSource, EmptyDocumentationStore, JsonDocumentationStore};

    fn vars(entries: &[(&str, &str)]) -> HashMap<String, TypeName> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), TypeName::parse(v).unwrap()))
            .collect()
    }

    fn resolve(expr: &str, scope: &HashMap<String, TypeName>) -> Option<String> {
        TypeResolver::new(&EmptyDocumentationStore)
            .resolve_type(expr, scope)
            .map(|t| t.to_string())
    }

    #[test]
    fn test_array_access_expressions() {
        let none = HashMap::new();
        assert_eq!(resolve("sim.subpopulations[0]", &none).as_deref(), Some("Subpopulation"));
        assert_eq!(resolve("p1.individuals[0]", &none).as_deref(), Some("Individual"));
        assert_eq!(
            resolve("p1.individuals[0].genomes[0]", &none).as_deref(),
            Some("Haplosome")
        );
    }

    #[test]
    fn test_chained_through_bound_variable() {
        let scope = vars(&[("genome", "Haplosome")]);
        assert_eq!(resolve("genome.mutations[0]", &scope).as_deref(), Some("Mutation"));
        assert_eq!(resolve("genome.mutations", &scope).as_deref(), Some("Mutation[]"));
    }

    #[test]
    fn test_numeric_aggregates_are_unresolved() {
        let none = HashMap::new();
        assert_eq!(resolve("size(p1.individuals)", &none), None);
        assert_eq!(resolve("sum(p1.individuals.age)", &none), None);
        assert_eq!(resolve("p1.individuals.size()", &none), None);
        assert_eq!(resolve("p1.individualCount + 1", &none), None);
        assert_eq!(resolve("x > 3", &none), None);
    }

    #[test]
    fn test_operators_inside_brackets_are_ignored() {
        let none = HashMap::new();
        assert_eq!(
            resolve("p1.individuals[p1.individuals.age > 2]", &none).as_deref(),
            Some("Individual")
        );
    }

    #[test]
    fn test_method_calls() {
        let none = HashMap::new();
        assert_eq!(
            resolve("sim.mutationsOfType(m1)[0]", &none).as_deref(),
            Some("Mutation")
        );
        assert_eq!(resolve("sim.mutationsOfType(m1)", &none).as_deref(), Some("Mutation[]"));
        assert_eq!(
            resolve("p1.sampleIndividuals(10)", &none).as_deref(),
            Some("Individual[]")
        );
    }

    #[test]
    fn test_terminal_member_fallback() {
        let none = HashMap::new();
        assert_eq!(
            resolve("sample(p1.individuals, 10)", &none).as_deref(),
            Some("Individual[]")
        );
        assert_eq!(
            resolve("unknownThing.foo.mutations[3]", &none).as_deref(),
            Some("Mutation")
        );
        assert_eq!(resolve("mutationsOfType(m1)", &none).as_deref(), Some("Mutation[]"));
        assert_eq!(resolve("whatever", &none), None);
        assert_eq!(resolve("5", &none), None);
    }

    #[test]
    fn test_constructor_call() {
        let none = HashMap::new();
        assert_eq!(resolve("Dictionary()", &none).as_deref(), Some("Dictionary"));
    }

    #[test]
    fn test_resolve_class_name_order() {
        let resolver = TypeResolver::new(&EmptyDocumentationStore);
        let scope = vars(&[("ind", "Subpopulation")]);
        assert_eq!(
            resolver.resolve_class_name("ind", &scope),
            Some(TypeName::class(ClassName::Subpopulation))
        );
        let none = HashMap::new();
        assert_eq!(
            resolver.resolve_class_name("ind", &none),
            Some(TypeName::class(ClassName::Individual))
        );
        assert_eq!(
            resolver.resolve_class_name("p12", &none),
            Some(TypeName::class(ClassName::Subpopulation))
        );
        assert_eq!(
            resolver.resolve_class_name("m3", &none),
            Some(TypeName::class(ClassName::MutationType))
        );
        assert_eq!(resolver.resolve_class_name("q1", &none), None);
    }

    #[test]
    fn test_documentation_takes_precedence() {
        let mut store = JsonDocumentationStore::new();
        store
            .add_classes_json(
                r#"{"Individual": {
                    "properties": {"age": {"type": "integer$", "description": ""}},
                    "methods": {"relatedness": {"signature": "(float)relatedness(object<Individual> individuals)", "description": ""}}
                }}"#,
                DocSource::Slim,
            )
            .unwrap();
        let resolver = TypeResolver::new(&store);
        let scope = vars(&[("ind", "Individual")]);
        assert_eq!(
            resolver.resolve_type("ind.age", &scope),
            Some(TypeName::primitive(Primitive::Integer))
        );
    }

    #[test]
    fn test_loop_variable_types() {
        let resolver = TypeResolver::new(&EmptyDocumentationStore);
        let none = HashMap::new();
        let t = |c: &str| resolver.loop_variable_type(c, &none).map(|t| t.to_string());
        assert_eq!(t("p1.individuals").as_deref(), Some("Individual"));
        assert_eq!(t("ind.haplosomes").as_deref(), Some("Haplosome"));
        assert_eq!(t("sim.mutationsOfType(m1)").as_deref(), Some("Mutation"));
        assert_eq!(t("sim.subpopulations").as_deref(), Some("Subpopulation"));
        assert_eq!(t("1:10").as_deref(), Some("integer"));
        assert_eq!(t("seqLen(5)").as_deref(), Some("integer"));
        assert_eq!(t("seq(0, 1, by = 0.1)").as_deref(), Some("numeric"));
        assert_eq!(t("community.allSpecies").as_deref(), Some("Species"));
    }

    #[test]
    fn test_mutation_type_source() {
        let resolver = TypeResolver::new(&EmptyDocumentationStore);
        let defined: HashSet<String> = ["m1".to_string()].into_iter().collect();
        let mut by_instance = HashMap::new();
        let none = HashMap::new();

        assert_eq!(
            resolver.mutation_type_source("sim.mutationsOfType(m1)", &none, &defined, &by_instance),
            Some("m1".to_string())
        );
        assert_eq!(
            resolver.mutation_type_source("sim.mutationsOfType(m2)", &none, &defined, &by_instance),
            None
        );

        by_instance.insert("muts".to_string(), "m1".to_string());
        assert_eq!(
            resolver.mutation_type_source("muts", &none, &defined, &by_instance),
            Some("m1".to_string())
        );
        assert_eq!(
            resolver.mutation_type_source("muts[0]", &none, &defined, &by_instance),
            Some("m1".to_string())
        );
        assert_eq!(
            resolver.mutation_type_source("muts[0:5]", &none, &defined, &by_instance),
            None
        );
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(literal_type("42").map(|t| t.to_string()).as_deref(), Some("integer"));
        assert_eq!(literal_type("1e-7").map(|t| t.to_string()).as_deref(), Some("float"));
        assert_eq!(literal_type("0.5").map(|t| t.to_string()).as_deref(), Some("float"));
        assert_eq!(literal_type("\"abc\"").map(|t| t.to_string()).as_deref(), Some("string"));
        assert_eq!(literal_type("T").map(|t| t.to_string()).as_deref(), Some("logical"));
        assert_eq!(literal_type("c(1, 2)"), None);
    }

    #[test]
    fn test_skeleton() {
        assert_eq!(skeleton("f(a + b)[i - 1].x"), "f()[].x");
        assert_eq!(skeleton(r#"g("a-b")"#), "g()");
    }
}
