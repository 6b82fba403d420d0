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

//! Class names and Eidos type names.
//!
//! Every Eidos value is a vector. The tracker distinguishes a single element
//! (`Individual`) from a collection (`Individual[]`) because indexing a
//! collection yields a single element and member tables are keyed by the
//! element class.
//!
//! Documentation files use a different notation: `object<Individual>` is a
//! vector and a trailing `$` marks a singleton. [`TypeName::from_doc`] reads
//! that notation, [`TypeName::parse`] reads the canonical one.

use std::fmt;

/// Built-in classes of the simulation dialect, plus a fallback for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassName {
    Species,
    Community,
    Subpopulation,
    Individual,
    Haplosome,
    Mutation,
    MutationType,
    GenomicElement,
    GenomicElementType,
    InteractionType,
    Chromosome,
    Substitution,
    /// `SLiMEidosBlock`, the class of script blocks and `self` in callbacks.
    ScriptBlock,
    LogFile,
    Dictionary,
    DataFrame,
    Image,
    /// A class that is not part of the built-in catalogue.
    Other(String),
}

impl ClassName {
    /// All built-in classes, in catalogue order.
    pub const BUILT_IN: [ClassName; 17] = [
        ClassName::Species,
        ClassName::Community,
        ClassName::Subpopulation,
        ClassName::Individual,
        ClassName::Haplosome,
        ClassName::Mutation,
        ClassName::MutationType,
        ClassName::GenomicElement,
        ClassName::GenomicElementType,
        ClassName::InteractionType,
        ClassName::Chromosome,
        ClassName::Substitution,
        ClassName::ScriptBlock,
        ClassName::LogFile,
        ClassName::Dictionary,
        ClassName::DataFrame,
        ClassName::Image,
    ];

    /// Map a class name as written in scripts or documentation.
    ///
    /// `Genome` is the pre-5.0 name of `Haplosome` and maps to it.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Species" => Self::Species,
            "Community" => Self::Community,
            "Subpopulation" => Self::Subpopulation,
            "Individual" => Self::Individual,
            "Haplosome" | "Genome" => Self::Haplosome,
            "Mutation" => Self::Mutation,
            "MutationType" => Self::MutationType,
            "GenomicElement" => Self::GenomicElement,
            "GenomicElementType" => Self::GenomicElementType,
            "InteractionType" => Self::InteractionType,
            "Chromosome" => Self::Chromosome,
            "Substitution" => Self::Substitution,
            "SLiMEidosBlock" => Self::ScriptBlock,
            "LogFile" => Self::LogFile,
            "Dictionary" => Self::Dictionary,
            "DataFrame" => Self::DataFrame,
            "Image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Species => "Species",
            Self::Community => "Community",
            Self::Subpopulation => "Subpopulation",
            Self::Individual => "Individual",
            Self::Haplosome => "Haplosome",
            Self::Mutation => "Mutation",
            Self::MutationType => "MutationType",
            Self::GenomicElement => "GenomicElement",
            Self::GenomicElementType => "GenomicElementType",
            Self::InteractionType => "InteractionType",
            Self::Chromosome => "Chromosome",
            Self::Substitution => "Substitution",
            Self::ScriptBlock => "SLiMEidosBlock",
            Self::LogFile => "LogFile",
            Self::Dictionary => "Dictionary",
            Self::DataFrame => "DataFrame",
            Self::Image => "Image",
            Self::Other(name) => name,
        }
    }

    pub fn is_built_in(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eidos primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Integer,
    Float,
    String,
    Logical,
    Numeric,
    Void,
    Null,
    Object,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            "logical" => Some(Self::Logical),
            "numeric" => Some(Self::Numeric),
            "void" => Some(Self::Void),
            "NULL" => Some(Self::Null),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Logical => "logical",
            Self::Numeric => "numeric",
            Self::Void => "void",
            Self::Null => "NULL",
            Self::Object => "object",
        }
    }
}

/// The element type of a [`TypeName`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    Class(ClassName),
    Primitive(Primitive),
}

/// An inferred type: a base type plus a singleton/vector flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub base: BaseType,
    pub vector: bool,
}

impl TypeName {
    /// A single instance of `class`.
    pub fn class(class: ClassName) -> Self {
        Self {
            base: BaseType::Class(class),
            vector: false,
        }
    }

    /// A collection of `class` instances.
    pub fn class_vector(class: ClassName) -> Self {
        Self {
            base: BaseType::Class(class),
            vector: true,
        }
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self {
            base: BaseType::Primitive(primitive),
            vector: false,
        }
    }

    /// Parse the canonical notation: `Foo` or `Foo[]`.
    ///
    /// A trailing `$` is accepted as an explicit singleton marker.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (name, vector) = if let Some(stripped) = text.strip_suffix("[]") {
            (stripped, true)
        } else if let Some(stripped) = text.strip_suffix('$') {
            (stripped, false)
        } else {
            (text, false)
        };
        Self::from_parts(name, vector)
    }

    /// Parse the documentation notation.
    ///
    /// `object<Foo>` without a `$` is a vector, `object<Foo>$` a singleton.
    /// `No<Foo>` is the nullable shorthand and reads the same way.
    pub fn from_doc(text: &str) -> Option<Self> {
        let text = text.trim();
        let (name, vector) = if let Some(stripped) = text.strip_suffix("[]") {
            (stripped, true)
        } else if let Some(stripped) = text.strip_suffix('$') {
            (stripped, false)
        } else {
            (text, true)
        };
        Self::from_parts(name, vector)
    }

    fn from_parts(name: &str, vector: bool) -> Option<Self> {
        let name = name.trim();
        let inner = name
            .strip_prefix("object<")
            .or_else(|| name.strip_prefix("No<"))
            .and_then(|rest| rest.strip_suffix('>'));
        let name = inner.unwrap_or(name).trim();

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }

        let base = match Primitive::from_name(name) {
            Some(primitive) => BaseType::Primitive(primitive),
            None => BaseType::Class(ClassName::from_name(name)),
        };
        Some(Self { base, vector })
    }

    /// The element type of this type.
    pub fn singleton(&self) -> Self {
        Self {
            base: self.base.clone(),
            vector: false,
        }
    }

    /// The collection type of this type.
    pub fn to_vector(&self) -> Self {
        Self {
            base: self.base.clone(),
            vector: true,
        }
    }

    pub fn class_name(&self) -> Option<&ClassName> {
        match &self.base {
            BaseType::Class(class) => Some(class),
            BaseType::Primitive(_) => None,
        }
    }

    /// True if the base is `class`, regardless of the vector flag.
    pub fn is_class(&self, class: &ClassName) -> bool {
        self.class_name() == Some(class)
    }

    pub fn base_name(&self) -> &str {
        match &self.base {
            BaseType::Class(class) => class.as_str(),
            BaseType::Primitive(primitive) => primitive.as_str(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())?;
        if self.vector {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_round_trip() {
        for class in ClassName::BUILT_IN.iter() {
            assert_eq!(&ClassName::from_name(class.as_str()), class);
            assert!(class.is_built_in());
        }
    }

    #[test]
    fn test_unknown_class_is_other() {
        let class = ClassName::from_name("MyThing");
        assert_eq!(class, ClassName::Other("MyThing".to_string()));
        assert!(!class.is_built_in());
        assert_eq!(class.to_string(), "MyThing");
    }

    #[test]
    fn test_genome_alias() {
        assert_eq!(ClassName::from_name("Genome"), ClassName::Haplosome);
    }

    #[test]
    fn test_parse_canonical() {
        let single = TypeName::parse("Subpopulation").unwrap();
        assert_eq!(single, TypeName::class(ClassName::Subpopulation));

        let vector = TypeName::parse("Mutation[]").unwrap();
        assert_eq!(vector, TypeName::class_vector(ClassName::Mutation));
        assert_eq!(vector.to_string(), "Mutation[]");

        let int = TypeName::parse("integer").unwrap();
        assert_eq!(int, TypeName::primitive(Primitive::Integer));
    }

    #[test]
    fn test_parse_documentation_notation() {
        assert_eq!(
            TypeName::from_doc("object<Individual>"),
            Some(TypeName::class_vector(ClassName::Individual))
        );
        assert_eq!(
            TypeName::from_doc("object<Subpopulation>$"),
            Some(TypeName::class(ClassName::Subpopulation))
        );
        assert_eq!(
            TypeName::from_doc("No<Mutation>$"),
            Some(TypeName::class(ClassName::Mutation))
        );
        assert_eq!(
            TypeName::from_doc("float$"),
            Some(TypeName::primitive(Primitive::Float))
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(TypeName::parse(""), None);
        assert_eq!(TypeName::parse("a b"), None);
        assert_eq!(TypeName::from_doc("integer or float"), None);
    }

    #[test]
    fn test_singleton_and_vector_conversions() {
        let vector = TypeName::class_vector(ClassName::Haplosome);
        assert_eq!(vector.singleton(), TypeName::class(ClassName::Haplosome));
        assert_eq!(vector.singleton().to_vector(), vector);
        assert!(vector.is_class(&ClassName::Haplosome));
    }
}
