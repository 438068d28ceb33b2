//! Generator configuration and mapping input.
//!
//! Everything here deserializes with serde so a command wrapper can load it
//! from TOML or JSON. Parsing works on strings only; reading files is the
//! caller's job.

use std::collections::HashSet;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::builder::TypeDescriptor;
use crate::emit::Emit;
use crate::error::{ConfigurationError, ValidationError};
use crate::types::LiteralValue;
use crate::utils::is_valid_identifier;

const DEFAULT_KEY_PARAM: &str = "resource_name";
const DEFAULT_RETURN_FALLBACK: &str = "Any";

fn default_key_param() -> String {
    DEFAULT_KEY_PARAM.to_string()
}

fn default_return_fallback() -> TypeDescriptor {
    TypeDescriptor::Text(DEFAULT_RETURN_FALLBACK.to_string())
}

const fn default_true() -> bool {
    true
}

// =============================================================================
// Generator options
// =============================================================================

/// Options describing the overloaded function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Name shared by every generated declaration
    pub function_name: String,
    /// Discriminant parameter typed as `Literal[key]`
    #[serde(default = "default_key_param")]
    pub key_param: String,
    /// Parameters following the key, in order
    #[serde(default)]
    pub additional_params: Vec<ParamSpec>,
    /// Emit `async def`
    #[serde(default)]
    pub is_async: bool,
    /// Emit a leading `self` receiver
    #[serde(default = "default_true")]
    pub has_self: bool,
    /// Use each entry's type as the stub return type; otherwise always use the fallback
    #[serde(default = "default_true")]
    pub return_type_from_mapping: bool,
    /// Return type for entries without a type, and for the implementation
    #[serde(default = "default_return_fallback")]
    pub return_type_fallback: TypeDescriptor,
    /// Append one shared, non-stub implementation after the stubs
    #[serde(default)]
    pub include_implementation: bool,
    /// Implementation source, required when `include_implementation` is set
    #[serde(default)]
    pub implementation_body: Option<String>,
    /// Key parameter type on the implementation; inferred from the keys when absent
    #[serde(default)]
    pub implementation_key_type: Option<TypeDescriptor>,
}

impl GeneratorConfig {
    /// Configuration with defaults for everything but the function name.
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            key_param: default_key_param(),
            additional_params: Vec::new(),
            is_async: false,
            has_self: true,
            return_type_from_mapping: true,
            return_type_fallback: default_return_fallback(),
            include_implementation: false,
            implementation_body: None,
            implementation_key_type: None,
        }
    }

    /// Check names, parameter uniqueness and implementation settings.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_identifier("function_name", &self.function_name)?;

        if self.has_self && self.key_param == "self" {
            return Err(ConfigurationError::SelfParameterConflict {
                field: "key_param".into(),
            });
        }
        check_identifier("key_param", &self.key_param)?;

        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(self.key_param.as_str());
        for param in &self.additional_params {
            if self.has_self && param.name == "self" {
                return Err(ConfigurationError::SelfParameterConflict {
                    field: "additional_params".into(),
                });
            }
            check_identifier("additional_params", &param.name)?;
            if !seen.insert(param.name.as_str()) {
                return Err(ConfigurationError::DuplicateParameter {
                    name: param.name.clone(),
                });
            }
        }

        if self.include_implementation && self.implementation_text().is_none() {
            return Err(ConfigurationError::MissingImplementationBody);
        }

        Ok(())
    }

    /// Implementation body if present and not blank.
    pub fn implementation_text(&self) -> Option<&str> {
        self.implementation_body
            .as_deref()
            .filter(|body| !body.trim().is_empty())
    }
}

fn check_identifier(field: &str, value: &str) -> Result<(), ConfigurationError> {
    if is_valid_identifier(value) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// Additional parameter: `{ name = "id", type = "int" }` or `["id", "int"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ParamSpecRepr")]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Annotation descriptor
    pub ty: TypeDescriptor,
    /// Emit after the bare `*`
    pub keyword_only: bool,
}

impl ParamSpec {
    /// Positional-or-keyword parameter.
    pub fn new(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            keyword_only: false,
        }
    }

    /// Keyword-only parameter.
    pub fn keyword_only(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self {
            keyword_only: true,
            ..Self::new(name, ty)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParamSpecRepr {
    Pair(String, TypeDescriptor),
    Table {
        name: String,
        #[serde(rename = "type")]
        ty: TypeDescriptor,
        #[serde(default)]
        keyword_only: bool,
    },
}

impl From<ParamSpecRepr> for ParamSpec {
    fn from(repr: ParamSpecRepr) -> Self {
        match repr {
            ParamSpecRepr::Pair(name, ty) => Self::new(name, ty),
            ParamSpecRepr::Table {
                name,
                ty,
                keyword_only,
            } => Self {
                name,
                ty,
                keyword_only,
            },
        }
    }
}

// =============================================================================
// Mapping
// =============================================================================

/// One key with its (optional) result type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingEntry {
    /// Discriminant value
    pub key: LiteralValue,
    /// Result type; `None` means use the fallback
    #[serde(rename = "type", default)]
    pub descriptor: Option<TypeDescriptor>,
}

/// Ordered key to type mapping. Order decides the order of emitted overloads.
///
/// Duplicates are kept as given and rejected by [`Mapping::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
}

impl Mapping {
    /// Empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn insert(
        &mut self,
        key: impl Into<LiteralValue>,
        descriptor: impl Into<TypeDescriptor>,
    ) -> &mut Self {
        self.entries.push(MappingEntry {
            key: key.into(),
            descriptor: Some(descriptor.into()),
        });
        self
    }

    /// Append an entry without a type; it will use the fallback.
    pub fn insert_untyped(&mut self, key: impl Into<LiteralValue>) -> &mut Self {
        self.entries.push(MappingEntry {
            key: key.into(),
            descriptor: None,
        });
        self
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &LiteralValue> {
        self.entries.iter().map(|e| &e.key)
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject empty mappings and repeated keys.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.entries.is_empty() {
            return Err(ValidationError::EmptyMapping);
        }
        let mut seen: HashSet<&LiteralValue> = HashSet::with_capacity(self.entries.len());
        for key in self.keys() {
            if !seen.insert(key) {
                return Err(ValidationError::DuplicateKey { key: key.emit() });
            }
        }
        Ok(())
    }
}

impl<K, D> FromIterator<(K, D)> for Mapping
where
    K: Into<LiteralValue>,
    D: Into<TypeDescriptor>,
{
    fn from_iter<I: IntoIterator<Item = (K, D)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (key, descriptor) in iter {
            mapping.insert(key, descriptor);
        }
        mapping
    }
}

impl From<Vec<MappingEntry>> for Mapping {
    fn from(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }
}

/// Accepts a table/object (`{ "a": "int" }`, string keys) or a list of
/// `{ key, type }` entries (typed keys). Repeated object keys are kept so
/// validation can report them instead of silently keeping the last one.
impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = Mapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of key = type pairs or a list of { key, type } entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Mapping, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, descriptor)) =
                    map.next_entry::<String, Option<TypeDescriptor>>()?
                {
                    entries.push(MappingEntry {
                        key: LiteralValue::Str(key),
                        descriptor,
                    });
                }
                Ok(Mapping { entries })
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Mapping, A::Error> {
                let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(entry) = seq.next_element::<MappingEntry>()? {
                    entries.push(entry);
                }
                Ok(Mapping { entries })
            }
        }

        deserializer.deserialize_any(MappingVisitor)
    }
}

// =============================================================================
// Output options and documents
// =============================================================================

/// Class wrapping options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassOptions {
    /// Class name
    pub name: String,
    /// Emit a class docstring
    #[serde(default = "default_true")]
    pub include_docstring: bool,
    /// Docstring text; defaults to "<name> class."
    #[serde(default)]
    pub docstring: Option<String>,
}

impl ClassOptions {
    /// Options for a class with the default docstring.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include_docstring: true,
            docstring: None,
        }
    }
}

/// How the generated declarations are packaged into a module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputOptions {
    /// Opaque text emitted first
    #[serde(default)]
    pub header: Option<String>,
    /// Emit the `from typing import ...` line for names the output uses
    #[serde(default = "default_true")]
    pub typing_import: bool,
    /// Import lines appended after the typing import, in order
    #[serde(default)]
    pub extra_imports: Vec<String>,
    /// Wrap the overloads as methods of this class
    #[serde(default)]
    pub class: Option<ClassOptions>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            header: None,
            typing_import: true,
            extra_imports: Vec::new(),
            class: None,
        }
    }
}

/// A complete generation request as stored in a configuration file.
///
/// ```toml
/// [generator]
/// function_name = "get_resource"
/// additional_params = [["id", "int"]]
///
/// [output]
/// extra_imports = ["import seerapi_models as M"]
///
/// [mapping]
/// pet = "M.Pet"
/// skill = "M.Skill"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationDocument {
    /// Function options
    pub generator: GeneratorConfig,
    /// Module packaging
    #[serde(default)]
    pub output: OutputOptions,
    /// Key to type mapping
    pub mapping: Mapping,
}

impl GenerationDocument {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(source).map_err(|err| ConfigurationError::Parse {
            format: "TOML",
            message: err.to_string(),
        })
    }

    /// Parse a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(source).map_err(|err| ConfigurationError::Parse {
            format: "JSON",
            message: err.to_string(),
        })
    }
}
