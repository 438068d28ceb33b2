//! Python typing IR for overload generation.
//!
//! This module defines the structural model the synthesizer builds and the
//! emitter prints:
//! - TypeExpr: annotation expressions (names, generics, literals, optionals, unions)
//! - Param / OverloadDecl / ClassDecl: declarations
//! - Import / Module: the top-level container handed to the emitter

use serde::Deserialize;

/// A constant that may appear inside `Literal[...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// `True` / `False`
    Bool(bool),
    /// Integer constant: `42`, `-1`
    Int(i64),
    /// String constant: `'json'`
    Str(String),
    /// `None`
    None,
}

impl LiteralValue {
    /// Name of the builtin type this constant belongs to.
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Bool(_) => "bool",
            LiteralValue::Int(_) => "int",
            LiteralValue::Str(_) => "str",
            LiteralValue::None => "None",
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::Str(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        LiteralValue::Str(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Int(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Bool(value)
    }
}

/// Python type annotation expression.
///
/// Values are immutable once built and compare structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Bare or dotted name: `int`, `M.Pet`
    Name(String),
    /// Parameterized type: `dict[str, Any]`
    Generic {
        /// Subscripted type, usually a `Name`
        base: Box<TypeExpr>,
        /// Subscript arguments in source order
        args: Vec<TypeExpr>,
    },
    /// `Literal['a', 1, True]`
    Literal(Vec<LiteralValue>),
    /// `Optional[T]`
    Optional(Box<TypeExpr>),
    /// `A | B | C`, always at least two alternatives
    Union(Vec<TypeExpr>),
    /// Pre-formatted annotation text, echoed verbatim
    Raw(String),
}

impl TypeExpr {
    /// Create a name reference.
    pub fn name(name: impl Into<String>) -> Self {
        TypeExpr::Name(name.into())
    }

    /// Create a parameterized type with a named base.
    pub fn generic(base: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic {
            base: Box::new(TypeExpr::Name(base.into())),
            args,
        }
    }

    /// Create a single-value `Literal[...]` type.
    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        TypeExpr::Literal(vec![value.into()])
    }

    /// Create `Optional[inner]`.
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Optional(Box::new(inner))
    }

    /// Create a union, flattening nested unions and dropping repeated alternatives.
    ///
    /// A single remaining alternative is returned as-is; `None` if there are none.
    pub fn union(alternatives: Vec<TypeExpr>) -> Option<Self> {
        let mut flat: Vec<TypeExpr> = Vec::with_capacity(alternatives.len());
        for alt in alternatives {
            let parts = match alt {
                TypeExpr::Union(inner) => inner,
                other => vec![other],
            };
            for part in parts {
                if !flat.contains(&part) {
                    flat.push(part);
                }
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(TypeExpr::Union(flat)),
        }
    }

    /// Create a raw passthrough annotation.
    pub fn raw(text: impl Into<String>) -> Self {
        TypeExpr::Raw(text.into())
    }

    /// Check whether this expression or any nested one satisfies `pred`.
    pub fn any(&self, pred: &impl Fn(&TypeExpr) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        match self {
            TypeExpr::Generic { base, args } => base.any(pred) || args.iter().any(|a| a.any(pred)),
            TypeExpr::Optional(inner) => inner.any(pred),
            TypeExpr::Union(alts) => alts.iter().any(|a| a.any(pred)),
            TypeExpr::Name(_) | TypeExpr::Literal(_) | TypeExpr::Raw(_) => false,
        }
    }
}

/// Parameter role in a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Positional-or-keyword parameter
    Normal,
    /// The method receiver, unannotated and always first
    SelfRef,
    /// Keyword-only parameter, emitted after a bare `*`
    KeywordOnly,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Python identifier
    pub name: String,
    /// Annotation; `None` for the receiver
    pub ty: Option<TypeExpr>,
    /// Receiver, positional-or-keyword, or keyword-only
    pub kind: ParamKind,
}

impl Param {
    /// The `self` receiver.
    pub fn receiver() -> Self {
        Self {
            name: "self".into(),
            ty: None,
            kind: ParamKind::SelfRef,
        }
    }

    /// An annotated positional-or-keyword parameter.
    pub fn typed(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            kind: ParamKind::Normal,
        }
    }

    /// An annotated keyword-only parameter.
    pub fn keyword_only(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            kind: ParamKind::KeywordOnly,
        }
    }
}

/// Function body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// `...` placeholder under `@overload`
    Stub,
    /// Caller-supplied source text, opaque to the generator.
    ///
    /// On emission the text is dedented and every non-blank line is indented
    /// to the body level. This is line based: lines inside a multi-line
    /// string literal shift too, so a body that needs exact literal content
    /// should build it with `textwrap.dedent` or escaped `\n`.
    Implementation(String),
}

/// One function declaration: an `@overload` stub or the shared implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadDecl {
    /// Function name, shared by every member of an overload set
    pub name: String,
    /// Parameters in declaration order
    pub params: Vec<Param>,
    /// Annotation after `->`
    pub return_type: TypeExpr,
    /// Emit `async def`
    pub is_async: bool,
    /// Stub placeholder or implementation text
    pub body: Body,
}

impl OverloadDecl {
    /// Whether this is a typing-only stub.
    pub fn is_stub(&self) -> bool {
        matches!(self.body, Body::Stub)
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Class holding overloaded methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    /// Class name
    pub name: String,
    /// Leading documentation string
    pub docstring: Option<String>,
    /// Methods in emission order
    pub body: Vec<OverloadDecl>,
}

/// Top-level declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// Module-level function
    Function(OverloadDecl),
    /// Class wrapping methods
    Class(ClassDecl),
}

impl Decl {
    /// All function declarations reachable from this one.
    pub fn functions(&self) -> Vec<&OverloadDecl> {
        match self {
            Decl::Function(f) => vec![f],
            Decl::Class(c) => c.body.iter().collect(),
        }
    }
}

/// Import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// `from module import a, b`
    From {
        /// Dotted module path
        module: String,
        /// Imported names in emission order
        names: Vec<String>,
    },
    /// Verbatim import line supplied by the caller
    Raw(String),
}

/// Complete generated Python module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    /// Opaque text placed before everything else (license, "generated by" notice)
    pub header: Option<String>,
    /// Import lines, emitted in order
    pub imports: Vec<Import>,
    /// Top-level declarations
    pub body: Vec<Decl>,
}
