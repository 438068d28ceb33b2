//! Python code emission via the Emit trait.
//!
//! Every IR node converts itself to source text. Emission is infallible and
//! deterministic: the same structure always yields byte-identical output.
//!
//! Layout rules:
//! - imports one per line, then exactly one blank line
//! - two blank lines between top-level declarations, one between methods
//! - four-space indentation, a single trailing newline

use super::types::{
    Body, ClassDecl, Decl, Import, LiteralValue, Module, OverloadDecl, Param, ParamKind, TypeExpr,
};
use super::utils::{
    INDENT, dedent, escape_docstring, indent_lines, quote_py_string, strip_margin,
};

/// Trait for emitting Python source from IR nodes.
pub trait Emit {
    /// Convert the node to its Python source representation.
    fn emit(&self) -> String;
}

// =============================================================================
// Types
// =============================================================================

impl Emit for LiteralValue {
    fn emit(&self) -> String {
        match self {
            LiteralValue::Str(s) => quote_py_string(s),
            LiteralValue::Int(i) => i.to_string(),
            LiteralValue::Bool(true) => "True".to_string(),
            LiteralValue::Bool(false) => "False".to_string(),
            LiteralValue::None => "None".to_string(),
        }
    }
}

impl Emit for TypeExpr {
    fn emit(&self) -> String {
        match self {
            TypeExpr::Name(name) => name.clone(),
            TypeExpr::Generic { base, args } => {
                if args.is_empty() {
                    format!("{}[()]", base.emit())
                } else {
                    format!("{}[{}]", base.emit(), join(args, ", "))
                }
            }
            TypeExpr::Literal(values) => format!("Literal[{}]", join(values, ", ")),
            TypeExpr::Optional(inner) => format!("Optional[{}]", inner.emit()),
            TypeExpr::Union(alts) => join(alts, " | "),
            TypeExpr::Raw(text) => text.clone(),
        }
    }
}

fn join<T: Emit>(items: &[T], sep: &str) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(sep)
}

// =============================================================================
// Declarations
// =============================================================================

impl Emit for Param {
    fn emit(&self) -> String {
        match &self.ty {
            Some(ty) => format!("{}: {}", self.name, ty.emit()),
            None => self.name.clone(),
        }
    }
}

/// Emit a parameter list, inserting the bare `*` before the first keyword-only parameter.
fn emit_params(params: &[Param]) -> String {
    let mut parts = Vec::with_capacity(params.len() + 1);
    let mut star_emitted = false;
    for param in params {
        if param.kind == ParamKind::KeywordOnly && !star_emitted {
            parts.push("*".to_string());
            star_emitted = true;
        }
        parts.push(param.emit());
    }
    parts.join(", ")
}

impl Emit for OverloadDecl {
    fn emit(&self) -> String {
        self.emit_indented(0)
    }
}

impl OverloadDecl {
    /// Emit with specified indentation level (4 spaces per level).
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = INDENT.repeat(indent);
        let body_prefix = INDENT.repeat(indent + 1);
        let mut output = String::new();

        if self.is_stub() {
            output.push_str(&format!("{prefix}@overload\n"));
        }

        let async_str = if self.is_async { "async " } else { "" };
        output.push_str(&format!(
            "{prefix}{async_str}def {}({}) -> {}:\n",
            self.name,
            emit_params(&self.params),
            self.return_type.emit()
        ));

        match &self.body {
            Body::Stub => output.push_str(&format!("{body_prefix}...\n")),
            Body::Implementation(code) => {
                let lines = dedent(code);
                if lines.is_empty() {
                    output.push_str(&format!("{body_prefix}...\n"));
                } else {
                    output.push_str(&indent_lines(lines, &body_prefix));
                }
            }
        }

        output
    }
}

impl Emit for ClassDecl {
    fn emit(&self) -> String {
        self.emit_indented(0)
    }
}

impl ClassDecl {
    /// Emit with specified indentation level (4 spaces per level).
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = INDENT.repeat(indent);
        let member_prefix = INDENT.repeat(indent + 1);
        let mut members: Vec<String> = Vec::with_capacity(self.body.len() + 1);

        if let Some(doc) = &self.docstring {
            let escaped = escape_docstring(doc);
            let lines: Vec<&str> = escaped.lines().collect();
            let (first, rest) = lines.split_first().map_or(("", &[][..]), |(f, r)| (*f, r));
            let mut docstring = format!("{member_prefix}\"\"\"{first}");
            for line in strip_margin(rest) {
                docstring.push('\n');
                if !line.is_empty() {
                    docstring.push_str(&member_prefix);
                    docstring.push_str(line);
                }
            }
            if rest.last().is_some_and(|l| l.trim().is_empty()) {
                docstring.push_str(&member_prefix);
            }
            docstring.push_str("\"\"\"\n");
            members.push(docstring);
        }

        members.extend(self.body.iter().map(|m| m.emit_indented(indent + 1)));

        if members.is_empty() {
            members.push(format!("{member_prefix}pass\n"));
        }

        format!("{prefix}class {}:\n{}", self.name, members.join("\n"))
    }
}

impl Emit for Decl {
    fn emit(&self) -> String {
        match self {
            Decl::Function(f) => f.emit(),
            Decl::Class(c) => c.emit(),
        }
    }
}

// =============================================================================
// Imports
// =============================================================================

impl Emit for Import {
    fn emit(&self) -> String {
        match self {
            Import::From { module, names } => {
                format!("from {} import {}\n", module, names.join(", "))
            }
            Import::Raw(line) => format!("{}\n", line.trim()),
        }
    }
}

// =============================================================================
// Module
// =============================================================================

/// Emit a declaration sequence with optional import lines prepended.
pub fn emit(declarations: &[Decl], imports: &[Import]) -> String {
    emit_parts(None, imports, declarations)
}

fn emit_parts(header: Option<&str>, imports: &[Import], body: &[Decl]) -> String {
    let mut output = String::new();

    if let Some(header) = header.map(str::trim_end).filter(|h| !h.is_empty()) {
        output.push_str(header);
        output.push('\n');
        if !imports.is_empty() || !body.is_empty() {
            output.push('\n');
        }
    }

    for import in imports {
        output.push_str(&import.emit());
    }

    if !imports.is_empty() && !body.is_empty() {
        output.push('\n');
    }

    for (i, decl) in body.iter().enumerate() {
        if i > 0 {
            output.push_str("\n\n");
        }
        output.push_str(&decl.emit());
    }

    output
}

impl Emit for Module {
    fn emit(&self) -> String {
        emit_parts(self.header.as_deref(), &self.imports, &self.body)
    }
}

// =============================================================================
// Tests
// =============================================================================
