//! Type expression builder.
//!
//! Turns a [`TypeDescriptor`] into a [`TypeExpr`]. Text descriptors are parsed
//! with a deliberately small grammar:
//!
//! ```text
//! type    := atom ('|' atom)*
//! atom    := NAME ('[' args ']')?
//! NAME    := IDENT ('.' IDENT)*
//! ```
//!
//! `Optional[X]` becomes [`TypeExpr::Optional`], `Literal[...]` with constant
//! arguments becomes [`TypeExpr::Literal`], `A | B` becomes [`TypeExpr::Union`].
//! Anything outside the grammar is kept as [`TypeExpr::Raw`] and reported as an
//! [`UnrecognizedDescriptor`] warning; building never fails.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::UnrecognizedDescriptor;
use crate::types::{LiteralValue, TypeExpr};
use crate::utils::{PY_RESERVED_WORDS, is_identifier_shape};

/// Deepest bracket nesting accepted before falling back to raw text.
const MAX_NESTING: usize = 64;

/// Input accepted by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Already-built expression, passed through
    Expr(TypeExpr),
    /// Annotation text in the restricted surface syntax
    Text(String),
}

impl From<TypeExpr> for TypeDescriptor {
    fn from(value: TypeExpr) -> Self {
        TypeDescriptor::Expr(value)
    }
}

impl From<&str> for TypeDescriptor {
    fn from(value: &str) -> Self {
        TypeDescriptor::Text(value.to_string())
    }
}

impl From<String> for TypeDescriptor {
    fn from(value: String) -> Self {
        TypeDescriptor::Text(value)
    }
}

impl<'de> Deserialize<'de> for TypeDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(TypeDescriptor::Text)
    }
}

/// Caller hook consulted before the default construction logic.
pub type TypeOverride = Arc<dyn Fn(&TypeDescriptor) -> Option<TypeExpr> + Send + Sync>;

/// Builds type expressions from descriptors.
#[derive(Clone, Default)]
pub struct TypeBuilder {
    override_fn: Option<TypeOverride>,
}

impl fmt::Debug for TypeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeBuilder")
            .field("has_override", &self.override_fn.is_some())
            .finish()
    }
}

impl TypeBuilder {
    /// Builder with the default structural logic only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an override. When it returns `Some`, that expression is used as-is.
    pub fn with_override<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Option<TypeExpr> + Send + Sync + 'static,
    {
        self.override_fn = Some(Arc::new(f));
        self
    }

    /// Build a type expression, logging unrecognized descriptors.
    pub fn build(&self, descriptor: &TypeDescriptor) -> TypeExpr {
        let mut warnings = Vec::new();
        self.build_collecting(descriptor, &mut warnings)
    }

    /// Build a type expression and record unrecognized descriptors in `warnings`.
    pub fn build_collecting(
        &self,
        descriptor: &TypeDescriptor,
        warnings: &mut Vec<UnrecognizedDescriptor>,
    ) -> TypeExpr {
        if let Some(expr) = self.override_fn.as_ref().and_then(|f| f(descriptor)) {
            return expr;
        }

        match descriptor {
            TypeDescriptor::Expr(expr) => expr.clone(),
            TypeDescriptor::Text(text) => match parse_type(text) {
                Ok(expr) => expr,
                Err(unrecognized) => {
                    warn!(
                        descriptor = %unrecognized.text,
                        reason = %unrecognized.reason,
                        "Unrecognized type descriptor, emitting it verbatim."
                    );
                    warnings.push(unrecognized);
                    TypeExpr::Raw(text.clone())
                }
            },
        }
    }
}

/// Parse annotation text strictly. Errors carry the reason parsing stopped.
pub fn parse_type(text: &str) -> Result<TypeExpr, UnrecognizedDescriptor> {
    let unrecognized = |reason: String| UnrecognizedDescriptor {
        text: text.to_string(),
        reason,
    };

    let tokens = tokenize(text).map_err(unrecognized)?;
    if tokens.is_empty() {
        return Err(unrecognized("empty descriptor".into()));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_type(0).map_err(unrecognized)?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(unrecognized(format!("unexpected {token} after type"))),
    }
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Str(String),
    Int(i64),
    LBracket,
    RBracket,
    Comma,
    Pipe,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "name `{name}`"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Int(i) => write!(f, "integer {i}"),
            Token::LBracket => f.write_str("`[`"),
            Token::RBracket => f.write_str("`]`"),
            Token::Comma => f.write_str("`,`"),
            Token::Pipe => f.write_str("`|`"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '\'' | '"' => {
                chars.next();
                tokens.push(Token::Str(lex_string(&mut chars, c)?));
            }
            c if c.is_ascii_digit() || c == '-' => {
                chars.next();
                let mut end = start + c.len_utf8();
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                let digits = &text[start..end];
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| format!("invalid integer `{digits}`"))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_alphanumeric() || d == '_' || d == '.') {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                let name = &text[start..end];
                validate_dotted_name(name)?;
                tokens.push(Token::Name(name.to_string()));
            }
            other => return Err(format!("unsupported character `{other}`")),
        }
    }

    Ok(tokens)
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
) -> Result<String, String> {
    let mut value = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            c if c == quote => return Ok(value),
            '\\' => match chars.next().map(|(_, e)| e) {
                Some('\\') => value.push('\\'),
                Some('\'') => value.push('\''),
                Some('"') => value.push('"'),
                Some('n') => value.push('\n'),
                Some('r') => value.push('\r'),
                Some('t') => value.push('\t'),
                Some(other) => return Err(format!("unsupported escape `\\{other}`")),
                None => break,
            },
            c => value.push(c),
        }
    }
    Err("unterminated string literal".into())
}

fn validate_dotted_name(name: &str) -> Result<(), String> {
    for segment in name.split('.') {
        if !is_identifier_shape(segment) {
            return Err(format!("invalid name `{name}`"));
        }
        if PY_RESERVED_WORDS.contains(segment) && !matches!(segment, "None" | "True" | "False") {
            return Err(format!("keyword `{segment}` is not a type"));
        }
    }
    Ok(())
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        match self.bump() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected {expected}, found {token}")),
            None => Err(format!("expected {expected}, found end of input")),
        }
    }

    fn parse_type(&mut self, depth: usize) -> Result<TypeExpr, String> {
        if depth > MAX_NESTING {
            return Err(format!("nesting deeper than {MAX_NESTING} levels"));
        }

        let mut alternatives = vec![self.parse_atom(depth)?];
        while self.peek() == Some(&Token::Pipe) {
            self.bump();
            alternatives.push(self.parse_atom(depth)?);
        }

        if alternatives.len() == 1 {
            return Ok(alternatives.remove(0));
        }
        // Repeated alternatives are kept so the text echoes unchanged.
        Ok(TypeExpr::Union(alternatives))
    }

    fn parse_atom(&mut self, depth: usize) -> Result<TypeExpr, String> {
        let name = match self.bump() {
            Some(Token::Name(name)) => name,
            Some(token) => return Err(format!("expected a type name, found {token}")),
            None => return Err("expected a type name, found end of input".into()),
        };

        if self.peek() != Some(&Token::LBracket) {
            return Ok(TypeExpr::Name(name));
        }
        self.bump();

        let expr = match name.as_str() {
            "Literal" => TypeExpr::Literal(self.parse_literal_args()?),
            "Optional" => {
                let inner = self.parse_type(depth + 1)?;
                TypeExpr::Optional(Box::new(inner))
            }
            _ => {
                let mut args = vec![self.parse_type(depth + 1)?];
                while self.peek() == Some(&Token::Comma) {
                    self.bump();
                    args.push(self.parse_type(depth + 1)?);
                }
                TypeExpr::Generic {
                    base: Box::new(TypeExpr::Name(name)),
                    args,
                }
            }
        };

        self.expect(&Token::RBracket)?;
        Ok(expr)
    }

    fn parse_literal_args(&mut self) -> Result<Vec<LiteralValue>, String> {
        let mut values = vec![self.parse_literal_value()?];
        while self.peek() == Some(&Token::Comma) {
            self.bump();
            values.push(self.parse_literal_value()?);
        }
        Ok(values)
    }

    fn parse_literal_value(&mut self) -> Result<LiteralValue, String> {
        match self.bump() {
            Some(Token::Str(s)) => Ok(LiteralValue::Str(s)),
            Some(Token::Int(i)) => Ok(LiteralValue::Int(i)),
            Some(Token::Name(name)) => match name.as_str() {
                "True" => Ok(LiteralValue::Bool(true)),
                "False" => Ok(LiteralValue::Bool(false)),
                "None" => Ok(LiteralValue::None),
                _ => Err(format!("`{name}` is not a literal constant")),
            },
            Some(token) => Err(format!("expected a literal constant, found {token}")),
            None => Err("expected a literal constant, found end of input".into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::emit::Emit;

    fn build(text: &str) -> TypeExpr {
        TypeBuilder::new().build(&TypeDescriptor::from(text))
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(build("int"), TypeExpr::name("int"));
        assert_eq!(build("  M.Pet "), TypeExpr::name("M.Pet"));
        assert_eq!(build("None"), TypeExpr::name("None"));
    }

    #[test]
    fn test_parse_generics() {
        assert_eq!(
            build("dict[str, list[int]]"),
            TypeExpr::generic(
                "dict",
                vec![
                    TypeExpr::name("str"),
                    TypeExpr::generic("list", vec![TypeExpr::name("int")]),
                ]
            )
        );
    }

    #[test]
    fn test_parse_optional_and_union() {
        assert_eq!(build("Optional[int]"), TypeExpr::optional(TypeExpr::name("int")));
        assert_eq!(
            build("int | str | None"),
            TypeExpr::Union(vec![
                TypeExpr::name("int"),
                TypeExpr::name("str"),
                TypeExpr::name("None"),
            ])
        );
        assert_eq!(
            build("list[int | None]"),
            TypeExpr::generic(
                "list",
                vec![TypeExpr::Union(vec![TypeExpr::name("int"), TypeExpr::name("None")])]
            )
        );
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(
            build("Literal['a', \"b\", -1, True, None]"),
            TypeExpr::Literal(vec![
                LiteralValue::from("a"),
                LiteralValue::from("b"),
                LiteralValue::from(-1_i64),
                LiteralValue::from(true),
                LiteralValue::None,
            ])
        );
    }

    #[test]
    fn test_canonical_descriptors_round_trip() {
        for text in [
            "int",
            "M.Pet",
            "list[str]",
            "dict[str, Any]",
            "list[list[str]]",
            "Optional[dict[str, int]]",
            "int | None",
            "Union[int, str]",
            "Literal['json', 'xml']",
            "tuple[int, ...]",
        ] {
            let expr = build(text);
            if text == "tuple[int, ...]" {
                assert!(matches!(expr, TypeExpr::Raw(_)));
            } else {
                assert!(!matches!(expr, TypeExpr::Raw(_)), "{text} should parse");
            }
            assert_eq!(expr.emit(), text);
        }
    }

    #[test]
    fn test_unrecognized_text_is_kept_verbatim() {
        for text in [
            "Callable[[int], str]",
            "some free text",
            "1 + 2",
            "list[",
            "list[]",
            "Optional[int, str]",
            "Literal[foo]",
            "def",
            "",
            "dict[str, int]]",
        ] {
            let expr = build(text);
            assert_eq!(expr, TypeExpr::Raw(text.to_string()));
            assert_eq!(expr.emit(), text);
        }
    }

    #[test]
    fn test_build_collecting_reports_warning() {
        let mut warnings = Vec::new();
        let expr = TypeBuilder::new()
            .build_collecting(&TypeDescriptor::from("Callable[[int], str]"), &mut warnings);
        assert_eq!(expr, TypeExpr::raw("Callable[[int], str]"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].text, "Callable[[int], str]");
        assert!(warnings[0].reason.contains("expected a type name"));
    }

    #[test]
    fn test_expr_descriptor_passes_through() {
        let expr = TypeExpr::generic("Sequence", vec![TypeExpr::raw("weird text")]);
        assert_eq!(TypeBuilder::new().build(&TypeDescriptor::Expr(expr.clone())), expr);
    }

    #[test]
    fn test_override_takes_precedence() {
        let types = TypeBuilder::new().with_override(|d| match d {
            TypeDescriptor::Text(t) if t == "Model" => Some(TypeExpr::name("M.Model")),
            _ => None,
        });
        assert_eq!(types.build(&"Model".into()), TypeExpr::name("M.Model"));
        assert_eq!(types.build(&"int".into()), TypeExpr::name("int"));
    }

    #[test]
    fn test_nesting_limit_falls_back_to_raw() {
        let text = format!("{}int{}", "list[".repeat(MAX_NESTING + 2), "]".repeat(MAX_NESTING + 2));
        let expr = build(&text);
        assert_eq!(expr, TypeExpr::Raw(text));
    }

    #[test]
    fn test_parse_type_error_reasons() {
        let err = parse_type("int str").unwrap_err();
        assert_eq!(err.reason, "unexpected name `str` after type");
        let err = parse_type("Literal['a").unwrap_err();
        assert_eq!(err.reason, "unterminated string literal");
    }
}
