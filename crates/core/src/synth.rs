//! Signature synthesis.
//!
//! Builds a single [`OverloadDecl`]: either an `@overload` stub bound to one
//! literal key, or the shared implementation that follows the stubs.

use crate::builder::TypeBuilder;
use crate::config::ParamSpec;
use crate::error::{ConfigurationError, UnrecognizedDescriptor};
use crate::types::{Body, LiteralValue, OverloadDecl, Param, ParamKind, TypeExpr};

/// Everything needed to synthesize one declaration.
#[derive(Debug, Clone)]
pub struct SignatureRequest<'a> {
    /// Function name
    pub function_name: &'a str,
    /// Discriminant parameter name
    pub key_param: &'a str,
    /// Discriminant annotation, `Literal[key]` for stubs
    pub key_type: TypeExpr,
    /// Parameters after the key, already typed
    pub additional_params: &'a [Param],
    /// Annotation after `->`
    pub return_type: TypeExpr,
    /// Emit `async def`
    pub is_async: bool,
    /// Prepend the `self` receiver
    pub has_self: bool,
    /// Produce the implementation instead of a stub
    pub include_implementation: bool,
    /// Implementation source, required when `include_implementation` is set
    pub implementation_body: Option<&'a str>,
}

/// `Literal[key]` for a single mapping key.
pub fn literal_key_type(key: &LiteralValue) -> TypeExpr {
    TypeExpr::Literal(vec![key.clone()])
}

/// Type the additional parameters once so every declaration in a set shares them.
///
/// Unrecognized descriptors are appended to `warnings` and kept verbatim.
pub fn resolve_params(
    builder: &TypeBuilder,
    specs: &[ParamSpec],
    warnings: &mut Vec<UnrecognizedDescriptor>,
) -> Vec<Param> {
    specs
        .iter()
        .map(|spec| {
            let ty = builder.build_collecting(&spec.ty, warnings);
            if spec.keyword_only {
                Param::keyword_only(spec.name.clone(), ty)
            } else {
                Param::typed(spec.name.clone(), ty)
            }
        })
        .collect()
}

/// Build one declaration from `request`.
///
/// Parameter order is `self`, the key, positional extras, then keyword-only
/// extras. The implementation body is carried as given.
pub fn synthesize(request: &SignatureRequest<'_>) -> Result<OverloadDecl, ConfigurationError> {
    let body = if request.include_implementation {
        let text = request
            .implementation_body
            .filter(|body| !body.trim().is_empty())
            .ok_or(ConfigurationError::MissingImplementationBody)?;
        Body::Implementation(text.to_string())
    } else {
        Body::Stub
    };

    let mut params = Vec::with_capacity(request.additional_params.len() + 2);
    if request.has_self {
        params.push(Param::receiver());
    }
    params.push(Param::typed(request.key_param, request.key_type.clone()));

    let (keyword_only, positional): (Vec<&Param>, Vec<&Param>) = request
        .additional_params
        .iter()
        .partition(|p| p.kind == ParamKind::KeywordOnly);
    params.extend(positional.into_iter().cloned());
    params.extend(keyword_only.into_iter().cloned());

    Ok(OverloadDecl {
        name: request.function_name.to_string(),
        params,
        return_type: request.return_type.clone(),
        is_async: request.is_async,
        body,
    })
}
