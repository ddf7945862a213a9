//! Signature checks and small helpers shared by the endpoint code generator.

use proc_macro2::TokenStream;
use syn::{Attribute, Expr, ExprLit, FnArg, Lit, Meta, ReturnType, Signature, Type};

/// Rejects async, unsafe, extern and generic endpoint methods.
pub(crate) fn validate_endpoint_signature(sig: &Signature) -> Option<TokenStream> {
    if let Some(asyncness) = &sig.asyncness {
        return Some(
            syn::Error::new_spanned(
                asyncness,
                "endpoint methods are called synchronously and cannot be async",
            )
            .to_compile_error(),
        );
    }

    if let Some(unsafety) = &sig.unsafety {
        return Some(
            syn::Error::new_spanned(unsafety, "unsafe methods cannot be exposed as endpoints")
                .to_compile_error(),
        );
    }

    if let Some(abi) = &sig.abi {
        return Some(
            syn::Error::new_spanned(abi, "extern methods cannot be exposed as endpoints")
                .to_compile_error(),
        );
    }

    if !sig.generics.params.is_empty() {
        return Some(
            syn::Error::new_spanned(&sig.generics, "endpoint methods cannot be generic")
                .to_compile_error(),
        );
    }

    None
}

/// Returns whether the method takes `&self`.
///
/// Methods without a receiver are allowed and called on the type. Every
/// other receiver is rejected: the shared instance is only reachable through
/// an `Arc`.
pub(crate) fn takes_shared_self(sig: &Signature) -> Result<bool, TokenStream> {
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver)) => {
            if receiver.reference.is_none() {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "endpoint methods must take `&self`, not `self` by value",
                )
                .to_compile_error());
            }
            if receiver.mutability.is_some() {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "endpoint methods must take `&self`, not `&mut self`; \
                     the instance is shared by concurrent requests",
                )
                .to_compile_error());
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Joins the method's doc comment lines.
pub(crate) fn extract_doc_comments(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(text),
                    ..
                }) => Some(text.value().trim().to_owned()),
                _ => None,
            },
            _ => None,
        })
        .collect();

    let joined = lines.join(" ").trim().to_owned();
    (!joined.is_empty()).then_some(joined)
}

/// Checks if a return type is some `Result<T, E>`.
pub(crate) fn is_result_type(output: &ReturnType) -> bool {
    if let ReturnType::Type(_, ty) = output
        && let Type::Path(type_path) = ty.as_ref()
        && let Some(segment) = type_path.path.segments.last()
    {
        return segment.ident == "Result";
    }
    false
}

/// Converts a `snake_case` name to `PascalCase`.
pub(crate) fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect()
}

/// Last path segment of the annotated type.
pub(crate) fn type_name_str(ty: &Type) -> Result<String, TokenStream> {
    if let Type::Path(type_path) = ty
        && type_path.qself.is_none()
        && let Some(segment) = type_path.path.segments.last()
    {
        return Ok(segment.ident.to_string());
    }
    Err(syn::Error::new_spanned(ty, "#[endpoints] must be applied to an impl of a named type")
        .to_compile_error())
}
