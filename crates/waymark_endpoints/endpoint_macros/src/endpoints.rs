//! Code generation for `#[endpoints]` on impl blocks.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, ImplItem, ImplItemFn, ItemImpl, Type};
use waymark_macro_utils::{WaymarkCrate, resolve_crate_path};

use crate::attrs::{EndpointAttr, Kind, ParamAttr};
use crate::common::{
    extract_doc_comments, is_result_type, takes_shared_self, to_pascal_case, type_name_str,
    validate_endpoint_signature,
};

/// One exposed method after validation.
struct EndpointMethod {
    method: ImplItemFn,
    attr: EndpointAttr,
    params: Vec<(ParamAttr, Type)>,
    shared_self: bool,
}

/// Generates handler structs, an `EndpointSet` impl and the namespace
/// registration for an impl block.
pub(crate) fn generate_endpoints(input: &ItemImpl) -> TokenStream {
    let we = resolve_crate_path(WaymarkCrate::Endpoints);

    if let Some((_, trait_path, _)) = &input.trait_ {
        return syn::Error::new_spanned(
            trait_path,
            "#[endpoints] must be applied to an inherent impl block",
        )
        .to_compile_error();
    }
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "#[endpoints] does not support generic types")
            .to_compile_error();
    }

    let self_ty = &input.self_ty;
    let type_name = match type_name_str(self_ty) {
        Ok(name) => name,
        Err(err) => return err,
    };

    let mut endpoints = Vec::new();
    for item in &input.items {
        if let ImplItem::Fn(method) = item {
            match parse_method(method) {
                Ok(Some(endpoint)) => endpoints.push(endpoint),
                Ok(None) => {}
                Err(err) => return err,
            }
        }
    }

    let handlers: Vec<_> = endpoints
        .iter()
        .map(|endpoint| generate_handler(self_ty, &type_name, endpoint, &we))
        .collect();
    let routes: Vec<_> = endpoints
        .iter()
        .map(|endpoint| generate_route(&type_name, endpoint, &we))
        .collect();

    let instance_param = if endpoints.iter().any(|endpoint| endpoint.shared_self) {
        quote!(__instance)
    } else {
        quote!(_instance)
    };

    let cleaned_items = input.items.iter().map(strip_attributes);
    let attrs = &input.attrs;
    let impl_token = &input.impl_token;

    quote! {
        #(#attrs)*
        #impl_token #self_ty {
            #(#cleaned_items)*
        }

        const _: () = {
            #(#handlers)*

            impl #we::EndpointSet for #self_ty {
                fn routes(
                    #instance_param: ::std::sync::Arc<Self>,
                ) -> ::core::result::Result<::std::vec::Vec<#we::RouteDescriptor>, #we::EndpointError> {
                    ::core::result::Result::Ok(::std::vec![#(#routes),*])
                }
            }
        };

        #we::inventory::submit! {
            #we::EndpointSetRegistration::new(
                ::core::module_path!(),
                #type_name,
                #we::discover_type::<#self_ty>,
            )
        }
    }
}

fn endpoint_attrs(method: &ImplItemFn) -> impl Iterator<Item = (&syn::Attribute, Kind)> {
    method
        .attrs
        .iter()
        .filter_map(|attr| Kind::from_path(attr.path()).map(|kind| (attr, kind)))
}

fn parse_method(method: &ImplItemFn) -> Result<Option<EndpointMethod>, TokenStream> {
    let mut found = endpoint_attrs(method);
    let Some((attr, kind)) = found.next() else {
        return reject_stray_params(method).map(|()| None);
    };
    if let Some((extra, _)) = found.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "a method can be exposed by only one endpoint attribute",
        )
        .to_compile_error());
    }

    let attr = EndpointAttr::parse(attr, kind).map_err(|err| err.to_compile_error())?;
    if let Some(err) = validate_endpoint_signature(&method.sig) {
        return Err(err);
    }
    let shared_self = takes_shared_self(&method.sig)?;

    let mut params = Vec::new();
    for input in &method.sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let mut declared = pat_type.attrs.iter().filter(|attr| attr.path().is_ident("param"));
        let Some(param_attr) = declared.next() else {
            return Err(syn::Error::new_spanned(
                pat_type,
                "endpoint parameters must be declared with #[param(\"name\", source)]",
            )
            .to_compile_error());
        };
        if let Some(extra) = declared.next() {
            return Err(syn::Error::new_spanned(extra, "duplicate #[param] declaration")
                .to_compile_error());
        }
        let param = ParamAttr::parse(param_attr).map_err(|err| err.to_compile_error())?;
        params.push((param, (*pat_type.ty).clone()));
    }

    Ok(Some(EndpointMethod {
        method: method.clone(),
        attr,
        params,
        shared_self,
    }))
}

fn reject_stray_params(method: &ImplItemFn) -> Result<(), TokenStream> {
    let stray = method.sig.inputs.iter().find_map(|input| match input {
        FnArg::Typed(pat_type) => pat_type.attrs.iter().find(|attr| attr.path().is_ident("param")),
        FnArg::Receiver(_) => None,
    });
    match stray {
        Some(attr) => Err(syn::Error::new_spanned(
            attr,
            "#[param] is only valid on methods exposed as endpoints",
        )
        .to_compile_error()),
        None => Ok(()),
    }
}

fn strip_attributes(item: &ImplItem) -> ImplItem {
    let ImplItem::Fn(method) = item else {
        return item.clone();
    };
    let mut cleaned = method.clone();
    cleaned
        .attrs
        .retain(|attr| Kind::from_path(attr.path()).is_none());
    for input in &mut cleaned.sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            pat_type.attrs.retain(|attr| !attr.path().is_ident("param"));
        }
    }
    ImplItem::Fn(cleaned)
}

fn handler_struct_name(type_name: &str, endpoint: &EndpointMethod) -> syn::Ident {
    format_ident!(
        "{}{}Endpoint",
        type_name,
        to_pascal_case(&endpoint.method.sig.ident.to_string())
    )
}

fn generate_handler(
    self_ty: &Type,
    type_name: &str,
    endpoint: &EndpointMethod,
    we: &TokenStream,
) -> TokenStream {
    let struct_name = handler_struct_name(type_name, endpoint);
    let method_name = &endpoint.method.sig.ident;
    let path = &endpoint.attr.path;
    let arity = endpoint.params.len();

    let args: Vec<_> = (0..arity).map(|index| format_ident!("__arg{}", index)).collect();
    let extractions = endpoint
        .params
        .iter()
        .zip(&args)
        .enumerate()
        .map(|(index, ((_, ty), arg))| quote!(let #arg = __args.take::<#ty>(#index)?;));

    let (args_param, rebind) = if arity == 0 {
        (quote!(_args), quote!())
    } else {
        (quote!(__args), quote!(let mut __args = __args;))
    };

    let (definition, call) = if endpoint.shared_self {
        (
            quote!(struct #struct_name { inner: ::std::sync::Arc<#self_ty> }),
            quote!(self.inner.#method_name(#(#args),*)),
        )
    } else {
        (
            quote!(struct #struct_name;),
            quote!(<#self_ty>::#method_name(#(#args),*)),
        )
    };

    let call = if is_result_type(&endpoint.method.sig.output) {
        quote!(#call.map_err(|__err| #we::EndpointError::invocation(#path, __err))?)
    } else {
        call
    };

    let output = match endpoint.attr.kind {
        Kind::Page => quote!(#we::HandlerOutput::page(&__value)),
        Kind::Api => quote!(#we::HandlerOutput::api(&__value)),
        Kind::ApiCookie => quote!(::core::result::Result::Ok(#we::HandlerOutput::cookies(__value))),
        Kind::Download => quote!(::core::result::Result::Ok(#we::HandlerOutput::download(__value))),
        Kind::Upload => quote! {
            let _ = __value;
            ::core::result::Result::Ok(#we::HandlerOutput::Upload)
        },
        Kind::Css | Kind::Js => quote!(::core::result::Result::Ok(#we::HandlerOutput::asset(__value))),
    };

    quote! {
        #definition

        impl #we::EndpointHandler for #struct_name {
            fn arity(&self) -> usize {
                #arity
            }

            fn invoke(
                &self,
                #args_param: #we::Arguments,
            ) -> ::core::result::Result<#we::HandlerOutput, #we::EndpointError> {
                #rebind
                #(#extractions)*
                let __value = #call;
                #output
            }
        }
    }
}

fn generate_route(type_name: &str, endpoint: &EndpointMethod, we: &TokenStream) -> TokenStream {
    let struct_name = handler_struct_name(type_name, endpoint);
    let doc = extract_doc_comments(&endpoint.method.attrs);
    let descriptor = endpoint.attr.descriptor(we, doc.as_deref());

    let parameters = endpoint.params.iter().map(|(param, ty)| {
        let name = &param.name;
        let source = param.source_kind(we);
        quote!(#we::ParameterDescriptor::of::<#ty>(#name, #source))
    });

    let handler = if endpoint.shared_self {
        quote!(#struct_name { inner: ::std::sync::Arc::clone(&__instance) })
    } else {
        quote!(#struct_name)
    };

    quote! {
        #we::RouteDescriptor::new(
            #descriptor,
            ::std::vec![#(#parameters),*],
            ::std::sync::Arc::new(#handler),
            #type_name,
        )?
    }
}
