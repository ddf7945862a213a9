//! Parsing of the endpoint and `#[param]` attributes.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::ParseStream;
use syn::{Attribute, Ident, LitStr, Path, Token};

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// `#[param]` source keyword and the `SourceKind` variant it names.
const SOURCES: &[(&str, &str)] = &[
    ("route", "Route"),
    ("query", "Query"),
    ("form", "Form"),
    ("cookie", "Cookie"),
    ("file", "File"),
    ("body", "Body"),
];

/// Which endpoint attribute a method carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Page,
    Api,
    ApiCookie,
    Download,
    Upload,
    Css,
    Js,
}

impl Kind {
    const ALL: [Self; 7] = [
        Self::Page,
        Self::Api,
        Self::ApiCookie,
        Self::Download,
        Self::Upload,
        Self::Css,
        Self::Js,
    ];

    /// Matches an attribute path such as `api` or `download`.
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| path.is_ident(kind.name()))
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Api => "api",
            Self::ApiCookie => "api_cookie",
            Self::Download => "download",
            Self::Upload => "upload",
            Self::Css => "css",
            Self::Js => "js",
        }
    }

    /// Uploads are always `POST` and assets always `GET`.
    fn takes_method(self) -> bool {
        matches!(self, Self::Page | Self::Api | Self::ApiCookie | Self::Download)
    }

    fn allowed_keys(self) -> &'static [&'static str] {
        match self {
            Self::Page => &["template", "role", "description"],
            Self::Api | Self::ApiCookie | Self::Upload => &["role", "description"],
            Self::Download => &["content_type", "filename", "role", "description"],
            Self::Css | Self::Js => &[],
        }
    }

    fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::Page => &["template"],
            Self::Download => &["content_type", "filename"],
            _ => &[],
        }
    }
}

/// A parsed endpoint attribute, e.g.
/// `#[download(GET, "/report.csv", content_type = "text/csv", filename = "report.csv")]`.
pub(crate) struct EndpointAttr {
    pub(crate) kind: Kind,
    method: Option<Ident>,
    pub(crate) path: LitStr,
    template: Option<LitStr>,
    content_type: Option<LitStr>,
    filename: Option<LitStr>,
    role: Option<LitStr>,
    description: Option<LitStr>,
}

impl EndpointAttr {
    pub(crate) fn parse(attr: &Attribute, kind: Kind) -> syn::Result<Self> {
        attr.parse_args_with(|input: ParseStream<'_>| Self::parse_args(input, kind))
    }

    fn parse_args(input: ParseStream<'_>, kind: Kind) -> syn::Result<Self> {
        let method = if kind.takes_method() {
            let method: Ident = input.parse()?;
            if !HTTP_METHODS.contains(&method.to_string().as_str()) {
                return Err(syn::Error::new_spanned(
                    &method,
                    format!(
                        "unknown HTTP method `{method}`, expected one of {}",
                        HTTP_METHODS.join(", ")
                    ),
                ));
            }
            input.parse::<Token![,]>()?;
            Some(method)
        } else {
            None
        };

        let path: LitStr = input.parse()?;
        if !path.value().starts_with('/') {
            return Err(syn::Error::new_spanned(&path, "endpoint paths must start with `/`"));
        }

        let mut parsed = Self {
            kind,
            method,
            path,
            template: None,
            content_type: None,
            filename: None,
            role: None,
            description: None,
        };

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;

            let key_name = key.to_string();
            if !kind.allowed_keys().contains(&key_name.as_str()) {
                return Err(syn::Error::new_spanned(
                    &key,
                    format!("`{key_name}` is not supported on #[{}]", kind.name()),
                ));
            }
            let Some(slot) = parsed.slot(&key_name) else {
                return Err(syn::Error::new_spanned(&key, format!("unknown key `{key_name}`")));
            };
            if slot.is_some() {
                return Err(syn::Error::new_spanned(&key, format!("duplicate `{key_name}`")));
            }
            *slot = Some(value);
        }

        for &required in kind.required_keys() {
            if parsed.slot(required).is_none_or(|slot| slot.is_none()) {
                return Err(syn::Error::new(
                    input.span(),
                    format!("#[{}] requires `{required} = \"...\"`", kind.name()),
                ));
            }
        }

        Ok(parsed)
    }

    fn slot(&mut self, key: &str) -> Option<&mut Option<LitStr>> {
        match key {
            "template" => Some(&mut self.template),
            "content_type" => Some(&mut self.content_type),
            "filename" => Some(&mut self.filename),
            "role" => Some(&mut self.role),
            "description" => Some(&mut self.description),
            _ => None,
        }
    }

    /// Expression building the `EndpointDescriptor`.
    ///
    /// An explicit `description` wins over the method's doc comment.
    pub(crate) fn descriptor(&self, we: &TokenStream, doc: Option<&str>) -> TokenStream {
        let path = &self.path;
        let method = self
            .method
            .as_ref()
            .map(|method| quote!(#we::http::Method::#method));
        let template = &self.template;
        let content_type = &self.content_type;
        let filename = &self.filename;

        let base = match self.kind {
            Kind::Page => quote!(#we::EndpointDescriptor::page(#method, #path, #template)),
            Kind::Api => quote!(#we::EndpointDescriptor::api(#method, #path)),
            Kind::ApiCookie => quote!(#we::EndpointDescriptor::api_cookie(#method, #path)),
            Kind::Download => quote! {
                #we::EndpointDescriptor::download(#method, #path, #content_type, #filename)
            },
            Kind::Upload => quote!(#we::EndpointDescriptor::upload(#path)),
            Kind::Css => quote!(#we::EndpointDescriptor::css(#path)),
            Kind::Js => quote!(#we::EndpointDescriptor::js(#path)),
        };

        let role = self.role.as_ref().map(|role| quote!(.with_role(#role)));
        let description = match (&self.description, doc) {
            (Some(explicit), _) => Some(quote!(.with_description(#explicit))),
            (None, Some(doc)) if !matches!(self.kind, Kind::Css | Kind::Js) => {
                Some(quote!(.with_description(#doc)))
            }
            _ => None,
        };

        quote!(#base #role #description)
    }
}

/// A parsed `#[param("name", source)]`.
pub(crate) struct ParamAttr {
    pub(crate) name: LitStr,
    source: Ident,
}

impl ParamAttr {
    pub(crate) fn parse(attr: &Attribute) -> syn::Result<Self> {
        attr.parse_args_with(|input: ParseStream<'_>| {
            let name: LitStr = input.parse()?;
            if name.value().is_empty() {
                return Err(syn::Error::new_spanned(&name, "parameter names cannot be empty"));
            }
            input.parse::<Token![,]>()?;
            let source: Ident = input.parse()?;
            if !SOURCES.iter().any(|(keyword, _)| source == keyword) {
                let expected: Vec<&str> = SOURCES.iter().map(|(keyword, _)| *keyword).collect();
                return Err(syn::Error::new_spanned(
                    &source,
                    format!(
                        "unknown parameter source `{source}`, expected one of {}",
                        expected.join(", ")
                    ),
                ));
            }
            let _ = input.parse::<Option<Token![,]>>()?;
            Ok(Self { name, source })
        })
    }

    /// `SourceKind::<Variant>` path for the declared source.
    pub(crate) fn source_kind(&self, we: &TokenStream) -> TokenStream {
        let variant = SOURCES
            .iter()
            .find(|(keyword, _)| self.source == keyword)
            .map_or("Route", |(_, variant)| *variant);
        let variant = format_ident!("{}", variant);
        quote!(#we::SourceKind::#variant)
    }
}
