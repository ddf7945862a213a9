//! Shared utilities for Waymark procedural macro crates.
//!
//! Generated code has to name Waymark crates by a path that resolves in the
//! consumer crate, which may depend on a member crate directly, under a
//! different name, or only through the `waymark` umbrella crate.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// A Waymark crate that macro-generated code may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WaymarkCrate {
    /// `waymark_endpoints`
    Endpoints,
}

impl WaymarkCrate {
    /// `Cargo.toml` package name.
    #[must_use]
    pub fn package_name(self) -> &'static str {
        match self {
            Self::Endpoints => "waymark_endpoints",
        }
    }
}

/// Returns a path to `krate` usable from the crate being expanded.
///
/// Tried in order:
/// 1. the crate itself, or a direct (possibly renamed) dependency,
/// 2. `waymark::<package>` through the umbrella crate,
/// 3. the bare package name, so a missing dependency surfaces as an
///    unresolved path at the call site.
#[must_use]
pub fn resolve_crate_path(krate: WaymarkCrate) -> TokenStream {
    let package = krate.package_name();
    let direct = format_ident!("{}", package);

    match crate_name(package) {
        Ok(FoundCrate::Itself) => quote!(#direct),
        Ok(FoundCrate::Name(renamed)) => {
            let renamed = format_ident!("{}", renamed);
            quote!(#renamed)
        }
        Err(_) => match crate_name("waymark") {
            // The umbrella's own tests and doctests see it as `Itself`.
            Ok(FoundCrate::Itself) => quote!(waymark::#direct),
            Ok(FoundCrate::Name(umbrella)) => {
                let umbrella = format_ident!("{}", umbrella);
                quote!(#umbrella::#direct)
            }
            Err(_) => quote!(#direct),
        },
    }
}
