//! Procedural macros for Waymark endpoints.
//!
//! Provides `#[endpoints]`, which exposes methods of an impl block as HTTP
//! endpoints.

mod attrs;
mod common;
mod endpoints;

use proc_macro::TokenStream;

/// Exposes methods of an inherent impl block as endpoints.
///
/// Each exposed method carries exactly one endpoint attribute:
///
/// | Attribute | Arguments | Method returns |
/// |-----------|-----------|----------------|
/// | `#[page]` | `METHOD, "/path", template = "..."` | a `Serialize` struct or map (the model) |
/// | `#[api]` | `METHOD, "/path"` | any `Serialize` value |
/// | `#[api_cookie]` | `METHOD, "/path"` | name/value pairs |
/// | `#[download]` | `METHOD, "/path", content_type = "...", filename = "..."` | bytes |
/// | `#[upload]` | `"/path"` (always `POST`) | anything, discarded |
/// | `#[css]`, `#[js]` | `"/path"` (always `GET`) | the asset source |
///
/// All but the assets also accept `role = "NAME"` and `description = "..."`.
/// Without `description`, the method's doc comment is used.
///
/// Every parameter is declared with `#[param("name", source)]`, where
/// `source` is one of `route`, `query`, `form`, `cookie`, `file` or `body`.
/// A `Result` return maps its error to an invocation failure.
///
/// Methods take `&self` or no receiver. The type must implement `Default`:
/// one instance is created at discovery and shared by all of its routes.
///
/// A type has at most one `#[endpoints]` impl block, since the block
/// implements `EndpointSet` for it. Further plain impl blocks are fine:
///
/// ```compile_fail
/// use waymark_endpoints::endpoints;
///
/// #[derive(Default)]
/// struct Split;
///
/// #[endpoints]
/// impl Split {
///     #[api(GET, "/a")]
///     fn a(&self) -> i64 { 1 }
/// }
///
/// #[endpoints]
/// impl Split {
///     #[api(GET, "/b")]
///     fn b(&self) -> i64 { 2 }
/// }
/// ```
///
/// # Example
///
/// ```
/// use waymark_endpoints::endpoints;
///
/// #[derive(Default)]
/// struct Reports;
///
/// #[endpoints]
/// impl Reports {
///     /// Number of reports filed in a year.
///     #[api(GET, "/api/reports/{year}/count", role = "ADMIN")]
///     fn count(&self, #[param("year", route)] year: i64) -> i64 {
///         year % 7
///     }
///
///     #[download(GET, "/reports.csv", content_type = "text/csv", filename = "reports.csv")]
///     fn export(&self) -> Vec<u8> {
///         b"year,count\n".to_vec()
///     }
///
///     fn not_exposed(&self) {}
/// }
///
/// let routes = waymark_endpoints::discover_type::<Reports>().unwrap();
/// assert_eq!(routes.len(), 2);
/// assert_eq!(routes[0].endpoint().access_role(), "ADMIN");
/// ```
#[proc_macro_attribute]
pub fn endpoints(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemImpl);
    endpoints::generate_endpoints(&input).into()
}
