//! An in-process [`HostServer`] for tests and embedding.
//!
//! Routes are matched in registration order. A path template segment written
//! `{name}` matches any single non-empty segment and is passed to the handler
//! as a percent-decoded route parameter. Unmatched requests get `404`;
//! requests holding none of a guarded route's roles get `403`; a captured
//! segment that does not decode to UTF-8 gets `400`.
//!
//! ```
//! use http::{Method, StatusCode};
//! use waymark_endpoints::endpoint::EndpointDescriptor;
//! use waymark_endpoints::host::ExposeEndpoints;
//! use waymark_endpoints::host::memory::MemoryHost;
//! use waymark_endpoints::param::SourceKind;
//! use waymark_endpoints::plugin::EndpointConfig;
//! use waymark_endpoints::request::RequestData;
//! use waymark_endpoints::response::HandlerOutput;
//! use waymark_endpoints::roles::RoleRegistry;
//! use waymark_endpoints::route::RouteDescriptor;
//! use std::sync::Arc;
//!
//! let route = RouteDescriptor::builder(EndpointDescriptor::api(Method::GET, "/users/{id}"))
//!     .param::<i64>("id", SourceKind::Route)
//!     .handler(|mut args| HandlerOutput::api(&args.take::<i64>(0)?))
//!     .unwrap();
//!
//! let mut host: MemoryHost<&str> = MemoryHost::new();
//! host.expose_routes(&[Arc::new(route)], &RoleRegistry::new(), &Arc::new(EndpointConfig::default()))
//!     .unwrap();
//!
//! let response = host.handle(&Method::GET, "/users/7", RequestData::new(), &[]);
//! assert_eq!(response.body().as_text(), Some("7"));
//!
//! let missing = host.handle(&Method::GET, "/users", RequestData::new(), &[]);
//! assert_eq!(missing.status(), StatusCode::NOT_FOUND);
//! ```

use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;

use super::{HostServer, RouteHandler};
use crate::request::RequestData;
use crate::response::Response;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

fn parse_template(path: &str) -> Vec<Segment> {
    split_path(path)
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => Segment::Param(name.to_owned()),
            None => Segment::Literal(segment.to_owned()),
        })
        .collect()
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

struct MemoryRoute<R> {
    method: Method,
    path: String,
    segments: Vec<Segment>,
    handler: RouteHandler,
    roles: Vec<R>,
}

impl<R> MemoryRoute<R> {
    fn captures<'p>(&self, path: &'p str) -> Option<Vec<(&str, &'p str)>> {
        let actual: Vec<&str> = split_path(path).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut captures = Vec::new();
        for (segment, value) in self.segments.iter().zip(actual) {
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => captures.push((name.as_str(), value)),
            }
        }
        Some(captures)
    }
}

/// A host that keeps its routes in memory and dispatches synchronously.
pub struct MemoryHost<R> {
    routes: Vec<MemoryRoute<R>>,
}

impl<R> Default for MemoryHost<R> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<R> core::fmt::Debug for MemoryHost<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|route| format!("{} {}", route.method, route.path)))
            .finish()
    }
}

impl<R: Clone + Send + Sync + 'static> HostServer for MemoryHost<R> {
    type Role = R;

    fn register(&mut self, method: Method, path: &str, handler: RouteHandler, roles: Vec<R>) {
        self.routes.push(MemoryRoute {
            method,
            path: path.to_owned(),
            segments: parse_template(path),
            handler,
            roles,
        });
    }
}

impl<R: PartialEq> MemoryHost<R> {
    /// Creates a host without routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches a request on behalf of a caller holding `granted` roles.
    ///
    /// `target` may carry a query string (`/search?q=rust`); its pairs are
    /// added to `request`.
    pub fn handle(
        &self,
        method: &Method,
        target: &str,
        request: RequestData,
        granted: &[R],
    ) -> Response {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let mut request = request.with_query_string(query);

        let Some((route, captures)) = self
            .routes
            .iter()
            .filter(|route| &route.method == method)
            .find_map(|route| route.captures(path).map(|captures| (route, captures)))
        else {
            tracing::debug!(%method, path, "no route matched");
            return Response::status_only(StatusCode::NOT_FOUND);
        };

        if !route.roles.is_empty() && !route.roles.iter().any(|role| granted.contains(role)) {
            tracing::debug!(%method, path, "caller lacks the required role");
            return Response::status_only(StatusCode::FORBIDDEN);
        }

        for (name, raw) in captures {
            let Ok(value) = percent_decode_str(raw).decode_utf8() else {
                tracing::debug!(%method, path, param = name, "route segment is not valid UTF-8");
                return Response::status_only(StatusCode::BAD_REQUEST);
            };
            request.set_path_param(name, value);
        }
        (route.handler)(&request)
    }

    /// Registered routes as (method, path template), in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes
            .iter()
            .map(|route| (&route.method, route.path.as_str()))
    }

    /// Role tokens registered for a route template.
    #[must_use]
    pub fn required_roles(&self, method: &Method, path: &str) -> Option<&[R]> {
        self.routes
            .iter()
            .find(|route| &route.method == method && route.path == path)
            .map(|route| route.roles.as_slice())
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::request::Request;
    use crate::response::Body;

    fn echo_id() -> RouteHandler {
        Arc::new(|request: &dyn Request| {
            Response::text(StatusCode::OK, request.path_param("id").unwrap_or("none"))
        })
    }

    #[test]
    fn template_segments() {
        assert_eq!(
            parse_template("/users/{id}/posts"),
            vec![
                Segment::Literal("users".into()),
                Segment::Param("id".into()),
                Segment::Literal("posts".into())
            ]
        );
    }

    #[test]
    fn captures_route_params() {
        let mut host: MemoryHost<u8> = MemoryHost::new();
        host.register(Method::GET, "/users/{id}", echo_id(), Vec::new());

        let response = host.handle(&Method::GET, "/users/42", RequestData::new(), &[]);
        assert_eq!(response.body(), &Body::Text("42".into()));
        assert_eq!(host.routes().collect::<Vec<_>>(), vec![(&Method::GET, "/users/{id}")]);
    }

    #[test]
    fn method_and_path_must_match() {
        let mut host: MemoryHost<u8> = MemoryHost::new();
        host.register(Method::GET, "/users/{id}", echo_id(), Vec::new());

        let wrong_method = host.handle(&Method::POST, "/users/1", RequestData::new(), &[]);
        assert_eq!(wrong_method.status(), StatusCode::NOT_FOUND);

        let too_long = host.handle(&Method::GET, "/users/1/extra", RequestData::new(), &[]);
        assert_eq!(too_long.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn guarded_route_requires_a_granted_role() {
        let mut host: MemoryHost<u8> = MemoryHost::new();
        host.register(Method::GET, "/admin/{id}", echo_id(), vec![1]);

        let denied = host.handle(&Method::GET, "/admin/3", RequestData::new(), &[2]);
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let allowed = host.handle(&Method::GET, "/admin/3", RequestData::new(), &[2, 1]);
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(host.required_roles(&Method::GET, "/admin/{id}"), Some(&[1_u8][..]));
    }

    #[test]
    fn captured_segments_are_decoded() {
        let mut host: MemoryHost<u8> = MemoryHost::new();
        host.register(Method::GET, "/users/{id}", echo_id(), Vec::new());

        let spaced = host.handle(&Method::GET, "/users/a%20b", RequestData::new(), &[]);
        assert_eq!(spaced.body().as_text(), Some("a b"));

        let plus = host.handle(&Method::GET, "/users/a+b", RequestData::new(), &[]);
        assert_eq!(plus.body().as_text(), Some("a+b"));

        let invalid = host.handle(&Method::GET, "/users/%C3%28", RequestData::new(), &[]);
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn query_string_reaches_the_handler() {
        let mut host: MemoryHost<u8> = MemoryHost::new();
        host.register(
            Method::GET,
            "/search",
            Arc::new(|request: &dyn Request| {
                Response::text(StatusCode::OK, request.query_param("q").unwrap_or_default())
            }),
            Vec::new(),
        );

        let response = host.handle(&Method::GET, "/search?q=rust", RequestData::new(), &[]);
        assert_eq!(response.body().as_text(), Some("rust"));
    }
}
