//! Route descriptors, their dispatch, and the route table.
//!
//! A [`RouteDescriptor`] is one exposed handler: its [`EndpointDescriptor`],
//! its declared parameters and the [`EndpointHandler`] that calls it. It is
//! validated on construction, so unsupported parameter conversions and arity
//! mismatches are reported before anything is registered with a host.
//!
//! Routes come from `#[endpoints]` impl blocks (see
//! [`discovery`](crate::discovery)) or are built by hand:
//!
//! ```
//! use http::Method;
//! use waymark_endpoints::endpoint::EndpointDescriptor;
//! use waymark_endpoints::param::SourceKind;
//! use waymark_endpoints::plugin::EndpointConfig;
//! use waymark_endpoints::request::RequestData;
//! use waymark_endpoints::response::HandlerOutput;
//! use waymark_endpoints::route::RouteDescriptor;
//!
//! let route = RouteDescriptor::builder(EndpointDescriptor::api(Method::GET, "/double/{n}"))
//!     .param::<i64>("n", SourceKind::Route)
//!     .handler(|mut args| HandlerOutput::api(&(args.take::<i64>(0)? * 2)))
//!     .unwrap();
//!
//! let request = RequestData::new().with_path_param("n", "21");
//! let response = route.handle(&request, &EndpointConfig::default());
//! assert_eq!(response.body().as_text(), Some("42"));
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use waymark_app::resource::GlobalResource;

use crate::discovery::{self, EndpointSet};
use crate::endpoint::EndpointDescriptor;
use crate::error::EndpointError;
use crate::param::{Arguments, FromParam, ParameterDescriptor, SourceKind, resolve_all};
use crate::plugin::EndpointConfig;
use crate::request::Request;
use crate::response::{HandlerOutput, Response, shape};
use crate::roles::RoleRegistry;

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// The callable behind a route.
///
/// Implementations are shared by every concurrent request and must not keep
/// request-scoped mutable state.
pub trait EndpointHandler: Send + Sync + 'static {
    /// Number of arguments the handler consumes.
    fn arity(&self) -> usize;

    /// Calls the handler with resolved arguments.
    ///
    /// # Errors
    ///
    /// Whatever the handler fails with, usually [`EndpointError::Invocation`].
    fn invoke(&self, args: Arguments) -> Result<HandlerOutput, EndpointError>;
}

/// An [`EndpointHandler`] backed by a closure.
pub struct FnHandler<F> {
    arity: usize,
    call: F,
}

impl<F> EndpointHandler for FnHandler<F>
where
    F: Fn(Arguments) -> Result<HandlerOutput, EndpointError> + Send + Sync + 'static,
{
    fn arity(&self) -> usize {
        self.arity
    }

    fn invoke(&self, args: Arguments) -> Result<HandlerOutput, EndpointError> {
        (self.call)(args)
    }
}

/// Wraps a closure taking `arity` arguments as an [`EndpointHandler`].
pub fn handler_fn<F>(arity: usize, call: F) -> FnHandler<F>
where
    F: Fn(Arguments) -> Result<HandlerOutput, EndpointError> + Send + Sync + 'static,
{
    FnHandler { arity, call }
}

/// Host-facing request handler produced by [`RouteDescriptor::bind`].
pub type RouteHandler = Arc<dyn Fn(&dyn Request) -> Response + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// RouteDescriptor
// ─────────────────────────────────────────────────────────────────────────────

/// One exposed handler.
#[derive(Clone)]
pub struct RouteDescriptor {
    endpoint: EndpointDescriptor,
    parameters: Vec<ParameterDescriptor>,
    handler: Arc<dyn EndpointHandler>,
    declared_in: String,
}

impl core::fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("endpoint", &self.endpoint)
            .field("parameters", &self.parameters)
            .field("declared_in", &self.declared_in)
            .finish_non_exhaustive()
    }
}

impl RouteDescriptor {
    /// Creates a validated route.
    ///
    /// # Errors
    ///
    /// - [`EndpointError::MissingStrategy`] if a parameter's (source, target)
    ///   pair has no conversion
    /// - [`EndpointError::ArityMismatch`] if the handler's arity differs from
    ///   the number of declared parameters
    pub fn new(
        endpoint: EndpointDescriptor,
        parameters: Vec<ParameterDescriptor>,
        handler: Arc<dyn EndpointHandler>,
        declared_in: impl Into<String>,
    ) -> Result<Self, EndpointError> {
        for parameter in &parameters {
            parameter.strategy()?;
        }
        if handler.arity() != parameters.len() {
            return Err(EndpointError::ArityMismatch {
                path: endpoint.path().to_owned(),
                expected: parameters.len(),
                actual: handler.arity(),
            });
        }

        Ok(Self {
            endpoint,
            parameters,
            handler,
            declared_in: declared_in.into(),
        })
    }

    /// Starts building a route by hand.
    #[must_use]
    pub fn builder(endpoint: EndpointDescriptor) -> RouteBuilder {
        RouteBuilder {
            endpoint,
            parameters: Vec::new(),
            declared_in: String::from("builder"),
        }
    }

    /// Endpoint metadata.
    #[must_use]
    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    /// Declared parameters, in call order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Name of the type the handler was declared on.
    #[must_use]
    pub fn declared_in(&self) -> &str {
        &self.declared_in
    }

    /// Resolves arguments, invokes the handler and shapes its output.
    ///
    /// # Errors
    ///
    /// The first failure along the way: parameter conversion, handler
    /// invocation or shaping. A panicking handler is reported as
    /// [`EndpointError::Invocation`].
    pub fn dispatch(
        &self,
        request: &dyn Request,
        config: &EndpointConfig,
    ) -> Result<Response, EndpointError> {
        let args = resolve_all(&self.parameters, request)?;
        let output = catch_unwind(AssertUnwindSafe(|| self.handler.invoke(args)))
            .map_err(|payload| {
                EndpointError::invocation(
                    self.endpoint.path(),
                    discovery::panic_message(payload.as_ref()),
                )
            })??;
        shape(&self.endpoint, output, config)
    }

    /// Like [`dispatch`](Self::dispatch), answering failures with an error
    /// response: 400 for parameter conversion, 500 for everything else.
    pub fn handle(&self, request: &dyn Request, config: &EndpointConfig) -> Response {
        self.dispatch(request, config).unwrap_or_else(|err| {
            if err.status().is_client_error() {
                tracing::warn!(
                    method = %self.endpoint.method(),
                    path = self.endpoint.path(),
                    error = %err,
                    "rejected request"
                );
            } else {
                tracing::error!(
                    method = %self.endpoint.method(),
                    path = self.endpoint.path(),
                    declared_in = %self.declared_in,
                    error = %err,
                    "endpoint failed"
                );
            }
            Response::from_error(&err, config.echo_errors())
        })
    }

    /// Resolves the route's role tokens and wraps it for registration.
    ///
    /// # Errors
    ///
    /// [`EndpointError::RoleNotFound`] if the access role is not registered.
    pub fn bind<R: Clone>(
        self: &Arc<Self>,
        roles: &RoleRegistry<R>,
        config: &Arc<EndpointConfig>,
    ) -> Result<BoundRoute<R>, EndpointError> {
        let required = roles.required_roles(self.endpoint.access_role())?;
        let route = Arc::clone(self);
        let config = Arc::clone(config);
        Ok(BoundRoute {
            method: self.endpoint.method().clone(),
            path: self.endpoint.path().to_owned(),
            roles: required,
            handler: Arc::new(move |request: &dyn Request| route.handle(request, &config)),
        })
    }
}

/// A route ready to be registered with a host.
pub struct BoundRoute<R> {
    /// HTTP method.
    pub method: Method,
    /// Route path.
    pub path: String,
    /// Role tokens the host must require. Empty for public routes.
    pub roles: Vec<R>,
    /// Request handler.
    pub handler: RouteHandler,
}

/// Builder for [`RouteDescriptor`]s registered without `#[endpoints]`.
#[derive(Debug)]
pub struct RouteBuilder {
    endpoint: EndpointDescriptor,
    parameters: Vec<ParameterDescriptor>,
    declared_in: String,
}

impl RouteBuilder {
    /// Declares the next parameter. Its target is derived from `T`.
    #[must_use]
    pub fn param<T: FromParam>(mut self, name: impl Into<String>, source: SourceKind) -> Self {
        self.parameters.push(ParameterDescriptor::of::<T>(name, source));
        self
    }

    /// Names the owner reported in logs and listings.
    #[must_use]
    pub fn declared_in(mut self, owner: impl Into<String>) -> Self {
        self.declared_in = owner.into();
        self
    }

    /// Finishes the route with a closure taking every declared parameter.
    ///
    /// # Errors
    ///
    /// See [`RouteDescriptor::new`].
    pub fn handler<F>(self, call: F) -> Result<RouteDescriptor, EndpointError>
    where
        F: Fn(Arguments) -> Result<HandlerOutput, EndpointError> + Send + Sync + 'static,
    {
        let arity = self.parameters.len();
        RouteDescriptor::new(
            self.endpoint,
            self.parameters,
            Arc::new(handler_fn(arity, call)),
            self.declared_in,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RouteTable
// ─────────────────────────────────────────────────────────────────────────────

/// Every route of an application, keyed by method and path.
///
/// Filled during startup (see [`EndpointsPlugin`](crate::plugin::EndpointsPlugin))
/// and read-only afterwards.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: IndexMap<(Method, String), Arc<RouteDescriptor>>,
}

impl GlobalResource for RouteTable {}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.
    ///
    /// # Panics
    ///
    /// Panics if a route with the same method and path is already present.
    pub fn add_route(&mut self, route: RouteDescriptor) -> &mut Self {
        let key = (
            route.endpoint().method().clone(),
            route.endpoint().path().to_owned(),
        );
        assert!(
            !self.routes.contains_key(&key),
            "Route '{} {}' is already registered",
            key.0,
            key.1
        );
        tracing::debug!(
            method = %key.0,
            path = %key.1,
            kind = %route.endpoint().kind(),
            declared_in = route.declared_in(),
            "route added"
        );
        self.routes.insert(key, Arc::new(route));
        self
    }

    /// Adds every route declared on `T`.
    ///
    /// # Errors
    ///
    /// See [`discover_type`](discovery::discover_type).
    ///
    /// # Panics
    ///
    /// Panics on a duplicate method and path.
    pub fn add_type<T: EndpointSet + Default>(&mut self) -> Result<&mut Self, EndpointError> {
        for route in discovery::discover_type::<T>()? {
            self.add_route(route);
        }
        Ok(self)
    }

    /// Adds every route declared under `namespace`.
    ///
    /// # Errors
    ///
    /// See [`discover_namespace`](discovery::discover_namespace).
    ///
    /// # Panics
    ///
    /// Panics on a duplicate method and path.
    pub fn add_namespace(&mut self, namespace: &str) -> Result<&mut Self, EndpointError> {
        for route in discovery::discover_namespace(namespace)? {
            self.add_route(route);
        }
        Ok(self)
    }

    /// Looks up a route by method and exact path template.
    #[must_use]
    pub fn get(&self, method: &Method, path: &str) -> Option<&Arc<RouteDescriptor>> {
        self.routes.get(&(method.clone(), path.to_owned()))
    }

    /// All routes, in insertion order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteDescriptor>> {
        self.routes.values()
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
