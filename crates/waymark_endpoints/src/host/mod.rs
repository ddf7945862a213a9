//! The boundary to the HTTP server that actually serves routes.
//!
//! The engine does not match URLs or enforce access: a [`HostServer`] does.
//! It receives one registration per route (method, path, handler and the
//! role tokens to require) and calls the handler for matching, authorized
//! requests. [`ExposeEndpoints`] adds the exposure methods to every host:
//!
//! ```ignore
//! host.expose_type::<FirstExposedClass>(&roles)?
//!     .expose_namespace("my_app::pages", &roles)?;
//! ```
//!
//! Role names are resolved for every route of a call before the first one is
//! registered, so an unknown role leaves the host untouched.

pub mod memory;

use std::sync::Arc;

use http::Method;

pub use crate::route::RouteHandler;

use crate::discovery::{self, EndpointSet};
use crate::error::EndpointError;
use crate::plugin::EndpointConfig;
use crate::roles::RoleRegistry;
use crate::route::{RouteDescriptor, RouteTable};

/// An HTTP server that routes requests to registered handlers.
pub trait HostServer {
    /// The server's access-role token.
    type Role: Clone + Send + Sync + 'static;

    /// Registers a handler. `roles` is empty for public routes; otherwise the
    /// server must reject requests holding none of them.
    fn register(&mut self, method: Method, path: &str, handler: RouteHandler, roles: Vec<Self::Role>);
}

/// Exposure of discovered routes on a [`HostServer`].
pub trait ExposeEndpoints: HostServer + Sized {
    /// Binds and registers `routes`.
    ///
    /// # Errors
    ///
    /// [`EndpointError::RoleNotFound`] if any route names an unregistered role.
    /// Nothing is registered in that case.
    fn expose_routes<'a>(
        &mut self,
        routes: impl IntoIterator<Item = &'a Arc<RouteDescriptor>>,
        roles: &RoleRegistry<Self::Role>,
        config: &Arc<EndpointConfig>,
    ) -> Result<&mut Self, EndpointError> {
        let bound = routes
            .into_iter()
            .map(|route| route.bind(roles, config))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|err| tracing::error!(error = %err, "cannot expose endpoints"))?;

        let count = bound.len();
        for route in bound {
            tracing::debug!(method = %route.method, path = %route.path, "registering route");
            self.register(route.method, &route.path, route.handler, route.roles);
        }
        tracing::info!(routes = count, "exposed endpoints");
        Ok(self)
    }

    /// Exposes every route of a frozen [`RouteTable`].
    ///
    /// # Errors
    ///
    /// See [`expose_routes`](Self::expose_routes).
    fn expose_table(
        &mut self,
        table: &RouteTable,
        roles: &RoleRegistry<Self::Role>,
        config: &EndpointConfig,
    ) -> Result<&mut Self, EndpointError> {
        self.expose_routes(table.routes(), roles, &Arc::new(config.clone()))
    }

    /// Discovers and exposes the routes declared on `T`, with the default
    /// [`EndpointConfig`].
    ///
    /// # Errors
    ///
    /// Any discovery error, or see [`expose_routes`](Self::expose_routes).
    fn expose_type<T: EndpointSet + Default>(
        &mut self,
        roles: &RoleRegistry<Self::Role>,
    ) -> Result<&mut Self, EndpointError> {
        let routes = shared(discovery::discover_type::<T>()?);
        self.expose_routes(&routes, roles, &Arc::new(EndpointConfig::default()))
    }

    /// Discovers and exposes the routes declared under `namespace`, with the
    /// default [`EndpointConfig`].
    ///
    /// # Errors
    ///
    /// Any discovery error, or see [`expose_routes`](Self::expose_routes).
    fn expose_namespace(
        &mut self,
        namespace: &str,
        roles: &RoleRegistry<Self::Role>,
    ) -> Result<&mut Self, EndpointError> {
        let routes = shared(discovery::discover_namespace(namespace)?);
        self.expose_routes(&routes, roles, &Arc::new(EndpointConfig::default()))
    }
}

impl<H: HostServer> ExposeEndpoints for H {}

fn shared(routes: Vec<RouteDescriptor>) -> Vec<Arc<RouteDescriptor>> {
    routes.into_iter().map(Arc::new).collect()
}
