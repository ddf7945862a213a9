//! Finding the routes declared by `#[endpoints]` impl blocks.
//!
//! The [`endpoints`](crate::endpoints) attribute implements [`EndpointSet`]
//! for the annotated type and submits an [`EndpointSetRegistration`] to a
//! link-time registry. Two discovery scopes are built on that:
//!
//! - [`discover_type`]: the routes declared on one type.
//! - [`discover_namespace`]: the routes of every annotated type whose module
//!   path is `namespace` or nested below it.
//!
//! Both construct one instance of each declaring type through `Default` and
//! share it between every route of that type.
//!
//! ```ignore
//! mod sample {
//!     pub mod first {
//!         #[derive(Default)]
//!         pub struct FirstExposedClass;
//!
//!         #[waymark_endpoints::endpoints]
//!         impl FirstExposedClass {
//!             #[api(GET, "/api/first")]
//!             fn hello(&self) -> String {
//!                 "API response for FirstExposedClass".into()
//!             }
//!         }
//!     }
//! }
//!
//! let routes = discover_namespace(concat!(module_path!(), "::sample"))?;
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::EndpointError;
use crate::route::RouteDescriptor;

/// A type whose methods are exposed as endpoints.
///
/// Implemented by `#[endpoints]`. Manual implementations are possible but the
/// attribute also takes care of namespace registration.
pub trait EndpointSet: Send + Sync + 'static {
    /// Builds one route per exposed method, all sharing `instance`.
    ///
    /// # Errors
    ///
    /// Any route validation error, see [`RouteDescriptor::new`].
    fn routes(instance: Arc<Self>) -> Result<Vec<RouteDescriptor>, EndpointError>;
}

/// Link-time record of one `#[endpoints]` type.
#[derive(Debug)]
pub struct EndpointSetRegistration {
    module_path: &'static str,
    type_name: &'static str,
    discover: fn() -> Result<Vec<RouteDescriptor>, EndpointError>,
}

inventory::collect!(EndpointSetRegistration);

impl EndpointSetRegistration {
    /// Creates a registration. Emitted by `#[endpoints]`.
    #[must_use]
    pub const fn new(
        module_path: &'static str,
        type_name: &'static str,
        discover: fn() -> Result<Vec<RouteDescriptor>, EndpointError>,
    ) -> Self {
        Self {
            module_path,
            type_name,
            discover,
        }
    }

    /// Module the type was declared in, as given by `module_path!()`.
    #[must_use]
    pub fn module_path(&self) -> &'static str {
        self.module_path
    }

    /// Unqualified type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the type lives in `namespace` or below it.
    #[must_use]
    pub fn is_within(&self, namespace: &str) -> bool {
        self.module_path
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    }

    /// Instantiates the type and builds its routes.
    ///
    /// # Errors
    ///
    /// See [`discover_type`].
    pub fn discover(&self) -> Result<Vec<RouteDescriptor>, EndpointError> {
        (self.discover)()
    }
}

/// Every registered `#[endpoints]` type, sorted by module path then type name.
pub fn registrations() -> Vec<&'static EndpointSetRegistration> {
    let mut all: Vec<_> = inventory::iter::<EndpointSetRegistration>.into_iter().collect();
    all.sort_by(|a, b| (a.module_path, a.type_name).cmp(&(b.module_path, b.type_name)));
    all
}

/// Builds the routes declared on `T`, in declaration order.
///
/// # Errors
///
/// - [`EndpointError::HandlerInstantiation`] if `T::default()` panics
/// - any route validation error
pub fn discover_type<T: EndpointSet + Default>() -> Result<Vec<RouteDescriptor>, EndpointError> {
    let type_name = core::any::type_name::<T>();
    let instance = catch_unwind(AssertUnwindSafe(T::default)).map_err(|payload| {
        let reason = panic_message(payload.as_ref());
        tracing::error!(type_name, %reason, "could not instantiate endpoint type");
        EndpointError::HandlerInstantiation {
            type_name: type_name.to_owned(),
            reason,
        }
    })?;

    let routes = T::routes(Arc::new(instance))?;
    tracing::debug!(type_name, routes = routes.len(), "discovered endpoint type");
    Ok(routes)
}

/// Builds the routes of every `#[endpoints]` type under `namespace`.
///
/// Matching is by whole module path segments: `app::api` covers
/// `app::api` and `app::api::v2` but not `app::api_v2`. Routes are ordered by
/// module path, then type name, then declaration order.
///
/// # Errors
///
/// The first error from [`discover_type`] among the matched types.
pub fn discover_namespace(namespace: &str) -> Result<Vec<RouteDescriptor>, EndpointError> {
    let mut routes = Vec::new();
    let mut types = 0_usize;
    for registration in registrations()
        .into_iter()
        .filter(|registration| registration.is_within(namespace))
    {
        routes.extend(registration.discover()?);
        types += 1;
    }
    tracing::info!(namespace, types, routes = routes.len(), "discovered endpoint namespace");
    Ok(routes)
}

pub(crate) fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("constructor panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use http::Method;

    use crate::endpoint::EndpointDescriptor;
    use crate::response::HandlerOutput;

    struct Exploding;

    impl Default for Exploding {
        fn default() -> Self {
            panic!("no database configured");
        }
    }

    impl EndpointSet for Exploding {
        fn routes(_instance: Arc<Self>) -> Result<Vec<RouteDescriptor>, EndpointError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Greeter {
        greeting: String,
    }

    impl EndpointSet for Greeter {
        fn routes(instance: Arc<Self>) -> Result<Vec<RouteDescriptor>, EndpointError> {
            let route = RouteDescriptor::builder(EndpointDescriptor::api(Method::GET, "/hello"))
                .declared_in("Greeter")
                .handler(move |_| HandlerOutput::api(&format!("{}!", instance.greeting)))?;
            Ok(vec![route])
        }
    }

    #[test]
    fn failing_constructor_is_instantiation_error() {
        let err = discover_type::<Exploding>().unwrap_err();
        let EndpointError::HandlerInstantiation { type_name, reason } = err else {
            panic!("expected HandlerInstantiation");
        };
        assert!(type_name.ends_with("Exploding"));
        assert_eq!(reason, "no database configured");
    }

    #[test]
    fn manual_endpoint_set_is_discovered() {
        let routes = discover_type::<Greeter>().unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].endpoint().path(), "/hello");
        assert_eq!(routes[0].declared_in(), "Greeter");
    }

    #[test]
    fn namespace_matching_uses_whole_segments() {
        fn none() -> Result<Vec<RouteDescriptor>, EndpointError> {
            Ok(Vec::new())
        }
        let registration = EndpointSetRegistration::new("app::api::v2", "Users", none);

        assert!(registration.is_within("app::api"));
        assert!(registration.is_within("app::api::v2"));
        assert!(registration.is_within("app"));
        assert!(!registration.is_within("app::ap"));
        assert!(!registration.is_within("app::api::v2::admin"));
    }

    #[test]
    fn unknown_namespace_is_empty() {
        assert!(discover_namespace("no::such::namespace").unwrap().is_empty());
    }
}
