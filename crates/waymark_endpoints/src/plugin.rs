//! Startup plugins for roles and routes.
//!
//! Both plugins follow the same two-phase pattern: a mutable resource is
//! inserted in `build()` so dependent plugins can extend it, then frozen into
//! a [`GlobalResource`] in `ready()`.
//!
//! ```
//! use waymark_app::app::App;
//! use waymark_endpoints::plugin::{EndpointConfig, EndpointsPlugin, RolesPlugin};
//! use waymark_endpoints::roles::RoleRegistry;
//! use waymark_endpoints::route::RouteTable;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Role {
//!     Admin,
//! }
//!
//! let mut app = App::new();
//! app.add_plugins(RolesPlugin::new([("ADMIN", Role::Admin)]))
//!     .add_plugins(EndpointsPlugin::new().with_upload_ack("thanks"));
//! app.finish();
//!
//! assert!(app.get_global::<RoleRegistry<Role>>().unwrap().contains("ADMIN"));
//! assert!(app.get_global::<RouteTable>().unwrap().is_empty());
//! assert_eq!(app.get_global::<EndpointConfig>().unwrap().upload_ack(), "thanks");
//! ```

use parking_lot::Mutex;
use waymark_app::app::App;
use waymark_app::plugin::Plugin;
use waymark_app::resource::GlobalResource;

use crate::discovery::EndpointSet;
use crate::error::EndpointError;
use crate::roles::RoleRegistry;
use crate::route::{RouteDescriptor, RouteTable};

// ─────────────────────────────────────────────────────────────────────────────
// EndpointConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Dispatch settings shared by every route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    upload_ack: String,
    echo_errors: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            upload_ack: String::from("Upload received"),
            echo_errors: true,
        }
    }
}

impl GlobalResource for EndpointConfig {}

impl EndpointConfig {
    /// Sets the body sent after a successful upload.
    #[must_use]
    pub fn with_upload_ack(mut self, text: impl Into<String>) -> Self {
        self.upload_ack = text.into();
        self
    }

    /// Whether 400 responses carry the parameter conversion message.
    #[must_use]
    pub fn with_echo_errors(mut self, enabled: bool) -> Self {
        self.echo_errors = enabled;
        self
    }

    /// Body sent after a successful upload.
    #[must_use]
    pub fn upload_ack(&self) -> &str {
        &self.upload_ack
    }

    /// Whether 400 responses carry the parameter conversion message.
    #[must_use]
    pub fn echo_errors(&self) -> bool {
        self.echo_errors
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RolesPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Provides the [`RoleRegistry<R>`] global resource.
pub struct RolesPlugin<R> {
    roles: Vec<(String, R)>,
}

impl<R> RolesPlugin<R> {
    /// Creates the plugin from a symbolic name to token mapping.
    pub fn new<K: Into<String>>(roles: impl IntoIterator<Item = (K, R)>) -> Self {
        Self {
            roles: roles
                .into_iter()
                .map(|(name, token)| (name.into(), token))
                .collect(),
        }
    }
}

impl<R: Clone + Send + Sync + 'static> Plugin for RolesPlugin<R> {
    fn build(&self, app: &mut App) {
        let registry: RoleRegistry<R> = self.roles.iter().cloned().collect();
        app.insert_resource(registry);
    }

    fn ready(&self, app: &mut App) {
        let Some(registry) = app.remove_resource::<RoleRegistry<R>>() else {
            panic!("RoleRegistry should exist from build phase");
        };
        tracing::info!(roles = ?registry.names(), "role registry ready");
        app.insert_global(registry);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EndpointsPlugin
// ─────────────────────────────────────────────────────────────────────────────

type Registrar = Box<dyn FnOnce(&mut RouteTable) -> Result<(), EndpointError> + Send>;

/// Provides the [`RouteTable`] and [`EndpointConfig`] global resources.
///
/// Routes can be added up front with [`with_type`](Self::with_type),
/// [`with_namespace`](Self::with_namespace) and [`with_route`](Self::with_route),
/// or by other plugins that depend on this one and extend the mutable
/// [`RouteTable`] during `build()`.
///
/// # Panics
///
/// `build()` panics on any configuration error (failed instantiation,
/// unsupported parameter, duplicate route): the app cannot start with a
/// broken route table.
#[derive(Default)]
pub struct EndpointsPlugin {
    config: EndpointConfig,
    registrars: Mutex<Vec<Registrar>>,
}

impl core::fmt::Debug for EndpointsPlugin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EndpointsPlugin")
            .field("config", &self.config)
            .field("registrars", &self.registrars.lock().len())
            .finish()
    }
}

impl EndpointsPlugin {
    /// Creates the plugin with the default [`EndpointConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole dispatch configuration.
    #[must_use]
    pub fn with_config(mut self, config: EndpointConfig) -> Self {
        self.config = config;
        self
    }

    /// See [`EndpointConfig::with_upload_ack`].
    #[must_use]
    pub fn with_upload_ack(mut self, text: impl Into<String>) -> Self {
        self.config = self.config.with_upload_ack(text);
        self
    }

    /// See [`EndpointConfig::with_echo_errors`].
    #[must_use]
    pub fn with_echo_errors(mut self, enabled: bool) -> Self {
        self.config = self.config.with_echo_errors(enabled);
        self
    }

    /// Adds the routes declared on `T` during `build()`.
    #[must_use]
    pub fn with_type<T: EndpointSet + Default>(self) -> Self {
        self.registrar(|table| table.add_type::<T>().map(drop))
    }

    /// Adds the routes declared under `namespace` during `build()`.
    #[must_use]
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.registrar(move |table| table.add_namespace(&namespace).map(drop))
    }

    /// Adds a hand-built route during `build()`.
    #[must_use]
    pub fn with_route(self, route: RouteDescriptor) -> Self {
        self.registrar(move |table| {
            table.add_route(route);
            Ok(())
        })
    }

    fn registrar(
        self,
        register: impl FnOnce(&mut RouteTable) -> Result<(), EndpointError> + Send + 'static,
    ) -> Self {
        self.registrars.lock().push(Box::new(register));
        self
    }
}

impl Plugin for EndpointsPlugin {
    fn build(&self, app: &mut App) {
        let mut table = RouteTable::new();
        for register in self.registrars.lock().drain(..) {
            if let Err(err) = register(&mut table) {
                tracing::error!(error = %err, "invalid endpoint configuration");
                panic!("invalid endpoint configuration: {err}");
            }
        }
        app.insert_resource(table);
        app.insert_global(self.config.clone());
    }

    fn ready(&self, app: &mut App) {
        let Some(table) = app.remove_resource::<RouteTable>() else {
            panic!("RouteTable should exist from build phase");
        };
        tracing::info!(routes = table.len(), "route table ready");
        app.insert_global(table);
    }
}
