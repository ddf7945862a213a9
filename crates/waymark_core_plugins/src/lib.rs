//! Core infrastructure plugins for Waymark.
//!
//! - [`TracingPlugin`] - Logging via the `tracing` crate
//! - [`DefaultPlugins`] - Tracing plus the endpoint route table
//! - [`MinimalPlugins`] - The route table without a subscriber, for tests
//!
//! # Example
//!
//! ```
//! use waymark_app::app::App;
//! use waymark_app::plugin::PluginGroup;
//! use waymark_core_plugins::{DefaultPlugins, TracingPlugin};
//! use waymark_endpoints::plugin::EndpointsPlugin;
//!
//! let mut app = App::new();
//! app.add_plugins(
//!     DefaultPlugins
//!         .build()
//!         .disable::<EndpointsPlugin>()
//!         .add(EndpointsPlugin::new().with_upload_ack("stored")),
//! );
//! app.finish();
//! ```

mod tracing_plugin;

pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

use waymark_app::plugin::{PluginGroup, PluginGroupBuilder};
use waymark_endpoints::plugin::EndpointsPlugin;

/// Default plugins for a Waymark application.
///
/// Includes:
/// - [`TracingPlugin`] - Logging and observability
/// - [`EndpointsPlugin`] - The route table other plugins add routes to
///
/// Roles are application specific: add a
/// [`RolesPlugin`](waymark_endpoints::plugin::RolesPlugin) alongside.
pub struct DefaultPlugins;

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(TracingPlugin::default())
            .add(EndpointsPlugin::new())
    }
}

/// [`DefaultPlugins`] without tracing, for tests that don't want a global
/// subscriber installed.
pub struct MinimalPlugins;

impl PluginGroup for MinimalPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new().add(EndpointsPlugin::new())
    }
}
