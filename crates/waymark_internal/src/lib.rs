//! # Waymark Internal Library
//!
//! Re-exports the Waymark crates for the umbrella crate.

/// Plugins, resources and the startup orchestrator.
pub use waymark_app;

/// The endpoint dispatch engine and `#[endpoints]`.
pub use waymark_endpoints;

/// Tracing and the default plugin groups.
pub use waymark_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use waymark_app::app::App;
    pub use waymark_app::plugin::{Plugin, PluginGroup, PluginId};
    pub use waymark_app::resource::GlobalResource;
    pub use waymark_core_plugins::{DefaultPlugins, MinimalPlugins, TracingFormat, TracingPlugin};
    pub use waymark_endpoints::host::memory::MemoryHost;
    pub use waymark_endpoints::{
        EndpointConfig, EndpointDescriptor, EndpointError, EndpointSet, EndpointsPlugin,
        ExposeEndpoints, HandlerOutput, HostServer, Request, RequestData, Response,
        RoleRegistry, RolesPlugin, RouteDescriptor, RouteTable, SourceKind, UploadedFile,
        endpoints,
    };
}
