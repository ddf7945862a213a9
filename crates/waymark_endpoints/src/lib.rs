//! Annotated endpoint dispatch for Waymark.
//!
//! Ordinary methods become HTTP endpoints by carrying declarative metadata.
//! At startup the metadata is discovered and turned into route descriptors
//! that a host server registers; per request, the engine converts untyped
//! request data into typed arguments, calls the method and shapes what it
//! returned into a response.
//!
//! # Quick Start
//!
//! ```ignore
//! use waymark_endpoints::{endpoints, ExposeEndpoints, RoleRegistry};
//!
//! #[derive(Default)]
//! struct Reports;
//!
//! #[endpoints]
//! impl Reports {
//!     #[api(GET, "/api/reports/{year}", role = "ADMIN")]
//!     fn count(&self, #[param("year", route)] year: i64) -> i64 {
//!         year % 7
//!     }
//!
//!     #[download(GET, "/reports.csv", content_type = "text/csv", filename = "reports.csv")]
//!     fn export(&self) -> Vec<u8> {
//!         b"year,count\n".to_vec()
//!     }
//! }
//!
//! let roles: RoleRegistry<MyRole> = [("ADMIN", MyRole::Admin)].into_iter().collect();
//! host.expose_type::<Reports>(&roles)?;
//! ```
//!
//! # Architecture
//!
//! - [`param`]: parameter descriptors and the conversion strategy table
//! - [`roles`]: symbolic role name to host role token
//! - [`endpoint`]: endpoint variants and their metadata
//! - [`route`]: validated route descriptors, dispatch and the route table
//! - [`response`]: handler output and response shaping
//! - [`discovery`]: routes of a type or of a namespace
//! - [`host`]: the host server boundary and an in-memory host
//! - [`plugin`]: startup plugins for roles, routes and dispatch settings

// Self-reference so `#[endpoints]` output can use `waymark_endpoints::` paths inside this crate.
extern crate self as waymark_endpoints;

pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod host;
pub mod param;
pub mod plugin;
pub mod request;
pub mod response;
pub mod roles;
pub mod route;

pub use discovery::{EndpointSet, EndpointSetRegistration, discover_namespace, discover_type};
pub use endpoint::{AssetKind, EndpointDescriptor, EndpointKind};
pub use error::EndpointError;
pub use host::{ExposeEndpoints, HostServer};
pub use param::{Arguments, FromParam, ParamValue, ParameterDescriptor, SourceKind, TargetType};
pub use plugin::{EndpointConfig, EndpointsPlugin, RolesPlugin};
pub use request::{Request, RequestData, UploadedFile};
pub use response::{ApiBody, Body, HandlerOutput, Response};
pub use roles::RoleRegistry;
pub use route::{EndpointHandler, RouteDescriptor, RouteHandler, RouteTable};

// Used by `#[endpoints]` output.
#[doc(hidden)]
pub use http;
#[doc(hidden)]
pub use inventory;

pub use endpoint_macros::endpoints;
