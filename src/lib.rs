//! Expose plain methods as HTTP endpoints.
//!
//! ```
//! use waymark::prelude::*;
//! use waymark::waymark_endpoints::http::Method;
//!
//! #[derive(Default)]
//! struct Greetings;
//!
//! #[endpoints]
//! impl Greetings {
//!     #[api(GET, "/greet/{name}")]
//!     fn greet(&self, #[param("name", route)] name: String) -> String {
//!         format!("Hello, {name}")
//!     }
//! }
//!
//! let mut host: MemoryHost<u8> = MemoryHost::new();
//! host.expose_type::<Greetings>(&RoleRegistry::new()).unwrap();
//!
//! let response = host.handle(&Method::GET, "/greet/Ada", RequestData::new(), &[]);
//! assert_eq!(response.body().as_text(), Some("Hello, Ada"));
//! ```

pub use waymark_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use waymark_internal::prelude::*;
}
