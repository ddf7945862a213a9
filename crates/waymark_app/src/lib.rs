//! Plugin orchestration for Waymark.
//!
//! This crate holds the startup machinery every other Waymark crate builds
//! on: the [`App`](app::App) that sorts and drives [`Plugin`](plugin::Plugin)s,
//! and the [`Resources`](resource::Resources) they use to hand state to each
//! other.

pub mod app;
pub mod plugin;
pub mod resource;
