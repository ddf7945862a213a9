//! Plugins: the unit of startup composition.
//!
//! Everything an application wires together at startup (tracing, role
//! mappings, route tables, host exposure) is contributed by a [`Plugin`].
//! The [`App`] orders plugins by their declared dependencies and drives each
//! one through `build`, `ready` and finally `cleanup`.
//!
//! # Example
//!
//! ```
//! use waymark_app::app::App;
//! use waymark_app::plugin::{Plugin, PluginId};
//!
//! struct Banner(&'static str);
//!
//! struct LoggingPlugin;
//! impl Plugin for LoggingPlugin {
//!     fn build(&self, _app: &mut App) {}
//! }
//!
//! struct BannerPlugin;
//! impl Plugin for BannerPlugin {
//!     fn build(&self, app: &mut App) {
//!         app.insert_resource(Banner("waymark"));
//!     }
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<LoggingPlugin>()]
//!     }
//! }
//!
//! let mut app = App::new();
//! app.add_plugins(LoggingPlugin).add_plugins(BannerPlugin);
//! app.finish();
//! ```

use core::any::TypeId;

use crate::app::App;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a plugin type, used for ordering and duplicate checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Returns the id of plugin type `P`.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of startup configuration.
///
/// Lifecycle, as driven by [`App::finish`] and [`App::cleanup`]:
///
/// 1. `build()` in dependency order: insert resources, extend resources
///    inserted by dependencies.
/// 2. `ready()` in dependency order: freeze mutable resources into globals,
///    validate what other plugins left behind, register with the host.
/// 3. `cleanup()` in reverse dependency order.
pub trait Plugin: Send + Sync + 'static {
    /// Inserts or extends resources.
    fn build(&self, app: &mut App);

    /// Runs once every plugin has been built.
    fn ready(&self, _app: &mut App) {}

    /// Runs on shutdown. Dependents are cleaned up before their dependencies.
    fn cleanup(&self, _app: &mut App) {}

    /// Name used in logs and panic messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Plugins that must be present, and are built before this one.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Whether adding this plugin type twice is an error. Defaults to `true`.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins (add_plugins polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Anything accepted by [`App::add_plugins`]: a single plugin or a group.
pub trait Plugins {
    /// Adds the plugin(s) to `app`.
    fn add_to_app(self, app: &mut App);
}

impl<P: Plugin> Plugins for P {
    fn add_to_app(self, app: &mut App) {
        app.add_boxed(BoxedPlugin::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_app(self, app: &mut App) {
        for boxed in self.plugins {
            app.add_boxed(boxed);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup
// ─────────────────────────────────────────────────────────────────────────────

/// A named bundle of plugins that callers can customize before adding.
///
/// ```ignore
/// App::new().add_plugins(
///     DefaultPlugins
///         .build()
///         .disable::<TracingPlugin>()
///         .add(RolesPlugin::new(roles)),
/// );
/// ```
pub trait PluginGroup {
    /// Produces the group's plugins.
    fn build(self) -> PluginGroupBuilder;
}

/// A plugin boxed together with the id captured from its concrete type.
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

impl BoxedPlugin {
    fn new<P: Plugin>(plugin: P) -> Self {
        Self {
            id: PluginId::of::<P>(),
            plugin: Box::new(plugin),
        }
    }
}

/// Ordered, editable list of plugins produced by a [`PluginGroup`].
#[derive(Default)]
pub struct PluginGroupBuilder {
    plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin::new(plugin));
        self
    }

    /// Inserts a plugin right after `Target`, or at the end if `Target` is absent.
    #[must_use]
    pub fn add_after<P: Plugin, Target: Plugin>(mut self, plugin: P) -> Self {
        let target = PluginId::of::<Target>();
        let position = self
            .plugins
            .iter()
            .position(|p| p.id == target)
            .map_or(self.plugins.len(), |index| index + 1);
        self.plugins.insert(position, BoxedPlugin::new(plugin));
        self
    }

    /// Removes every plugin of type `P`. No-op if none is present.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let target = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != target);
        self
    }

    /// Returns `true` if a plugin of type `P` is in the group.
    #[must_use]
    pub fn contains<P: Plugin>(&self) -> bool {
        let target = PluginId::of::<P>();
        self.plugins.iter().any(|p| p.id == target)
    }

    /// Number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
