//! The plugin orchestrator.
//!
//! An [`App`] owns the startup [`Resources`] and the plugins that fill them.
//! It does nothing by itself: the role registry, the route table and the
//! host registrations are all contributed by plugins.
//!
//! # Resource scoping
//!
//! - **Mutable resources** (`insert_resource`) are edited during `build()`.
//! - **Global resources** (`insert_global`) are read-only once inserted and
//!   hold everything request handling needs after startup.
//!
//! # Lifecycle
//!
//! 1. Dependency resolution: validate and topologically sort plugins.
//! 2. `build()` on each plugin, dependencies first.
//! 3. `ready()` on each plugin in the same order.
//! 4. `cleanup()` in reverse order, on [`App::cleanup`].

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use crate::plugin::{BoxedPlugin, Plugin, PluginId, Plugins};
use crate::resource::{GlobalResource, Resource, ResourceRef, ResourceRefMut, Resources};

/// Where the app is in its startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// `finish()` has not been called.
    NotStarted,
    /// Plugins are being built; newly added plugins are built immediately.
    Building,
    /// Build and ready phases are complete.
    Built,
}

struct PluginEntry {
    id: PluginId,
    plugin: Box<dyn Plugin>,
    name: String,
}

/// Plugin orchestrator and owner of startup resources.
pub struct App {
    resources: Resources,
    global: Resources,
    pending: Vec<PluginEntry>,
    built: Vec<PluginEntry>,
    plugin_ids: HashSet<PluginId>,
    build_state: BuildState,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for App {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let plugins: Vec<&str> = self
            .built
            .iter()
            .chain(&self.pending)
            .map(|entry| entry.name.as_str())
            .collect();
        f.debug_struct("App")
            .field("plugins", &plugins)
            .field("resources", &self.resources)
            .field("global", &self.global)
            .field("build_state", &self.build_state)
            .finish()
    }
}

impl App {
    /// Creates an app with no plugins and no resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: Resources::new(),
            global: Resources::new(),
            pending: Vec::new(),
            built: Vec::new(),
            plugin_ids: HashSet::new(),
            build_state: BuildState::NotStarted,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugins
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a plugin or a plugin group.
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin type is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_app(self);
        self
    }

    pub(crate) fn add_boxed(&mut self, boxed: BoxedPlugin) {
        let BoxedPlugin { id, plugin } = boxed;
        let name = plugin.name().to_string();

        if plugin.is_unique() && self.plugin_ids.contains(&id) {
            panic!(
                "Plugin '{name}' is unique and was already added.\n\
                 Return `false` from `is_unique()` to allow multiple instances."
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry { id, plugin, name };
        if self.build_state == BuildState::Building {
            tracing::debug!(plugin = %entry.name, "building plugin added during build");
            entry.plugin.build(self);
            self.built.push(entry);
        } else {
            self.pending.push(entry);
        }
    }

    /// Returns `true` if a plugin of type `P` was added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_ids.contains(&PluginId::of::<P>())
    }

    /// Current build state.
    #[must_use]
    pub fn build_state(&self) -> BuildState {
        self.build_state
    }

    /// Returns `true` once `finish()` has completed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.build_state == BuildState::Built
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutable resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a mutable resource, returning the previous value of that type.
    pub fn insert_resource<R: Resource>(&mut self, resource: R) -> Option<R> {
        self.resources.insert(resource)
    }

    /// Returns `true` if a mutable resource of type `R` exists.
    #[must_use]
    pub fn contains_resource<R: Resource>(&self) -> bool {
        self.resources.contains::<R>()
    }

    /// Borrows a mutable resource for reading.
    #[must_use]
    pub fn get_resource<R: Resource>(&self) -> Option<ResourceRef<'_, R>> {
        self.resources.get::<R>().ok()
    }

    /// Borrows a mutable resource for writing.
    #[must_use]
    pub fn get_resource_mut<R: Resource>(&self) -> Option<ResourceRefMut<'_, R>> {
        self.resources.get_mut::<R>().ok()
    }

    /// Removes a mutable resource.
    pub fn remove_resource<R: Resource>(&mut self) -> Option<R> {
        self.resources.remove::<R>()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Global resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a global resource.
    ///
    /// Globals are only handed out through shared borrows. Plugins usually
    /// insert them from `ready()`, after every plugin had a chance to extend
    /// the mutable version.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.global.insert(resource)
    }

    /// Returns `true` if a global resource of type `R` exists.
    #[must_use]
    pub fn contains_global<R: GlobalResource>(&self) -> bool {
        self.global.contains::<R>()
    }

    /// Borrows a global resource.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<ResourceRef<'_, R>> {
        self.global.get::<R>().ok()
    }

    /// All global resources.
    #[must_use]
    pub fn global_resources(&self) -> &Resources {
        &self.global
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Sorts, builds and readies every added plugin.
    ///
    /// # Panics
    ///
    /// - if a declared dependency was never added
    /// - if plugin dependencies form a cycle
    /// - if called twice
    pub fn finish(&mut self) {
        assert!(
            self.build_state == BuildState::NotStarted,
            "App::finish() was already called. Cannot build twice."
        );

        let sorted = self.sort_by_dependencies();
        tracing::debug!(plugins = sorted.len(), "building plugins");

        self.build_state = BuildState::Building;
        for entry in sorted {
            tracing::debug!(plugin = %entry.name, "build");
            entry.plugin.build(self);
            self.built.push(entry);
        }

        let built = core::mem::take(&mut self.built);
        for entry in &built {
            tracing::debug!(plugin = %entry.name, "ready");
            entry.plugin.ready(self);
        }
        self.restore_built(built);

        self.build_state = BuildState::Built;
        tracing::info!(
            plugins = self.built.len(),
            globals = self.global.len(),
            "app ready"
        );
    }

    /// Calls `cleanup()` on every built plugin, dependents first.
    pub fn cleanup(&mut self) {
        let built = core::mem::take(&mut self.built);
        for entry in built.iter().rev() {
            tracing::debug!(plugin = %entry.name, "cleanup");
            entry.plugin.cleanup(self);
        }
        self.restore_built(built);
    }

    // Plugins added from `ready()`/`cleanup()` were pushed onto the emptied
    // list; keep them after the original entries.
    fn restore_built(&mut self, mut built: Vec<PluginEntry>) {
        built.append(&mut self.built);
        self.built = built;
    }

    /// Kahn's algorithm over the pending plugins. Plugins with no ordering
    /// constraint between them keep the order they were added in.
    fn sort_by_dependencies(&mut self) -> Vec<PluginEntry> {
        let pending = core::mem::take(&mut self.pending);
        let count = pending.len();

        let index_of: HashMap<PluginId, usize> = pending
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.id, index))
            .collect();

        let mut in_degree = vec![0_usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

        for (index, entry) in pending.iter().enumerate() {
            for dependency in entry.plugin.dependencies() {
                if let Some(&dep_index) = index_of.get(&dependency) {
                    dependents[dep_index].push(index);
                    in_degree[index] += 1;
                } else if !self.built.iter().any(|built| built.id == dependency) {
                    panic!(
                        "Plugin '{}' requires '{}' which was not added.",
                        entry.name,
                        dependency.type_name()
                    );
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(index) = queue.pop_front() {
            order.push(index);
            for &dependent in &dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() != count {
            let in_cycle: Vec<&str> = (0..count)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| pending[i].name.as_str())
                .collect();
            panic!("Circular dependency detected among plugins: {in_cycle:?}");
        }

        let mut slots: Vec<Option<PluginEntry>> = pending.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect()
    }
}
