//! Startup resource storage.
//!
//! Plugins share state through [`Resources`], a type-keyed container. The
//! [`App`](crate::app::App) keeps two of them:
//!
//! - a **mutable** set that plugins fill and edit while the app is building
//!   (route tables under construction, role mappings being assembled), and
//! - a **global** set of [`GlobalResource`] values that are frozen once the
//!   app is ready and only ever read afterwards.
//!
//! The usual pattern is to insert a mutable resource in `build()`, let other
//! plugins extend it, then move it into the global set in `ready()`:
//!
//! ```
//! use waymark_app::app::App;
//! use waymark_app::plugin::Plugin;
//! use waymark_app::resource::GlobalResource;
//!
//! #[derive(Default)]
//! struct Greetings(Vec<String>);
//! impl GlobalResource for Greetings {}
//!
//! struct GreetingsPlugin;
//!
//! impl Plugin for GreetingsPlugin {
//!     fn build(&self, app: &mut App) {
//!         app.insert_resource(Greetings::default());
//!     }
//!
//!     fn ready(&self, app: &mut App) {
//!         if let Some(greetings) = app.remove_resource::<Greetings>() {
//!             app.insert_global(greetings);
//!         }
//!     }
//! }
//!
//! let mut app = App::new();
//! app.add_plugins(GreetingsPlugin);
//! app.finish();
//! assert!(app.contains_global::<Greetings>());
//! ```

use core::any::{Any, TypeId};
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Any value that can live in a [`Resources`] container.
///
/// Implemented for every `Send + Sync + 'static` type.
pub trait Resource: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Resource for T {}

/// Marker for resources that become read-only once the app is ready.
///
/// Route tables, role registries and configuration values are global: they
/// are assembled during startup and shared by every request afterwards.
pub trait GlobalResource: Resource {}

/// Errors returned when accessing a resource.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// No resource of the requested type was inserted.
    #[error("resource not found: {0}")]
    NotFound(&'static str),

    /// The resource is currently borrowed in a conflicting way.
    #[error("resource already borrowed: {0}")]
    BorrowConflict(&'static str),
}

type BoxedResource = Box<dyn Any + Send + Sync>;

/// Type-keyed storage for startup resources.
///
/// Each entry sits behind its own `RwLock`, so any number of readers or a
/// single writer can hold a given resource at a time. Borrows never block:
/// a conflicting borrow is reported as [`ResourceError::BorrowConflict`].
#[derive(Default)]
pub struct Resources {
    storage: HashMap<TypeId, RwLock<BoxedResource>>,
}

impl core::fmt::Debug for Resources {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Resources")
            .field("len", &self.storage.len())
            .finish()
    }
}

impl Resources {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: HashMap::new(),
        }
    }

    /// Inserts a resource, returning the previous value of the same type.
    pub fn insert<T: Resource>(&mut self, resource: T) -> Option<T> {
        self.storage
            .insert(TypeId::of::<T>(), RwLock::new(Box::new(resource)))
            .and_then(|old| old.into_inner().downcast::<T>().ok().map(|boxed| *boxed))
    }

    /// Returns `true` if a resource of type `T` is stored.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.storage.contains_key(&TypeId::of::<T>())
    }

    /// Borrows a resource immutably.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NotFound`] if no resource of type `T` exists
    /// - [`ResourceError::BorrowConflict`] if it is mutably borrowed
    pub fn get<T: Resource>(&self) -> Result<ResourceRef<'_, T>, ResourceError> {
        let type_name = core::any::type_name::<T>();
        let guard = self
            .storage
            .get(&TypeId::of::<T>())
            .ok_or(ResourceError::NotFound(type_name))?
            .try_read()
            .ok_or(ResourceError::BorrowConflict(type_name))?;

        Ok(ResourceRef {
            guard,
            _marker: core::marker::PhantomData,
        })
    }

    /// Borrows a resource mutably.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NotFound`] if no resource of type `T` exists
    /// - [`ResourceError::BorrowConflict`] if it is already borrowed
    pub fn get_mut<T: Resource>(&self) -> Result<ResourceRefMut<'_, T>, ResourceError> {
        let type_name = core::any::type_name::<T>();
        let guard = self
            .storage
            .get(&TypeId::of::<T>())
            .ok_or(ResourceError::NotFound(type_name))?
            .try_write()
            .ok_or(ResourceError::BorrowConflict(type_name))?;

        Ok(ResourceRefMut {
            guard,
            _marker: core::marker::PhantomData,
        })
    }

    /// Removes a resource and returns it.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        self.storage
            .remove(&TypeId::of::<T>())
            .and_then(|entry| entry.into_inner().downcast::<T>().ok().map(|boxed| *boxed))
    }

    /// Returns the number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

/// Shared borrow of a resource. The lock is released on drop.
pub struct ResourceRef<'a, T: Resource> {
    guard: RwLockReadGuard<'a, BoxedResource>,
    _marker: core::marker::PhantomData<&'a T>,
}

impl<T: Resource> core::ops::Deref for ResourceRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // Entries are keyed by `TypeId::of::<T>()`, so the downcast cannot fail.
        self.guard
            .downcast_ref::<T>()
            .expect("resource type mismatch (this is a bug)")
    }
}

/// Exclusive borrow of a resource. The lock is released on drop.
pub struct ResourceRefMut<'a, T: Resource> {
    guard: RwLockWriteGuard<'a, BoxedResource>,
    _marker: core::marker::PhantomData<&'a mut T>,
}

impl<T: Resource> core::ops::Deref for ResourceRefMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.guard
            .downcast_ref::<T>()
            .expect("resource type mismatch (this is a bug)")
    }
}

impl<T: Resource> core::ops::DerefMut for ResourceRefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard
            .downcast_mut::<T>()
            .expect("resource type mismatch (this is a bug)")
    }
}
