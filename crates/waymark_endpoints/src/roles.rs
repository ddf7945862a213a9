//! Mapping of symbolic access-role names to host role tokens.
//!
//! Endpoints name the role they require as a plain string (`role = "ADMIN"`).
//! The host enforces access with its own token type. A [`RoleRegistry`] is
//! the table between the two. It is filled once at startup, usually through
//! [`RolesPlugin`](crate::plugin::RolesPlugin), and read-only afterwards.

use indexmap::IndexMap;
use waymark_app::resource::GlobalResource;

use crate::error::EndpointError;

/// Symbolic role name to host role token.
#[derive(Debug, Clone)]
pub struct RoleRegistry<R> {
    roles: IndexMap<String, R>,
}

impl<R> Default for RoleRegistry<R> {
    fn default() -> Self {
        Self {
            roles: IndexMap::new(),
        }
    }
}

impl<R: Send + Sync + 'static> GlobalResource for RoleRegistry<R> {}

impl<R> RoleRegistry<R> {
    /// Creates an empty registry. Only public endpoints can be bound against it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole table with `mapping`. Later duplicates win.
    pub fn set_roles<K: Into<String>>(&mut self, mapping: impl IntoIterator<Item = (K, R)>) {
        self.roles = mapping
            .into_iter()
            .map(|(name, token)| (name.into(), token))
            .collect();
        tracing::debug!(roles = self.roles.len(), "role table replaced");
    }

    /// Looks up the token for a role name.
    ///
    /// # Errors
    ///
    /// [`EndpointError::RoleNotFound`] if `name` has no entry.
    pub fn get_role(&self, name: &str) -> Result<&R, EndpointError> {
        self.roles
            .get(name)
            .ok_or_else(|| EndpointError::RoleNotFound(name.to_owned()))
    }

    /// Returns `true` if `name` has an entry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Registered role names, in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }

    /// Number of registered roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns `true` if no role is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl<R: Clone> RoleRegistry<R> {
    /// Tokens a route with access role `name` must be registered with.
    ///
    /// An empty name means the route is public and yields no tokens.
    ///
    /// # Errors
    ///
    /// [`EndpointError::RoleNotFound`] if a non-empty `name` has no entry.
    pub fn required_roles(&self, name: &str) -> Result<Vec<R>, EndpointError> {
        if name.is_empty() {
            return Ok(Vec::new());
        }
        self.get_role(name).map(|token| vec![token.clone()])
    }
}

impl<K: Into<String>, R> FromIterator<(K, R)> for RoleRegistry<R> {
    fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.set_roles(iter);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Role {
        Admin,
        User,
    }

    #[test]
    fn get_role_returns_token() {
        let registry: RoleRegistry<Role> = [("ADMIN", Role::Admin), ("USER", Role::User)]
            .into_iter()
            .collect();
        assert_eq!(*registry.get_role("ADMIN").unwrap(), Role::Admin);
        assert_eq!(registry.names(), vec!["ADMIN", "USER"]);
    }

    #[test]
    fn unknown_role_fails_with_name() {
        let registry: RoleRegistry<Role> = RoleRegistry::new();
        let err = registry.get_role("ADMIN").unwrap_err();
        assert_eq!(err.to_string(), "No role matching 'ADMIN'");
    }

    #[test]
    fn set_roles_replaces_whole_table() {
        let mut registry = RoleRegistry::new();
        registry.set_roles([("ADMIN", Role::Admin)]);
        registry.set_roles([("USER", Role::User)]);

        assert!(!registry.contains("ADMIN"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_name_is_public() {
        let registry: RoleRegistry<Role> = RoleRegistry::new();
        assert!(registry.required_roles("").unwrap().is_empty());
        assert!(registry.required_roles("USER").is_err());
    }
}
