//! Name → Route table for one Application

use crate::error::NotFoundError;
use crate::route::Route;
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// Routes keyed by name
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: RwLock<HashMap<String, Arc<Route>>>,
}

impl RouteRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `route` under `name`, overwriting any previous entry
    ///
    /// Returns the stored route.
    pub fn add(&self, name: impl Into<String>, route: Arc<Route>) -> Arc<Route> {
        let name = name.into();
        let mut routes = self.routes.write();
        if routes.insert(name.clone(), Arc::clone(&route)).is_some() {
            tracing::debug!("Replaced route: {}", name);
        } else {
            tracing::debug!("Registered route: {}", name);
        }
        route
    }

    #[must_use]
    pub fn route_by_name(&self, name: &str) -> Option<Arc<Route>> {
        self.routes.read_recursive().get(name).cloned()
    }

    /// Look up a route
    ///
    /// # Errors
    /// Returns `NotFoundError::Route` if no route has this name.
    pub fn get(&self, name: &str) -> Result<Arc<Route>, NotFoundError> {
        self.route_by_name(name)
            .ok_or_else(|| NotFoundError::Route(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.routes.read_recursive().contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.read_recursive().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.read_recursive().is_empty()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.read_recursive().keys().cloned().collect();
        names.sort();
        names
    }

    /// Defensive copy of the table
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Arc<Route>> {
        self.routes.read_recursive().clone()
    }

    /// Scoped read guard over the table
    pub fn lock(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Route>>> {
        self.routes.read_recursive()
    }
}
