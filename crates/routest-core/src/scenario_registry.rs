//! Ordered scenario list for one Route, plus cross-level orchestration
//!
//! The associated functions here fix the order in which the three scopes act
//! on one execution:
//! - before-hooks: Application, Route, Scenario
//! - parameter export: Application, Route, Scenario (inner scopes win headers)
//! - after-hooks: Scenario, Route, Application

use crate::error::HookError;
use crate::request::HttpRequest;
use crate::response::ResponseRecord;
use crate::scenario::Scenario;
use crate::scope::ScopeChain;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;

/// Scenarios in registration order
#[derive(Debug, Default)]
pub struct ScenarioRegistry {
    scenarios: RwLock<Vec<Arc<Scenario>>>,
}

impl ScenarioRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scenario built from its index
    ///
    /// The index is reserved under the write lock, so concurrent callers get
    /// distinct, dense indices and `get(i)` always holds the scenario with
    /// index `i`.
    pub fn add<F>(&self, build: F) -> Arc<Scenario>
    where
        F: FnOnce(usize) -> Arc<Scenario>,
    {
        let mut scenarios = self.scenarios.write();
        let scenario = build(scenarios.len());
        scenarios.push(Arc::clone(&scenario));
        scenario
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Arc<Scenario>> {
        self.scenarios.read_recursive().get(index).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.read_recursive().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.read_recursive().is_empty()
    }

    /// Defensive copy of the list
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Scenario>> {
        self.scenarios.read_recursive().clone()
    }

    /// Scoped read guard over the list
    pub fn lock(&self) -> RwLockReadGuard<'_, Vec<Arc<Scenario>>> {
        self.scenarios.read_recursive()
    }

    /// Scenarios matching `predicate`, in order
    pub fn filter<P>(&self, predicate: P) -> Vec<Arc<Scenario>>
    where
        P: Fn(&Scenario) -> bool,
    {
        self.scenarios
            .read_recursive()
            .iter()
            .filter(|scenario| predicate(scenario))
            .cloned()
            .collect()
    }

    /// Scenarios belonging to the named route
    #[must_use]
    pub fn scenarios_by_route(&self, route_name: &str) -> Vec<Arc<Scenario>> {
        self.filter(|scenario| scenario.route_name() == route_name)
    }

    /// Scenarios whose metadata carries `tag`
    #[must_use]
    pub fn scenarios_with_tag(&self, tag: &str) -> Vec<Arc<Scenario>> {
        self.filter(|scenario| scenario.meta_snapshot().has_tag(tag))
    }

    /// Before-hooks of every scope, outermost first
    ///
    /// # Errors
    /// Returns the first hook failure; later hooks do not run.
    pub fn run_before_hooks(
        chain: ScopeChain<'_>,
        request: HttpRequest,
    ) -> Result<HttpRequest, HookError> {
        chain
            .outside_in()
            .into_iter()
            .try_fold(request, |request, scope| scope.hooks().run_before(request))
    }

    /// Parameters of every scope, outermost first
    #[must_use]
    pub fn export_to_request(chain: ScopeChain<'_>, request: HttpRequest) -> HttpRequest {
        chain
            .outside_in()
            .into_iter()
            .fold(request, |request, scope| {
                scope.parameters().export_to_request(request)
            })
    }

    /// After-hooks of every scope, innermost first
    ///
    /// # Errors
    /// Returns the first hook failure; later hooks do not run.
    pub fn run_after_hooks(
        chain: ScopeChain<'_>,
        response: ResponseRecord,
    ) -> Result<ResponseRecord, HookError> {
        chain
            .inside_out()
            .into_iter()
            .try_fold(response, |response, scope| scope.hooks().run_after(response))
    }
}
