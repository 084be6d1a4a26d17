//! Scope capabilities shared by Application, Route and Scenario
//!
//! Orchestration only needs a scope's parameters, hooks and metadata, so it
//! works against [`Scope`] rather than the concrete level types.

use crate::error::ValidationError;
use crate::hooks::HookChain;
use crate::meta::Meta;
use crate::parameters::ParameterStore;
use crate::request::HttpRequest;
use crate::response::ResponseRecord;
use std::fmt;
use std::sync::Arc;

/// Level in the Application → Route → Scenario hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Outermost scope
    Application,
    /// Endpoint scope
    Route,
    /// Innermost scope
    Scenario,
}

impl ScopeKind {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Route => "route",
            Self::Scenario => "scenario",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the HTTP exchange a hook runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// Before the request is sent
    Before,
    /// After the response is received
    After,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
        })
    }
}

/// Scope owning a parameter store
pub trait HasParameterStore {
    /// Parameters registered at this scope
    fn parameters(&self) -> &ParameterStore;
}

/// Scope owning a hook chain
pub trait HasHookChain {
    /// Hooks registered at this scope
    fn hooks(&self) -> &HookChain;
}

/// Scope carrying metadata
pub trait HasMetadata {
    /// Current metadata snapshot
    fn meta(&self) -> Arc<Meta>;

    /// Swap in a new record; snapshots already handed out are unaffected
    fn replace_meta(&self, meta: Meta);

    /// Copy, edit and swap the record under one write lock
    fn update_meta(&self, update: &mut dyn FnMut(&mut Meta));
}

/// One level of the hierarchy
pub trait Scope: HasParameterStore + HasHookChain + HasMetadata + Send + Sync {
    /// Which level this is
    fn kind(&self) -> ScopeKind;
}

/// Registration conveniences available on every scope
pub trait ScopeExt: Scope {
    /// Append a query entry to this scope
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyKey` if `key` is empty.
    fn register_query(&self, key: &str, value: &str) -> Result<(), ValidationError> {
        self.parameters().register_query(key, value)
    }

    /// Append a path variable to this scope
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyKey` if `key` is empty.
    fn register_path(&self, key: &str, value: &str) -> Result<(), ValidationError> {
        self.parameters().register_path(key, value)
    }

    /// Append a header to this scope
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyKey` if `key` is empty.
    fn register_header(&self, key: &str, value: &str) -> Result<(), ValidationError> {
        self.parameters().register_header(key, value)
    }

    /// Append a before-hook to this scope
    fn before_hook<F>(&self, hook: F)
    where
        F: Fn(HttpRequest) -> anyhow::Result<HttpRequest> + Send + Sync + 'static,
    {
        self.hooks().register_before(hook);
    }

    /// Append an after-hook to this scope
    fn after_hook<F>(&self, hook: F)
    where
        F: Fn(ResponseRecord) -> anyhow::Result<ResponseRecord> + Send + Sync + 'static,
    {
        self.hooks().register_after(hook);
    }

    /// Parse `text` and apply it over the current metadata
    ///
    /// # Errors
    /// Returns the parse error; the current record is left unchanged.
    fn override_meta(&self, text: &str) -> Result<(), ValidationError> {
        let other = Meta::from_yaml(text)?;
        self.update_meta(&mut |meta: &mut Meta| meta.override_meta(Some(&other)));
        Ok(())
    }
}

impl<T: Scope + ?Sized> ScopeExt for T {}

/// The three scopes a scenario executes under
#[derive(Clone, Copy)]
pub struct ScopeChain<'a> {
    /// Outermost
    pub application: &'a dyn Scope,
    /// Middle
    pub route: &'a dyn Scope,
    /// Innermost
    pub scenario: &'a dyn Scope,
}

impl<'a> ScopeChain<'a> {
    /// Create chain from the three levels
    #[inline]
    #[must_use]
    pub fn new(application: &'a dyn Scope, route: &'a dyn Scope, scenario: &'a dyn Scope) -> Self {
        Self {
            application,
            route,
            scenario,
        }
    }

    /// Application, Route, Scenario
    #[inline]
    #[must_use]
    pub fn outside_in(&self) -> [&'a dyn Scope; 3] {
        [self.application, self.route, self.scenario]
    }

    /// Scenario, Route, Application
    #[inline]
    #[must_use]
    pub fn inside_out(&self) -> [&'a dyn Scope; 3] {
        [self.scenario, self.route, self.application]
    }
}

impl fmt::Debug for ScopeChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.outside_in().iter().map(|scope| scope.kind()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_kind_display() {
        assert_eq!(ScopeKind::Application.to_string(), "application");
        assert_eq!(ScopeKind::Scenario.as_str(), "scenario");
        assert_eq!(HookStage::After.to_string(), "after");
    }
}
