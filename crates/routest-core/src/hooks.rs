//! Before- and after-hook chains
//!
//! Hooks are plain transforms: a before-hook maps a request draft to a new
//! draft, an after-hook maps a response record to a new record. A chain runs
//! its hooks left to right and stops at the first failure.
//!
//! Runs take a snapshot of the chain under the read lock and call the hooks
//! with no lock held, so a hook may register further hooks. Those apply to
//! later runs only.

use crate::error::HookError;
use crate::request::HttpRequest;
use crate::response::ResponseRecord;
use crate::scope::{HookStage, ScopeKind};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Transform applied to a request before sending
pub type BeforeHook = Arc<dyn Fn(HttpRequest) -> anyhow::Result<HttpRequest> + Send + Sync>;

/// Transform applied to a response after receiving
pub type AfterHook = Arc<dyn Fn(ResponseRecord) -> anyhow::Result<ResponseRecord> + Send + Sync>;

#[derive(Default)]
struct Hooks {
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
}

/// Ordered hooks for one scope
pub struct HookChain {
    scope: ScopeKind,
    inner: RwLock<Hooks>,
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("HookChain")
            .field("scope", &self.scope)
            .field("before", &inner.before.len())
            .field("after", &inner.after.len())
            .finish()
    }
}

impl HookChain {
    /// Create empty chain owned by `scope`
    #[must_use]
    pub fn new(scope: ScopeKind) -> Self {
        Self {
            scope,
            inner: RwLock::new(Hooks::default()),
        }
    }

    #[inline]
    #[must_use]
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    /// Append a before-hook
    pub fn register_before<F>(&self, hook: F)
    where
        F: Fn(HttpRequest) -> anyhow::Result<HttpRequest> + Send + Sync + 'static,
    {
        self.inner.write().before.push(Arc::new(hook));
    }

    /// Append an after-hook
    pub fn register_after<F>(&self, hook: F)
    where
        F: Fn(ResponseRecord) -> anyhow::Result<ResponseRecord> + Send + Sync + 'static,
    {
        self.inner.write().after.push(Arc::new(hook));
    }

    #[must_use]
    pub fn before_len(&self) -> usize {
        self.inner.read().before.len()
    }

    #[must_use]
    pub fn after_len(&self) -> usize {
        self.inner.read().after.len()
    }

    /// Fold the before-hooks over `request`
    ///
    /// # Errors
    /// Returns the first failing hook's error with its index.
    pub fn run_before(&self, request: HttpRequest) -> Result<HttpRequest, HookError> {
        let hooks = self.inner.read().before.clone();
        self.fold(HookStage::Before, &hooks, request)
    }

    /// Fold the after-hooks over `response`
    ///
    /// # Errors
    /// Returns the first failing hook's error with its index.
    pub fn run_after(&self, response: ResponseRecord) -> Result<ResponseRecord, HookError> {
        let hooks = self.inner.read().after.clone();
        self.fold(HookStage::After, &hooks, response)
    }

    fn fold<T>(
        &self,
        stage: HookStage,
        hooks: &[Arc<dyn Fn(T) -> anyhow::Result<T> + Send + Sync>],
        value: T,
    ) -> Result<T, HookError> {
        hooks
            .iter()
            .enumerate()
            .try_fold(value, |acc, (index, hook)| {
                hook(acc).map_err(|cause| HookError::new(self.scope, stage, index, cause))
            })
    }
}
