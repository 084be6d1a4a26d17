//! Route scope: one endpoint of the Application
//!
//! A Route owns its scenarios and the schemas its request and response bodies
//! are checked against. It refers back to its Application without owning it.

use crate::application::Application;
use crate::error::{ScenarioError, SchemaError, ValidationError};
use crate::hooks::HookChain;
use crate::info::RouteInfo;
use crate::meta::Meta;
use crate::parameters::ParameterStore;
use crate::response::ResponseRecord;
use crate::scenario::Scenario;
use crate::scenario_registry::ScenarioRegistry;
use crate::schema::{BodySchema, BodyTarget, SchemaValidator};
use crate::scope::{HasHookChain, HasMetadata, HasParameterStore, Scope, ScopeKind};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// One endpoint and its scenarios
pub struct Route {
    info: RouteInfo,
    application: Weak<Application>,
    meta: RwLock<Arc<Meta>>,
    parameters: ParameterStore,
    hooks: HookChain,
    scenarios: ScenarioRegistry,
    request_schema: RwLock<Option<BodySchema>>,
    response_schema: RwLock<Option<BodySchema>>,
    validator: Arc<dyn SchemaValidator>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("info", &self.info)
            .field("scenarios", &self.scenarios.len())
            .finish_non_exhaustive()
    }
}

impl Route {
    /// Compile the declared schemas and wire the route to `application`
    pub(crate) fn new(
        info: RouteInfo,
        application: &Arc<Application>,
        meta: Meta,
        validator: Arc<dyn SchemaValidator>,
    ) -> Result<Self, SchemaError> {
        let request_schema = info
            .request_body_schema
            .as_deref()
            .map(|text| BodySchema::compile(validator.as_ref(), text))
            .transpose()?;
        let response_schema = info
            .response_body_schema
            .as_deref()
            .map(|text| BodySchema::compile(validator.as_ref(), text))
            .transpose()?;

        Ok(Self {
            info,
            application: Arc::downgrade(application),
            meta: RwLock::new(Arc::new(meta)),
            parameters: ParameterStore::new(),
            hooks: HookChain::new(ScopeKind::Route),
            scenarios: ScenarioRegistry::new(),
            request_schema: RwLock::new(request_schema),
            response_schema: RwLock::new(response_schema),
            validator,
        })
    }

    #[inline]
    #[must_use]
    pub fn info(&self) -> &RouteInfo {
        &self.info
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Owning application, if still alive
    #[must_use]
    pub fn application(&self) -> Option<Arc<Application>> {
        self.application.upgrade()
    }

    #[inline]
    #[must_use]
    pub fn scenarios(&self) -> &ScenarioRegistry {
        &self.scenarios
    }

    pub(crate) fn validator(&self) -> &Arc<dyn SchemaValidator> {
        &self.validator
    }

    /// Create and register a scenario
    ///
    /// Its metadata starts from this route's and applies `meta_text` on top.
    ///
    /// # Errors
    /// Returns the parse error of `meta_text`.
    pub fn new_scenario(self: &Arc<Self>, meta_text: &str) -> Result<Arc<Scenario>, ValidationError> {
        let meta = Meta::inherit(&self.meta(), meta_text)?;
        let scenario = self
            .scenarios
            .add(|index| Arc::new(Scenario::new(index, self, meta)));
        tracing::debug!(
            "Created scenario #{} for route: {}",
            scenario.index(),
            self.name()
        );
        Ok(scenario)
    }

    /// Replace the request body schema
    ///
    /// # Errors
    /// Returns `SchemaError::Compile` and keeps the previous schema.
    pub fn set_request_schema(&self, schema: &str) -> Result<(), SchemaError> {
        let compiled = BodySchema::compile(self.validator.as_ref(), schema)?;
        *self.request_schema.write() = Some(compiled);
        Ok(())
    }

    /// Replace the response body schema
    ///
    /// # Errors
    /// Returns `SchemaError::Compile` and keeps the previous schema.
    pub fn set_response_schema(&self, schema: &str) -> Result<(), SchemaError> {
        let compiled = BodySchema::compile(self.validator.as_ref(), schema)?;
        *self.response_schema.write() = Some(compiled);
        Ok(())
    }

    #[must_use]
    pub fn request_schema(&self) -> Option<BodySchema> {
        self.request_schema.read().clone()
    }

    #[must_use]
    pub fn response_schema(&self) -> Option<BodySchema> {
        self.response_schema.read().clone()
    }

    /// Check a request body against this route's schema; passes if none is set
    ///
    /// # Errors
    /// Returns `SchemaError::InvalidJson` or `SchemaError::Violation`.
    pub fn validate_request_body(&self, body: &[u8]) -> Result<(), SchemaError> {
        match self.request_schema() {
            Some(schema) => schema.validate_bytes(BodyTarget::Request, body),
            None => Ok(()),
        }
    }

    /// Check a response body against this route's schema; passes if none is set
    ///
    /// # Errors
    /// Returns `SchemaError::InvalidJson` or `SchemaError::Violation`.
    pub fn validate_response_body(&self, body: &[u8]) -> Result<(), SchemaError> {
        match self.response_schema() {
            Some(schema) => schema.validate_bytes(BodyTarget::Response, body),
            None => Ok(()),
        }
    }

    /// Execute every registered scenario concurrently
    ///
    /// Results come back in registration order.
    pub async fn execute_all(&self) -> Vec<Result<Arc<ResponseRecord>, ScenarioError>> {
        let scenarios = self.scenarios.snapshot();
        tracing::info!(
            "Executing {} scenarios for route: {}",
            scenarios.len(),
            self.name()
        );
        futures::future::join_all(scenarios.iter().map(|scenario| scenario.execute())).await
    }
}

impl HasParameterStore for Route {
    fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }
}

impl HasHookChain for Route {
    fn hooks(&self) -> &HookChain {
        &self.hooks
    }
}

impl HasMetadata for Route {
    fn meta(&self) -> Arc<Meta> {
        Arc::clone(&self.meta.read())
    }

    fn replace_meta(&self, meta: Meta) {
        *self.meta.write() = Arc::new(meta);
    }

    fn update_meta(&self, update: &mut dyn FnMut(&mut Meta)) {
        let mut current = self.meta.write();
        let mut next = current.copy();
        update(&mut next);
        *current = Arc::new(next);
    }
}

impl Scope for Route {
    fn kind(&self) -> ScopeKind {
        ScopeKind::Route
    }
}
