//! Scenario scope: one concrete call of a Route
//!
//! [`Scenario::execute`] drives a single exchange through every scope:
//! before-hooks, parameter export, the request body check, the transport,
//! the response body check and the after-hooks. No lock is held while hooks,
//! schema checks or the transport run.

use crate::error::{NotFoundError, ScenarioError, SchemaError};
use crate::hooks::HookChain;
use crate::meta::Meta;
use crate::parameters::ParameterStore;
use crate::request::{HttpRequest, RequestBody};
use crate::response::ResponseRecord;
use crate::route::Route;
use crate::scenario_registry::ScenarioRegistry;
use crate::schema::{BodySchema, BodyTarget, SchemaValidator};
use crate::scope::{HasHookChain, HasMetadata, HasParameterStore, Scope, ScopeChain, ScopeKind};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// One test case against a Route
pub struct Scenario {
    index: usize,
    route: Weak<Route>,
    route_name: String,
    meta: RwLock<Arc<Meta>>,
    parameters: ParameterStore,
    hooks: HookChain,
    validator: Arc<dyn SchemaValidator>,
    request_schema: RwLock<Option<BodySchema>>,
    response_schema: RwLock<Option<BodySchema>>,
    body: RwLock<Option<RequestBody>>,
    response: RwLock<Option<Arc<ResponseRecord>>>,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("index", &self.index)
            .field("route", &self.route_name)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    pub(crate) fn new(index: usize, route: &Arc<Route>, meta: Meta) -> Self {
        Self {
            index,
            route: Arc::downgrade(route),
            route_name: route.name().to_string(),
            meta: RwLock::new(Arc::new(meta)),
            parameters: ParameterStore::new(),
            hooks: HookChain::new(ScopeKind::Scenario),
            validator: Arc::clone(route.validator()),
            request_schema: RwLock::new(None),
            response_schema: RwLock::new(None),
            body: RwLock::new(None),
            response: RwLock::new(None),
        }
    }

    /// Position within the route's scenario list
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    /// Owning route, if still alive
    #[must_use]
    pub fn route(&self) -> Option<Arc<Route>> {
        self.route.upgrade()
    }

    /// Current metadata
    #[must_use]
    pub fn meta_snapshot(&self) -> Arc<Meta> {
        Arc::clone(&self.meta.read())
    }

    /// Body sent with every execution
    pub fn set_body(&self, body: RequestBody) {
        *self.body.write() = Some(body);
    }

    /// Response of the last execution that reached the server
    #[must_use]
    pub fn response(&self) -> Option<Arc<ResponseRecord>> {
        self.response.read().clone()
    }

    /// Request schema for this scenario only; overrides the route's
    ///
    /// # Errors
    /// Returns `SchemaError::Compile` and keeps the previous schema.
    pub fn set_request_schema(&self, schema: &str) -> Result<(), SchemaError> {
        let compiled = BodySchema::compile(self.validator.as_ref(), schema)?;
        *self.request_schema.write() = Some(compiled);
        Ok(())
    }

    /// Response schema for this scenario only; overrides the route's
    ///
    /// # Errors
    /// Returns `SchemaError::Compile` and keeps the previous schema.
    pub fn set_response_schema(&self, schema: &str) -> Result<(), SchemaError> {
        let compiled = BodySchema::compile(self.validator.as_ref(), schema)?;
        *self.response_schema.write() = Some(compiled);
        Ok(())
    }

    fn request_schema_for(&self, route: &Route) -> Option<BodySchema> {
        self.request_schema
            .read()
            .clone()
            .or_else(|| route.request_schema())
    }

    fn response_schema_for(&self, route: &Route) -> Option<BodySchema> {
        self.response_schema
            .read()
            .clone()
            .or_else(|| route.response_schema())
    }

    /// Run the full exchange
    ///
    /// On success returns the final record, which is also stored on the
    /// scenario. A response schema violation is returned only after the
    /// after-hooks ran and the record was stored; an after-hook failure takes
    /// its place.
    ///
    /// # Errors
    /// - `ScenarioError::NotFound` if the route or application was dropped
    /// - `ScenarioError::Hook` if any hook fails
    /// - `ScenarioError::Schema` if a body fails its schema
    /// - `ScenarioError::Transport` if the exchange fails; no after-hooks run
    pub async fn execute(&self) -> Result<Arc<ResponseRecord>, ScenarioError> {
        let route = self
            .route
            .upgrade()
            .ok_or(NotFoundError::ParentScope(ScopeKind::Route))?;
        let application = route
            .application()
            .ok_or(NotFoundError::ParentScope(ScopeKind::Application))?;

        tracing::info!(
            "Executing scenario #{} of route: {}",
            self.index,
            self.route_name
        );

        let chain = ScopeChain::new(application.as_ref(), route.as_ref(), self);

        let mut draft = HttpRequest::new(
            route.info().method,
            application.host().base_url(),
            route.info().path.as_str(),
        );
        let body = self.body.read().clone();
        if let Some(body) = body {
            draft.set_body(body);
        }

        let request = ScenarioRegistry::run_before_hooks(chain, draft)?;
        tracing::debug!("Before-hooks complete for scenario #{}", self.index);

        let request = ScenarioRegistry::export_to_request(chain, request);
        tracing::debug!(
            "Parameters exported for scenario #{}: {} {}",
            self.index,
            request.method(),
            request.path()
        );

        if let (Some(schema), Some(body)) = (self.request_schema_for(&route), request.body()) {
            if let Err(err) = schema.validate_bytes(BodyTarget::Request, body) {
                tracing::warn!("Scenario #{} request rejected: {}", self.index, err);
                return Err(err.into());
            }
        }

        let wire = request.to_transport()?;
        let url = wire.url.clone();
        let reply = match application.transport().send(wire).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(
                    "Transport failed for scenario #{} ({}): {}",
                    self.index,
                    url,
                    err
                );
                return Err(err.into());
            }
        };
        tracing::debug!("Scenario #{} received status {}", self.index, reply.status);

        let record = ResponseRecord::from_reply(reply, request.query().to_vec());

        let violation = self
            .response_schema_for(&route)
            .and_then(|schema| schema.validate_bytes(BodyTarget::Response, record.body()).err());
        if let Some(err) = &violation {
            tracing::warn!("Scenario #{} response rejected: {}", self.index, err);
        }

        *self.response.write() = Some(Arc::new(record.clone()));

        let record = Arc::new(ScenarioRegistry::run_after_hooks(chain, record)?);
        tracing::debug!("After-hooks complete for scenario #{}", self.index);

        *self.response.write() = Some(Arc::clone(&record));

        tracing::info!(
            "Completed scenario #{} of route: {} with status {}",
            self.index,
            self.route_name,
            record.status_code()
        );

        match violation {
            Some(err) => Err(err.into()),
            None => Ok(record),
        }
    }
}

impl HasParameterStore for Scenario {
    fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }
}

impl HasHookChain for Scenario {
    fn hooks(&self) -> &HookChain {
        &self.hooks
    }
}

impl HasMetadata for Scenario {
    fn meta(&self) -> Arc<Meta> {
        self.meta_snapshot()
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

impl Scope for Scenario {
    fn kind(&self) -> ScopeKind {
        ScopeKind::Scenario
    }
}
