//! Application scope: the root of a test suite
//!
//! An Application is built once from metadata, configuration and an optional
//! requirements table, and owns everything below it: routes, the
//! application-wide parameters and hooks, the result register, the transport
//! and the schema validator.
//!
//! # Example
//!
//! ```rust,ignore
//! let app = Application::builder(META)
//!     .config_selection(ConfigSelection::new("staging", "./config"))
//!     .requirements_from(YamlRequirementsSource, "./config/requirements.yaml")
//!     .build()?;
//! let route = app.add_route("get-user", app.new_route(info, ROUTE_META)?);
//! let scenario = route.new_scenario(SCENARIO_META)?;
//! let response = scenario.execute().await?;
//! ```

use crate::config::{ConfigMap, ConfigSelection, ConfigSource, ConfigStore};
use crate::error::{ConfigError, NotFoundError, RequirementsError, RoutestResult};
use crate::hooks::HookChain;
use crate::host::Host;
use crate::info::RouteInfo;
use crate::meta::Meta;
use crate::parameters::{Parameter, ParameterStore};
use crate::register::ResultRegister;
use crate::requirements::{Requirement, Requirements, RequirementsSource, YamlRequirementsSource};
use crate::response::ResponseRecord;
use crate::route::Route;
use crate::route_registry::RouteRegistry;
use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::scope::{HasHookChain, HasMetadata, HasParameterStore, Scope, ScopeKind};
use crate::transport::{ReqwestTransport, Transport, TransportSettings};
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Root scope of a test suite
pub struct Application {
    environment: String,
    config: ConfigStore,
    host: Host,
    requirements: RwLock<Requirements>,
    meta: RwLock<Arc<Meta>>,
    routes: RouteRegistry,
    parameters: ParameterStore,
    hooks: HookChain,
    register: ResultRegister,
    transport: Arc<dyn Transport>,
    validator: Arc<dyn SchemaValidator>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("routes", &self.routes.names())
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Start building an application with its metadata text
    #[must_use]
    pub fn builder(meta_text: impl Into<String>) -> ApplicationBuilder {
        ApplicationBuilder::new(meta_text)
    }

    /// Build from a config directory and a YAML requirements file
    ///
    /// # Errors
    /// Returns the first metadata, configuration or requirements failure.
    pub fn from_selection(
        meta_text: &str,
        selection: ConfigSelection,
        requirements_path: impl Into<PathBuf>,
    ) -> RoutestResult<Arc<Self>> {
        Self::builder(meta_text)
            .config_selection(selection)
            .requirements_from(YamlRequirementsSource, requirements_path)
            .build()
    }

    #[inline]
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    #[inline]
    #[must_use]
    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    #[inline]
    #[must_use]
    pub fn register(&self) -> &ResultRegister {
        &self.register
    }

    /// Create a route under this application
    ///
    /// The route's metadata starts from the application's and applies
    /// `meta_text` on top. The route is not registered; pass it to
    /// [`Application::add_route`].
    ///
    /// # Errors
    /// Returns the metadata parse error or a schema compile error.
    pub fn new_route(self: &Arc<Self>, info: RouteInfo, meta_text: &str) -> RoutestResult<Arc<Route>> {
        let meta = Meta::inherit(&self.meta(), meta_text)?;
        let route = Route::new(info, self, meta, Arc::clone(&self.validator))?;
        Ok(Arc::new(route))
    }

    /// Register `route` under `name`, replacing any route with that name
    pub fn add_route(&self, name: impl Into<String>, route: Arc<Route>) -> Arc<Route> {
        self.routes.add(name, route)
    }

    #[must_use]
    pub fn route_by_name(&self, name: &str) -> Option<Arc<Route>> {
        self.routes.route_by_name(name)
    }

    pub fn register_response(&self, name: impl Into<String>, response: Arc<ResponseRecord>) {
        self.register.register_response(name, response);
    }

    /// # Errors
    /// Returns `NotFoundError::Response` if nothing is registered under `name`.
    pub fn response(&self, name: &str) -> Result<Arc<ResponseRecord>, NotFoundError> {
        self.register.response(name)
    }

    pub fn register_parameter(&self, name: impl Into<String>, parameter: Parameter) {
        self.register.register_parameter(name, parameter);
    }

    /// # Errors
    /// Returns `NotFoundError::Parameter` if nothing is registered under `name`.
    pub fn parameter(&self, name: &str) -> Result<Parameter, NotFoundError> {
        self.register.parameter(name)
    }

    /// Replace the requirements table from `source`
    ///
    /// # Errors
    /// Returns the load failure; the current table is kept.
    pub fn load_requirements(
        &self,
        source: &dyn RequirementsSource,
        path: &Path,
    ) -> Result<(), RequirementsError> {
        let loaded = source.load(path)?;
        *self.requirements.write() = loaded;
        Ok(())
    }

    /// # Errors
    /// Returns `NotFoundError::Requirement` if absent.
    pub fn requirement(&self, name: &str) -> Result<Requirement, NotFoundError> {
        self.requirements.read().get(name).cloned()
    }

    /// Copy of the requirements table
    #[must_use]
    pub fn requirements(&self) -> Requirements {
        self.requirements.read().clone()
    }
}

impl HasParameterStore for Application {
    fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }
}

impl HasHookChain for Application {
    fn hooks(&self) -> &HookChain {
        &self.hooks
    }
}

impl HasMetadata for Application {
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

impl Scope for Application {
    fn kind(&self) -> ScopeKind {
        ScopeKind::Application
    }
}

enum ConfigInput {
    Selection(ConfigSelection),
    Source {
        environment: String,
        source: Box<dyn ConfigSource>,
    },
    Map {
        environment: String,
        map: ConfigMap,
    },
}

enum RequirementsInput {
    Source {
        source: Box<dyn RequirementsSource>,
        path: PathBuf,
    },
    Table(Requirements),
}

/// Builder for [`Application`]
///
/// Configuration is required. Requirements default to an empty table, the
/// transport to [`ReqwestTransport`] with settings from the `transport`
/// config mapping, and the validator to [`JsonSchemaValidator`].
pub struct ApplicationBuilder {
    meta_text: String,
    config: Option<ConfigInput>,
    requirements: Option<RequirementsInput>,
    transport: Option<Arc<dyn Transport>>,
    validator: Option<Arc<dyn SchemaValidator>>,
}

impl fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("configured", &self.config.is_some())
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

impl ApplicationBuilder {
    /// Create new builder
    #[must_use]
    pub fn new(meta_text: impl Into<String>) -> Self {
        Self {
            meta_text: meta_text.into(),
            config: None,
            requirements: None,
            transport: None,
            validator: None,
        }
    }

    /// Load configuration by file presence in a directory
    #[must_use]
    pub fn config_selection(mut self, selection: ConfigSelection) -> Self {
        self.config = Some(ConfigInput::Selection(selection));
        self
    }

    /// Load configuration from a custom source
    #[must_use]
    pub fn config_source<S>(mut self, environment: impl Into<String>, source: S) -> Self
    where
        S: ConfigSource + 'static,
    {
        self.config = Some(ConfigInput::Source {
            environment: environment.into(),
            source: Box::new(source),
        });
        self
    }

    /// Use an in-memory configuration mapping
    #[must_use]
    pub fn config_map(mut self, environment: impl Into<String>, map: ConfigMap) -> Self {
        self.config = Some(ConfigInput::Map {
            environment: environment.into(),
            map,
        });
        self
    }

    /// Load requirements from `source` at `path`
    #[must_use]
    pub fn requirements_from<S>(mut self, source: S, path: impl Into<PathBuf>) -> Self
    where
        S: RequirementsSource + 'static,
    {
        self.requirements = Some(RequirementsInput::Source {
            source: Box::new(source),
            path: path.into(),
        });
        self
    }

    /// Use an in-memory requirements table
    #[must_use]
    pub fn requirements(mut self, table: Requirements) -> Self {
        self.requirements = Some(RequirementsInput::Table(table));
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Load everything and build
    ///
    /// # Errors
    /// - `RoutestError::Validation` for bad metadata
    /// - `RoutestError::Config` if configuration is missing, unreadable or
    ///   lacks a valid `host` mapping
    /// - `RoutestError::Requirements` if the requirements cannot be loaded
    /// - `RoutestError::Transport` if the default client cannot be built
    pub fn build(self) -> RoutestResult<Arc<Application>> {
        let meta = Meta::from_yaml(&self.meta_text)?;

        let (environment, map) = match self.config.ok_or(ConfigError::Unconfigured)? {
            ConfigInput::Selection(selection) => {
                let map = selection.load()?;
                (selection.environment, map)
            }
            ConfigInput::Source {
                environment,
                source,
            } => {
                let map = source.load(&environment)?;
                (environment, map)
            }
            ConfigInput::Map { environment, map } => (environment, map),
        };

        let config = ConfigStore::from_map(map);
        let host = Host::from_config(&config)?;

        let requirements = match self.requirements {
            Some(RequirementsInput::Source { source, path }) => source.load(&path)?,
            Some(RequirementsInput::Table(table)) => table,
            None => Requirements::new(),
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&TransportSettings::from_config(
                &config,
            )?)?),
        };
        let validator: Arc<dyn SchemaValidator> = match self.validator {
            Some(validator) => validator,
            None => Arc::new(JsonSchemaValidator),
        };

        tracing::info!(
            "Application initialized for environment: {} ({})",
            environment,
            host
        );

        Ok(Arc::new(Application {
            environment,
            config,
            host,
            requirements: RwLock::new(requirements),
            meta: RwLock::new(Arc::new(meta)),
            routes: RouteRegistry::new(),
            parameters: ParameterStore::new(),
            hooks: HookChain::new(ScopeKind::Application),
            register: ResultRegister::new(),
            transport,
            validator,
        }))
    }
}
