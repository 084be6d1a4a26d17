//! RouTest Core - hierarchical HTTP API test engine
//!
//! Test suites are declared as Application → Route → Scenario. This crate:
//! - Merges metadata and parameters down the hierarchy
//! - Runs before- and after-hooks in a fixed multi-level order
//! - Builds and sends each scenario's request through a pluggable transport
//! - Checks request and response bodies against JSON schemas
//! - Loads configuration and requirements at startup
//!
//! # Example
//!
//! ```rust,ignore
//! use routest_core::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = Application::builder(APP_META)
//!     .config_selection(ConfigSelection::new("staging", "./config"))
//!     .build()?;
//! app.register_header("Accept", "application/json")?;
//!
//! let info = RouteInfo::new("get-user", Method::Get, "/users/{id}");
//! let route = app.add_route("get-user", app.new_route(info, "")?);
//! let scenario = route.new_scenario("")?;
//! scenario.register_path("id", "42")?;
//!
//! let response = scenario.execute().await?;
//! println!("status {}", response.status_code());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod application;
pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod info;
pub mod meta;
pub mod parameters;
pub mod register;
pub mod request;
pub mod requirements;
pub mod response;
pub mod route;
pub mod route_registry;
pub mod scenario;
pub mod scenario_registry;
pub mod schema;
pub mod scope;
pub mod transport;

// Re-exports for convenience
pub use application::{Application, ApplicationBuilder};
pub use config::{ConfigFormat, ConfigMap, ConfigSelection, ConfigSource, ConfigStore, FileConfigSource};
pub use error::{
    ConfigError, HookError, NotFoundError, RequirementsError, RoutestError, RoutestResult,
    ScenarioError, SchemaError, TransportError, ValidationError,
};
pub use hooks::{AfterHook, BeforeHook, HookChain};
pub use host::Host;
pub use info::RouteInfo;
pub use meta::{AutomationStatus, Importance, Meta};
pub use parameters::{Parameter, ParameterKind, ParameterStore};
pub use register::{RegisterContents, ResultRegister};
pub use request::{HttpRequest, Method, RequestBody};
pub use requirements::{Requirement, Requirements, RequirementsSource, YamlRequirementsSource};
pub use response::ResponseRecord;
pub use route::Route;
pub use route_registry::RouteRegistry;
pub use scenario::Scenario;
pub use scenario_registry::ScenarioRegistry;
pub use schema::{BodySchema, BodyTarget, CompiledSchema, JsonSchemaValidator, SchemaValidator};
pub use scope::{
    HasHookChain, HasMetadata, HasParameterStore, HookStage, Scope, ScopeChain, ScopeExt, ScopeKind,
};
pub use transport::{RawReply, ReqwestTransport, Transport, TransportRequest, TransportSettings};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for declaring and running suites
    pub use crate::{
        Application, ConfigSelection, HasHookChain, HasMetadata, HasParameterStore, Method,
        Parameter, RequestBody, ResponseRecord, Route, RouteInfo, Scenario, ScenarioError, Scope,
        ScopeExt, YamlRequirementsSource,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
