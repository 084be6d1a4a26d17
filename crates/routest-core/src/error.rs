//! Error types for RouTest core
//!
//! Provides typed errors for:
//! - Malformed declarations (metadata, route info, parameter keys)
//! - Missing registry entries
//! - Hook, transport and schema failures during scenario execution
//! - Configuration and requirements loading at startup

use crate::parameters::ParameterKind;
use crate::schema::BodyTarget;
use crate::scope::{HookStage, ScopeKind};
use std::path::PathBuf;

/// Malformed input rejected at construction or registration time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Metadata text was empty
    #[error("metadata text is empty")]
    EmptyMetadata,

    /// Metadata text was not valid YAML for a metadata record
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    /// `automation_status` outside the accepted set
    #[error("invalid automation_status value: '{0}'")]
    InvalidAutomationStatus(String),

    /// `importance` outside the accepted set
    #[error("invalid importance value: '{0}'")]
    InvalidImportance(String),

    /// Parameter registered with an empty key
    #[error("{0} parameter key cannot be empty")]
    EmptyKey(ParameterKind),

    /// Route info text could not be parsed
    #[error("malformed route info: {0}")]
    MalformedInfo(String),

    /// Unknown HTTP method name
    #[error("invalid HTTP method: '{0}'")]
    InvalidMethod(String),
}

/// A named lookup found nothing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    /// No route under this name
    #[error("route not found: {0}")]
    Route(String),

    /// No registered response under this name
    #[error("response not found: {0}")]
    Response(String),

    /// No registered parameter under this name
    #[error("parameter not found: {0}")]
    Parameter(String),

    /// No parameter entry with this key in a store
    #[error("{kind} parameter not found: {key}")]
    ParameterKey { kind: ParameterKind, key: String },

    /// No requirement under this name
    #[error("requirement not found: {0}")]
    Requirement(String),

    /// No configuration value at this dotted path
    #[error("config key not found: {0}")]
    ConfigKey(String),

    /// The owning scope was dropped before the lookup
    #[error("parent {0} scope is no longer alive")]
    ParentScope(ScopeKind),
}

/// A user hook returned a failure
///
/// The hook's own error is kept unchanged in [`HookError::cause`].
#[derive(Debug, thiserror::Error)]
#[error("{stage} hook #{index} at {scope} scope failed: {cause}")]
pub struct HookError {
    /// Scope the failing chain belongs to
    pub scope: ScopeKind,
    /// Before or after
    pub stage: HookStage,
    /// Position of the failing hook in its chain
    pub index: usize,
    cause: anyhow::Error,
}

impl HookError {
    /// Create new hook error
    #[inline]
    #[must_use]
    pub fn new(scope: ScopeKind, stage: HookStage, index: usize, cause: anyhow::Error) -> Self {
        Self {
            scope,
            stage,
            index,
            cause,
        }
    }

    /// The error returned by the hook
    #[inline]
    #[must_use]
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Consume and return the hook's error
    #[inline]
    #[must_use]
    pub fn into_cause(self) -> anyhow::Error {
        self.cause
    }
}

/// The transport could not complete an exchange
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The resolved URL is not valid
    #[error("invalid request url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Sending failed (connect, TLS, protocol)
    #[error("request failed: {0}")]
    Send(String),

    /// The transport's own timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// The reply body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Client construction failed
    #[error("transport setup failed: {0}")]
    Setup(String),
}

/// Schema compilation or body validation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Schema text is not a valid JSON schema
    #[error("schema failed to compile: {0}")]
    Compile(String),

    /// Body could not be parsed as JSON
    #[error("{target} body is not valid JSON: {message}")]
    InvalidJson { target: BodyTarget, message: String },

    /// Body parsed but violates the schema
    #[error("{target} body failed schema validation: {}", errors.join("; "))]
    Violation {
        target: BodyTarget,
        errors: Vec<String>,
    },
}

impl SchemaError {
    /// Check if this is a body validation failure rather than a bad schema
    #[inline]
    #[must_use]
    pub fn is_body_failure(&self) -> bool {
        matches!(self, Self::InvalidJson { .. } | Self::Violation { .. })
    }
}

/// Configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No builder input was given for configuration
    #[error("no configuration source supplied")]
    Unconfigured,

    /// No file for the environment in the search directory
    #[error("no configuration file for environment '{environment}' in {}", dir.display())]
    NoSource { environment: String, dir: PathBuf },

    /// IO error reading a configuration file
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content could not be parsed
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A required key is absent
    #[error("configuration key not found: {0}")]
    MissingKey(String),

    /// The `host` mapping is malformed
    #[error("invalid host configuration: {0}")]
    InvalidHost(String),

    /// The `transport` mapping is malformed
    #[error("invalid transport configuration: {0}")]
    InvalidTransport(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create parse error for path
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Requirements could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum RequirementsError {
    /// IO error reading the requirements file
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content could not be parsed
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Terminal error of one scenario execution
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// A before- or after-hook failed
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The transport failed; no after-hooks ran
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body failed its schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The owning route or application is gone
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

impl ScenarioError {
    /// Check if the execution reached the server but a body failed its schema
    #[inline]
    #[must_use]
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Self::Schema(err) if err.is_body_failure())
    }

    /// Check if a hook aborted the execution
    #[inline]
    #[must_use]
    pub fn is_hook_failure(&self) -> bool {
        matches!(self, Self::Hook(_))
    }
}

/// Combined error for construction paths
#[derive(Debug, thiserror::Error)]
pub enum RoutestError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("requirements error: {0}")]
    Requirements(#[from] RequirementsError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias for construction operations
pub type RoutestResult<T> = Result<T, RoutestError>;
