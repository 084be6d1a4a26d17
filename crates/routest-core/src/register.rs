//! Application-wide result register
//!
//! Named responses and parameters that one scenario records and another
//! reuses, for example a login response whose token later requests send.

use crate::error::NotFoundError;
use crate::parameters::Parameter;
use crate::response::ResponseRecord;
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// Register contents
#[derive(Debug, Clone, Default)]
pub struct RegisterContents {
    /// Responses by name
    pub responses: HashMap<String, Arc<ResponseRecord>>,
    /// Parameters by name
    pub parameters: HashMap<String, Parameter>,
}

/// Thread-safe named table of responses and parameters
#[derive(Debug, Default)]
pub struct ResultRegister {
    inner: RwLock<RegisterContents>,
}

impl ResultRegister {
    /// Create empty register
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a response, replacing any under the same name
    pub fn register_response(&self, name: impl Into<String>, response: Arc<ResponseRecord>) {
        let name = name.into();
        tracing::debug!("Registering response: {}", name);
        self.inner.write().responses.insert(name, response);
    }

    /// Look up a response
    ///
    /// # Errors
    /// Returns `NotFoundError::Response` if nothing is stored under `name`.
    pub fn response(&self, name: &str) -> Result<Arc<ResponseRecord>, NotFoundError> {
        self.inner
            .read_recursive()
            .responses
            .get(name)
            .cloned()
            .ok_or_else(|| NotFoundError::Response(name.to_string()))
    }

    /// Store a parameter, replacing any under the same name
    pub fn register_parameter(&self, name: impl Into<String>, parameter: Parameter) {
        self.inner.write().parameters.insert(name.into(), parameter);
    }

    /// Look up a parameter
    ///
    /// # Errors
    /// Returns `NotFoundError::Parameter` if nothing is stored under `name`.
    pub fn parameter(&self, name: &str) -> Result<Parameter, NotFoundError> {
        self.inner
            .read_recursive()
            .parameters
            .get(name)
            .cloned()
            .ok_or_else(|| NotFoundError::Parameter(name.to_string()))
    }

    /// Scoped read guard over the whole register
    ///
    /// Every accessor reads recursively, so lookups through `self` stay safe
    /// while it is held, even with a writer waiting.
    pub fn lock(&self) -> RwLockReadGuard<'_, RegisterContents> {
        self.inner.read_recursive()
    }

    /// Total stored responses and parameters
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read_recursive();
        inner.responses.len() + inner.parameters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Defensive copy
    #[must_use]
    pub fn snapshot(&self) -> RegisterContents {
        self.inner.read_recursive().clone()
    }
}
