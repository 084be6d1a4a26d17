//! Target server address

use crate::config::ConfigStore;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Protocol, hostname and optional port of the server under test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    /// `http` or `https`; empty means `http`
    pub protocol: String,
    pub hostname: String,
    pub port: Option<u16>,
}

impl Host {
    /// Create new host
    #[must_use]
    pub fn new(protocol: impl Into<String>, hostname: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            protocol: protocol.into(),
            hostname: hostname.into(),
            port,
        }
    }

    /// `protocol://hostname[:port]`
    #[must_use]
    pub fn base_url(&self) -> String {
        let protocol = if self.protocol.is_empty() {
            "http"
        } else {
            self.protocol.as_str()
        };

        match self.port {
            Some(port) if port != 0 => format!("{protocol}://{}:{port}", self.hostname),
            _ => format!("{protocol}://{}", self.hostname),
        }
    }

    /// Read the `host` mapping
    ///
    /// `port` may be an integer or, as `.env` files produce, a numeric string.
    ///
    /// # Errors
    /// - `ConfigError::MissingKey` if there is no `host` mapping
    /// - `ConfigError::InvalidHost` if a field has the wrong shape
    pub fn from_config(config: &ConfigStore) -> Result<Self, ConfigError> {
        let section = config
            .get("host")
            .map_err(|_| ConfigError::MissingKey("host".to_string()))?;
        let Value::Object(section) = section else {
            return Err(ConfigError::InvalidHost("expected a mapping".to_string()));
        };

        let protocol = match section.get("protocol") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(ConfigError::InvalidHost(
                    "protocol must be a string".to_string(),
                ))
            }
        };

        let hostname = match section.get("hostname") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(ConfigError::InvalidHost(
                    "hostname must be a non-empty string".to_string(),
                ))
            }
        };

        let port = match section.get("port") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(
                n.as_u64()
                    .and_then(|p| u16::try_from(p).ok())
                    .ok_or_else(|| ConfigError::InvalidHost(format!("port out of range: {n}")))?,
            ),
            Some(Value::String(s)) => Some(
                s.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidHost(format!("port is not a number: {s}")))?,
            ),
            Some(_) => {
                return Err(ConfigError::InvalidHost(
                    "port must be a number".to_string(),
                ))
            }
        };

        Ok(Self {
            protocol,
            hostname,
            port,
        })
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}
