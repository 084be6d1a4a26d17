//! Testing utilities for RouTest workspace
//!
//! Shared test helpers, fixtures, and an in-memory transport.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use routest_core::{
    Application, ConfigMap, Method, RawReply, Route, RouteInfo, Transport, TransportError,
    TransportRequest,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const APP_META: &str = r#"
assignee: "Jane Doe"
automation_status: "manual-only"
component: "shopping cart"
importance: "medium"
requirements: "User must be able to add items to the cart and checkout"
requirements_override: "None"
setup: "Navigate to the shopping cart page"
test_steps: "Add items to the cart and check out"
expected_results: "Order is placed"
negative: false
type: "smoke"
tags: "cart,checkout"
"#;

pub const ROUTE_META: &str = r#"
assignee: "Anand Chavan"
automation_status: "automated"
importance: "high"
tags: "orders"
"#;

pub const SCENARIO_META: &str = r#"
automation_status: "automated"
importance: "critical"
negative: true
tags: "regression"
"#;

/// Transport double that records requests and replays a fixed outcome
pub struct RecordingTransport {
    outcome: Result<RawReply, TransportError>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl RecordingTransport {
    pub fn replying(reply: RawReply) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(reply),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Reply with `status` and a JSON body
    pub fn json(status: u16, body: &Value) -> Arc<Self> {
        Self::replying(RawReply {
            status,
            status_text: String::new(),
            headers: vec![(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )],
            body: body.to_string().into_bytes(),
        })
    }

    pub fn failing(error: TransportError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawReply, TransportError> {
        self.requests.lock().push(request);
        self.outcome.clone()
    }
}

/// Shared log for asserting hook order
#[derive(Debug, Clone, Default)]
pub struct TraceLog(Arc<Mutex<Vec<String>>>);

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

pub fn test_config() -> ConfigMap {
    let Value::Object(map) = json!({
        "host": {"protocol": "http", "hostname": "localhost", "port": 8080}
    }) else {
        unreachable!()
    };
    map
}

pub fn setup_test_app(transport: Arc<RecordingTransport>) -> Arc<Application> {
    Application::builder(APP_META)
        .config_map("test", test_config())
        .transport(transport)
        .build()
        .unwrap()
}

/// Create and register a route
pub fn add_test_route(app: &Arc<Application>, name: &str, method: Method, path: &str) -> Arc<Route> {
    let route = app
        .new_route(RouteInfo::new(name, method, path), ROUTE_META)
        .unwrap();
    app.add_route(name, route)
}
