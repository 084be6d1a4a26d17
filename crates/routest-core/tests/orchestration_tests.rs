//! Functional tests for scenario execution across the three scopes.
//!
//! Core guarantees exercised here:
//! - Before-hooks run Application, Route, Scenario; after-hooks run the
//!   reverse.
//! - Parameter export runs outermost first, so inner scopes win header
//!   conflicts.
//! - A transport failure stops execution before any after-hook.
//! - A response schema violation still runs after-hooks and stores the
//!   response.
//! - Metadata is inherited and overridden down the hierarchy.

use pretty_assertions::assert_eq;
use routest_core::prelude::*;
use routest_core::{
    AutomationStatus, BodyTarget, HookStage, Importance, NotFoundError, ParameterKind, ScopeKind,
    SchemaError, TransportError,
};
use routest_test_utils::{add_test_route, setup_test_app, RecordingTransport, TraceLog};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const USER_SCHEMA: &str = r#"{
    "type": "object",
    "required": ["id"],
    "properties": {"id": {"type": "integer"}}
}"#;

fn trace_hooks(scope: &dyn Scope, label: &'static str, log: &TraceLog) {
    let before = log.clone();
    scope.before_hook(move |request| {
        before.push(format!("before:{label}"));
        Ok(request)
    });
    let after = log.clone();
    scope.after_hook(move |response| {
        after.push(format!("after:{label}"));
        Ok(response)
    });
}

#[tokio::test]
async fn hooks_run_in_scope_order() {
    let transport = RecordingTransport::json(200, &json!({"id": 1}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "get-user", Method::Get, "/users/1");
    let scenario = route.new_scenario("").unwrap();

    let log = TraceLog::new();
    trace_hooks(app.as_ref(), "app", &log);
    trace_hooks(route.as_ref(), "route", &log);
    trace_hooks(scenario.as_ref(), "scenario", &log);

    scenario.execute().await.unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "before:app",
            "before:route",
            "before:scenario",
            "after:scenario",
            "after:route",
            "after:app",
        ]
    );
}

#[tokio::test]
async fn request_is_built_from_every_scope() {
    let transport = RecordingTransport::json(200, &json!({"id": 42}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "get-user", Method::Get, "/users/{id}");
    let scenario = route.new_scenario("").unwrap();

    app.register_header("X-Env", "app").unwrap();
    app.register_header("Accept", "text/plain").unwrap();
    route.register_query("expand", "profile").unwrap();
    route.register_header("X-Env", "route").unwrap();
    scenario.register_path("id", "42").unwrap();
    scenario.register_header("x-env", "scenario").unwrap();

    scenario.execute().await.unwrap();

    let sent = transport.last_request().unwrap();
    assert_eq!(sent.url.as_str(), "http://localhost:8080/users/42?expand=profile");
    let env: Vec<_> = sent
        .headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("x-env"))
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(env, vec!["scenario"]);
    assert!(sent
        .headers
        .contains(&("Accept".to_string(), "text/plain".to_string())));
}

#[tokio::test]
async fn before_hook_sees_unexported_request() {
    let transport = RecordingTransport::json(200, &json!({}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "search", Method::Get, "/search");
    let scenario = route.new_scenario("").unwrap();

    route.register_header("X-Token", "from-params").unwrap();
    scenario.before_hook(|mut request| {
        assert_eq!(request.header("X-Token"), None);
        request.set_header("X-Token", "from-hook");
        Ok(request)
    });

    scenario.execute().await.unwrap();
    let sent = transport.last_request().unwrap();
    assert!(sent
        .headers
        .contains(&("X-Token".to_string(), "from-params".to_string())));
}

#[tokio::test]
async fn before_hook_failure_stops_execution() {
    let transport = RecordingTransport::json(200, &json!({}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "orders", Method::Post, "/orders");
    let scenario = route.new_scenario("").unwrap();

    let later = Arc::new(AtomicUsize::new(0));
    route.before_hook(|_| Err(anyhow::anyhow!("credentials unavailable")));
    let counter = Arc::clone(&later);
    scenario.before_hook(move |request| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(request)
    });

    let hook = match scenario.execute().await {
        Err(ScenarioError::Hook(hook)) => hook,
        other => panic!("expected hook failure, got {other:?}"),
    };
    assert_eq!(hook.scope, ScopeKind::Route);
    assert_eq!(hook.stage, HookStage::Before);
    assert_eq!(hook.index, 0);
    assert_eq!(hook.cause().to_string(), "credentials unavailable");
    assert_eq!(later.load(Ordering::SeqCst), 0);
    assert_eq!(transport.calls(), 0);
    assert!(scenario.response().is_none());
}

#[tokio::test]
async fn transport_failure_runs_no_after_hooks() {
    let transport = RecordingTransport::failing(TransportError::Timeout);
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "slow", Method::Get, "/slow");
    let scenario = route.new_scenario("").unwrap();

    let after_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&after_calls);
    app.after_hook(move |response| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(response)
    });

    let err = scenario.execute().await.unwrap_err();
    assert!(matches!(err, ScenarioError::Transport(TransportError::Timeout)));
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    assert!(scenario.response().is_none());
}

#[tokio::test]
async fn response_violation_still_runs_after_hooks_and_stores() {
    let transport = RecordingTransport::json(200, &json!({"id": "not-a-number"}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "get-user", Method::Get, "/users/1");
    route.set_response_schema(USER_SCHEMA).unwrap();
    let scenario = route.new_scenario("").unwrap();

    let after_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&after_calls);
    app.after_hook(move |response| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(response.with_header("X-Checked", "yes"))
    });

    let err = scenario.execute().await.unwrap_err();
    assert!(err.is_schema_violation());
    assert!(matches!(
        err,
        ScenarioError::Schema(SchemaError::Violation {
            target: BodyTarget::Response,
            ..
        })
    ));
    assert_eq!(after_calls.load(Ordering::SeqCst), 1);

    let stored = scenario.response().unwrap();
    assert_eq!(stored.header_value("x-checked"), Some("yes"));
}

#[tokio::test]
async fn after_hook_error_outranks_schema_violation() {
    let transport = RecordingTransport::json(200, &json!({}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "get-user", Method::Get, "/users/1");
    route.set_response_schema(USER_SCHEMA).unwrap();
    let scenario = route.new_scenario("").unwrap();
    scenario.after_hook(|_| Err(anyhow::anyhow!("audit log closed")));

    let err = scenario.execute().await.unwrap_err();
    assert!(err.is_hook_failure());
    assert!(scenario.response().is_some());
}

#[tokio::test]
async fn invalid_request_body_is_never_sent() {
    let transport = RecordingTransport::json(201, &json!({"id": 1}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "create-user", Method::Post, "/users");
    route.set_request_schema(USER_SCHEMA).unwrap();
    let scenario = route.new_scenario("").unwrap();
    scenario.set_body(RequestBody::json(&json!({"name": "no id"})));

    let after_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&after_calls);
    route.after_hook(move |response| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(response)
    });

    let err = scenario.execute().await.unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::Schema(SchemaError::Violation {
            target: BodyTarget::Request,
            ..
        })
    ));
    assert_eq!(transport.calls(), 0);
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scenario_schema_overrides_route_schema() {
    let transport = RecordingTransport::json(200, &json!({"error": "gone"}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "get-user", Method::Get, "/users/9");
    route.set_response_schema(USER_SCHEMA).unwrap();

    let negative = route.new_scenario("").unwrap();
    negative
        .set_response_schema(r#"{"type": "object", "required": ["error"]}"#)
        .unwrap();
    let positive = route.new_scenario("").unwrap();

    assert!(negative.execute().await.is_ok());
    assert!(positive.execute().await.unwrap_err().is_schema_violation());
}

#[tokio::test]
async fn posted_body_and_response_round_trip() {
    let transport = RecordingTransport::json(201, &json!({"id": 7}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "create-user", Method::Post, "/users");
    let scenario = route.new_scenario("").unwrap();
    scenario.set_body(RequestBody::json(&json!({"id": 7})));

    let response = scenario.execute().await.unwrap();
    assert_eq!(response.status_code(), 201);
    assert_eq!(response.json_value().unwrap(), json!({"id": 7}));

    let sent = transport.last_request().unwrap();
    assert_eq!(sent.body.as_deref(), Some(br#"{"id":7}"#.as_slice()));
    assert!(Arc::ptr_eq(&response, &scenario.response().unwrap()));

    app.register_response("created-user", Arc::clone(&response));
    assert_eq!(app.response("created-user").unwrap().status_code(), 201);
}

#[tokio::test]
async fn dropped_route_is_reported() {
    let transport = RecordingTransport::json(200, &json!({}));
    let app = setup_test_app(transport);
    let route = app
        .new_route(RouteInfo::new("temp", Method::Get, "/temp"), "")
        .unwrap();
    let scenario = route.new_scenario("").unwrap();
    drop(route);

    assert!(matches!(
        scenario.execute().await,
        Err(ScenarioError::NotFound(NotFoundError::ParentScope(ScopeKind::Route)))
    ));
}

#[tokio::test]
async fn execute_all_keeps_registration_order() {
    let transport = RecordingTransport::json(200, &json!({}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "list", Method::Get, "/items");
    for page in 0..3 {
        let scenario = route.new_scenario("").unwrap();
        scenario.register_query("page", &page.to_string()).unwrap();
    }

    let results = route.execute_all().await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(transport.calls(), 3);
}

#[test]
fn metadata_flows_down_the_hierarchy() {
    let app = setup_test_app(RecordingTransport::json(200, &json!({})));
    let route = add_test_route(&app, "checkout", Method::Post, "/checkout");
    let scenario = route.new_scenario(routest_test_utils::SCENARIO_META).unwrap();

    let route_meta = route.meta();
    assert_eq!(route_meta.assignee(), "Anand Chavan");
    assert_eq!(route_meta.component(), "shopping cart");
    assert_eq!(route_meta.importance(), Importance::High);
    assert_eq!(route_meta.tags(), "cart,checkout,orders");

    let meta = scenario.meta();
    assert_eq!(meta.assignee(), "Anand Chavan");
    assert_eq!(meta.automation_status(), AutomationStatus::Automated);
    assert_eq!(meta.importance(), Importance::Critical);
    assert!(meta.is_negative());
    assert_eq!(meta.tag_list(), vec!["cart", "checkout", "orders", "regression"]);
    assert_eq!(meta.ancestors().count(), 2);

    assert_eq!(
        route.scenarios().scenarios_with_tag("regression").len(),
        1
    );
    assert_eq!(route.scenarios().scenarios_by_route("checkout").len(), 1);
}

#[test]
fn scope_override_keeps_old_snapshots() {
    let app = setup_test_app(RecordingTransport::json(200, &json!({})));
    let before = app.meta();
    app.override_meta("automation_status: automated\nimportance: low\ntags: nightly")
        .unwrap();

    assert_eq!(before.importance(), Importance::Medium);
    assert_eq!(app.meta().importance(), Importance::Low);
    assert!(app.meta().has_tag("nightly"));
}

#[test]
fn route_overwrite_keeps_count() {
    let app = setup_test_app(RecordingTransport::json(200, &json!({})));
    add_test_route(&app, "users", Method::Get, "/users");
    let replacement = add_test_route(&app, "users", Method::Get, "/v2/users");

    assert_eq!(app.routes().len(), 1);
    let stored = app.route_by_name("users").unwrap();
    assert!(Arc::ptr_eq(&stored, &replacement));
    assert_eq!(stored.info().path, "/v2/users");
    assert!(app.route_by_name("orders").is_none());
    assert_eq!(
        app.routes().get("orders").unwrap_err(),
        NotFoundError::Route("orders".to_string())
    );
}

#[tokio::test]
async fn reserved_characters_in_path_values_stay_in_the_path() {
    let transport = RecordingTransport::json(200, &json!({}));
    let app = setup_test_app(Arc::clone(&transport));
    let route = add_test_route(&app, "file", Method::Get, "/files/{name}");
    let scenario = route.new_scenario("").unwrap();
    scenario.register_path("name", "what?.txt").unwrap();
    scenario.register_query("v", "1").unwrap();

    scenario.execute().await.unwrap();

    let sent = transport.last_request().unwrap();
    assert_eq!(sent.url.path(), "/files/what%3F.txt");
    assert_eq!(sent.url.query(), Some("v=1"));
}

#[tokio::test]
async fn after_hook_header_rewrite_reaches_parameter_index() {
    let app = setup_test_app(RecordingTransport::json(200, &json!({})));
    let route = add_test_route(&app, "ping", Method::Get, "/ping");
    let scenario = route.new_scenario("").unwrap();
    scenario.after_hook(|response| Ok(response.with_header("X-Request-Id", "rewritten")));

    let record = scenario.execute().await.unwrap();

    let indexed = record
        .parameters()
        .get_by_key("x-request-id", ParameterKind::Header)
        .unwrap();
    assert_eq!(indexed.value, "rewritten");
    assert_eq!(record.header_value("X-Request-Id"), Some("rewritten"));
    assert!(Arc::ptr_eq(&scenario.response().unwrap(), &record));
}
