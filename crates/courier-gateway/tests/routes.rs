// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use courier_config::model::QueryConfig;
use courier_core::WebhookLedger;
use courier_gateway::{GatewayState, HealthState, build_router};
use courier_test_utils::{Fault, MockReply, MockSender, StoreOp, TestHarness};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn router(
    harness: &TestHarness,
    metrics: Option<Arc<dyn Fn() -> String + Send + Sync>>,
) -> Router {
    let query = QueryConfig {
        default_limit: 2,
        max_limit: 3,
    };
    let state = GatewayState {
        pipeline: harness.pipeline.clone(),
        outbound: harness.outbound.clone(),
        store: harness.store.clone(),
        store_timeout: Duration::from_secs(5),
        query,
        health: HealthState::new(metrics),
    };
    build_router(state, Duration::from_secs(10))
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn incoming(id: &str, timestamp: i64) -> Value {
    json!({
        "eventType": "message",
        "id": id,
        "waId": "27820000000",
        "text": format!("message {id}"),
        "timestamp": timestamp.to_string()
    })
}

#[tokio::test]
async fn webhook_acknowledges_and_ledgers_event() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);

    let (status, body) = call(&app, post_json("/webhook", incoming("m1", 1_700_000_000))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["kind"], "incoming_message");
    assert_eq!(body["result"]["outcome"], "stored");
    assert!(body["eventId"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn webhook_acknowledges_unknown_and_malformed_events() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);

    let unknown = json!({"eventType": "orderPlaced"});
    let (status, body) = call(&app, post_json("/webhook", unknown)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "unhandled");
    assert_eq!(body["result"]["outcome"], "unhandled");

    let (status, body) = call(
        &app,
        post_json("/webhook", json!({"eventType": "sentMessageREAD_v2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["outcome"], "malformed_event");

    let (status, body) = call(
        &app,
        post_json("/webhook", json!({"eventType": "sentMessageDELIVERED", "id": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["outcome"], "update_target_missing");
}

#[tokio::test]
async fn webhook_accepts_json_without_content_type() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .body(Body::from(incoming("m1", 1_700_000_000).to_string()))
        .unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "incoming_message");
    assert_eq!(body["result"]["outcome"], "stored");
}

#[tokio::test]
async fn webhook_ledgers_non_json_body_as_unhandled() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "unhandled");

    let event_id = body["eventId"].as_str().unwrap();
    let entry = harness.storage.get_entry(event_id).await.unwrap().unwrap();
    assert_eq!(entry.raw_event, json!("not json"));
    assert!(entry.processed);
}

#[tokio::test]
async fn webhook_returns_500_when_store_fails() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);
    harness.faults.inject(StoreOp::Upsert, Fault::Fail);

    let (status, body) = call(&app, post_json("/webhook", incoming("m1", 1_700_000_000))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("storage")));
}

#[tokio::test]
async fn history_is_ascending_and_limited() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);
    for (id, ts) in [("m3", 1_700_000_300), ("m1", 1_700_000_100), ("m2", 1_700_000_200)] {
        call(&app, post_json("/webhook", incoming(id, ts))).await;
    }

    let (status, body) = call(&app, get("/api/messages/27820000000")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["m2", "m3"]);
    assert_eq!(body[0]["timestamp"], 1_700_000_200_000i64);
    assert_eq!(body[0]["formattedDate"], "2023-11-14T22:16:40.000Z");
    assert_eq!(body[0]["counterpartyId"], "27820000000");

    let (_, body) = call(&app, get("/api/messages/27820000000?order=asc&limit=50")).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn history_survives_missing_index() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);
    for (id, ts) in [("m1", 1_700_000_100), ("m2", 1_700_000_200)] {
        call(&app, post_json("/webhook", incoming(id, ts))).await;
    }
    harness.drop_history_index().await.unwrap();

    let (status, body) = call(&app, get("/api/messages/27820000000?order=asc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["id"], "m1");
}

#[tokio::test]
async fn history_rejects_missing_counterparty_and_bad_order() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);

    let (status, _) = call(&app, get("/api/messages")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, get("/api/messages/%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&app, get("/api/messages/278?order=sideways")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sideways"));
}

#[tokio::test]
async fn history_serves_counterparty_ids_that_look_like_routes() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);
    let event = json!({
        "eventType": "message",
        "id": "m1",
        "waId": "session",
        "text": "hi",
        "timestamp": "1700000000"
    });
    call(&app, post_json("/webhook", event)).await;

    let (status, body) = call(&app, get("/api/messages/session")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "m1");
    assert_eq!(body[0]["counterpartyId"], "session");
}

#[tokio::test]
async fn history_returns_500_when_store_fails() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);
    harness.faults.inject(StoreOp::Query, Fault::Fail);

    let (status, _) = call(&app, get("/api/messages/27820000000")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn session_send_records_outgoing_message() {
    let sender = MockSender::with_replies(vec![MockReply::Accept(Some("wamid.1".to_string()))]);
    let harness = TestHarness::builder().with_sender(sender).build().await.unwrap();
    let app = router(&harness, None);

    let (status, body) = call(
        &app,
        post_json("/api/send/session", json!({"waId": "27820000000", "text": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "messageId": "wamid.1"}));

    let (_, history) = call(&app, get("/api/messages/27820000000")).await;
    assert_eq!(history[0]["id"], "wamid.1");
    assert_eq!(history[0]["direction"], "outgoing");
    assert_eq!(history[0]["status"], "sent");
    assert_eq!(history[0]["kind"], "session");
}

#[tokio::test]
async fn template_send_failure_returns_detail_and_records_nothing() {
    let sender = MockSender::with_replies(vec![MockReply::Reject {
        status: 400,
        detail: "Template not approved".to_string(),
    }]);
    let harness = TestHarness::builder().with_sender(sender).build().await.unwrap();
    let app = router(&harness, None);

    let (status, body) = call(
        &app,
        post_json(
            "/api/send/template",
            json!({
                "waId": "27820000000",
                "templateName": "welcome",
                "broadcastName": "welcome_oct",
                "parameters": [{"name": "first_name", "value": "Ada"}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Template not approved");

    let sent = harness.sender.sent_templates().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].parameters[0].name, "first_name");

    let (_, history) = call(&app, get("/api/messages/27820000000")).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn send_endpoints_reject_blank_fields() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);

    let (status, _) = call(
        &app,
        post_json("/api/send/session", json!({"waId": " ", "text": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        post_json("/api/send/template", json!({"waId": "278", "templateName": "t"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(harness.sender.sent_sessions().await.is_empty());
    assert!(harness.sender.sent_templates().await.is_empty());
}

#[tokio::test]
async fn health_reports_version_and_uptime() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);

    let (status, body) = call(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptimeSecs"].is_u64());
}

#[tokio::test]
async fn health_reports_degraded_without_history_index() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(&harness, None);
    harness.drop_history_index().await.unwrap();

    let (status, body) = call(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn metrics_are_served_only_when_enabled() {
    let harness = TestHarness::new().await.unwrap();

    let (status, _) = call(&router(&harness, None), get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let render: Arc<dyn Fn() -> String + Send + Sync> =
        Arc::new(|| "courier_webhook_events_total 3\n".to_string());
    let (status, body) = call(&router(&harness, Some(render)), get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("courier_webhook_events_total 3\n"));
}
