use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use push_relay_lib::push::{DeliveryError, PushTransport, SubscriptionRecord};
use push_relay_lib::server::{build_cors, build_router, ServerAppState};
use push_relay_lib::shutdown::ShutdownState;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

const PUBLIC_KEY: &str = "BEl62iUYgUivxIkv69yViEuiBIa-Ib9-SkvMeAtA3LFgDzkrxZJjSgSnfckjBJuBkr3qBUYIHBQFLXYp5Nksh8U";

/// Transport that fails with `EndpointGone` for selected endpoints
#[derive(Default)]
struct RecordingTransport {
    gone: HashSet<String>,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send(
        &self,
        subscription: &SubscriptionRecord,
        _payload: &[u8],
    ) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(subscription.endpoint.clone());
        if self.gone.contains(&subscription.endpoint) {
            Err(DeliveryError::EndpointGone)
        } else {
            Ok(())
        }
    }
}

fn app_with(transport: Arc<RecordingTransport>, origins: &[String]) -> (Router, ServerAppState) {
    let state = ServerAppState::new(
        PUBLIC_KEY,
        transport,
        Some("hello".to_string()),
        ShutdownState::new(),
    );
    let router = build_router(state.clone(), build_cors(origins).unwrap());
    (router, state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn subscription(endpoint: &str) -> Value {
    json!({
        "endpoint": endpoint,
        "expirationTime": null,
        "keys": {"p256dh": "k1", "auth": "a1"}
    })
}

/// Poll until the registry reaches the expected size
async fn wait_for_len(state: &ServerAppState, expected: usize) {
    for _ in 0..100 {
        if state.registry.len().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "registry size stayed at {}, expected {}",
        state.registry.len().await,
        expected
    );
}

#[tokio::test]
async fn test_vapid_public_key() {
    let (router, _) = app_with(Arc::default(), &[]);

    let request = Request::get("/vapid/public").body(Body::empty()).unwrap();
    let (status, body) = call(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"publicKey": PUBLIC_KEY}));
}

#[tokio::test]
async fn test_index_and_health() {
    let (router, _) = app_with(Arc::default(), &[]);

    let (status, body) = call(&router, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "hello"}));

    let response = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_subscribe_is_idempotent() {
    let (router, state) = app_with(Arc::default(), &[]);

    let (status, body) = call(
        &router,
        post_json("/subscribe", subscription("https://push.example/abc")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "total": 1}));

    let (status, body) = call(
        &router,
        post_json("/subscribe", subscription("https://push.example/abc")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": false, "total": 1}));

    let (_, body) = call(
        &router,
        post_json("/subscribe", subscription("https://push.example/def")),
    )
    .await;
    assert_eq!(body, json!({"success": true, "total": 2}));
    assert_eq!(state.registry.len().await, 2);
}

#[tokio::test]
async fn test_subscribe_rejects_malformed_body() {
    let (router, state) = app_with(Arc::default(), &[]);

    let (status, _) = call(
        &router,
        post_json("/subscribe", json!({"keys": {"p256dh": "k1"}})),
    )
    .await;
    assert!(status.is_client_error());

    let (status, _) = call(
        &router,
        post_json("/subscribe", json!({"endpoint": 42, "keys": {}})),
    )
    .await;
    assert!(status.is_client_error());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/subscribe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let (status, _) = call(&router, request).await;
    assert!(status.is_client_error());

    assert!(state.registry.is_empty().await);
}

#[tokio::test]
async fn test_send_with_no_subscribers() {
    let transport = Arc::new(RecordingTransport::default());
    let (router, _) = app_with(transport.clone(), &[]);

    let (status, body) = call(
        &router,
        post_json("/send", json!({"title": "Hi", "body": "There"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"queued": 0}));
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_requires_title_and_body() {
    let (router, _) = app_with(Arc::default(), &[]);

    let (status, _) = call(&router, post_json("/send", json!({"title": "Hi"}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_send_removes_gone_subscribers() {
    let transport = Arc::new(RecordingTransport {
        gone: HashSet::from(["https://push.example/abc".to_string()]),
        sent: Mutex::default(),
    });
    let (router, state) = app_with(transport.clone(), &[]);

    call(
        &router,
        post_json("/subscribe", subscription("https://push.example/abc")),
    )
    .await;
    call(
        &router,
        post_json("/subscribe", subscription("https://push.example/live")),
    )
    .await;

    let (status, body) = call(
        &router,
        post_json(
            "/send",
            json!({"title": "Hi", "body": "There", "url": "/inbox"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"queued": 2}));

    wait_for_len(&state, 1).await;
    let snapshot = state.registry.snapshot().await;
    assert_eq!(snapshot[0].endpoint, "https://push.example/live");
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let origins = vec!["https://frontend-webpush.vercel.app".to_string()];
    let (router, _) = app_with(Arc::default(), &origins);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/subscribe")
        .header(header::ORIGIN, "https://frontend-webpush.vercel.app")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://frontend-webpush.vercel.app"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_ignores_other_origins() {
    let origins = vec!["https://frontend-webpush.vercel.app".to_string()];
    let (router, _) = app_with(Arc::default(), &origins);

    let request = Request::get("/vapid/public")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
