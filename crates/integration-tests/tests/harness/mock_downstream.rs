//! Mock downstream service answering with canned failure bodies

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Full instance body as a debug-mode service would send it
pub const FULL_BODY: &str = r#"{
    "errorCode": "billing.402.PaymentRequired",
    "statusCode": 402,
    "timestamp": "2024-05-01T10:00:00Z",
    "message": {"en": "Invoice 42 is unpaid."},
    "data": {"Invoice": 42}
}"#;

/// Reduced body as a production service would send it
pub const SIMPLE_BODY: &str = r#"{"error":{"message":"no such user","errorCode":"users.404.Missing"},"statusCode":404}"#;

/// Mock downstream service
pub struct MockDownstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    queries: Mutex<Vec<Option<String>>>,
    headers: Mutex<Vec<HeaderMap>>,
}

impl MockDownstream {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/full", routing::get(|| async { json_reply(StatusCode::PAYMENT_REQUIRED, FULL_BODY) }))
            .route("/simple", routing::get(|| async { json_reply(StatusCode::NOT_FOUND, SIMPLE_BODY) }))
            .route(
                "/foreign",
                routing::get(|| async { json_reply(StatusCode::SERVICE_UNAVAILABLE, r#"{"foo":"bar"}"#) }),
            )
            .route(
                "/html",
                routing::get(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
            )
            .route("/empty", routing::get(|| async { StatusCode::NO_CONTENT }))
            .route("/users", routing::get(users).post(echo_body))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL, suitable as a `[domains]` entry
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Query strings received on `/users`, in order
    pub fn queries(&self) -> Vec<Option<String>> {
        self.state.queries.lock().unwrap().clone()
    }

    /// Headers received on `/users`, in order
    pub fn headers(&self) -> Vec<HeaderMap> {
        self.state.headers.lock().unwrap().clone()
    }
}

impl Drop for MockDownstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn json_reply(status: StatusCode, body: &'static str) -> impl IntoResponse {
    (status, [(axum::http::header::CONTENT_TYPE, "application/json")], body)
}

async fn users(
    State(state): State<Arc<MockState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.queries.lock().unwrap().push(query);
    state.headers.lock().unwrap().push(headers);
    Json(serde_json::json!([{"id": 7, "name": "alice"}]))
}

async fn echo_body(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(body))
}
