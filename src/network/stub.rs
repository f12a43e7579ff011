//! Canned-response backend used by the transport tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct StubState {
    status: StatusCode,
    body: &'static str,
    captured: mpsc::UnboundedSender<CapturedRequest>,
}

/// Answers every request with `status` and `body`. The handle resolves once
/// `count` requests have been captured; the server lives until the test
/// runtime shuts down.
pub async fn serve(
    count: usize,
    status: u16,
    body: &'static str,
) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let (captured_tx, mut captured_rx) = mpsc::unbounded_channel();
    let state = Arc::new(StubState {
        status: StatusCode::from_u16(status).unwrap(),
        body,
        captured: captured_tx,
    });
    let app = Router::new().fallback(capture).with_state(state);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            log::error!("Stub backend error: {err}");
        }
    });

    let handle = tokio::spawn(async move {
        let mut captured = Vec::with_capacity(count);
        while captured.len() < count {
            match captured_rx.recv().await {
                Some(request) => captured.push(request),
                None => break,
            }
        }
        captured
    });

    (base_url, handle)
}

/// Base URL of a port nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn capture(
    State(stub): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let _ = stub.captured.send(CapturedRequest {
        method,
        uri,
        headers,
        body,
    });
    (
        stub.status,
        [(header::CONTENT_TYPE, "application/json")],
        stub.body,
    )
}
