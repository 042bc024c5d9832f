//! Fake vocabulary REST API for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Every `GET` is answered from a table keyed by request path
//! (without the query string):
//! - `/Vocabularies/{acr}.search.json` — suggest rows
//! - `{term path}.info.json` — term detail
//! - `/Vocabularies/{acr}.json` — vocabulary metadata and roots
//!
//! Unknown paths answer `404`. Requests are recorded with their query string
//! so harnesses can check the `suggest` and `customFilter` parameters.
//!
//! # Example
//!
//! ```rust,no_run
//! let api = FakeVocabApi::start().await.unwrap();
//! api.respond("/Vocabularies/HP.search.json", json!({ "rows": [] })).await;
//! let source = RestSource::new(&api.base_url(), "/Vocabularies/", Duration::from_secs(1))?;
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: serde_json::Value,
    delay: Option<Duration>,
}

#[derive(Default)]
struct ApiState {
    routes: HashMap<String, Canned>,
    /// Every request as `path?query`.
    requests: Vec<String>,
}

/// Handle to the running fake API server.
pub struct FakeVocabApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeVocabApi {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new().fallback(serve).with_state(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer `path` with `200` and `body`.
    pub async fn respond(&self, path: &str, body: serde_json::Value) {
        self.insert(path, StatusCode::OK, body, None).await;
    }

    /// Answer `path` with `status` and an empty JSON object.
    pub async fn fail(&self, path: &str, status: u16) {
        let status = StatusCode::from_u16(status).unwrap();
        self.insert(path, status, serde_json::json!({}), None).await;
    }

    /// Answer `path` with `200` after `delay`.
    pub async fn respond_slowly(&self, path: &str, body: serde_json::Value, delay: Duration) {
        self.insert(path, StatusCode::OK, body, Some(delay)).await;
    }

    pub async fn requests(&self) -> Vec<String> {
        self.state.lock().await.requests.clone()
    }

    async fn insert(
        &self,
        path: &str,
        status: StatusCode,
        body: serde_json::Value,
        delay: Option<Duration>,
    ) {
        self.state
            .lock()
            .await
            .routes
            .insert(path.to_string(), Canned { status, body, delay });
    }
}

async fn serve(State(state): State<Arc<Mutex<ApiState>>>, uri: Uri) -> Response {
    let canned = {
        let mut state = state.lock().await;
        let recorded = match uri.query() {
            Some(q) => format!("{}?{q}", uri.path()),
            None => uri.path().to_string(),
        };
        state.requests.push(recorded);
        state.routes.get(uri.path()).cloned()
    };

    match canned {
        Some(canned) => {
            if let Some(delay) = canned.delay {
                tokio::time::sleep(delay).await;
            }
            (canned.status, Json(canned.body)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
