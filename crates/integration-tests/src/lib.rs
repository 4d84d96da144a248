//! Mock storefront backend for end-to-end tests.
//!
//! [`MockBackend`] binds an axum server to `127.0.0.1:0`, answers each
//! `(method, path)` from a queue of scripted responses and records every
//! request it receives. Unscripted routes answer `404 {"message":"Not found"}`.
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! backend.respond(Method::GET, "/api/offers/active", 200, json!({"offers": []}));
//! let (storefront, local, toasts) = backend.storefront();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use shopfront_client::notify::ToastLog;
use shopfront_client::storage::{MemoryStore, SharedStore};
use shopfront_client::{ClientConfig, Storefront};
use tokio::task::JoinHandle;

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub request_id: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    /// The body parsed as JSON, or `Value::Null`.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// The body as lossy UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
struct Scripted {
    status: StatusCode,
    body: Value,
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Handle to a running mock backend. The server stops on drop.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("Failed to bind mock backend: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("Mock backend has no address: {e}"));

        let server = tokio::spawn(async move {
            // A dead server shows up as failed requests in the test itself.
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL to configure the client with.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a URL.
    #[must_use]
    pub fn url(&self) -> url::Url {
        url::Url::parse(&format!("http://{}", self.addr))
            .unwrap_or_else(|e| panic!("Invalid mock URL: {e}"))
    }

    /// Queue a response for `method path`. The last queued response for a
    /// route is repeated once the queue would otherwise run dry.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Scripted { status, body });
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for one route.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }

    /// Forget recorded requests.
    pub fn reset_requests(&self) {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Client configuration pointing at this backend, with short timers.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.url());
        config.offer_delay = Duration::from_millis(50);
        config.admin_poll_interval = Duration::from_millis(100);
        config.search_debounce = Duration::from_millis(20);
        config
    }

    /// A storefront over in-memory storage, reporting toasts to the
    /// returned log. Returns the local store so tests can seed tokens.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client fails to build.
    #[must_use]
    pub fn storefront(&self) -> (Storefront, SharedStore, Arc<ToastLog>) {
        let local = MemoryStore::shared();
        let toasts = Arc::new(ToastLog::new());
        let storefront = Storefront::with_stores(
            self.config(),
            local.clone(),
            MemoryStore::shared(),
            toasts.clone(),
        )
        .unwrap_or_else(|e| panic!("Failed to build storefront: {e}"));
        (storefront, local, toasts)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path = uri.path().to_string();

    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query: uri.query().map(str::to_string),
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
            request_id: header_value(header::HeaderName::from_static("x-request-id")),
            body,
        });

    let scripted = {
        let mut routes = state.routes.lock().unwrap_or_else(PoisonError::into_inner);
        routes.get_mut(&(method, path)).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };

    match scripted {
        Some(Scripted { status, body }) => (status, axum::Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": "Not found" })),
        )
            .into_response(),
    }
}

/// A product document as the backend returns it.
#[must_use]
pub fn product_json(id: &str, name: &str, price: u32, stock: u32) -> Value {
    json!({
        "_id": id,
        "name": name,
        "description": format!("{name} in organic cotton"),
        "price": price,
        "image": format!("https://cdn.example.com/{id}.jpg"),
        "category": "tees",
        "sizes": ["S", "M", "L"],
        "stock": stock,
    })
}

/// A logged-in customer document.
#[must_use]
pub fn user_json(id: &str, email: &str) -> Value {
    json!({ "_id": id, "name": "Asha Rao", "email": email })
}
