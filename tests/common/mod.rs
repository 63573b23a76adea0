#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use dimfaso_admin::session::{CredentialStore, MemoryStore, SharedStore, StoreError};
use dimfaso_admin::{AdminClient, AppConfig};

/// Tokens the mock backend accepts
pub const VALID_TOKENS: [&str; 2] = ["T1", "A1"];

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Memory-backed store that counts writes, optionally failing to persist a clear
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    sets: AtomicUsize,
    clears: AtomicUsize,
    fail_clear: bool,
}

impl CountingStore {
    pub fn with_token(token: Option<&str>) -> Self {
        Self {
            inner: token.map(|t| MemoryStore::with_token(t)).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// `clear` drops the token but reports a storage failure, like a full disk would
    pub fn failing_clear(token: &str) -> Self {
        Self {
            fail_clear: true,
            ..Self::with_token(Some(token))
        }
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialStore for CountingStore {
    fn get(&self) -> Option<String> {
        self.inner.get()
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(token)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()?;
        if self.fail_clear {
            return Err(StoreError::Io {
                path: "storage.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    pub fail_logout: bool,
}

#[derive(Clone)]
struct MockState {
    options: MockOptions,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process stand-in for the Django backend, one host serving all four services
pub struct MockBackend {
    pub base_url: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        Self::start_with(MockOptions::default()).await
    }

    pub async fn start_with(options: MockOptions) -> Result<Self> {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            options,
            recorded: recorded.clone(),
        };
        let app = Router::new().fallback(handle).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock backend")?;
        let base_url = format!("http://{}", listener.local_addr()?);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { base_url, recorded })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().last().cloned().expect("no request recorded")
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::for_host(&self.base_url)
    }

    pub fn client(&self, store: SharedStore) -> AdminClient {
        AdminClient::new(&self.config(), store).expect("client for mock backend")
    }

    /// Client plus the store it reads, optionally pre-loaded with a token
    pub fn client_with_token(&self, token: Option<&str>) -> (AdminClient, SharedStore) {
        let store = match token {
            Some(token) => MemoryStore::with_token(token).shared(),
            None => MemoryStore::new().shared(),
        };
        (self.client(store.clone()), store)
    }

    /// Client over a `CountingStore`, returned alongside so calls can be asserted
    pub fn client_with_counting(&self, store: CountingStore) -> (AdminClient, Arc<CountingStore>) {
        let store = Arc::new(store);
        (self.client(store.clone()), store)
    }
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn unauthorized(detail: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Token")],
        Json(json!({ "detail": detail })),
    )
        .into_response()
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let path = uri.path().to_string();

    state.recorded.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    match (method.as_str(), path.as_str()) {
        ("POST", "/user/api/login/") => return login(&body),
        ("POST", "/user/api/register/") => {
            return reply(StatusCode::CREATED, merge_id(body, 100));
        }
        ("POST", "/user/api/logout/") if state.options.fail_logout => {
            return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"detail": "logout unavailable"}));
        }
        _ => {}
    }

    match authorization.as_deref().and_then(|h| h.strip_prefix("Token ")) {
        None => return unauthorized("Authentication credentials were not provided."),
        Some(token) if !VALID_TOKENS.contains(&token) => return unauthorized("Invalid token."),
        Some(_) => {}
    }

    if path == "/user/api/logout/" {
        return StatusCode::NO_CONTENT.into_response();
    }

    let last_segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let item_id = last_segment.parse::<u64>().ok();

    match (method.as_str(), item_id) {
        ("GET", Some(404)) => reply(StatusCode::NOT_FOUND, json!({"detail": "Not found."})),
        ("GET", Some(id)) => reply(StatusCode::OK, json!({"id": id, "nom": format!("item {}", id)})),
        ("GET", None) if path == "/user/api/users/me/" => {
            reply(StatusCode::OK, json!({"id": 1, "email": "a@b.com", "role": "admin"}))
        }
        ("GET", None) => list(&path, uri.query()),
        ("POST", None) => {
            if body.get("email").and_then(Value::as_str) == Some("dup@b.com") {
                return reply(
                    StatusCode::BAD_REQUEST,
                    json!({"email": ["user with this email already exists."]}),
                );
            }
            reply(StatusCode::CREATED, merge_id(body, 100))
        }
        ("PUT", Some(id)) | ("PATCH", Some(id)) => reply(StatusCode::OK, merge_id(body, id)),
        ("PUT", None) | ("PATCH", None) => reply(StatusCode::OK, body),
        ("DELETE", Some(_)) => StatusCode::NO_CONTENT.into_response(),
        _ => reply(StatusCode::METHOD_NOT_ALLOWED, json!({"detail": "Method not allowed."})),
    }
}

fn login(body: &Value) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");

    match (email, password) {
        ("a@b.com", "x") => reply(StatusCode::OK, json!({"token": "T1"})),
        ("jwt@b.com", "x") => reply(StatusCode::OK, json!({"access": "A1", "refresh": "R1"})),
        ("notoken@b.com", "x") => reply(StatusCode::OK, json!({"user": {"id": 3}})),
        _ => reply(
            StatusCode::BAD_REQUEST,
            json!({"non_field_errors": ["Unable to log in with provided credentials."]}),
        ),
    }
}

fn list(path: &str, query: Option<&str>) -> Response {
    let user_filter = query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "user")
            .map(|(_, v)| v.into_owned())
    });

    if path.contains("/profil-") {
        let items = match user_filter.as_deref() {
            Some("5") => json!([{"id": 9, "user": 5}]),
            _ => json!([]),
        };
        return reply(StatusCode::OK, items);
    }

    // The maintenance service answers with plain arrays
    if path.starts_with("/maintenance/") {
        return reply(StatusCode::OK, json!([{"id": 1, "titre": "Onduleur en panne"}, {"id": 2}]));
    }

    reply(
        StatusCode::OK,
        json!({
            "count": 42,
            "next": null,
            "previous": null,
            "results": [{"id": 1, "nom": "A"}, {"id": 2, "nom": "B"}]
        }),
    )
}

fn merge_id(body: Value, id: u64) -> Value {
    match body {
        Value::Object(mut map) => {
            map.insert("id".to_string(), json!(id));
            Value::Object(map)
        }
        _ => json!({"id": id}),
    }
}
