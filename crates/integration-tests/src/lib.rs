//! Integration test support for Emporium.
//!
//! [`MockStore`] is an in-process json-server look-alike: three collections
//! (`products`, `admins`, `sessions`) served over HTTP on a random local port.
//! Every request is recorded, and failures can be injected per method and
//! collection.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use url::Url;

use emporium_admin::CatalogClient;

/// Collections the store serves.
pub const COLLECTIONS: [&str; 3] = ["products", "admins", "sessions"];

/// One request as the store saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// Query parameters, decoded.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    method: Method,
    collection: String,
    status: StatusCode,
    body: String,
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<String, Vec<Value>>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
    failures: Vec<InjectedFailure>,
}

impl StoreState {
    fn assign_id(&mut self, record: &mut Value) {
        if let Some(object) = record.as_object_mut() {
            if !object.contains_key("id") {
                self.next_id += 1;
                object.insert("id".to_string(), json!(self.next_id));
            } else if let Some(n) = object.get("id").and_then(Value::as_i64) {
                self.next_id = self.next_id.max(n);
            }
        }
    }

    fn failure_for(&self, method: &Method, collection: &str) -> Option<&InjectedFailure> {
        self.failures
            .iter()
            .find(|f| &f.method == method && f.collection == collection)
    }
}

type SharedState = Arc<Mutex<StoreState>>;

/// Running mock catalog store.
#[derive(Debug, Clone)]
pub struct MockStore {
    base_url: Url,
    state: SharedState,
}

impl MockStore {
    /// Start a store with empty collections on `127.0.0.1` and a random port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let mut state = StoreState::default();
        for name in COLLECTIONS {
            state.collections.insert(name.to_string(), Vec::new());
        }
        let state = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/{collection}", get(list).post(create))
            .route(
                "/{collection}/{id}",
                get(fetch).put(replace).delete(remove),
            )
            .layer(middleware::from_fn_with_state(state.clone(), record_and_inject))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock store");
        let addr = listener.local_addr().expect("mock store address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}")).expect("mock store URL");
        Self { base_url, state }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Catalog client pointed at this store.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> CatalogClient {
        CatalogClient::new(&self.base_url).expect("catalog client")
    }

    /// Insert a record directly, assigning a numeric id if it has none.
    pub async fn insert(&self, collection: &str, mut record: Value) -> Value {
        let mut state = self.state.lock().await;
        state.assign_id(&mut record);
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    /// Insert an admin account.
    pub async fn seed_admin(&self, email: &str, password: &str, name: Option<&str>) -> Value {
        let mut record = json!({"email": email, "password": password});
        if let Some(name) = name {
            record["name"] = json!(name);
        }
        self.insert("admins", record).await
    }

    /// Current records of `collection`.
    pub async fn records(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    pub async fn clear_requests(&self) {
        self.state.lock().await.requests.clear();
    }

    /// Answer `method` requests on `collection` with `status` and `body`.
    pub async fn fail(&self, method: Method, collection: &str, status: StatusCode, body: &str) {
        self.state.lock().await.failures.push(InjectedFailure {
            method,
            collection: collection.to_string(),
            status,
            body: body.to_string(),
        });
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }
}

async fn record_and_inject(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_else(|_| Bytes::new());

    let collection = parts
        .uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let failure = {
        let mut state = state.lock().await;
        state.requests.push(RecordedRequest {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            content_type: parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            headers: parts.headers.clone(),
            body: serde_json::from_slice(&bytes).ok(),
        });
        state.failure_for(&parts.method, &collection).cloned()
    };

    if let Some(failure) = failure {
        return (failure.status, failure.body).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({}))).into_response()
}

fn id_matches(record: &Value, id: &str) -> bool {
    match record.get("id") {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

/// Field rendered the way a query-string filter compares it.
fn field_text(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => field_text(a, field).cmp(&field_text(b, field)),
    }
}

async fn list(
    State(state): State<SharedState>,
    Path(collection): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let state = state.lock().await;
    let Some(records) = state.collections.get(&collection) else {
        return not_found();
    };

    let mut sort = None;
    let mut descending = false;
    let mut filters = Vec::new();
    for (key, value) in params {
        match key.as_str() {
            "_sort" => sort = Some(value),
            "_order" => descending = value.eq_ignore_ascii_case("desc"),
            _ => filters.push((key, value)),
        }
    }

    let mut matched: Vec<Value> = records
        .iter()
        .filter(|record| {
            filters
                .iter()
                .all(|(key, value)| field_text(record, key).as_deref() == Some(value.as_str()))
        })
        .cloned()
        .collect();

    if let Some(field) = sort {
        matched.sort_by(|a, b| compare_field(a, b, &field));
        if descending {
            matched.reverse();
        }
    }

    Json(Value::Array(matched)).into_response()
}

async fn fetch(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let state = state.lock().await;
    state
        .collections
        .get(&collection)
        .and_then(|records| records.iter().find(|r| id_matches(r, &id)))
        .map_or_else(not_found, |record| Json(record.clone()).into_response())
}

async fn create(
    State(state): State<SharedState>,
    Path(collection): Path<String>,
    Json(mut record): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    if !state.collections.contains_key(&collection) {
        return not_found();
    }
    state.assign_id(&mut record);
    if let Some(records) = state.collections.get_mut(&collection) {
        records.push(record.clone());
    }
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn replace(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
    Json(mut record): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    let Some(existing) = state
        .collections
        .get_mut(&collection)
        .and_then(|records| records.iter_mut().find(|r| id_matches(r, &id)))
    else {
        return not_found();
    };

    if let (Some(object), Some(old_id)) = (record.as_object_mut(), existing.get("id").cloned()) {
        object.insert("id".to_string(), old_id);
    }
    *existing = record.clone();
    Json(record).into_response()
}

async fn remove(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let mut state = state.lock().await;
    let Some(records) = state.collections.get_mut(&collection) else {
        return not_found();
    };
    let before = records.len();
    records.retain(|r| !id_matches(r, &id));
    if records.len() == before {
        return not_found();
    }
    Json(json!({})).into_response()
}
