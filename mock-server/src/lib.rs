//! In-memory stand-in for the Honeycomb REST API.
//!
//! Serves markers, triggers and boards under the same paths as the real
//! service and authenticates every request with the `X-Honeycomb-Team`
//! header. Triggers and boards are stored as opaque JSON documents so the
//! server echoes back exactly what clients send, plus an assigned `id`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "x-honeycomb-team";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub marker_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateMarker {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub marker_type: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Stored JSON objects keyed by their `id` field, in insertion order.
#[derive(Default)]
struct Documents {
    items: Vec<Map<String, Value>>,
}

impl Documents {
    fn insert(&mut self, mut doc: Map<String, Value>) -> Map<String, Value> {
        doc.insert("id".to_string(), Value::String(new_id()));
        self.items.push(doc.clone());
        doc
    }

    fn get(&self, id: &str) -> Option<&Map<String, Value>> {
        self.items.iter().find(|doc| doc_id(doc) == Some(id))
    }

    fn replace(&mut self, id: &str, mut doc: Map<String, Value>) -> Option<Map<String, Value>> {
        let slot = self.items.iter_mut().find(|doc| doc_id(doc) == Some(id))?;
        doc.insert("id".to_string(), Value::String(id.to_string()));
        *slot = doc.clone();
        Some(doc)
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|doc| doc_id(doc) != Some(id));
        self.items.len() != before
    }

    fn list(&self) -> Vec<Map<String, Value>> {
        self.items.clone()
    }
}

#[derive(Default)]
struct Store {
    markers: HashMap<String, Vec<Marker>>,
    triggers: HashMap<String, Documents>,
    boards: Documents,
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorBody>)>;

pub fn app(api_key: impl Into<String>) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key.into()),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/1/markers/{dataset}", get(list_markers).post(create_marker))
        .route("/1/triggers/{dataset}", get(list_triggers).post(create_trigger))
        .route(
            "/1/triggers/{dataset}/{id}",
            get(get_trigger).put(update_trigger).delete(delete_trigger),
        )
        .route("/1/boards", get(list_boards).post(create_board))
        .route("/1/boards/{id}", get(get_board).put(update_board).delete(delete_board))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: impl Into<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(&*state.api_key) {
        tracing::debug!(path = %request.uri().path(), "rejecting request with bad API key");
        return error(StatusCode::UNAUTHORIZED, "unknown API key - check your credentials").into_response();
    }
    next.run(request).await
}

// --- markers ---

async fn list_markers(State(state): State<AppState>, Path(dataset): Path<String>) -> Json<Vec<Marker>> {
    let store = state.store.read().await;
    Json(store.markers.get(&dataset).cloned().unwrap_or_default())
}

async fn create_marker(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
    Json(input): Json<CreateMarker>,
) -> Json<Marker> {
    let now = Utc::now();
    let marker = Marker {
        id: new_id(),
        created_at: now,
        updated_at: now,
        start_time: input.start_time,
        end_time: input.end_time,
        message: input.message,
        color: input.marker_type.as_deref().and_then(color_for),
        marker_type: input.marker_type,
        url: input.url,
    };
    state
        .store
        .write()
        .await
        .markers
        .entry(dataset)
        .or_default()
        .push(marker.clone());
    Json(marker)
}

// --- triggers ---

async fn list_triggers(State(state): State<AppState>, Path(dataset): Path<String>) -> Json<Vec<Map<String, Value>>> {
    let store = state.store.read().await;
    Json(store.triggers.get(&dataset).map(Documents::list).unwrap_or_default())
}

async fn create_trigger(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
    Json(input): Json<Value>,
) -> ApiResult<(StatusCode, Json<Map<String, Value>>)> {
    let doc = named_document("trigger", input)?;
    let created = state
        .store
        .write()
        .await
        .triggers
        .entry(dataset)
        .or_default()
        .insert(doc);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_trigger(
    State(state): State<AppState>,
    Path((dataset, id)): Path<(String, String)>,
) -> ApiResult<Json<Map<String, Value>>> {
    let store = state.store.read().await;
    store
        .triggers
        .get(&dataset)
        .and_then(|docs| docs.get(&id))
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("trigger"))
}

async fn update_trigger(
    State(state): State<AppState>,
    Path((dataset, id)): Path<(String, String)>,
    Json(input): Json<Value>,
) -> ApiResult<Json<Map<String, Value>>> {
    let doc = named_document("trigger", input)?;
    let mut store = state.store.write().await;
    store
        .triggers
        .get_mut(&dataset)
        .and_then(|docs| docs.replace(&id, doc))
        .map(Json)
        .ok_or_else(|| not_found("trigger"))
}

async fn delete_trigger(
    State(state): State<AppState>,
    Path((dataset, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let mut store = state.store.write().await;
    let removed = store.triggers.get_mut(&dataset).is_some_and(|docs| docs.remove(&id));
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("trigger"))
    }
}

// --- boards ---

async fn list_boards(State(state): State<AppState>) -> Json<Vec<Map<String, Value>>> {
    Json(state.store.read().await.boards.list())
}

async fn create_board(
    State(state): State<AppState>,
    Json(input): Json<Value>,
) -> ApiResult<(StatusCode, Json<Map<String, Value>>)> {
    let doc = named_document("board", input)?;
    let created = state.store.write().await.boards.insert(doc);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_board(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Map<String, Value>>> {
    let store = state.store.read().await;
    store.boards.get(&id).cloned().map(Json).ok_or_else(|| not_found("board"))
}

async fn update_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> ApiResult<Json<Map<String, Value>>> {
    let doc = named_document("board", input)?;
    let mut store = state.store.write().await;
    store.boards.replace(&id, doc).map(Json).ok_or_else(|| not_found("board"))
}

async fn delete_board(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    if state.store.write().await.boards.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("board"))
    }
}

// --- helpers ---

/// Accept a JSON object with a non-empty string `name`, dropping any `id`.
fn named_document(kind: &str, input: Value) -> ApiResult<Map<String, Value>> {
    let Value::Object(mut doc) = input else {
        return Err(error(StatusCode::BAD_REQUEST, &format!("{kind} must be a JSON object")));
    };
    match doc.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        _ => return Err(error(StatusCode::BAD_REQUEST, &format!("{kind} name must not be empty"))),
    }
    doc.remove("id");
    Ok(doc)
}

fn doc_id(doc: &Map<String, Value>) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn color_for(marker_type: &str) -> Option<String> {
    match marker_type {
        "deploy" => Some("#F96E11".to_string()),
        "incident" => Some("#E2003A".to_string()),
        _ => None,
    }
}

fn not_found(kind: &str) -> (StatusCode, Json<ErrorBody>) {
    error(StatusCode::NOT_FOUND, &format!("{kind} not found"))
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}
