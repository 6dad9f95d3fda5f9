//! In-memory stand-in for the tracking service.
//!
//! Serves the three routes the client uses: the root probe, tracking
//! creation and tracking lookup. Every route checks the API key header and
//! answers with the service's `{meta, data}` envelope.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "aftership-api-key";

/// Trackings keyed by `(slug, tracking_number)`.
pub type Db = Arc<RwLock<HashMap<(String, String), Value>>>;

pub type Reply = (StatusCode, Json<Value>);

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    db: Db,
}

/// Request fields copied verbatim onto a stored tracking.
const COPIED_FIELDS: [&str; 7] = [
    "title",
    "smses",
    "emails",
    "order_id",
    "order_id_path",
    "custom_fields",
    "language",
];

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(HashMap::new())),
    };
    Router::new()
        .route("/", get(probe))
        .route("/trackings", post(create_tracking))
        .route("/trackings/{slug}/{tracking_number}", get(get_tracking))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

pub fn envelope(status: StatusCode, data: Value) -> Reply {
    (status, Json(json!({ "meta": { "code": status.as_u16() }, "data": data })))
}

pub fn error_envelope(status: StatusCode, code: u32, error_type: &str, message: &str) -> Reply {
    (
        status,
        Json(json!({
            "meta": { "code": code, "message": message, "type": error_type },
            "data": {}
        })),
    )
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Reply> {
    let presented = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if presented == Some(&*state.api_key) {
        Ok(())
    } else {
        Err(error_envelope(
            StatusCode::UNAUTHORIZED,
            401,
            "Unauthorized",
            "Invalid API key.",
        ))
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Fresh tracking record for a validated creation request.
pub fn new_tracking_record(slug: &str, tracking_number: &str, input: &Map<String, Value>) -> Value {
    let created_at = now();
    let mut tracking = json!({
        "id": Uuid::new_v4().simple().to_string(),
        "created_at": created_at,
        "updated_at": created_at,
        "last_updated_at": created_at,
        "slug": slug,
        "tracking_number": tracking_number,
        "active": true,
        "source": "api",
        "tag": "Pending",
        "subtag": "Pending_001",
        "subtag_message": "Pending",
        "tracked_count": 0,
        "return_to_sender": false,
        "android": [],
        "ios": [],
        "checkpoints": [{
            "slug": slug,
            "created_at": created_at,
            "checkpoint_time": Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "city": null,
            "location": null,
            "country_name": null,
            "country_iso3": null,
            "coordinates": [],
            "state": null,
            "zip": null,
            "message": "Shipment information received",
            "tag": "InfoReceived",
            "subtag": "InfoReceived_001",
            "subtag_message": "Info Received"
        }]
    });
    if let Some(record) = tracking.as_object_mut() {
        for field in COPIED_FIELDS {
            record.insert(field.to_string(), input.get(field).cloned().unwrap_or(Value::Null));
        }
    }
    tracking
}

/// Keep identifiers plus the requested fields.
pub fn select_fields(tracking: &Value, fields: &[String]) -> Value {
    let mut selected = Map::new();
    for key in ["id", "slug", "tracking_number"]
        .into_iter()
        .chain(fields.iter().map(String::as_str))
    {
        if let Some(value) = tracking.get(key) {
            selected.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(selected)
}

async fn probe(State(state): State<AppState>, headers: HeaderMap) -> Reply {
    if let Err(reply) = authorize(&state, &headers) {
        return reply;
    }
    envelope(StatusCode::OK, json!({}))
}

async fn create_tracking(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Reply {
    if let Err(reply) = authorize(&state, &headers) {
        return reply;
    }

    let input = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(mut root)) => match root.remove("tracking") {
            Some(Value::Object(tracking)) => tracking,
            _ => {
                return error_envelope(StatusCode::BAD_REQUEST, 4001, "BadRequest", "Missing tracking object.")
            }
        },
        _ => return error_envelope(StatusCode::BAD_REQUEST, 4001, "BadRequest", "Invalid JSON body."),
    };

    let tracking_number = input
        .get("tracking_number")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if tracking_number.is_empty() {
        return error_envelope(
            StatusCode::BAD_REQUEST,
            4005,
            "BadRequest",
            "tracking_number is required.",
        );
    }
    let slug = input
        .get("slug")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut db = state.db.write().await;
    let key = (slug, tracking_number);
    if db.contains_key(&key) {
        return error_envelope(StatusCode::CONFLICT, 4003, "BadRequest", "Tracking already exists.");
    }
    let tracking = new_tracking_record(&key.0, &key.1, &input);
    db.insert(key, tracking.clone());
    tracing::info!(tracking = %tracking["id"], "tracking created");

    envelope(StatusCode::CREATED, json!({ "tracking": tracking }))
}

async fn get_tracking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((slug, tracking_number)): Path<(String, String)>,
    body: Bytes,
) -> Reply {
    if let Err(reply) = authorize(&state, &headers) {
        return reply;
    }

    // Extra fields arrive as a JSON array in the GET body.
    let fields: Vec<String> = if body.is_empty() {
        Vec::new()
    } else {
        match serde_json::from_slice(&body) {
            Ok(fields) => fields,
            Err(_) => {
                return error_envelope(
                    StatusCode::BAD_REQUEST,
                    4001,
                    "BadRequest",
                    "Field list must be a JSON array of strings.",
                )
            }
        }
    };

    let db = state.db.read().await;
    match db.get(&(slug, tracking_number)) {
        Some(tracking) if fields.is_empty() => envelope(StatusCode::OK, json!({ "tracking": tracking })),
        Some(tracking) => envelope(
            StatusCode::OK,
            json!({ "tracking": select_fields(tracking, &fields) }),
        ),
        None => error_envelope(StatusCode::NOT_FOUND, 4004, "NotFound", "Tracking does not exist."),
    }
}
