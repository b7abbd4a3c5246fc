#![allow(dead_code)]

//! In-process stand-in for the card service web app.
//!
//! One route answers every operation, dispatched on the `path` query
//! parameter the way the real deployment does. Behavior knobs let tests
//! break specific legs: refuse direct reads, misaddress relay replies,
//! stall individual write mechanisms, or delay the visibility of newly
//! added cards.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use meishi_api::{ApiConfig, CardFields, CardRecord};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const TOKEN: &str = "test-token";

/// Failure modes a test can switch on.
#[derive(Default)]
pub struct BackendBehavior {
    /// Direct reads answer 500 instead of JSON.
    pub fail_direct_reads: bool,
    /// Direct reads answer this envelope verbatim.
    pub direct_read_envelope: Option<Value>,
    /// Relay replies invoke a callback name nobody registered.
    pub misaddress_relay: bool,
    /// Sleep before answering any read.
    pub stall_reads: Option<Duration>,
    /// Sleep before answering JSON posts.
    pub stall_json_posts: Option<Duration>,
    /// Sleep before answering form posts.
    pub stall_form_posts: Option<Duration>,
    /// Accept writes without applying them.
    pub drop_writes: bool,
    /// Newly added cards stay unreadable for this long.
    pub add_visible_after: Option<Duration>,
}

struct StoredCard {
    record: CardRecord,
    visible_at: Instant,
}

#[derive(Default)]
struct BackendInner {
    behavior: BackendBehavior,
    cards: Vec<StoredCard>,
    update_bodies: Vec<Value>,
    search_queries: Vec<HashMap<String, String>>,
    direct_read_hits: usize,
    relay_hits: usize,
    bridge_hits: usize,
    get_hits: usize,
    json_post_hits: usize,
    form_post_hits: usize,
}

/// Handle to the running fake backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<BackendInner>>,
}

impl FakeBackend {
    /// Starts the backend on an ephemeral port and returns it together
    /// with a client config pointed at it, tuned for fast tests.
    pub async fn start() -> (Self, ApiConfig) {
        let backend = FakeBackend::default();
        let app = Router::new()
            .route("/", get(handle_get).post(handle_post))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ApiConfig::new(format!("http://{}/", addr), TOKEN)
            .unwrap()
            .with_read_timeout(Duration::from_millis(800))
            .with_post_timeout(Duration::from_millis(800))
            .with_add_dispatch_timeout(Duration::from_millis(800))
            .with_poll_interval(Duration::from_millis(40))
            .with_poll_deadline(Duration::from_secs(3));
        (backend, config)
    }

    pub fn set_behavior(&self, behavior: BackendBehavior) {
        self.inner.lock().unwrap().behavior = behavior;
    }

    /// Stores a card that is readable immediately.
    pub fn seed_card(&self, record: CardRecord) {
        self.inner.lock().unwrap().cards.push(StoredCard {
            record,
            visible_at: Instant::now(),
        });
    }

    pub fn card(&self, id: &str) -> Option<CardRecord> {
        self.inner
            .lock()
            .unwrap()
            .cards
            .iter()
            .find(|c| c.record.id == id)
            .map(|c| c.record.clone())
    }

    /// Bodies of every applied `update`, JSON-decoded.
    pub fn update_bodies(&self) -> Vec<Value> {
        self.inner.lock().unwrap().update_bodies.clone()
    }

    /// Query maps of every `search` that reached the envelope builder.
    pub fn search_queries(&self) -> Vec<HashMap<String, String>> {
        self.inner.lock().unwrap().search_queries.clone()
    }

    pub fn direct_read_hits(&self) -> usize {
        self.inner.lock().unwrap().direct_read_hits
    }

    pub fn relay_hits(&self) -> usize {
        self.inner.lock().unwrap().relay_hits
    }

    pub fn bridge_hits(&self) -> usize {
        self.inner.lock().unwrap().bridge_hits
    }

    pub fn get_hits(&self) -> usize {
        self.inner.lock().unwrap().get_hits
    }

    pub fn json_post_hits(&self) -> usize {
        self.inner.lock().unwrap().json_post_hits
    }

    pub fn form_post_hits(&self) -> usize {
        self.inner.lock().unwrap().form_post_hits
    }

    /// Builds the reply envelope for a read, shared by every transport
    /// rendition of the same operation.
    fn read_envelope(&self, params: &HashMap<String, String>) -> Value {
        let mut inner = self.inner.lock().unwrap();
        if params.get("api_token").map(String::as_str) != Some(TOKEN) {
            return json!({"ok": false, "error": "unauthorized"});
        }
        match params.get("path").map(String::as_str) {
            Some("search") => {
                inner.search_queries.push(params.clone());
                let mut items: Vec<CardRecord> = inner
                    .cards
                    .iter()
                    .filter(|c| c.visible_at <= Instant::now())
                    .map(|c| c.record.clone())
                    .filter(|r| search_matches(r, params))
                    .collect();
                match params.get("sort").map(String::as_str) {
                    Some("company") => {
                        items.sort_by(|a, b| a.fields.company.cmp(&b.fields.company))
                    }
                    _ => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
                }
                json!({"ok": true, "items": items})
            }
            Some("get") => {
                inner.get_hits += 1;
                let id = params.get("id").map(String::as_str).unwrap_or_default();
                let item = inner
                    .cards
                    .iter()
                    .find(|c| c.record.id == id && c.visible_at <= Instant::now())
                    .map(|c| c.record.clone());
                match item {
                    Some(record) => json!({"ok": true, "item": record}),
                    None => json!({"ok": false, "error": "not_found"}),
                }
            }
            _ => json!({"ok": false, "error": "unknown path"}),
        }
    }

    fn apply_write(&self, path: &str, payload: Value) {
        let mut inner = self.inner.lock().unwrap();
        if payload["api_token"] != TOKEN || inner.behavior.drop_writes {
            return;
        }
        match path {
            "add" => {
                let id = match payload["id"].as_str() {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => format!("srv_{}", inner.cards.len() + 1),
                };
                let delay = inner.behavior.add_visible_after.unwrap_or(Duration::ZERO);
                let n = inner.cards.len() + 1;
                inner.cards.push(StoredCard {
                    record: CardRecord {
                        id,
                        created_at: format!("2024-06-0{}T00:00:00Z", n.min(9)),
                        image_file_id: format!("file_{}", n),
                        image_url: format!("https://img.test/file_{}", n),
                        raw_json: "{}".to_string(),
                        fields: CardFields {
                            name: "Scanned Name".to_string(),
                            company: "Scanned Co".to_string(),
                            ..Default::default()
                        },
                    },
                    visible_at: Instant::now() + delay,
                });
            }
            "update" => {
                inner.update_bodies.push(payload.clone());
                let id = payload["id"].as_str().unwrap_or_default();
                let fields: CardFields =
                    serde_json::from_value(payload["fields"].clone()).unwrap_or_default();
                if let Some(card) = inner.cards.iter_mut().find(|c| c.record.id == id) {
                    card.record.fields = fields;
                }
            }
            _ => {}
        }
    }
}

fn search_matches(record: &CardRecord, params: &HashMap<String, String>) -> bool {
    if let Some(q) = params.get("q") {
        let q = q.to_lowercase();
        let hay = format!(
            "{} {} {} {} {}",
            record.fields.name,
            record.fields.company,
            record.fields.title,
            record.fields.email,
            record.fields.notes
        )
        .to_lowercase();
        if !hay.contains(&q) {
            return false;
        }
    }
    if let Some(company) = params.get("company") {
        if !record
            .fields
            .company
            .to_lowercase()
            .contains(&company.to_lowercase())
        {
            return false;
        }
    }
    if let Some(tag) = params.get("tag") {
        if !record.fields.tags.split(',').map(str::trim).any(|t| t == tag) {
            return false;
        }
    }
    let date = record.created_at.get(..10).unwrap_or(record.created_at.as_str());
    if let Some(from) = params.get("from") {
        if date < from.as_str() {
            return false;
        }
    }
    if let Some(to) = params.get("to") {
        if date > to.as_str() {
            return false;
        }
    }
    true
}

async fn handle_get(
    State(backend): State<FakeBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (stall, fail_direct, direct_envelope, misaddress) = {
        let inner = backend.inner.lock().unwrap();
        (
            inner.behavior.stall_reads,
            inner.behavior.fail_direct_reads,
            inner.behavior.direct_read_envelope.clone(),
            inner.behavior.misaddress_relay,
        )
    };
    if let Some(delay) = stall {
        tokio::time::sleep(delay).await;
    }

    if let Some(callback) = params.get("callback").cloned() {
        backend.inner.lock().unwrap().relay_hits += 1;
        let envelope = backend.read_envelope(&params);
        let name = if misaddress {
            "cb_nobody_0".to_string()
        } else {
            callback
        };
        let body = format!("{}({});", name, envelope);
        return (
            [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
            body,
        )
            .into_response();
    }

    if params.get("transport").map(String::as_str) == Some("postmessage") {
        backend.inner.lock().unwrap().bridge_hits += 1;
        let callback_id = params.get("callback_id").cloned().unwrap_or_default();
        let envelope = backend.read_envelope(&params);
        let message = json!({"callback_id": callback_id, "payload": envelope});
        let body = format!(
            "<!doctype html><html><body><script>parent.postMessage({}, \"*\");</script></body></html>",
            message
        );
        return ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response();
    }

    backend.inner.lock().unwrap().direct_read_hits += 1;
    if fail_direct {
        return (StatusCode::INTERNAL_SERVER_ERROR, "server error").into_response();
    }
    if let Some(envelope) = direct_envelope {
        return Json(envelope).into_response();
    }
    Json(backend.read_envelope(&params)).into_response()
}

async fn handle_post(
    State(backend): State<FakeBackend>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    let stall = {
        let mut inner = backend.inner.lock().unwrap();
        if is_form {
            inner.form_post_hits += 1;
            inner.behavior.stall_form_posts
        } else {
            inner.json_post_hits += 1;
            inner.behavior.stall_json_posts
        }
    };
    if let Some(delay) = stall {
        tokio::time::sleep(delay).await;
    }

    let payload: Value = if is_form {
        let form: HashMap<String, String> = url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();
        serde_json::from_str(form.get("payload").map(String::as_str).unwrap_or("{}"))
            .unwrap_or_default()
    } else {
        serde_json::from_str(&body).unwrap_or_default()
    };

    let path = params.get("path").cloned().unwrap_or_default();
    backend.apply_write(&path, payload);
    Json(json!({"ok": true})).into_response()
}

/// A readable card for seeding.
pub fn sample_card(id: &str, name: &str, company: &str, tags: &str, created_at: &str) -> CardRecord {
    CardRecord {
        id: id.to_string(),
        created_at: created_at.to_string(),
        image_file_id: format!("file_{}", id),
        image_url: format!("https://img.test/{}", id),
        raw_json: "{}".to_string(),
        fields: CardFields {
            name: name.to_string(),
            company: company.to_string(),
            tags: tags.to_string(),
            ..Default::default()
        },
    }
}
