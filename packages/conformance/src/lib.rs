//! In-process fake of the Graph API for end-to-end tests.
//!
//! [`FakeGraph`] holds users, albums, photos and CDN files in memory and
//! serves the subset of the Graph API the `fbgraph` client speaks:
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `GET /{id}` | Node body; `me` resolves to the current user; `fields` narrows the reply |
//! | `GET /{id}/{connection}` | `{ "data": [ … ] }` of connected nodes, in insertion order |
//! | `POST /{id}/{connection}` | Creates a node from form fields, replies `{ "id": … }` (photos: `{ "post_id": …, "id": … }`) |
//! | `GET /cdn/photos/{file}` | Raw bytes of a seeded file |
//!
//! Every Graph route requires `access_token` to match the configured token and
//! answers with the Graph error envelope otherwise. All requests are recorded
//! so tests can assert on what went over the wire.
//!
//! [`spawn_graph`] serves a [`FakeGraph`] on an ephemeral port from a
//! dedicated thread, so tests can drive it with the blocking client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use fbgraph::wire::ErrorResponse;
use fbgraph::NodeKind;
use serde_json::{json, Map, Value};
use tracing::debug;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A request as the fake server saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

struct StoredNode {
    kind: NodeKind,
    body: Map<String, Value>,
}

#[derive(Default)]
struct GraphState {
    access_token: String,
    me: Option<String>,
    nodes: HashMap<String, StoredNode>,
    /// `"{parent}/{connection}"` → child ids in insertion order.
    edges: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<u8>>,
    requests: Vec<RecordedRequest>,
    next_id: u64,
}

impl GraphState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{}", 100_000 + self.next_id)
    }

    fn resolve(&self, id: &str) -> Option<String> {
        if id == fbgraph::user::ME {
            self.me.clone()
        } else {
            Some(id.to_string())
        }
    }
}

/// In-memory Graph API.
pub struct FakeGraph {
    state: RwLock<GraphState>,
}

impl FakeGraph {
    /// A graph accepting only `access_token`.
    pub fn new(access_token: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(GraphState {
                access_token: access_token.into(),
                ..GraphState::default()
            }),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Change the accepted token, e.g. to simulate expiry.
    pub fn set_access_token(&self, access_token: impl Into<String>) {
        self.write().access_token = access_token.into();
    }

    /// Seed a node. Uses `body["id"]` when it is a string, otherwise assigns
    /// a fresh id. Returns the id.
    pub fn add_node(&self, kind: NodeKind, parent: Option<&str>, body: Value) -> String {
        let mut state = self.write();
        let mut body = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let id = match body.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => state.allocate_id(),
        };
        body.insert("id".into(), Value::String(id.clone()));

        if let Some(parent) = parent {
            if let Some(parent_kind) = state.nodes.get(parent).map(|n| n.kind) {
                if let Ok(path) = kind.connection_path(parent_kind) {
                    state
                        .edges
                        .entry(format!("{parent}/{path}"))
                        .or_default()
                        .push(id.clone());
                }
            }
        }
        state.nodes.insert(id.clone(), StoredNode { kind, body });
        id
    }

    /// Seed a user and make it the one `me` resolves to.
    pub fn add_me(&self, body: Value) -> String {
        let id = self.add_node(NodeKind::User, None, body);
        self.write().me = Some(id.clone());
        id
    }

    /// Serve `bytes` at `/cdn/photos/{name}`.
    pub fn add_file(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.write().files.insert(name.into(), bytes);
    }

    /// Stored body of a node.
    pub fn node(&self, id: &str) -> Option<Value> {
        self.read()
            .nodes
            .get(id)
            .map(|n| Value::Object(n.body.clone()))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.read().requests.clone()
    }

    fn record(&self, method: &'static str, path: String, params: &[(String, String)]) {
        debug!(method, %path, "fake graph request");
        self.write().requests.push(RecordedRequest {
            method,
            path,
            params: params.to_vec(),
        });
    }

    fn check_token(&self, params: &[(String, String)]) -> Result<(), GraphFault> {
        let expected = self.read().access_token.clone();
        match params.iter().find(|(k, _)| k == "access_token") {
            Some((_, token)) if *token == expected => Ok(()),
            Some(_) => Err(GraphFault::InvalidToken),
            None => Err(GraphFault::MissingToken),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures rendered as the Graph error envelope.
#[derive(Debug)]
pub enum GraphFault {
    MissingToken,
    InvalidToken,
    NotFound(String),
    UnknownPath(String),
    BadRequest(String),
}

impl IntoResponse for GraphFault {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            GraphFault::MissingToken => (
                StatusCode::BAD_REQUEST,
                "OAuthException",
                2500,
                "An active access token must be used to query information about the current user."
                    .to_string(),
            ),
            GraphFault::InvalidToken => (
                StatusCode::BAD_REQUEST,
                "OAuthException",
                190,
                "Invalid OAuth access token.".to_string(),
            ),
            GraphFault::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "GraphMethodException",
                100,
                format!("Unsupported get request. Object with ID '{id}' does not exist."),
            ),
            GraphFault::UnknownPath(path) => (
                StatusCode::BAD_REQUEST,
                "OAuthException",
                2500,
                format!("Unknown path components: /{path}"),
            ),
            GraphFault::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "GraphMethodException", 100, message)
            }
        };
        (status, Json(ErrorResponse::new(error_type, code, message))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(graph: Arc<FakeGraph>) -> Router {
    Router::new()
        .route("/cdn/photos/{file}", get(cdn_file))
        .route("/{id}", get(get_node))
        .route(
            "/{id}/{connection}",
            get(list_connection).post(create_in_connection),
        )
        .with_state(graph)
}

type Params = Vec<(String, String)>;

async fn get_node(
    State(graph): State<Arc<FakeGraph>>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, GraphFault> {
    graph.record("GET", format!("/{id}"), &params);
    graph.check_token(&params)?;

    let state = graph.read();
    let resolved = state
        .resolve(&id)
        .ok_or_else(|| GraphFault::NotFound(id.clone()))?;
    let node = state
        .nodes
        .get(&resolved)
        .ok_or(GraphFault::NotFound(resolved.clone()))?;

    let fields = params
        .iter()
        .find(|(k, _)| k == "fields")
        .map(|(_, v)| v.split(',').map(str::trim).collect::<Vec<_>>());
    let body = match fields {
        Some(fields) => node
            .body
            .iter()
            .filter(|(k, _)| k.as_str() == "id" || fields.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        None => node.body.clone(),
    };
    Ok(Json(Value::Object(body)))
}

/// Kind of the children hanging off a `parent_kind` node under `connection`.
fn child_kind(parent_kind: NodeKind, connection: &str) -> Option<NodeKind> {
    NodeKind::ALL
        .into_iter()
        .find(|kind| kind.connection_path(parent_kind) == Ok(connection))
}

async fn list_connection(
    State(graph): State<Arc<FakeGraph>>,
    Path((id, connection)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, GraphFault> {
    graph.record("GET", format!("/{id}/{connection}"), &params);
    graph.check_token(&params)?;

    let state = graph.read();
    let parent = state
        .resolve(&id)
        .ok_or_else(|| GraphFault::NotFound(id.clone()))?;
    let parent_kind = state
        .nodes
        .get(&parent)
        .map(|n| n.kind)
        .ok_or_else(|| GraphFault::NotFound(parent.clone()))?;
    child_kind(parent_kind, &connection)
        .ok_or_else(|| GraphFault::UnknownPath(connection.clone()))?;

    let data: Vec<Value> = state
        .edges
        .get(&format!("{parent}/{connection}"))
        .into_iter()
        .flatten()
        .filter_map(|child| state.nodes.get(child))
        .map(|n| Value::Object(n.body.clone()))
        .collect();
    Ok(Json(json!({ "data": data })))
}

async fn create_in_connection(
    State(graph): State<Arc<FakeGraph>>,
    Path((id, connection)): Path<(String, String)>,
    Form(params): Form<Params>,
) -> Result<Json<Value>, GraphFault> {
    graph.record("POST", format!("/{id}/{connection}"), &params);
    graph.check_token(&params)?;

    let field = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };

    let (parent, kind) = {
        let state = graph.read();
        let parent = state
            .resolve(&id)
            .ok_or_else(|| GraphFault::NotFound(id.clone()))?;
        let parent_kind = state
            .nodes
            .get(&parent)
            .map(|n| n.kind)
            .ok_or_else(|| GraphFault::NotFound(parent.clone()))?;
        let kind = child_kind(parent_kind, &connection)
            .ok_or_else(|| GraphFault::UnknownPath(connection.clone()))?;
        (parent, kind)
    };

    let body = match kind {
        NodeKind::Album => {
            let name = field("name")
                .filter(|n| !n.is_empty())
                .ok_or_else(|| GraphFault::BadRequest("(#100) Invalid album name".into()))?;
            let mut body = json!({ "name": name, "count": 0 });
            if let Some(message) = field("message") {
                body["description"] = Value::String(message);
            }
            body
        }
        NodeKind::Photo => json!({ "name": field("message").unwrap_or_default() }),
        NodeKind::User => return Err(GraphFault::UnknownPath(connection)),
    };

    let new_id = graph.add_node(kind, Some(&parent), body);
    let reply = match kind {
        // Photo uploads lead with the feed story they created.
        NodeKind::Photo => json!({ "post_id": format!("{parent}_{new_id}"), "id": new_id }),
        _ => json!({ "id": new_id }),
    };
    Ok(Json(reply))
}

async fn cdn_file(
    State(graph): State<Arc<FakeGraph>>,
    Path(file): Path<String>,
    Query(params): Query<Params>,
) -> Result<Response, GraphFault> {
    graph.record("GET", format!("/cdn/photos/{file}"), &params);
    let bytes = graph
        .read()
        .files
        .get(&file)
        .cloned()
        .ok_or_else(|| GraphFault::NotFound(file.clone()))?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Serve `graph` on an ephemeral `127.0.0.1` port and return its base URL,
/// e.g. `http://127.0.0.1:51234`.
///
/// The server runs on its own thread with a current-thread runtime and lives
/// until the process exits.
///
/// # Panics
///
/// Panics if the listener cannot be bound or the runtime cannot start.
pub fn spawn_graph(graph: Arc<FakeGraph>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener
        .set_nonblocking(true)
        .expect("set listener non-blocking");
    let addr = listener.local_addr().expect("get local addr");
    let router = build_router(graph);

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build fake graph runtime");
        runtime.block_on(async move {
            let listener =
                tokio::net::TcpListener::from_std(listener).expect("adopt std listener");
            axum::serve(listener, router)
                .await
                .expect("fake graph server error");
        });
    });

    format!("http://{addr}")
}
