//! Mock JSON-RPC node and IPFS gateway for testing.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Response, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// What the node answers for one method.
#[derive(Debug, Clone)]
pub enum RpcReply {
    Result(Value),
    Error(i64, String),
}

impl RpcReply {
    pub fn hex(n: u128) -> Self {
        RpcReply::Result(Value::String(format!("{n:#x}")))
    }
}

/// A captured JSON-RPC call.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub params: Value,
    pub id: Value,
}

#[derive(Debug, Clone)]
pub struct IpfsObject {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<Mutex<Vec<CapturedCall>>>,
    /// Queued replies per method; the last one repeats.
    replies: Arc<Mutex<HashMap<String, VecDeque<RpcReply>>>>,
    objects: Arc<Mutex<HashMap<String, IpfsObject>>>,
}

/// Mock node server for testing.
pub struct MockNode {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockNode {
    /// Start a new mock node.
    pub async fn start() -> Self {
        let state = MockState::default();
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/", post(handle_rpc))
            .route("/ipfs/{cid}", get(handle_ipfs))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock node");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    /// Base URL for this mock node.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Always answer `method` with `reply`.
    pub async fn respond(&self, method: &str, reply: RpcReply) {
        self.respond_sequence(method, vec![reply]).await;
    }

    /// Answer `method` with `replies` in turn, repeating the last one.
    pub async fn respond_sequence(&self, method: &str, replies: Vec<RpcReply>) {
        self.state
            .replies
            .lock()
            .await
            .insert(method.to_string(), replies.into());
    }

    pub async fn serve_ipfs(&self, cid: &str, content_type: &str, body: &[u8]) {
        self.state.objects.lock().await.insert(
            cid.to_string(),
            IpfsObject {
                content_type: content_type.to_string(),
                body: body.to_vec(),
            },
        );
    }

    /// All captured calls.
    pub async fn calls(&self) -> Vec<CapturedCall> {
        self.state.calls.lock().await.clone()
    }

    pub async fn calls_to(&self, method: &str) -> Vec<CapturedCall> {
        self.calls()
            .await
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_rpc(State(state): State<MockState>, Json(request): Json<Value>) -> Json<Value> {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let id = request["id"].clone();
    state.calls.lock().await.push(CapturedCall {
        method: method.clone(),
        params: request["params"].clone(),
        id: id.clone(),
    });

    let reply = {
        let mut replies = state.replies.lock().await;
        match replies.get_mut(&method) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
    };

    let body = match reply {
        Some(RpcReply::Result(result)) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Some(RpcReply::Error(code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }),
        None => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": format!("the method {method} does not exist")}
        }),
    };
    Json(body)
}

async fn handle_ipfs(State(state): State<MockState>, Path(cid): Path<String>) -> Response<Body> {
    match state.objects.lock().await.get(&cid) {
        Some(object) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, &object.content_type)
            .body(Body::from(object.body.clone()))
            .unwrap(),
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("ipfs resolve: no link named"))
            .unwrap(),
    }
}
