use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, LOCATION};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::chain::RpcClient;
use crate::config::Settings;
use crate::payment::{send_payment, SendPaymentOptions};
use crate::server::debug_page::{self, DebugView};
use crate::server::error::ServerError;
use crate::server::ServerOptions;

pub const NOT_FOUND_BODY: &str = "not found api endpoint....\n";
pub const DEBUG_OFF_BODY: &str = "Debug mode is off. No debug information available.\n";

/// Shared, read-only state of the running server.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppContext>,
}

struct AppContext {
    options: ServerOptions,
    settings: Settings,
    server_url: String,
    rpc: Option<RpcClient>,
}

impl AppState {
    pub fn new(
        options: ServerOptions,
        settings: Settings,
        server_url: impl Into<String>,
    ) -> Result<Self, ServerError> {
        let rpc = options
            .rpc_url
            .as_deref()
            .map(|url| RpcClient::new(url, &settings.rpc))
            .transpose()?;
        Ok(Self {
            inner: Arc::new(AppContext {
                options,
                settings,
                server_url: server_url.into(),
                rpc,
            }),
        })
    }

    pub fn options(&self) -> &ServerOptions {
        &self.inner.options
    }

    fn rpc(&self) -> Result<&RpcClient, ServerError> {
        self.inner.rpc.as_ref().ok_or(ServerError::NoRpc)
    }
}

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api", get(welcome).fallback(not_found))
        .route("/api/", get(redirect_to_api).fallback(not_found))
        .route("/api/block", get(block_number).fallback(not_found))
        .route("/api/pay", post(pay).fallback(not_found))
        .route("/debug", get(debug).fallback(not_found))
        .fallback(not_found);

    let router = if state.options().logs {
        router.layer(middleware::from_fn(log_request))
    } else {
        router
    };
    router.with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    tracing::info!(method = %method, path = %path, status = response.status().as_u16(), "request");
    response
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the VX SDK API",
        "status": "success",
    }))
}

async fn redirect_to_api() -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(LOCATION, "/api")],
        Json(json!({
            "message": "Redirecting to /api",
            "status": "redirect",
        })),
    )
        .into_response()
}

async fn block_number(State(state): State<AppState>) -> Result<Json<Value>, ServerError> {
    let block = state.rpc()?.block_number().await?;
    Ok(Json(json!({ "blockNumber": block })))
}

async fn debug(State(state): State<AppState>) -> Response {
    let options = state.options();
    if !options.debug {
        return (
            StatusCode::NOT_FOUND,
            [(CONTENT_TYPE, "text/plain")],
            DEBUG_OFF_BODY,
        )
            .into_response();
    }

    let block = match state.rpc() {
        Ok(client) => client.block_number().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Block number unavailable for debug page");
            0
        }),
        Err(_) => 0,
    };

    Html(debug_page::render(&DebugView {
        server_url: &state.inner.server_url,
        rpc_url: options.rpc_url.as_deref(),
        block_number: block,
        env: &options.env,
        chains: &options.chains,
    }))
    .into_response()
}

/// Body of `POST /api/pay`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub to: Option<String>,
    pub amount_eth: Option<Value>,
    pub amount: Option<Value>,
    pub rpc_url: Option<String>,
    pub from: Option<String>,
}

impl PayRequest {
    /// `amountEth`, falling back to `amount`; numbers are accepted too.
    fn amount(&self) -> Option<String> {
        [&self.amount_eth, &self.amount]
            .into_iter()
            .flatten()
            .find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn pay(State(state): State<AppState>, body: Bytes) -> Result<Response, ServerError> {
    let request: PayRequest = if body.iter().all(u8::is_ascii_whitespace) {
        PayRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ServerError::InvalidRequest(format!("body is not valid JSON: {e}")))?
    };

    let (Some(to), Some(amount_eth)) = (non_empty(request.to.as_deref()), request.amount()) else {
        return Err(ServerError::InvalidRequest(
            "to and amountEth are required".to_string(),
        ));
    };

    let options = state.options();
    let Some(rpc_url) = non_empty(request.rpc_url.as_deref())
        .or_else(|| options.rpc_url.clone())
    else {
        return Err(ServerError::InvalidRequest(
            "rpcUrl not configured. Provide rpcUrl in body or create vx.config.json".to_string(),
        ));
    };

    let Some(from) = non_empty(request.from.as_deref()).or_else(|| options.pay_from.clone()) else {
        return Err(ServerError::InvalidRequest(
            "from account not provided. Set VX3_FROM or pass from in request body".to_string(),
        ));
    };

    let result = send_payment(
        &SendPaymentOptions {
            rpc_url,
            from,
            to,
            amount_eth,
            ..Default::default()
        },
        &state.inner.settings,
    )
    .await?;

    Ok(([(ACCESS_CONTROL_ALLOW_ORIGIN, "*")], Json(result)).into_response())
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "text/plain")],
        NOT_FOUND_BODY,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_prefers_amount_eth() {
        let req: PayRequest =
            serde_json::from_value(json!({"amountEth": "0.1", "amount": "5"})).unwrap();
        assert_eq!(req.amount().as_deref(), Some("0.1"));
    }

    #[test]
    fn test_amount_accepts_numbers_and_fallback() {
        let req: PayRequest = serde_json::from_value(json!({"amount": 0.25})).unwrap();
        assert_eq!(req.amount().as_deref(), Some("0.25"));

        let req: PayRequest = serde_json::from_value(json!({"amountEth": ""})).unwrap();
        assert_eq!(req.amount(), None);
    }
}
