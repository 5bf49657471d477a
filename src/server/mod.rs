//! Local development HTTP server.

pub mod debug_page;
pub mod error;
pub mod router;
pub mod shutdown;

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower::Service;

use crate::config::{ServerSettings, Settings};

pub use error::{ErrorResponse, ServerError};
pub use router::{build_router, AppState};
pub use shutdown::ShutdownManager;

/// A chain announced with `--chains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub name: String,
    #[serde(rename = "chainId", alias = "chaiId")]
    pub chain_id: u64,
    #[serde(rename = "rpcUrl")]
    pub rpc_url: String,
}

/// Parse `--chains`: a JSON array of chains, or a single chain object.
pub fn parse_chains(json: &str) -> Result<Vec<ChainInfo>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<ChainInfo>),
        One(ChainInfo),
    }

    Ok(match serde_json::from_str(json)? {
        OneOrMany::Many(chains) => chains,
        OneOrMany::One(chain) => vec![chain],
    })
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub env: String,
    pub debug: bool,
    /// Log every request at info level.
    pub logs: bool,
    pub chains: Vec<ChainInfo>,
    /// Node used by `/api/block`, `/debug`, and as the `/api/pay` default.
    pub rpc_url: Option<String>,
    /// Default sender for `/api/pay`.
    pub pay_from: Option<String>,
}

impl ServerOptions {
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            env: settings.env.clone(),
            debug: false,
            logs: false,
            chains: Vec::new(),
            rpc_url: None,
            pay_from: None,
        }
    }
}

pub struct DevServer {
    pub addr: SocketAddr,
    /// The bound listener, kept alive so the port cannot be taken between
    /// try_bind() and run().
    listener: Option<TcpListener>,
    options: ServerOptions,
    settings: Settings,
    shutdown: Arc<ShutdownManager>,
}

impl DevServer {
    pub fn new(options: ServerOptions, settings: Settings) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            listener: None,
            options,
            settings,
            shutdown: Arc::new(ShutdownManager::new()),
        }
    }

    /// Bind `host:port`. Port 0 picks a free port; read it from the result.
    pub async fn try_bind(&mut self) -> Result<SocketAddr, ServerError> {
        let host = self.options.host.trim();
        if host.is_empty() {
            return Err(ServerError::InvalidAddress {
                addr: format!("{}:{}", self.options.host, self.options.port),
                reason: "host is empty".to_string(),
            });
        }

        let listener = TcpListener::bind((host, self.options.port))
            .await
            .map_err(|e| ServerError::InvalidAddress {
                addr: format!("{}:{}", host, self.options.port),
                reason: e.to_string(),
            })?;
        let actual_addr = listener.local_addr()?;

        self.addr = actual_addr;
        self.listener = Some(listener);
        tracing::info!("Dev server bound to {}", actual_addr);
        Ok(actual_addr)
    }

    /// URL clients use, with the configured host and the bound port.
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.options.host, self.addr.port())
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Run until shutdown.
    ///
    /// Consumes self to take ownership of the pre-bound listener.
    pub async fn run(self) -> Result<(), ServerError> {
        let server_url = self.server_url();
        let listener = self.listener.ok_or(ServerError::NotBound)?;

        if self.options.debug {
            tracing::info!("Server on {} with debug mode", server_url);
            tracing::info!("{}/debug", server_url);
            if !self.options.chains.is_empty() {
                tracing::info!(chains = ?self.options.chains, "Available chains");
            }
            tracing::info!("Environment: {}", self.options.env);
        }
        match &self.options.rpc_url {
            Some(url) => tracing::info!("Using RPC URL: {}", url),
            None => tracing::warn!("No RPC configured; /api/block will return 503"),
        }

        let state = AppState::new(self.options, self.settings, server_url)?;
        let app = build_router(state);
        let make_service = app.into_make_service();
        let make_service = ConnectionCounter::new(make_service, self.shutdown.clone());

        let shutdown = self.shutdown.clone();
        axum::serve(listener, make_service)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for_shutdown().await;
            })
            .into_future()
            .await?;

        if self.shutdown.drain(Duration::from_secs(10)).await {
            tracing::info!("Server stopped");
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<ShutdownManager>,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        self.shutdown.signal_shutdown();
    }
}

struct ConnectionCounter<M> {
    inner: M,
    shutdown: Arc<ShutdownManager>,
}

impl<M> ConnectionCounter<M> {
    fn new(inner: M, shutdown: Arc<ShutdownManager>) -> Self {
        Self { inner, shutdown }
    }
}

impl<M: Clone> Clone for ConnectionCounter<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<M, T> Service<T> for ConnectionCounter<M>
where
    M: Service<T> + Send,
    M::Future: Send + 'static,
    M::Response: Send + 'static,
{
    type Response = ConnectionGuard<M::Response>;
    type Error = M::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, target: T) -> Self::Future {
        let shutdown = self.shutdown.clone();
        shutdown.connection_opened();
        let fut = self.inner.call(target);

        Box::pin(async move {
            match fut.await {
                Ok(service) => Ok(ConnectionGuard {
                    inner: service,
                    shutdown,
                }),
                Err(err) => {
                    shutdown.connection_closed();
                    Err(err)
                }
            }
        })
    }
}

struct ConnectionGuard<S> {
    inner: S,
    shutdown: Arc<ShutdownManager>,
}

impl<S: Clone> Clone for ConnectionGuard<S> {
    fn clone(&self) -> Self {
        self.shutdown.connection_opened();
        Self {
            inner: self.inner.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S> Drop for ConnectionGuard<S> {
    fn drop(&mut self) {
        self.shutdown.connection_closed();
    }
}

impl<S, Req> Service<Req> for ConnectionGuard<S>
where
    S: Service<Req>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chains_array_and_single() {
        let chains = parse_chains(
            r#"[{"name":"local","chainId":31337,"rpcUrl":"http://localhost:8545"}]"#,
        )
        .unwrap();
        assert_eq!(chains[0].chain_id, 31337);

        let chains =
            parse_chains(r#"{"name":"sepolia","chaiId":11155111,"rpcUrl":"https://rpc.sepolia.org"}"#)
                .unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].name, "sepolia");

        assert!(parse_chains("not json").is_err());
    }

    #[tokio::test]
    async fn test_run_without_bind_fails() {
        let server = DevServer::new(
            ServerOptions::from_settings(&ServerSettings::default()),
            Settings::default(),
        );
        assert!(matches!(server.run().await, Err(ServerError::NotBound)));
    }

    #[tokio::test]
    async fn test_bind_port_zero_reports_actual_port() {
        let mut options = ServerOptions::from_settings(&ServerSettings::default());
        options.port = 0;
        let mut server = DevServer::new(options, Settings::default());
        let addr = server.try_bind().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(server.server_url(), format!("http://127.0.0.1:{}", addr.port()));
    }
}
