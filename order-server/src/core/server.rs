//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::time::Duration;

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::{Config, Result, ServerError, ServerState};

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .merge(crate::api::orders::router())
        .merge(crate::api::pricing_policies::router())
}

/// Build a fully configured application with all middleware and state
///
/// Used by both the HTTP server and oneshot tests
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        // Request logging
        .layer(middleware::from_fn(log_request))
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 请求日志中间件
///
/// 记录方法、路由、状态码和延迟，按状态码选择日志级别
async fn log_request(req: Request, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(target: "http_access", %method, %path, status, latency_ms, "Request completed with server error");
    } else if response.status().is_client_error() {
        tracing::warn!(target: "http_access", %method, %path, status, latency_ms, "Request completed with client error");
    } else {
        tracing::info!(target: "http_access", %method, %path, status, latency_ms, "Request completed");
    }
    response
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let app = build_app(state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            environment = %self.config.environment,
            "Order server listening on {}",
            addr
        );

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.into()))?;

        Ok(())
    }
}
