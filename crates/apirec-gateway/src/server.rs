//! HTTP server.

use crate::routes;
use crate::state::AppState;
use apirec_core::config::{BindMode, GatewayConfig};
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the router.
pub fn router(state: AppState, cors: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(routes::api_info))
        .route("/health", get(routes::health::health_check))
        .route("/recommend", post(routes::recommend::recommend))
        .route("/recommend/stream", post(routes::recommend::recommend_stream))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE])
                .max_age(std::time::Duration::from_secs(3600)),
        );
    }

    router
}

/// The HTTP gateway.
pub struct Gateway {
    config: GatewayConfig,
    state: AppState,
}

impl Gateway {
    /// Create a gateway.
    pub fn new(config: GatewayConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Address the server listens on.
    pub fn bind_address(&self) -> SocketAddr {
        let ip = match self.config.bind {
            BindMode::Loopback => [127, 0, 0, 1],
            BindMode::Lan => [0, 0, 0, 0],
        };
        SocketAddr::from((ip, self.config.port))
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.bind_address();
        if self.config.bind != BindMode::Loopback {
            warn!("Gateway binding to {}, reachable from the network", addr);
        }

        let app = router(self.state, self.config.cors);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Starting gateway server on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
