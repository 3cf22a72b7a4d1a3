use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use orca_core::{AuditRecorder, BrokerProvider, BrokerStatus};
use orca_engine::TradeEngine;
use orca_store::MemoryStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{handlers, websocket};

/// Shared state for all handlers and the WebSocket feed.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TradeEngine>,
    pub store: Arc<MemoryStore>,
    pub audit: Arc<dyn AuditRecorder>,
    pub broker: Arc<dyn BrokerProvider>,
    pub broker_status: BrokerStatus,
    pub feed_interval: Duration,
}

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/account", get(handlers::get_account))
            .route("/api/positions", get(handlers::get_positions))
            .route(
                "/api/positions/:position_id/close",
                post(handlers::close_position),
            )
            .route("/api/options/chain/:symbol", get(handlers::get_option_chain))
            .route("/api/trades", get(handlers::list_trades))
            .route("/api/trades/validate", post(handlers::validate_trade))
            .route("/api/trades/submit", post(handlers::submit_trade))
            .route("/api/trades/:trade_id/cancel", post(handlers::cancel_trade))
            .route(
                "/api/rules",
                get(handlers::get_rules).post(handlers::update_rules),
            )
            .route("/api/logs", get(handlers::get_logs))
            .route("/api/broker/status", get(handlers::broker_status))
            .route("/ws", get(websocket::websocket_handler))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve
    /// requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
