//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The HTTP + WebSocket transport façade (SPEC_FULL §6). A thin adapter over
// `Engine`: it owns no matching logic of its own, only request/response
// (de)serialization and routing.
//
// | Component  | Description                                                |
// |------------|--------------------------------------------------------------|
// | AppState   | Shared engine handle plus the symbol config table            |
// | Api        | Builds the router and serves it                              |
//--------------------------------------------------------------------------------------------------

mod dto;
mod error;
mod routes;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::models::types::SymbolConfig;
use crate::domain::services::engine::Engine;

pub use error::{ApiError, ApiResult};

/// Shared application state accessible by every handler.
pub struct AppState {
    pub engine: Engine,
    symbol_configs: HashMap<String, SymbolConfig>,
}

impl AppState {
    pub fn new(engine: Engine, symbols: Vec<SymbolConfig>) -> Self {
        let symbol_configs = symbols.into_iter().map(|c| (c.symbol.clone(), c)).collect();
        Self {
            engine,
            symbol_configs,
        }
    }

    pub fn symbol_config(&self, symbol: &str) -> Option<SymbolConfig> {
        self.symbol_configs.get(symbol).cloned()
    }
}

pub struct Api {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl Api {
    pub fn new(addr: SocketAddr, state: Arc<AppState>) -> Self {
        Self { addr, state }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin([
                "http://localhost:3000".parse::<HeaderValue>().unwrap(),
                "http://127.0.0.1:3000".parse::<HeaderValue>().unwrap(),
            ])
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);

        Router::new()
            .route("/orders", axum::routing::post(routes::create_order))
            .route("/symbols/:symbol/book", get(routes::get_book))
            .route("/stats", get(routes::get_stats))
            .route("/ws/trades/:symbol", get(routes::stream_trades))
            .route("/ws/book/:symbol", get(routes::stream_book))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub async fn serve(self) -> std::io::Result<()> {
        let app = self.router();
        info!(addr = %self.addr, "starting matching engine HTTP server");
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await
    }
}
