//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name           | Description                                        | Return Type        |
// |----------------|----------------------------------------------------|--------------------|
// | create_order   | POST /orders                                       | ApiResult<Response>|
// | get_book       | GET /symbols/:symbol/book                          | ApiResult<Response>|
// | get_stats      | GET /stats                                         | Response           |
// | stream_trades  | GET /ws/trades/:symbol                             | Response           |
// | stream_book    | GET /ws/book/:symbol                               | Response           |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use crate::domain::services::events::EngineEvent;

use super::dto::{BookResponse, OrderRequest, OrderResponseDto, StatsResponse};
use super::error::{ApiError, ApiResult};
use super::AppState;

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OrderRequest>,
) -> ApiResult<Response> {
    let submit_request = req.try_into_submit_request()?;
    let response = state.engine.submit(submit_request).await?;
    Ok((StatusCode::OK, Json(OrderResponseDto::from(response))).into_response())
}

pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    let depth = params
        .get("depth")
        .and_then(|d| d.parse::<usize>().ok())
        .unwrap_or(10);
    let config = state
        .symbol_config(&symbol)
        .ok_or_else(|| ApiError::NotFound(format!("unknown symbol {symbol}")))?;
    let snapshot = state.engine.snapshot(&symbol, depth).await?;
    let body = BookResponse::from_snapshot(snapshot, &config);
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatsResponse::from(state.engine.stats()))
}

pub async fn stream_trades(
    ws: WebSocketUpgrade,
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| forward_topic(socket, state, symbol, EventKind::Trade))
}

pub async fn stream_book(
    ws: WebSocketUpgrade,
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| forward_topic(socket, state, symbol, EventKind::Book))
}

#[derive(Clone, Copy)]
enum EventKind {
    Trade,
    Book,
}

/// Forwards the broadcast subscription to one client socket, filtering to
/// `symbol` and `kind`. A lagged receiver just skips ahead silently, per the
/// at-most-once, drop-oldest fan-out contract (SPEC_FULL §4.5) -- it is not
/// this loop's job to report drops to the client.
async fn forward_topic(mut socket: WebSocket, state: Arc<AppState>, symbol: String, kind: EventKind) {
    let Some(config) = state.symbol_config(&symbol) else {
        let _ = socket.send(Message::Close(None)).await;
        return;
    };
    let mut rx = state.engine.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => {
                if event.symbol() != symbol {
                    continue;
                }
                let payload = match (&event, kind) {
                    (EngineEvent::Trade(t), EventKind::Trade) => {
                        serde_json::to_string(&super::dto::TradeDto::from_trade(t, &config))
                    }
                    (EngineEvent::Book(b), EventKind::Book) => {
                        serde_json::to_string(&super::dto::BookResponse::from_snapshot(b.clone(), &config))
                    }
                    _ => continue,
                };
                let Ok(text) = payload else { continue };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                debug!(symbol = %symbol, dropped = n, "websocket subscriber lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
