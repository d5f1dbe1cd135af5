//--------------------------------------------------------------------------------------------------
// TEST MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Integration tests for the HTTP transport: drives `Api::router()` with
// `axum-test`'s `TestServer` so requests go through real (de)serialization,
// not just the `Engine` facade directly (that's `tests/engine_scenarios.rs`).
//--------------------------------------------------------------------------------------------------

use std::net::SocketAddr;
use std::sync::Arc;

use axum_test::TestServer;
use rust_decimal_macros::dec;
use serde_json::json;

use venue_matching::api::{Api, AppState};
use venue_matching::{Engine, SymbolConfig};

/// Installed once for the whole test binary so request/response tracing
/// shows up under `RUST_LOG=debug` without every test needing its own init
/// (repeated `tracing_subscriber::fmt().init()` calls panic on the second
/// call).
#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_test_writer()
        .try_init();
}

fn test_server() -> TestServer {
    let symbols = vec![SymbolConfig {
        symbol: "BTC-USD".to_string(),
        tick_size: dec!(0.01),
        lot_size: dec!(0.0001),
    }];
    let engine = Engine::new(symbols.clone(), 1024);
    let state = Arc::new(AppState::new(engine, symbols));
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let api = Api::new(addr, state);
    TestServer::new(api.router()).unwrap()
}

#[tokio::test]
async fn resting_limit_order_is_reported_with_no_trades() {
    let server = test_server();
    let response = server
        .post("/orders")
        .json(&json!({
            "symbol": "BTC-USD",
            "order_type": "limit",
            "side": "buy",
            "quantity": "1.0",
            "price": "100.00",
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "resting");
    assert_eq!(body["trades"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn crossing_limit_orders_trade_at_the_maker_price() {
    let server = test_server();
    server
        .post("/orders")
        .json(&json!({
            "symbol": "BTC-USD",
            "order_type": "limit",
            "side": "sell",
            "quantity": "1.0",
            "price": "100.00",
        }))
        .await
        .assert_status_ok();

    let response = server
        .post("/orders")
        .json(&json!({
            "symbol": "BTC-USD",
            "order_type": "limit",
            "side": "buy",
            "quantity": "1.0",
            "price": "101.00",
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "filled");
    assert_eq!(body["trades"][0]["price"], "100.00");
}

#[tokio::test]
async fn market_order_with_a_price_is_rejected_with_400() {
    let server = test_server();
    let response = server
        .post("/orders")
        .json(&json!({
            "symbol": "BTC-USD",
            "order_type": "market",
            "side": "buy",
            "quantity": "1.0",
            "price": "100.00",
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["reason"], "unexpected_price_for_market");
}

#[tokio::test]
async fn book_query_reports_best_first_depth_and_sequence() {
    let server = test_server();
    server
        .post("/orders")
        .json(&json!({
            "symbol": "BTC-USD", "order_type": "limit", "side": "buy",
            "quantity": "1.0", "price": "99.00",
        }))
        .await
        .assert_status_ok();
    server
        .post("/orders")
        .json(&json!({
            "symbol": "BTC-USD", "order_type": "limit", "side": "buy",
            "quantity": "1.0", "price": "100.00",
        }))
        .await
        .assert_status_ok();

    let response = server.get("/symbols/BTC-USD/book?depth=5").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["bids"][0][0], "100.00");
    assert_eq!(body["bids"][1][0], "99.00");
}

#[tokio::test]
async fn book_query_for_unknown_symbol_is_404() {
    let server = test_server();
    let response = server.get("/symbols/ETH-USD/book").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn stats_reflect_accepted_rejected_and_traded_volume() {
    let server = test_server();
    server
        .post("/orders")
        .json(&json!({
            "symbol": "BTC-USD", "order_type": "limit", "side": "sell",
            "quantity": "1.0", "price": "100.00",
        }))
        .await
        .assert_status_ok();
    server
        .post("/orders")
        .json(&json!({
            "symbol": "BTC-USD", "order_type": "limit", "side": "buy",
            "quantity": "1.0", "price": "100.00",
        }))
        .await
        .assert_status_ok();
    server
        .post("/orders")
        .json(&json!({
            "symbol": "ETH-USD", "order_type": "limit", "side": "buy",
            "quantity": "1.0", "price": "1.00",
        }))
        .await
        .assert_status_ok();

    let response = server.get("/stats").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["total_orders_accepted"], 2);
    assert_eq!(body["total_orders_rejected"], 1);
    assert_eq!(body["total_trades"], 1);
}
