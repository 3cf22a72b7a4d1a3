//! WebSocket endpoint: forwards engine events and pushes a simulated price
//! feed that marks open positions to market.
//!
//! The feed is display plumbing; lifecycle correctness never depends on its
//! cadence. Quote values are externally supplied inputs as far as the engine
//! is concerned; here they are a small random walk over the demo symbols.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use chrono::Utc;
use orca_core::{EngineEvent, PositionStatus};
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::time::interval;

use crate::server::AppState;

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| websocket_connection(socket, state))
}

async fn websocket_connection(mut socket: WebSocket, state: AppState) {
    let mut events = state.engine.subscribe();
    let mut tick = interval(state.feed_interval);

    // Seed the walk from the chain underlying prices.
    let mut prices: HashMap<String, Decimal> = HashMap::new();
    for symbol in state.store.chain_symbols().await {
        let chains = state.store.get_option_chain(&symbol, None).await;
        if let Some(chain) = chains.first() {
            prices.insert(symbol, chain.underlying_price);
        }
    }

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if feed_tick(&mut socket, &state, &mut prices).await.is_err() {
                    break;
                }
            }
            event = events.recv() => {
                let Ok(event) = event else { continue };
                let Ok(json) = serde_json::to_string(&event) else { continue };
                if socket.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed");
}

/// One feed tick: jitter each symbol's price, push the updates, and apply
/// mark-to-market to open positions.
async fn feed_tick(
    socket: &mut WebSocket,
    state: &AppState,
    prices: &mut HashMap<String, Decimal>,
) -> Result<(), ()> {
    let positions = state.store.get_positions().await;

    // Random values are drawn up front; the RNG never crosses an await.
    let mut updates: Vec<(String, Decimal)> = Vec::with_capacity(prices.len());
    let mut marks: Vec<(String, Decimal, f64)> = Vec::new();
    {
        let mut rng = rand::thread_rng();
        for (symbol, price) in prices.iter_mut() {
            let jitter = Decimal::from_f64_retain(rng.gen_range(-0.5..0.5))
                .unwrap_or(Decimal::ZERO)
                .round_dp(2);
            *price += jitter;
            updates.push((symbol.clone(), *price));
        }
        for position in &positions {
            if position.status != PositionStatus::Open {
                continue;
            }
            let factor = Decimal::from_f64_retain(1.0 + rng.gen_range(-0.05..0.05))
                .unwrap_or(Decimal::ONE);
            let value = (position.current_value * factor).round_dp(2);
            marks.push((position.id.clone(), value, position.delta));
        }
    }

    for (symbol, price) in updates {
        let event = EngineEvent::PriceUpdate {
            symbol,
            price,
            timestamp: Utc::now(),
        };
        let Ok(json) = serde_json::to_string(&event) else {
            continue;
        };
        if socket.send(Message::Text(json)).await.is_err() {
            return Err(());
        }
    }

    for (id, value, delta) in marks {
        if let Err(e) = state.store.update_position_value(&id, value, delta).await {
            tracing::debug!(position_id = %id, error = %e, "Mark-to-market skipped");
        }
    }

    Ok(())
}
