use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ValidationOutcome;

/// Events broadcast by the lifecycle engine and the price feed, forwarded to
/// WebSocket clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A proposal passed validation and became a trade.
    TradeValidated { trade_id: String },

    /// A trade reached the rejected state (rule failure or broker rejection).
    TradeRejected { trade_id: String, reason: String },

    /// The broker acknowledged the order; the trade awaits its fill.
    OrderPlaced { trade_id: String },

    /// The trade filled and its position was created.
    TradeFilled { trade_id: String, position_id: String },

    /// A pending trade was cancelled before its fill.
    TradeCancelled { trade_id: String },

    /// A dry-run validation completed (no trade record).
    ValidationRun { symbol: String, outcome: ValidationOutcome },

    /// Simulated quote tick for the UI feed.
    PriceUpdate {
        symbol: String,
        price: Decimal,
        timestamp: DateTime<Utc>,
    },
}
