use serde::{Deserialize, Serialize};

use crate::types::{BrokerEnv, BrokerProviderKind};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Cadence of the simulated price feed pushed over the WebSocket.
    pub feed_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            feed_interval_secs: 5,
        }
    }
}

/// Broker selection. Resolved once at startup and injected, never read from
/// the environment at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub provider: BrokerProviderKind,
    pub env: BrokerEnv,
    /// Client Portal gateway base URL (ibkr provider only).
    pub base_url: String,
    /// Brokerage account id (required for the ibkr provider).
    pub account_id: Option<String>,
    /// Bounded retry budget for transient placement failures.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            provider: BrokerProviderKind::Mock,
            env: BrokerEnv::Paper,
            base_url: "https://localhost:5000/v1/api".to_string(),
            account_id: None,
            max_retries: 3,
            retry_backoff_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay before a simulated (mock-acked) order fills.
    pub fill_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fill_delay_ms: 1000 }
    }
}
