use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::trade_handle::TradeHandle;

/// Live trade actors, keyed by trade id. Actors remove themselves once they
/// reach a terminal state.
#[derive(Clone, Default)]
pub struct TradeRegistry {
    inner: Arc<RwLock<HashMap<String, TradeHandle>>>,
}

impl TradeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, trade_id: &str, handle: TradeHandle) {
        self.inner
            .write()
            .await
            .insert(trade_id.to_string(), handle);
    }

    pub async fn get(&self, trade_id: &str) -> Option<TradeHandle> {
        self.inner.read().await.get(trade_id).cloned()
    }

    pub async fn remove(&self, trade_id: &str) {
        self.inner.write().await.remove(trade_id);
    }

    /// Trade ids with a live actor (still awaiting their fill).
    pub async fn active(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }
}
