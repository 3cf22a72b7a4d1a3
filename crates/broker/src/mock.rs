//! Simulated broker backed by the in-process store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use orca_core::{
    AccountSnapshot, BrokerProvider, OptionChain, OrderAck, OrderAckStatus, Position,
    ProviderError, Trade,
};
use orca_store::MemoryStore;

/// Adapter over the record store. Placement always acknowledges immediately
/// with `accepted_mock`; fill confirmation is driven by the engine's own
/// scheduled task, not by this provider.
pub struct MockBroker {
    store: Arc<MemoryStore>,
}

impl MockBroker {
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BrokerProvider for MockBroker {
    fn name(&self) -> &'static str {
        "MockBroker"
    }

    async fn get_account(&self) -> Result<AccountSnapshot, ProviderError> {
        Ok(self.store.get_account_info().await)
    }

    async fn get_positions(&self) -> Result<Vec<Position>, ProviderError> {
        Ok(self.store.get_positions().await)
    }

    async fn get_option_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<Vec<OptionChain>, ProviderError> {
        Ok(self.store.get_option_chain(symbol, expiration).await)
    }

    async fn get_trades(&self) -> Result<Vec<Trade>, ProviderError> {
        Ok(self.store.get_trades().await)
    }

    async fn place_order(&self, trade: &Trade) -> Result<OrderAck, ProviderError> {
        tracing::info!(
            trade_id = %trade.id,
            spread = %trade.spread.display_name(),
            "Simulated order accepted"
        );
        Ok(OrderAck {
            order_id: format!("MOCK-{}", trade.id),
            status: OrderAckStatus::AcceptedMock,
        })
    }
}
