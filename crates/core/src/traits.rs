use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{Error, ProviderError};
use crate::types::{
    AccountSnapshot, AuditLogEntry, AuditRecord, OptionChain, OrderAck, Position, SpreadConfig,
    Trade,
};

/// The capability set a brokerage backend exposes. The lifecycle engine and
/// the API surface depend only on this trait, never on a concrete variant:
/// the simulated backend substitutes for the live one in tests and paper
/// mode without any pipeline change.
#[async_trait]
pub trait BrokerProvider: Send + Sync {
    /// The provider name (e.g., "MockBroker", "IbkrBroker").
    fn name(&self) -> &'static str;

    async fn get_account(&self) -> Result<AccountSnapshot, ProviderError>;

    async fn get_positions(&self) -> Result<Vec<Position>, ProviderError>;

    async fn get_option_chain(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<Vec<OptionChain>, ProviderError>;

    async fn get_trades(&self) -> Result<Vec<Trade>, ProviderError>;

    /// Submits an order for a validated trade. Retry policy for transient
    /// failures lives inside the provider; the engine never retries a
    /// placement on its own.
    async fn place_order(&self, trade: &Trade) -> Result<OrderAck, ProviderError>;
}

/// Append-only audit sink. A failed append must propagate: a state
/// transition that cannot be audited must not commit.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<AuditLogEntry, Error>;

    /// All entries, in insertion order. No reordering, no deduplication.
    async fn entries(&self) -> Vec<AuditLogEntry>;

    async fn entries_for_trade(&self, trade_id: &str) -> Vec<AuditLogEntry>;
}

/// Margin and delta for a newly filled spread. The default implementation is
/// the simplified placeholder model; a real pricing engine can replace it
/// without touching lifecycle logic.
pub trait PositionModel: Send + Sync {
    fn margin_required(&self, spread: &SpreadConfig) -> Decimal;

    fn fill_delta(&self, spread: &SpreadConfig) -> f64;
}
