pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;

pub use config::{AppConfig, BrokerConfig, EngineConfig, ServerConfig};
pub use config_loader::ConfigLoader;
pub use error::{Error, ProviderError, Result};
pub use events::EngineEvent;
pub use traits::{AuditRecorder, BrokerProvider, PositionModel};
pub use types::{
    AccountSnapshot, AuditEvent, AuditLogEntry, AuditRecord, AuditStatus, BrokerEnv,
    BrokerProviderKind, BrokerStatus, LegAction, OptionChain, OptionQuote, OptionRight, OrderAck,
    OrderAckStatus, Position, PositionStatus, RiskRules, RiskRulesUpdate, RuleName, RuleResult,
    SpreadConfig, SpreadLeg, SpreadStrategy, Trade, TradeStatus, ValidationOutcome,
};
