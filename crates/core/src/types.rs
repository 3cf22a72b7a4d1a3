//! Domain types for spread proposals, trades, positions, risk rules, and the
//! audit trail.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Option right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

/// Which side of the spread a leg sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegAction {
    Sell,
    Buy,
}

/// Spread strategy tag. Extensible: validation only assumes a two-leg
/// credit structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadStrategy {
    PutCredit,
    CallCredit,
}

impl SpreadStrategy {
    /// The option right both legs of this strategy must carry.
    #[must_use]
    pub const fn leg_right(self) -> OptionRight {
        match self {
            Self::PutCredit => OptionRight::Put,
            Self::CallCredit => OptionRight::Call,
        }
    }
}

impl std::fmt::Display for SpreadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PutCredit => write!(f, "put_credit"),
            Self::CallCredit => write!(f, "call_credit"),
        }
    }
}

/// One leg of a proposed spread. Premium and delta are externally supplied
/// quote data, not computed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadLeg {
    pub strike: Decimal,
    pub right: OptionRight,
    pub action: LegAction,
    pub premium: Decimal,
    pub delta: f64,
    pub open_interest: u64,
}

/// A proposed two-leg option spread. Both legs share the top-level symbol and
/// expiration by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadConfig {
    pub symbol: String,
    pub strategy: SpreadStrategy,
    pub sell_leg: SpreadLeg,
    pub buy_leg: SpreadLeg,
    pub quantity: u32,
    pub expiration: NaiveDate,
}

impl SpreadConfig {
    /// Checks the structural invariants of a proposal. A violation here is a
    /// malformed proposal, rejected before any risk rule runs.
    pub fn validate(&self) -> Result<(), Error> {
        if self.symbol.trim().is_empty() {
            return Err(Error::MalformedProposal {
                reason: "symbol must not be empty".to_string(),
            });
        }
        if self.quantity == 0 {
            return Err(Error::MalformedProposal {
                reason: "quantity must be positive".to_string(),
            });
        }
        if self.sell_leg.action != LegAction::Sell {
            return Err(Error::MalformedProposal {
                reason: "sell leg must carry the sell action".to_string(),
            });
        }
        if self.buy_leg.action != LegAction::Buy {
            return Err(Error::MalformedProposal {
                reason: "buy leg must carry the buy action".to_string(),
            });
        }
        let expected = self.strategy.leg_right();
        if self.sell_leg.right != expected || self.buy_leg.right != expected {
            return Err(Error::MalformedProposal {
                reason: format!("{} legs must both be {:?}", self.strategy, expected),
            });
        }
        if self.sell_leg.strike <= Decimal::ZERO || self.buy_leg.strike <= Decimal::ZERO {
            return Err(Error::MalformedProposal {
                reason: "strikes must be positive".to_string(),
            });
        }
        if self.sell_leg.strike == self.buy_leg.strike {
            return Err(Error::MalformedProposal {
                reason: "legs must have distinct strikes".to_string(),
            });
        }
        Ok(())
    }

    /// Human-readable spread description (e.g., "SPY put_credit 450/445 x2").
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {}/{} x{}",
            self.symbol, self.strategy, self.sell_leg.strike, self.buy_leg.strike, self.quantity
        )
    }
}

/// Stored trade status. The engine tracks a finer-grained lifecycle; this is
/// the coarse state persisted with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Filled,
    Rejected,
    Cancelled,
}

impl TradeStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Filled => write!(f, "filled"),
            Self::Rejected => write!(f, "rejected"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A submitted trade. Never deleted; status changes are the only mutation,
/// and only the lifecycle engine performs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub spread: SpreadConfig,
    /// Net credit per contract at submission time.
    pub credit: Decimal,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    pub filled_at: Option<DateTime<Utc>>,
}

/// Position status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
    Expired,
}

/// A position derived from a filled trade. Closed positions persist for
/// history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub trade_id: String,
    pub symbol: String,
    pub strategy: SpreadStrategy,
    pub sell_strike: Decimal,
    pub buy_strike: Decimal,
    pub expiration: NaiveDate,
    pub quantity: u32,
    pub open_credit: Decimal,
    pub current_value: Decimal,
    pub delta: f64,
    pub margin_required: Decimal,
    pub status: PositionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A versioned risk rule set. Updates append a new version; history is kept
/// so past validations stay reproducible against the version they used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRules {
    pub name: String,
    pub version: u32,
    pub min_credit: Decimal,
    pub max_loss_per_trade: Decimal,
    pub min_open_interest: u64,
    pub delta_cap_abs: f64,
    pub leverage_cap: f64,
    pub created_at: DateTime<Utc>,
}

/// Incoming rule-set update. The store assigns version and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRulesUpdate {
    pub name: String,
    pub min_credit: Decimal,
    pub max_loss_per_trade: Decimal,
    pub min_open_interest: u64,
    pub delta_cap_abs: f64,
    pub leverage_cap: f64,
}

/// The canonical rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleName {
    NetCredit,
    MaxLoss,
    OpenInterest,
    DeltaExposure,
    Leverage,
}

impl std::fmt::Display for RuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetCredit => write!(f, "net_credit"),
            Self::MaxLoss => write!(f, "max_loss"),
            Self::OpenInterest => write!(f, "open_interest"),
            Self::DeltaExposure => write!(f, "delta_exposure"),
            Self::Leverage => write!(f, "leverage"),
        }
    }
}

/// Outcome of a single rule. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: RuleName,
    pub passed: bool,
    pub observed: String,
    pub threshold: String,
    pub message: String,
}

/// The full, ordered result set of a validation run. The verdict is the AND
/// of every rule; no rule is ever omitted by an earlier failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub results: Vec<RuleResult>,
}

impl ValidationOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// One-line summary for audit details (e.g., "4/5 rules passed; failed:
    /// open_interest").
    #[must_use]
    pub fn summary(&self) -> String {
        let passed = self.results.iter().filter(|r| r.passed).count();
        if passed == self.results.len() {
            format!("{}/{} rules passed", passed, self.results.len())
        } else {
            let failed: Vec<String> = self.failures().map(|r| r.rule.to_string()).collect();
            format!(
                "{}/{} rules passed; failed: {}",
                passed,
                self.results.len(),
                failed.join(", ")
            )
        }
    }
}

/// Account state read atomically with the active rule version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub net_liquidation: Decimal,
    pub buying_power: Decimal,
    pub cash_balance: Decimal,
    pub margin_used: Decimal,
}

/// Audit event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEvent {
    TradeValidate,
    TradeSubmit,
    TradeFilled,
    TradeCancelled,
    PositionClosed,
    RulesUpdate,
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TradeValidate => write!(f, "TRADE_VALIDATE"),
            Self::TradeSubmit => write!(f, "TRADE_SUBMIT"),
            Self::TradeFilled => write!(f, "TRADE_FILLED"),
            Self::TradeCancelled => write!(f, "TRADE_CANCELLED"),
            Self::PositionClosed => write!(f, "POSITION_CLOSED"),
            Self::RulesUpdate => write!(f, "RULES_UPDATE"),
        }
    }
}

/// Outcome status carried by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Passed,
    Failed,
    Pending,
    Success,
    Applied,
}

/// An audit entry to append. The recorder assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub event_type: AuditEvent,
    pub details: String,
    pub trade_id: Option<String>,
    pub actor: String,
    pub status: AuditStatus,
}

impl AuditRecord {
    #[must_use]
    pub fn new(event_type: AuditEvent, status: AuditStatus, details: impl Into<String>) -> Self {
        Self {
            event_type,
            details: details.into(),
            trade_id: None,
            actor: "system".to_string(),
            status,
        }
    }

    #[must_use]
    pub fn for_trade(mut self, trade_id: impl Into<String>) -> Self {
        self.trade_id = Some(trade_id.into());
        self
    }

    #[must_use]
    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}

/// A recorded audit entry. Append-only; never mutated or deleted. Insertion
/// order is the compliance record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub event_type: AuditEvent,
    pub details: String,
    pub trade_id: Option<String>,
    pub actor: String,
    pub status: AuditStatus,
    pub timestamp: DateTime<Utc>,
}

/// A single option quote inside a chain. Externally supplied data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: Decimal,
    pub right: OptionRight,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub delta: f64,
    pub open_interest: u64,
    pub volume: u64,
}

/// Option chain for one underlying and expiration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    pub symbol: String,
    pub underlying_price: Decimal,
    pub expiration: NaiveDate,
    pub quotes: Vec<OptionQuote>,
}

/// Broker provider variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerProviderKind {
    Mock,
    Ibkr,
}

/// Broker environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerEnv {
    Paper,
    Live,
}

/// Process-wide broker selection, resolved once at startup. The connected
/// flag is informational only and never gates calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerStatus {
    pub provider: BrokerProviderKind,
    pub env: BrokerEnv,
    pub connected: bool,
}

/// Placement acknowledgement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAckStatus {
    /// Simulated backend accepted the order; the engine drives the fill.
    AcceptedMock,
    /// Live backend accepted the order; the fill confirmation arrives later.
    Submitted,
}

/// Acknowledgement returned by a broker placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub status: OrderAckStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn put_credit_proposal() -> SpreadConfig {
        SpreadConfig {
            symbol: "SPY".to_string(),
            strategy: SpreadStrategy::PutCredit,
            sell_leg: SpreadLeg {
                strike: dec!(450),
                right: OptionRight::Put,
                action: LegAction::Sell,
                premium: dec!(2.00),
                delta: -0.20,
                open_interest: 5000,
            },
            buy_leg: SpreadLeg {
                strike: dec!(445),
                right: OptionRight::Put,
                action: LegAction::Buy,
                premium: dec!(1.00),
                delta: -0.10,
                open_interest: 3000,
            },
            quantity: 2,
            expiration: NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
        }
    }

    #[test]
    fn well_formed_proposal_validates() {
        assert!(put_credit_proposal().validate().is_ok());
    }

    #[test]
    fn zero_quantity_is_malformed() {
        let mut proposal = put_credit_proposal();
        proposal.quantity = 0;
        assert!(matches!(
            proposal.validate(),
            Err(Error::MalformedProposal { .. })
        ));
    }

    #[test]
    fn two_sell_legs_is_malformed() {
        let mut proposal = put_credit_proposal();
        proposal.buy_leg.action = LegAction::Sell;
        assert!(matches!(
            proposal.validate(),
            Err(Error::MalformedProposal { .. })
        ));
    }

    #[test]
    fn call_legs_on_put_credit_is_malformed() {
        let mut proposal = put_credit_proposal();
        proposal.sell_leg.right = OptionRight::Call;
        assert!(matches!(
            proposal.validate(),
            Err(Error::MalformedProposal { .. })
        ));
    }

    #[test]
    fn identical_strikes_is_malformed() {
        let mut proposal = put_credit_proposal();
        proposal.buy_leg.strike = proposal.sell_leg.strike;
        assert!(matches!(
            proposal.validate(),
            Err(Error::MalformedProposal { .. })
        ));
    }

    #[test]
    fn trade_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TradeStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&PositionStatus::Open).unwrap(),
            "\"OPEN\""
        );
        assert_eq!(
            serde_json::to_string(&AuditEvent::TradeValidate).unwrap(),
            "\"TRADE_VALIDATE\""
        );
    }

    #[test]
    fn outcome_summary_names_failed_rules() {
        let outcome = ValidationOutcome {
            results: vec![
                RuleResult {
                    rule: RuleName::NetCredit,
                    passed: true,
                    observed: "1.00".to_string(),
                    threshold: "0.50".to_string(),
                    message: String::new(),
                },
                RuleResult {
                    rule: RuleName::OpenInterest,
                    passed: false,
                    observed: "50".to_string(),
                    threshold: "100".to_string(),
                    message: String::new(),
                },
            ],
        };
        assert!(!outcome.passed());
        assert_eq!(outcome.summary(), "1/2 rules passed; failed: open_interest");
    }
}
