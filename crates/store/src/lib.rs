//! In-memory key-addressed record store.
//!
//! The persistence engine itself is out of scope; this crate is the
//! read-your-writes collaborator the lifecycle engine calls in transition
//! order. Account state and the active rule version share one lock cell so
//! rule-5 snapshots never observe a torn write.

pub mod audit;
pub mod seed;

pub use audit::MemoryAuditLog;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use orca_core::{
    AccountSnapshot, Error, OptionChain, Position, PositionStatus, Result, RiskRules,
    RiskRulesUpdate, SpreadConfig, Trade, TradeStatus,
};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

/// Account figures and the full rule-version history, guarded together.
struct RiskState {
    account: AccountSnapshot,
    /// Versions in ascending order; the last entry is active.
    rules: Vec<RiskRules>,
}

pub struct MemoryStore {
    next_id: AtomicU64,
    risk: RwLock<RiskState>,
    trades: RwLock<TradeTable>,
    positions: RwLock<PositionTable>,
    chains: RwLock<HashMap<String, Vec<OptionChain>>>,
}

#[derive(Default)]
struct TradeTable {
    rows: HashMap<String, Trade>,
    order: Vec<String>,
}

#[derive(Default)]
struct PositionTable {
    rows: HashMap<String, Position>,
    order: Vec<String>,
}

impl MemoryStore {
    /// Creates a store seeded with the demo account and the default rule
    /// set (version 1).
    #[must_use]
    pub fn new() -> Self {
        Self::with_chains(HashMap::new())
    }

    /// Creates a store that also carries the demo option chains.
    #[must_use]
    pub fn with_demo_data() -> Self {
        Self::with_chains(seed::demo_chains())
    }

    fn with_chains(chains: HashMap<String, Vec<OptionChain>>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            risk: RwLock::new(RiskState {
                account: seed::demo_account(),
                rules: vec![seed::default_rules()],
            }),
            trades: RwLock::new(TradeTable::default()),
            positions: RwLock::new(PositionTable::default()),
            chains: RwLock::new(chains),
        }
    }

    fn allocate_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}-{n}")
    }

    // --- account & rules ---

    pub async fn get_account_info(&self) -> AccountSnapshot {
        self.risk.read().await.account.clone()
    }

    /// The active rule set.
    pub async fn get_risk_rules(&self) -> RiskRules {
        let state = self.risk.read().await;
        state
            .rules
            .last()
            .cloned()
            .unwrap_or_else(seed::default_rules)
    }

    /// Full version history, oldest first.
    pub async fn rule_history(&self) -> Vec<RiskRules> {
        self.risk.read().await.rules.clone()
    }

    /// Atomic read of account state and the active rule version. Callers
    /// evaluating rule 5 must use this rather than separate reads.
    pub async fn snapshot(&self) -> (AccountSnapshot, RiskRules) {
        let state = self.risk.read().await;
        let rules = state
            .rules
            .last()
            .cloned()
            .unwrap_or_else(seed::default_rules);
        (state.account.clone(), rules)
    }

    /// Appends a new rule version and makes it active. History is never
    /// mutated in place, so past validations stay reproducible.
    pub async fn create_or_update_risk_rules(&self, update: RiskRulesUpdate) -> RiskRules {
        let mut state = self.risk.write().await;
        let version = state.rules.last().map_or(1, |r| r.version + 1);
        let rules = RiskRules {
            name: update.name,
            version,
            min_credit: update.min_credit,
            max_loss_per_trade: update.max_loss_per_trade,
            min_open_interest: update.min_open_interest,
            delta_cap_abs: update.delta_cap_abs,
            leverage_cap: update.leverage_cap,
            created_at: Utc::now(),
        };
        state.rules.push(rules.clone());
        tracing::info!(name = %rules.name, version = rules.version, "Risk rules updated");
        rules
    }

    /// Adjusts aggregate margin usage (positive on fill, negative on close).
    pub async fn adjust_margin(&self, delta: Decimal) {
        let mut state = self.risk.write().await;
        state.account.margin_used += delta;
        state.account.buying_power -= delta;
    }

    // --- trades ---

    pub async fn create_trade(
        &self,
        spread: SpreadConfig,
        credit: Decimal,
        status: TradeStatus,
    ) -> Trade {
        let trade = Trade {
            id: self.allocate_id("T"),
            spread,
            credit,
            status,
            created_at: Utc::now(),
            filled_at: None,
        };
        let mut table = self.trades.write().await;
        table.order.push(trade.id.clone());
        table.rows.insert(trade.id.clone(), trade.clone());
        trade
    }

    pub async fn get_trade(&self, id: &str) -> Result<Trade> {
        self.trades
            .read()
            .await
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownTrade { id: id.to_string() })
    }

    /// All trades in insertion order.
    pub async fn get_trades(&self) -> Vec<Trade> {
        let table = self.trades.read().await;
        table
            .order
            .iter()
            .filter_map(|id| table.rows.get(id).cloned())
            .collect()
    }

    pub async fn update_trade_status(
        &self,
        id: &str,
        status: TradeStatus,
        filled_at: Option<DateTime<Utc>>,
    ) -> Result<Trade> {
        let mut table = self.trades.write().await;
        let trade = table
            .rows
            .get_mut(id)
            .ok_or_else(|| Error::UnknownTrade { id: id.to_string() })?;
        trade.status = status;
        if filled_at.is_some() {
            trade.filled_at = filled_at;
        }
        Ok(trade.clone())
    }

    // --- positions ---

    pub async fn create_position(
        &self,
        trade: &Trade,
        current_value: Decimal,
        delta: f64,
        margin_required: Decimal,
    ) -> Position {
        let position = Position {
            id: self.allocate_id("P"),
            trade_id: trade.id.clone(),
            symbol: trade.spread.symbol.clone(),
            strategy: trade.spread.strategy,
            sell_strike: trade.spread.sell_leg.strike,
            buy_strike: trade.spread.buy_leg.strike,
            expiration: trade.spread.expiration,
            quantity: trade.spread.quantity,
            open_credit: trade.credit,
            current_value,
            delta,
            margin_required,
            status: PositionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        };
        let mut table = self.positions.write().await;
        table.order.push(position.id.clone());
        table.rows.insert(position.id.clone(), position.clone());
        position
    }

    pub async fn get_position(&self, id: &str) -> Result<Position> {
        self.positions
            .read()
            .await
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownPosition { id: id.to_string() })
    }

    pub async fn get_positions(&self) -> Vec<Position> {
        let table = self.positions.read().await;
        table
            .order
            .iter()
            .filter_map(|id| table.rows.get(id).cloned())
            .collect()
    }

    /// Marks a closed position. Closed positions persist for history.
    pub async fn close_position(&self, id: &str) -> Result<Position> {
        let mut table = self.positions.write().await;
        let position = table
            .rows
            .get_mut(id)
            .ok_or_else(|| Error::UnknownPosition { id: id.to_string() })?;
        position.status = PositionStatus::Closed;
        position.closed_at = Some(Utc::now());
        Ok(position.clone())
    }

    /// Mark-to-market entry point: the price feed supplies the new value and
    /// delta, the store applies them.
    pub async fn update_position_value(
        &self,
        id: &str,
        current_value: Decimal,
        delta: f64,
    ) -> Result<()> {
        let mut table = self.positions.write().await;
        let position = table
            .rows
            .get_mut(id)
            .ok_or_else(|| Error::UnknownPosition { id: id.to_string() })?;
        position.current_value = current_value;
        position.delta = delta;
        Ok(())
    }

    // --- option chains ---

    /// Chains for a symbol, optionally narrowed to one expiration. Unknown
    /// symbols yield an empty list.
    pub async fn get_option_chain(
        &self,
        symbol: &str,
        expiration: Option<chrono::NaiveDate>,
    ) -> Vec<OptionChain> {
        let chains = self.chains.read().await;
        let Some(all) = chains.get(&symbol.to_uppercase()) else {
            return Vec::new();
        };
        match expiration {
            Some(date) => all.iter().filter(|c| c.expiration == date).cloned().collect(),
            None => all.clone(),
        }
    }

    pub async fn chain_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.chains.read().await.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
