//! End-to-end lifecycle tests driven with a deterministic broker double and
//! tokio's paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use orca_core::{
    AccountSnapshot, AuditEvent, AuditLogEntry, AuditRecord, AuditRecorder, AuditStatus,
    BrokerProvider, EngineConfig, EngineEvent, Error, LegAction, OptionChain, OptionRight,
    OrderAck, OrderAckStatus, Position, ProviderError, SpreadConfig, SpreadLeg, SpreadStrategy,
    Trade, TradeStatus,
};
use orca_engine::{LifecycleState, TradeEngine};
use orca_risk::SimplifiedPositionModel;
use orca_store::{MemoryAuditLog, MemoryStore};
use rust_decimal_macros::dec;

struct TestBroker {
    ack: OrderAckStatus,
    failure: Option<ProviderError>,
    placements: AtomicUsize,
}

impl TestBroker {
    fn acking(ack: OrderAckStatus) -> Self {
        Self {
            ack,
            failure: None,
            placements: AtomicUsize::new(0),
        }
    }

    fn failing(failure: ProviderError) -> Self {
        Self {
            ack: OrderAckStatus::Submitted,
            failure: Some(failure),
            placements: AtomicUsize::new(0),
        }
    }

    fn placements(&self) -> usize {
        self.placements.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerProvider for TestBroker {
    fn name(&self) -> &'static str {
        "TestBroker"
    }

    async fn get_account(&self) -> Result<AccountSnapshot, ProviderError> {
        Ok(AccountSnapshot {
            account_id: "TEST".to_string(),
            net_liquidation: dec!(50000),
            buying_power: dec!(100000),
            cash_balance: dec!(50000),
            margin_used: dec!(0),
        })
    }

    async fn get_positions(&self) -> Result<Vec<Position>, ProviderError> {
        Ok(Vec::new())
    }

    async fn get_option_chain(
        &self,
        _symbol: &str,
        _expiration: Option<NaiveDate>,
    ) -> Result<Vec<OptionChain>, ProviderError> {
        Ok(Vec::new())
    }

    async fn get_trades(&self) -> Result<Vec<Trade>, ProviderError> {
        Ok(Vec::new())
    }

    async fn place_order(&self, trade: &Trade) -> Result<OrderAck, ProviderError> {
        self.placements.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(OrderAck {
                order_id: format!("TEST-{}", trade.id),
                status: self.ack,
            }),
        }
    }
}

struct FailingAudit;

#[async_trait]
impl AuditRecorder for FailingAudit {
    async fn record(&self, _record: AuditRecord) -> Result<AuditLogEntry, Error> {
        Err(Error::AuditWrite {
            reason: "audit sink unavailable".to_string(),
        })
    }

    async fn entries(&self) -> Vec<AuditLogEntry> {
        Vec::new()
    }

    async fn entries_for_trade(&self, _trade_id: &str) -> Vec<AuditLogEntry> {
        Vec::new()
    }
}

fn spy_proposal() -> SpreadConfig {
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

struct Fixture {
    store: Arc<MemoryStore>,
    audit: Arc<MemoryAuditLog>,
    broker: Arc<TestBroker>,
    engine: TradeEngine,
}

fn fixture(broker: TestBroker) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let broker = Arc::new(broker);
    let engine = TradeEngine::new(
        Arc::clone(&store),
        broker.clone(),
        audit.clone(),
        Arc::new(SimplifiedPositionModel),
        EngineConfig { fill_delay_ms: 1000 },
    );
    Fixture {
        store,
        audit,
        broker,
        engine,
    }
}

async fn next_filled_event(rx: &mut tokio::sync::broadcast::Receiver<EngineEvent>) -> String {
    loop {
        match rx.recv().await {
            Ok(EngineEvent::TradeFilled { trade_id, .. }) => return trade_id,
            Ok(_) => {}
            Err(e) => panic!("event stream closed: {e}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn simulated_fill_creates_exactly_one_position() {
    let f = fixture(TestBroker::acking(OrderAckStatus::AcceptedMock));
    let mut events = f.engine.subscribe();

    let submitted = f.engine.submit(spy_proposal()).await.unwrap();
    assert!(submitted.outcome.passed());
    assert_eq!(submitted.trade.status, TradeStatus::Pending);
    assert_eq!(
        f.engine.lifecycle_state(&submitted.trade.id).await,
        Some(LifecycleState::PendingFill)
    );

    // The paused clock auto-advances to the scheduled fill while we wait.
    let filled_id = next_filled_event(&mut events).await;
    assert_eq!(filled_id, submitted.trade.id);

    let trade = f.store.get_trade(&submitted.trade.id).await.unwrap();
    assert_eq!(trade.status, TradeStatus::Filled);
    assert!(trade.filled_at.is_some());

    let positions = f.store.get_positions().await;
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].trade_id, trade.id);
    assert_eq!(positions[0].open_credit, dec!(1.00));
    assert_eq!(positions[0].margin_required, dec!(1000));
    assert!((positions[0].delta - (-0.40)).abs() < 1e-9);

    // Margin usage feeds back into the account aggregate for rule 5.
    let account = f.store.get_account_info().await;
    assert_eq!(account.margin_used, dec!(1000));
}

#[tokio::test(start_paused = true)]
async fn audit_trail_has_one_entry_per_transition() {
    let f = fixture(TestBroker::acking(OrderAckStatus::AcceptedMock));
    let mut events = f.engine.subscribe();

    let submitted = f.engine.submit(spy_proposal()).await.unwrap();
    next_filled_event(&mut events).await;

    // Submitted→Validated, Validated→PendingFill, PendingFill→Filled.
    let entries = f.audit.entries_for_trade(&submitted.trade.id).await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].event_type, AuditEvent::TradeValidate);
    assert_eq!(entries[0].status, AuditStatus::Passed);
    assert_eq!(entries[1].event_type, AuditEvent::TradeSubmit);
    assert_eq!(entries[1].status, AuditStatus::Pending);
    assert_eq!(entries[2].event_type, AuditEvent::TradeFilled);
    assert_eq!(entries[2].status, AuditStatus::Success);
}

#[tokio::test]
async fn rule_failure_rejects_without_touching_the_broker() {
    let f = fixture(TestBroker::acking(OrderAckStatus::AcceptedMock));

    let mut proposal = spy_proposal();
    proposal.buy_leg.open_interest = 50;

    let submitted = f.engine.submit(proposal).await.unwrap();
    assert!(!submitted.outcome.passed());
    assert_eq!(submitted.trade.status, TradeStatus::Rejected);
    assert_eq!(f.broker.placements(), 0);

    // One transition (Submitted→Rejected), one entry, full diagnostics.
    let entries = f.audit.entries_for_trade(&submitted.trade.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, AuditStatus::Failed);
    assert!(entries[0].details.contains("open_interest=fail"));
    assert!(entries[0].details.contains("net_credit=pass"));
    assert!(entries[0].details.contains("max_loss=pass"));
    assert!(entries[0].details.contains("delta_exposure=pass"));
    assert!(entries[0].details.contains("leverage=pass"));
}

#[tokio::test]
async fn malformed_proposal_is_rejected_before_the_pipeline() {
    let f = fixture(TestBroker::acking(OrderAckStatus::AcceptedMock));

    let mut proposal = spy_proposal();
    proposal.quantity = 0;

    let err = f.engine.submit(proposal).await.unwrap_err();
    assert!(matches!(err, Error::MalformedProposal { .. }));

    // Nothing entered the pipeline: no trade, no audit entry, no placement.
    assert!(f.store.get_trades().await.is_empty());
    assert!(f.audit.entries().await.is_empty());
    assert_eq!(f.broker.placements(), 0);
}

#[tokio::test]
async fn duplicate_fill_confirmations_create_one_position() {
    let f = fixture(TestBroker::acking(OrderAckStatus::Submitted));

    let submitted = f.engine.submit(spy_proposal()).await.unwrap();
    let id = submitted.trade.id.clone();

    let (first, second) = tokio::join!(f.engine.confirm_fill(&id), f.engine.confirm_fill(&id));
    let outcomes = [first, second];
    let filled = outcomes.iter().filter(|r| r.is_ok()).count();
    let refused = outcomes
        .iter()
        .filter(|r| matches!(r, Err(Error::TerminalState { .. })))
        .count();

    assert_eq!(filled, 1, "exactly one confirmation may win");
    assert_eq!(refused, 1, "the loser observes the terminal state");
    assert_eq!(f.store.get_positions().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_trade_never_fills() {
    let f = fixture(TestBroker::acking(OrderAckStatus::AcceptedMock));

    let submitted = f.engine.submit(spy_proposal()).await.unwrap();
    let cancelled = f.engine.cancel(&submitted.trade.id).await.unwrap();
    assert_eq!(cancelled.status, TradeStatus::Cancelled);

    // Outlive the would-be fill schedule; the timer died with the actor.
    tokio::time::advance(std::time::Duration::from_millis(5000)).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }

    assert!(f.store.get_positions().await.is_empty());
    let trade = f.store.get_trade(&submitted.trade.id).await.unwrap();
    assert_eq!(trade.status, TradeStatus::Cancelled);

    let entries = f.audit.entries_for_trade(&submitted.trade.id).await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].event_type, AuditEvent::TradeCancelled);
}

#[tokio::test]
async fn cancel_after_fill_is_a_terminal_state_error() {
    let f = fixture(TestBroker::acking(OrderAckStatus::Submitted));

    let submitted = f.engine.submit(spy_proposal()).await.unwrap();
    let position = f.engine.confirm_fill(&submitted.trade.id).await.unwrap();

    let err = f.engine.cancel(&submitted.trade.id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::TerminalState {
            status: TradeStatus::Filled,
            ..
        }
    ));

    // The position is untouched.
    let after = f.store.get_position(&position.id).await.unwrap();
    assert_eq!(after.status, position.status);
    assert_eq!(after.current_value, position.current_value);
}

#[tokio::test]
async fn provider_rejection_is_terminal_and_audited() {
    let f = fixture(TestBroker::failing(ProviderError::Permanent {
        reason: "insufficient buying power".to_string(),
    }));

    let submitted = f.engine.submit(spy_proposal()).await.unwrap();
    assert_eq!(submitted.trade.status, TradeStatus::Rejected);
    // The engine never retries a placement on its own.
    assert_eq!(f.broker.placements(), 1);

    let entries = f.audit.entries_for_trade(&submitted.trade.id).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].event_type, AuditEvent::TradeSubmit);
    assert_eq!(entries[1].status, AuditStatus::Failed);
    assert!(entries[1].details.contains("insufficient buying power"));
}

#[tokio::test]
async fn audit_write_failure_aborts_the_submission() {
    let store = Arc::new(MemoryStore::new());
    let broker = Arc::new(TestBroker::acking(OrderAckStatus::AcceptedMock));
    let engine = TradeEngine::new(
        Arc::clone(&store),
        broker.clone(),
        Arc::new(FailingAudit),
        Arc::new(SimplifiedPositionModel),
        EngineConfig { fill_delay_ms: 1000 },
    );

    let err = engine.submit(spy_proposal()).await.unwrap_err();
    assert!(matches!(err, Error::AuditWrite { .. }));

    // The un-auditable transition never committed: the trade is still in
    // its initial stored state and no order went out.
    let trades = store.get_trades().await;
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].status, TradeStatus::Pending);
    assert_eq!(broker.placements(), 0);
}

#[tokio::test]
async fn unknown_trade_cancellation_reports_unknown() {
    let f = fixture(TestBroker::acking(OrderAckStatus::AcceptedMock));
    let err = f.engine.cancel("T-404").await.unwrap_err();
    assert!(matches!(err, Error::UnknownTrade { .. }));
}

#[tokio::test(start_paused = true)]
async fn events_follow_the_lifecycle_order() {
    let f = fixture(TestBroker::acking(OrderAckStatus::AcceptedMock));
    let mut events = f.engine.subscribe();

    f.engine.submit(spy_proposal()).await.unwrap();

    assert!(matches!(
        events.recv().await.unwrap(),
        EngineEvent::TradeValidated { .. }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        EngineEvent::OrderPlaced { .. }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        EngineEvent::TradeFilled { .. }
    ));
}

#[tokio::test]
async fn dry_run_validation_creates_no_trade() {
    let f = fixture(TestBroker::acking(OrderAckStatus::AcceptedMock));

    let outcome = f.engine.validate(&spy_proposal()).await.unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.results.len(), 5);

    assert!(f.store.get_trades().await.is_empty());
    assert_eq!(f.broker.placements(), 0);

    // The dry run is still audited.
    let entries = f.audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, AuditEvent::TradeValidate);
    assert!(entries[0].trade_id.is_none());
}
