//! Order lifecycle engine.
//!
//! The single point translating evaluator and broker outcomes into trade
//! state and audit entries. Depends only on the [`BrokerProvider`] trait, so
//! the simulated and live backends are interchangeable without touching
//! pipeline logic.

pub mod commands;
pub mod lifecycle;
pub mod registry;
pub mod trade_actor;
pub mod trade_handle;

pub use lifecycle::LifecycleState;
pub use registry::TradeRegistry;
pub use trade_handle::TradeHandle;

use std::sync::Arc;
use std::time::Duration;

use orca_core::{
    AuditEvent, AuditRecord, AuditRecorder, AuditStatus, BrokerProvider, EngineConfig,
    EngineEvent, Error, OrderAckStatus, Position, PositionModel, Result, SpreadConfig, Trade,
    TradeStatus, ValidationOutcome,
};
use orca_store::MemoryStore;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::trade_actor::TradeActor;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const TRADE_COMMAND_CAPACITY: usize = 16;

/// What a submission produced: the trade record (status tells whether it was
/// rejected or is awaiting its fill) and the full rule diagnostic set.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub trade: Trade,
    pub outcome: ValidationOutcome,
}

pub struct TradeEngine {
    store: Arc<MemoryStore>,
    broker: Arc<dyn BrokerProvider>,
    audit: Arc<dyn AuditRecorder>,
    model: Arc<dyn PositionModel>,
    registry: TradeRegistry,
    config: EngineConfig,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl TradeEngine {
    #[must_use]
    pub fn new(
        store: Arc<MemoryStore>,
        broker: Arc<dyn BrokerProvider>,
        audit: Arc<dyn AuditRecorder>,
        model: Arc<dyn PositionModel>,
        config: EngineConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            broker,
            audit,
            model,
            registry: TradeRegistry::new(),
            config,
            event_tx,
        }
    }

    /// Subscribes to engine events (for the WebSocket fan-out).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// The event sender, for collaborators that publish alongside the engine
    /// (the price feed).
    #[must_use]
    pub fn event_sender(&self) -> broadcast::Sender<EngineEvent> {
        self.event_tx.clone()
    }

    /// Dry-run validation: evaluates and audits, but creates no trade and
    /// never touches the broker.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedProposal`] for structural violations (not audited:
    /// nothing entered the pipeline); [`Error::AuditWrite`] if the outcome
    /// cannot be recorded.
    pub async fn validate(&self, proposal: &SpreadConfig) -> Result<ValidationOutcome> {
        let (account, rules) = self.store.snapshot().await;
        let outcome = orca_risk::evaluate(proposal, &rules, &account)?;

        let status = if outcome.passed() {
            AuditStatus::Passed
        } else {
            AuditStatus::Failed
        };
        self.audit
            .record(AuditRecord::new(
                AuditEvent::TradeValidate,
                status,
                validation_details(proposal, &outcome),
            ))
            .await?;

        let _ = self.event_tx.send(EngineEvent::ValidationRun {
            symbol: proposal.symbol.clone(),
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// Submits a proposal through the full pipeline: structural check, rule
    /// evaluation, placement, and the scheduled fill.
    ///
    /// On a failed verdict the trade is rejected, audited, and returned with
    /// the full diagnostic set; the broker is never called. A placement
    /// failure also rejects; it is never retried here (a retry is an
    /// explicit new submit).
    ///
    /// # Errors
    ///
    /// [`Error::MalformedProposal`] before anything is created or audited;
    /// [`Error::AuditWrite`] aborts whichever transition could not be
    /// recorded.
    pub async fn submit(&self, proposal: SpreadConfig) -> Result<SubmitOutcome> {
        proposal.validate()?;

        let (account, rules) = self.store.snapshot().await;
        let outcome = orca_risk::evaluate(&proposal, &rules, &account)?;
        let credit = orca_risk::spread::net_credit(&proposal);

        let trade = self
            .store
            .create_trade(proposal, credit, TradeStatus::Pending)
            .await;

        if !outcome.passed() {
            self.audit
                .record(
                    AuditRecord::new(
                        AuditEvent::TradeValidate,
                        AuditStatus::Failed,
                        validation_details(&trade.spread, &outcome),
                    )
                    .for_trade(&trade.id),
                )
                .await?;
            let trade = self
                .store
                .update_trade_status(&trade.id, TradeStatus::Rejected, None)
                .await?;

            tracing::warn!(
                trade_id = %trade.id,
                rules_version = rules.version,
                summary = %outcome.summary(),
                "Trade rejected by risk rules"
            );
            let _ = self.event_tx.send(EngineEvent::TradeRejected {
                trade_id: trade.id.clone(),
                reason: outcome.summary(),
            });
            return Ok(SubmitOutcome { trade, outcome });
        }

        self.audit
            .record(
                AuditRecord::new(
                    AuditEvent::TradeValidate,
                    AuditStatus::Passed,
                    validation_details(&trade.spread, &outcome),
                )
                .for_trade(&trade.id),
            )
            .await?;
        let _ = self.event_tx.send(EngineEvent::TradeValidated {
            trade_id: trade.id.clone(),
        });

        match self.broker.place_order(&trade).await {
            Err(err) => {
                self.audit
                    .record(
                        AuditRecord::new(
                            AuditEvent::TradeSubmit,
                            AuditStatus::Failed,
                            format!("{}: {err}", trade.spread.display_name()),
                        )
                        .for_trade(&trade.id),
                    )
                    .await?;
                let trade = self
                    .store
                    .update_trade_status(&trade.id, TradeStatus::Rejected, None)
                    .await?;

                tracing::error!(trade_id = %trade.id, error = %err, "Order placement failed");
                let _ = self.event_tx.send(EngineEvent::TradeRejected {
                    trade_id: trade.id.clone(),
                    reason: err.to_string(),
                });
                Ok(SubmitOutcome { trade, outcome })
            }
            Ok(ack) => {
                self.audit
                    .record(
                        AuditRecord::new(
                            AuditEvent::TradeSubmit,
                            AuditStatus::Pending,
                            trade.spread.display_name(),
                        )
                        .for_trade(&trade.id),
                    )
                    .await?;
                let _ = self.event_tx.send(EngineEvent::OrderPlaced {
                    trade_id: trade.id.clone(),
                });
                tracing::info!(
                    trade_id = %trade.id,
                    order_id = %ack.order_id,
                    broker = self.broker.name(),
                    "Order placed, awaiting fill"
                );

                // Mock acks are filled by our own scheduled task; live acks
                // wait for the external confirmation.
                let fill_delay = match ack.status {
                    OrderAckStatus::AcceptedMock => {
                        Some(Duration::from_millis(self.config.fill_delay_ms))
                    }
                    OrderAckStatus::Submitted => None,
                };

                let (tx, rx) = mpsc::channel(TRADE_COMMAND_CAPACITY);
                self.registry.insert(&trade.id, TradeHandle::new(tx)).await;
                let actor = TradeActor::new(
                    trade.clone(),
                    rx,
                    Arc::clone(&self.store),
                    Arc::clone(&self.audit),
                    Arc::clone(&self.model),
                    self.registry.clone(),
                    self.event_tx.clone(),
                    fill_delay,
                );
                tokio::spawn(actor.run());

                Ok(SubmitOutcome { trade, outcome })
            }
        }
    }

    /// Confirms a fill from the outside (live ack path, or tests driving the
    /// pipeline deterministically).
    ///
    /// # Errors
    ///
    /// [`Error::TerminalState`] if the trade already filled, rejected, or
    /// cancelled. A duplicate confirmation can never create a second
    /// position.
    pub async fn confirm_fill(&self, trade_id: &str) -> Result<Position> {
        if let Some(handle) = self.registry.get(trade_id).await {
            if let Some(result) = handle.confirm_fill().await {
                return result;
            }
        }
        let trade = self.store.get_trade(trade_id).await?;
        Err(Error::TerminalState {
            id: trade.id,
            status: trade.status,
        })
    }

    /// Cancels a trade still awaiting its fill.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalState`] once the trade is filled, rejected, or
    /// already cancelled; [`Error::UnknownTrade`] if the id never existed.
    pub async fn cancel(&self, trade_id: &str) -> Result<Trade> {
        if let Some(handle) = self.registry.get(trade_id).await {
            if let Some(result) = handle.cancel().await {
                return result;
            }
        }
        let trade = self.store.get_trade(trade_id).await?;
        Err(Error::TerminalState {
            id: trade.id,
            status: trade.status,
        })
    }

    /// Fine-grained lifecycle state, while the trade's actor is alive.
    pub async fn lifecycle_state(&self, trade_id: &str) -> Option<LifecycleState> {
        let handle = self.registry.get(trade_id).await?;
        handle.state().await
    }
}

/// Audit detail line carrying the complete rule diagnostic set, so a
/// rejected entry lists every result, not just the first failure.
fn validation_details(proposal: &SpreadConfig, outcome: &ValidationOutcome) -> String {
    let verdict = if outcome.passed() { "PASSED" } else { "FAILED" };
    let rules: Vec<String> = outcome
        .results
        .iter()
        .map(|r| {
            format!(
                "{}={}",
                r.rule,
                if r.passed { "pass" } else { "fail" }
            )
        })
        .collect();
    format!(
        "{} validation: {} [{}]",
        proposal.display_name(),
        verdict,
        rules.join(", ")
    )
}
