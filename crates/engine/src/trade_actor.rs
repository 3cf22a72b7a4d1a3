//! Per-trade actor.
//!
//! Every mutation of one trade flows through its actor's command queue, so
//! operations on the same trade are mutually exclusive while different
//! trades proceed in parallel. The fill wait is a non-blocking `select!`
//! inside this task and never holds up submission or validation elsewhere.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use orca_core::{
    AuditEvent, AuditRecord, AuditRecorder, AuditStatus, EngineEvent, Error, Position,
    PositionModel, Result, Trade, TradeStatus,
};
use orca_store::MemoryStore;
use tokio::sync::{broadcast, mpsc};

use crate::commands::TradeCommand;
use crate::lifecycle::LifecycleState;
use crate::registry::TradeRegistry;

pub(crate) struct TradeActor {
    trade: Trade,
    state: LifecycleState,
    rx: mpsc::Receiver<TradeCommand>,
    store: Arc<MemoryStore>,
    audit: Arc<dyn AuditRecorder>,
    model: Arc<dyn PositionModel>,
    registry: TradeRegistry,
    event_tx: broadcast::Sender<EngineEvent>,
    /// Simulated fill schedule. `None` means the fill arrives only through
    /// an external `ConfirmFill` (the live ack path).
    fill_delay: Option<Duration>,
}

impl TradeActor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        trade: Trade,
        rx: mpsc::Receiver<TradeCommand>,
        store: Arc<MemoryStore>,
        audit: Arc<dyn AuditRecorder>,
        model: Arc<dyn PositionModel>,
        registry: TradeRegistry,
        event_tx: broadcast::Sender<EngineEvent>,
        fill_delay: Option<Duration>,
    ) -> Self {
        Self {
            trade,
            state: LifecycleState::PendingFill,
            rx,
            store,
            audit,
            model,
            registry,
            event_tx,
            fill_delay,
        }
    }

    pub(crate) async fn run(mut self) {
        tracing::debug!(trade_id = %self.trade.id, "Trade actor started");

        let delay = self.fill_delay;
        let fill_timer = async move {
            match delay {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(fill_timer);
        let mut fill_armed = delay.is_some();

        while !self.state.is_terminal() {
            tokio::select! {
                () = &mut fill_timer, if fill_armed => {
                    fill_armed = false;
                    if let Err(e) = self.fill().await {
                        tracing::error!(trade_id = %self.trade.id, error = %e, "Scheduled fill failed");
                    }
                }
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
            }
        }

        // Terminal: deregister first so no new commands are routed here, then
        // answer anything already queued.
        self.registry.remove(&self.trade.id).await;
        while let Ok(cmd) = self.rx.try_recv() {
            self.handle(cmd).await;
        }
        tracing::debug!(trade_id = %self.trade.id, state = %self.state, "Trade actor finished");
    }

    async fn handle(&mut self, cmd: TradeCommand) {
        match cmd {
            TradeCommand::ConfirmFill(reply) => {
                let _ = reply.send(self.fill().await);
            }
            TradeCommand::Cancel(reply) => {
                let _ = reply.send(self.cancel().await);
            }
            TradeCommand::GetState(reply) => {
                let _ = reply.send(self.state);
            }
        }
    }

    fn terminal_error(&self) -> Error {
        Error::TerminalState {
            id: self.trade.id.clone(),
            status: self.state.as_status(),
        }
    }

    /// `PendingFill → Filled`: creates the trade's one position. The audit
    /// entry is written before anything commits; duplicate fill signals land
    /// here sequentially and the state guard turns them away.
    async fn fill(&mut self) -> Result<Position> {
        if !self.state.can_transition(LifecycleState::Filled) {
            return Err(self.terminal_error());
        }

        self.audit
            .record(
                AuditRecord::new(
                    AuditEvent::TradeFilled,
                    AuditStatus::Success,
                    self.trade.spread.display_name(),
                )
                .for_trade(&self.trade.id),
            )
            .await?;

        let filled = self
            .store
            .update_trade_status(&self.trade.id, TradeStatus::Filled, Some(Utc::now()))
            .await?;
        self.trade = filled;

        let margin = self.model.margin_required(&self.trade.spread);
        let delta = self.model.fill_delta(&self.trade.spread);
        let position = self
            .store
            .create_position(&self.trade, self.trade.credit, delta, margin)
            .await;
        self.store.adjust_margin(margin).await;

        self.state = LifecycleState::Filled;
        tracing::info!(
            trade_id = %self.trade.id,
            position_id = %position.id,
            margin = %margin,
            "Trade filled"
        );
        let _ = self.event_tx.send(EngineEvent::TradeFilled {
            trade_id: self.trade.id.clone(),
            position_id: position.id.clone(),
        });

        Ok(position)
    }

    /// `PendingFill → Cancelled`. Once filled there are no take-backs.
    async fn cancel(&mut self) -> Result<Trade> {
        if !self.state.can_transition(LifecycleState::Cancelled) {
            return Err(self.terminal_error());
        }

        self.audit
            .record(
                AuditRecord::new(
                    AuditEvent::TradeCancelled,
                    AuditStatus::Success,
                    self.trade.spread.display_name(),
                )
                .for_trade(&self.trade.id),
            )
            .await?;

        let cancelled = self
            .store
            .update_trade_status(&self.trade.id, TradeStatus::Cancelled, None)
            .await?;
        self.trade = cancelled.clone();
        self.state = LifecycleState::Cancelled;

        tracing::info!(trade_id = %self.trade.id, "Trade cancelled before fill");
        let _ = self.event_tx.send(EngineEvent::TradeCancelled {
            trade_id: self.trade.id.clone(),
        });

        Ok(cancelled)
    }
}
