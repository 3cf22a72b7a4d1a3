use orca_core::{Position, Result, Trade};
use tokio::sync::{mpsc, oneshot};

use crate::commands::TradeCommand;
use crate::lifecycle::LifecycleState;

/// Cloneable handle to a trade's actor. All methods return `None` when the
/// actor has already finished (terminal state reached and drained); callers
/// fall back to the stored record.
#[derive(Clone)]
pub struct TradeHandle {
    tx: mpsc::Sender<TradeCommand>,
}

impl TradeHandle {
    #[must_use]
    pub(crate) const fn new(tx: mpsc::Sender<TradeCommand>) -> Self {
        Self { tx }
    }

    pub async fn confirm_fill(&self) -> Option<Result<Position>> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(TradeCommand::ConfirmFill(tx)).await.is_err() {
            return None;
        }
        rx.await.ok()
    }

    pub async fn cancel(&self) -> Option<Result<Trade>> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(TradeCommand::Cancel(tx)).await.is_err() {
            return None;
        }
        rx.await.ok()
    }

    pub async fn state(&self) -> Option<LifecycleState> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(TradeCommand::GetState(tx)).await.is_err() {
            return None;
        }
        rx.await.ok()
    }
}
