use orca_core::{Position, Result, Trade};
use tokio::sync::oneshot;

use crate::lifecycle::LifecycleState;

/// Commands a trade's actor accepts. Each carries a reply channel; the actor
/// processes them strictly in order, which is what makes every trade
/// single-writer.
#[derive(Debug)]
pub enum TradeCommand {
    /// External fill confirmation (the live-broker ack path).
    ConfirmFill(oneshot::Sender<Result<Position>>),
    /// Administrative cancellation of a pending fill.
    Cancel(oneshot::Sender<Result<Trade>>),
    /// Current lifecycle state.
    GetState(oneshot::Sender<LifecycleState>),
}
