//! Error taxonomy shared across the workspace.

use thiserror::Error;

use crate::types::TradeStatus;

/// Broker-side failures, split by whether a retry can help. Transient
/// failures are retried inside the provider; permanent failures propagate to
/// the lifecycle engine as a terminal rejection.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("transient broker failure: {reason}")]
    Transient { reason: String },

    #[error("order rejected by broker: {reason}")]
    Permanent { reason: String },
}

impl ProviderError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// A structural invariant of the proposal is violated. Raised before any
    /// rule runs; nothing was submitted, so nothing is audited.
    #[error("malformed proposal: {reason}")]
    MalformedProposal { reason: String },

    #[error("unknown trade {id}")]
    UnknownTrade { id: String },

    #[error("unknown position {id}")]
    UnknownPosition { id: String },

    /// The trade already reached a terminal state; no further transitions.
    #[error("trade {id} is {status} and cannot change state")]
    TerminalState { id: String, status: TradeStatus },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// An un-audited transition must not commit, so a failed append aborts
    /// the operation that triggered it.
    #[error("audit write failed: {reason}")]
    AuditWrite { reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_permanent_are_distinguished() {
        let transient = ProviderError::Transient {
            reason: "timeout".to_string(),
        };
        let permanent = ProviderError::Permanent {
            reason: "insufficient buying power".to_string(),
        };
        assert!(transient.is_transient());
        assert!(!permanent.is_transient());
    }

    #[test]
    fn terminal_state_message_names_the_status() {
        let err = Error::TerminalState {
            id: "T-7".to_string(),
            status: TradeStatus::Filled,
        };
        assert_eq!(err.to_string(), "trade T-7 is filled and cannot change state");
    }
}
