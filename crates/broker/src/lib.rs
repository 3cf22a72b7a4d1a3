//! Broker provider variants and startup selection.
//!
//! The lifecycle engine depends only on the [`BrokerProvider`] trait. Which
//! concrete variant backs it is static process configuration, resolved once
//! here and injected, never re-read per request.

pub mod client;
pub mod ibkr;
pub mod mock;

pub use ibkr::IbkrBroker;
pub use mock::MockBroker;

use std::sync::Arc;

use orca_core::{BrokerConfig, BrokerProvider, BrokerProviderKind, BrokerStatus, Result};
use orca_store::MemoryStore;

/// Resolves the configured provider and its status banner.
///
/// The connected flag is informational only: it never gates whether calls
/// are attempted.
///
/// # Errors
///
/// Returns [`orca_core::Error::Config`] if the ibkr provider is selected
/// without an account id.
pub fn select_broker(
    config: &BrokerConfig,
    store: Arc<MemoryStore>,
) -> Result<(Arc<dyn BrokerProvider>, BrokerStatus)> {
    match config.provider {
        BrokerProviderKind::Mock => {
            let status = BrokerStatus {
                provider: BrokerProviderKind::Mock,
                env: config.env,
                connected: true,
            };
            tracing::info!(env = ?config.env, "Using simulated broker");
            Ok((Arc::new(MockBroker::new(store)), status))
        }
        BrokerProviderKind::Ibkr => {
            let broker = IbkrBroker::new(config)?;
            let status = BrokerStatus {
                provider: BrokerProviderKind::Ibkr,
                env: config.env,
                connected: false,
            };
            tracing::info!(env = ?config.env, base_url = %config.base_url, "Using IBKR broker");
            Ok((Arc::new(broker), status))
        }
    }
}
