//! Fill-time position model.

use orca_core::{PositionModel, SpreadConfig};
use rust_decimal::Decimal;

use crate::spread;

/// The simplified placeholder model: margin is strike width × 100 ×
/// quantity, delta sign derives from which strike is higher for the sell
/// leg. Not real greeks: a pricing engine replaces this implementation
/// without touching lifecycle code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifiedPositionModel;

impl PositionModel for SimplifiedPositionModel {
    fn margin_required(&self, spread: &SpreadConfig) -> Decimal {
        spread::margin_required(spread)
    }

    fn fill_delta(&self, spread: &SpreadConfig) -> f64 {
        spread::fill_delta(spread)
    }
}
