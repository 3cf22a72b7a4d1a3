//! Spread arithmetic shared by the evaluator and the fill-time position
//! model. All money figures are per the standard 100-share contract
//! multiplier.

use orca_core::{AccountSnapshot, SpreadConfig};
use rust_decimal::Decimal;

const CONTRACT_MULTIPLIER: Decimal = Decimal::ONE_HUNDRED;

/// Net credit per contract: sell-leg premium minus buy-leg premium.
#[must_use]
pub fn net_credit(spread: &SpreadConfig) -> Decimal {
    spread.sell_leg.premium - spread.buy_leg.premium
}

/// Distance between the strikes.
#[must_use]
pub fn strike_width(spread: &SpreadConfig) -> Decimal {
    (spread.sell_leg.strike - spread.buy_leg.strike).abs()
}

/// Worst-case loss across the whole order:
/// (width × 100 − credit × 100) × quantity.
#[must_use]
pub fn max_loss(spread: &SpreadConfig) -> Decimal {
    (strike_width(spread) * CONTRACT_MULTIPLIER - net_credit(spread) * CONTRACT_MULTIPLIER)
        * Decimal::from(spread.quantity)
}

/// Margin requirement for the spread: width × 100 × quantity.
#[must_use]
pub fn margin_required(spread: &SpreadConfig) -> Decimal {
    strike_width(spread) * CONTRACT_MULTIPLIER * Decimal::from(spread.quantity)
}

/// Net delta exposure per spread: the sold leg's delta net of the bought
/// hedge.
#[must_use]
pub fn net_delta(spread: &SpreadConfig) -> f64 {
    spread.sell_leg.delta - spread.buy_leg.delta
}

/// Simplified fill-time delta for the whole order. The sign derives from
/// which strike is higher for the sell leg, standing in for a real
/// pricing feed.
#[must_use]
pub fn fill_delta(spread: &SpreadConfig) -> f64 {
    let per_spread = if spread.sell_leg.strike > spread.buy_leg.strike {
        -0.20
    } else {
        0.20
    };
    per_spread * f64::from(spread.quantity)
}

/// Account leverage if this spread's margin were added to current usage.
/// A zero net liquidation value reads as unbounded leverage.
#[must_use]
pub fn projected_leverage(account: &AccountSnapshot, additional_margin: Decimal) -> f64 {
    if account.net_liquidation <= Decimal::ZERO {
        return f64::INFINITY;
    }
    let projected = account.margin_used + additional_margin;
    let ratio: f64 = (projected / account.net_liquidation).try_into().unwrap_or(f64::INFINITY);
    ratio
}
