//! Risk rule evaluation for option spread proposals.
//!
//! The evaluator is a pure function over (proposal, rule set, account
//! snapshot): no clock, no randomness, no mutation. Every rule runs
//! unconditionally so callers always receive the complete diagnostic set.

pub mod evaluator;
pub mod model;
pub mod spread;

pub use evaluator::evaluate;
pub use model::SimplifiedPositionModel;
