//! Seed data for the paper environment: a demo account, the default rule
//! set, and option chains for a few liquid underlyings.

use std::collections::HashMap;

use chrono::{Days, Utc};
use orca_core::{AccountSnapshot, OptionChain, OptionQuote, OptionRight, RiskRules};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn demo_account() -> AccountSnapshot {
    AccountSnapshot {
        account_id: "DU1234567".to_string(),
        net_liquidation: dec!(50000),
        buying_power: dec!(100000),
        cash_balance: dec!(50000),
        margin_used: dec!(0),
    }
}

pub fn default_rules() -> RiskRules {
    RiskRules {
        name: "default".to_string(),
        version: 1,
        min_credit: dec!(0.50),
        max_loss_per_trade: dec!(2000),
        min_open_interest: 100,
        delta_cap_abs: 1.0,
        leverage_cap: 4.0,
        created_at: Utc::now(),
    }
}

pub fn demo_chains() -> HashMap<String, Vec<OptionChain>> {
    let near = Utc::now().date_naive() + Days::new(30);
    let far = Utc::now().date_naive() + Days::new(58);

    let mut chains = HashMap::new();
    chains.insert(
        "SPY".to_string(),
        vec![
            chain("SPY", dec!(450.23), near, &SPY_STRIKES),
            chain("SPY", dec!(450.23), far, &SPY_STRIKES),
        ],
    );
    chains.insert(
        "TSLA".to_string(),
        vec![chain("TSLA", dec!(242.15), near, &TSLA_STRIKES)],
    );
    chains.insert(
        "AAPL".to_string(),
        vec![chain("AAPL", dec!(187.50), near, &AAPL_STRIKES)],
    );
    chains
}

type StrikeRow = (Decimal, Decimal, f64, u64);

const SPY_STRIKES: [StrikeRow; 5] = [
    (dec!(440), dec!(0.65), -0.08, 4100),
    (dec!(445), dec!(1.00), -0.10, 3000),
    (dec!(450), dec!(2.00), -0.20, 5000),
    (dec!(455), dec!(3.40), -0.35, 2600),
    (dec!(460), dec!(5.10), -0.48, 1900),
];

const TSLA_STRIKES: [StrikeRow; 4] = [
    (dec!(230), dec!(2.10), -0.14, 1200),
    (dec!(235), dec!(3.05), -0.21, 1500),
    (dec!(240), dec!(4.30), -0.31, 2200),
    (dec!(245), dec!(6.00), -0.44, 900),
];

const AAPL_STRIKES: [StrikeRow; 4] = [
    (dec!(180), dec!(0.95), -0.11, 2800),
    (dec!(185), dec!(1.70), -0.22, 3400),
    (dec!(190), dec!(3.10), -0.41, 2100),
    (dec!(195), dec!(5.35), -0.62, 800),
];

fn chain(
    symbol: &str,
    underlying_price: Decimal,
    expiration: chrono::NaiveDate,
    strikes: &[StrikeRow],
) -> OptionChain {
    let quotes = strikes
        .iter()
        .map(|&(strike, mid, delta, open_interest)| OptionQuote {
            strike,
            right: OptionRight::Put,
            bid: mid - dec!(0.05),
            ask: mid + dec!(0.05),
            last: mid,
            delta,
            open_interest,
            volume: open_interest / 10,
        })
        .collect();

    OptionChain {
        symbol: symbol.to_string(),
        underlying_price,
        expiration,
        quotes,
    }
}
