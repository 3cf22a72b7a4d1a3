//! The rule evaluator.

use orca_core::{
    AccountSnapshot, Error, RiskRules, RuleName, RuleResult, SpreadConfig, ValidationOutcome,
};

use crate::spread;

/// Evaluates a proposal against the active rule set and an account snapshot.
///
/// A structurally invalid proposal fails fast with
/// [`Error::MalformedProposal`] before any rule runs. Otherwise every rule is
/// evaluated unconditionally, in a fixed order, and the verdict is the AND of
/// all results, so the caller always receives the full diagnostic set.
///
/// # Errors
///
/// Returns [`Error::MalformedProposal`] if the proposal violates its
/// structural invariants.
pub fn evaluate(
    proposal: &SpreadConfig,
    rules: &RiskRules,
    account: &AccountSnapshot,
) -> Result<ValidationOutcome, Error> {
    proposal.validate()?;

    let results = vec![
        check_net_credit(proposal, rules),
        check_max_loss(proposal, rules),
        check_open_interest(proposal, rules),
        check_delta_exposure(proposal, rules),
        check_leverage(proposal, rules, account),
    ];

    Ok(ValidationOutcome { results })
}

fn check_net_credit(proposal: &SpreadConfig, rules: &RiskRules) -> RuleResult {
    let credit = spread::net_credit(proposal);
    let passed = credit >= rules.min_credit;
    RuleResult {
        rule: RuleName::NetCredit,
        passed,
        observed: credit.to_string(),
        threshold: rules.min_credit.to_string(),
        message: if passed {
            format!("net credit {} meets minimum {}", credit, rules.min_credit)
        } else {
            format!("net credit {} below minimum {}", credit, rules.min_credit)
        },
    }
}

fn check_max_loss(proposal: &SpreadConfig, rules: &RiskRules) -> RuleResult {
    let loss = spread::max_loss(proposal);
    let passed = loss <= rules.max_loss_per_trade;
    RuleResult {
        rule: RuleName::MaxLoss,
        passed,
        observed: loss.to_string(),
        threshold: rules.max_loss_per_trade.to_string(),
        message: if passed {
            format!("max loss {} within limit {}", loss, rules.max_loss_per_trade)
        } else {
            format!("max loss {} exceeds limit {}", loss, rules.max_loss_per_trade)
        },
    }
}

fn check_open_interest(proposal: &SpreadConfig, rules: &RiskRules) -> RuleResult {
    let lowest = proposal
        .sell_leg
        .open_interest
        .min(proposal.buy_leg.open_interest);
    let passed = lowest >= rules.min_open_interest;
    RuleResult {
        rule: RuleName::OpenInterest,
        passed,
        observed: lowest.to_string(),
        threshold: rules.min_open_interest.to_string(),
        message: if passed {
            format!(
                "both legs have open interest of at least {}",
                rules.min_open_interest
            )
        } else {
            format!(
                "leg open interest {} below minimum {}",
                lowest, rules.min_open_interest
            )
        },
    }
}

fn check_delta_exposure(proposal: &SpreadConfig, rules: &RiskRules) -> RuleResult {
    let delta = spread::net_delta(proposal);
    let passed = delta.abs() <= rules.delta_cap_abs;
    RuleResult {
        rule: RuleName::DeltaExposure,
        passed,
        observed: format!("{delta:.2}"),
        threshold: format!("±{:.2}", rules.delta_cap_abs),
        message: if passed {
            format!(
                "net delta {delta:.2} within ±{:.2} band",
                rules.delta_cap_abs
            )
        } else {
            format!(
                "net delta {delta:.2} outside ±{:.2} band",
                rules.delta_cap_abs
            )
        },
    }
}

fn check_leverage(
    proposal: &SpreadConfig,
    rules: &RiskRules,
    account: &AccountSnapshot,
) -> RuleResult {
    let margin = spread::margin_required(proposal);
    let leverage = spread::projected_leverage(account, margin);
    let passed = leverage <= rules.leverage_cap;
    RuleResult {
        rule: RuleName::Leverage,
        passed,
        observed: format!("{leverage:.2}"),
        threshold: format!("{:.2}", rules.leverage_cap),
        message: if passed {
            format!(
                "projected leverage {leverage:.2} within cap {:.2}",
                rules.leverage_cap
            )
        } else {
            format!(
                "projected leverage {leverage:.2} exceeds cap {:.2}",
                rules.leverage_cap
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use orca_core::{LegAction, OptionRight, SpreadLeg, SpreadStrategy};
    use rust_decimal_macros::dec;

    fn spy_proposal() -> SpreadConfig {
        SpreadConfig {
            symbol: "SPY".to_string(),
            strategy: SpreadStrategy::PutCredit,
            sell_leg: SpreadLeg {
                strike: dec!(450),
                right: OptionRight::Put,
                action: LegAction::Sell,
                premium: dec!(2.00),
                delta: -0.20,
                open_interest: 5000,
            },
            buy_leg: SpreadLeg {
                strike: dec!(445),
                right: OptionRight::Put,
                action: LegAction::Buy,
                premium: dec!(1.00),
                delta: -0.10,
                open_interest: 3000,
            },
            quantity: 2,
            expiration: NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
        }
    }

    fn rules() -> RiskRules {
        RiskRules {
            name: "default".to_string(),
            version: 1,
            min_credit: dec!(0.50),
            max_loss_per_trade: dec!(2000),
            min_open_interest: 100,
            delta_cap_abs: 1.0,
            leverage_cap: 4.0,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn account() -> AccountSnapshot {
        AccountSnapshot {
            account_id: "DU1234567".to_string(),
            net_liquidation: dec!(50000),
            buying_power: dec!(100000),
            cash_balance: dec!(50000),
            margin_used: dec!(0),
        }
    }

    #[test]
    fn worked_example_passes_every_rule() {
        let outcome = evaluate(&spy_proposal(), &rules(), &account()).unwrap();
        assert_eq!(outcome.results.len(), 5);
        assert!(outcome.passed(), "{:?}", outcome.results);
        assert_eq!(outcome.results[0].observed, "1.00");
        assert_eq!(outcome.results[1].observed, "800.00");
    }

    #[test]
    fn low_open_interest_fails_only_rule_three() {
        let mut proposal = spy_proposal();
        proposal.buy_leg.open_interest = 50;

        let outcome = evaluate(&proposal, &rules(), &account()).unwrap();
        assert_eq!(outcome.results.len(), 5);
        assert!(!outcome.passed());

        let failed: Vec<_> = outcome.failures().map(|r| r.rule).collect();
        assert_eq!(failed, vec![RuleName::OpenInterest]);
    }

    #[test]
    fn every_rule_runs_even_after_the_first_failure() {
        let mut proposal = spy_proposal();
        // Negative credit, thin open interest, and delta outside the band.
        proposal.sell_leg.premium = dec!(0.10);
        proposal.buy_leg.premium = dec!(2.00);
        proposal.buy_leg.open_interest = 10;
        proposal.buy_leg.delta = 1.0;

        let outcome = evaluate(&proposal, &rules(), &account()).unwrap();
        assert_eq!(outcome.results.len(), 5);
        let failed = outcome.failures().count();
        assert!(failed >= 3, "expected several failures, got {failed}");
    }

    #[test]
    fn evaluation_is_deterministic_and_idempotent() {
        let proposal = spy_proposal();
        let rules = rules();
        let account = account();

        let first = evaluate(&proposal, &rules, &account).unwrap();
        let second = evaluate(&proposal, &rules, &account).unwrap();

        assert_eq!(first.results.len(), second.results.len());
        for (a, b) in first.results.iter().zip(second.results.iter()) {
            assert_eq!(a.rule, b.rule);
            assert_eq!(a.passed, b.passed);
            assert_eq!(a.observed, b.observed);
            assert_eq!(a.threshold, b.threshold);
            assert_eq!(a.message, b.message);
        }
    }

    #[test]
    fn evaluation_does_not_mutate_inputs() {
        let proposal = spy_proposal();
        let rules = rules();
        let account = account();
        let before = (proposal.clone(), rules.version, account.margin_used);

        let _ = evaluate(&proposal, &rules, &account).unwrap();

        assert_eq!(proposal, before.0);
        assert_eq!(rules.version, before.1);
        assert_eq!(account.margin_used, before.2);
    }

    #[test]
    fn malformed_proposal_fails_fast_without_rule_results() {
        let mut proposal = spy_proposal();
        proposal.quantity = 0;
        let err = evaluate(&proposal, &rules(), &account()).unwrap_err();
        assert!(matches!(err, Error::MalformedProposal { .. }));
    }

    #[test]
    fn leverage_rule_uses_existing_margin_usage() {
        let mut account = account();
        // 199_500 used + 1_000 projected = 4.01x on 50k.
        account.margin_used = dec!(199500);

        let outcome = evaluate(&spy_proposal(), &rules(), &account).unwrap();
        let leverage = &outcome.results[4];
        assert_eq!(leverage.rule, RuleName::Leverage);
        assert!(!leverage.passed);
    }

    #[test]
    fn delta_band_is_symmetric() {
        let mut tight = rules();
        tight.delta_cap_abs = 0.05;

        let outcome = evaluate(&spy_proposal(), &tight, &account()).unwrap();
        let delta = &outcome.results[3];
        assert_eq!(delta.rule, RuleName::DeltaExposure);
        assert!(!delta.passed);
    }
}
