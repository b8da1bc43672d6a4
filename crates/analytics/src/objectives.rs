// In crates/analytics/src/objectives.rs

use core_types::{MetricsSnapshot, ObjectiveResult, ObjectiveSet, ProgramType};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Rule thresholds of a funding program. Percentages are in percent, not fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramRules {
    pub min_trading_days: u32,
    pub max_drawdown: f64,
    pub max_daily_drawdown: f64,
    pub profit_target: f64,
}

impl ProgramRules {
    pub const STANDARD: ProgramRules = ProgramRules {
        min_trading_days: 5,
        max_drawdown: 15.0,
        max_daily_drawdown: 8.0,
        profit_target: 10.0,
    };

    pub const INSTANT: ProgramRules = ProgramRules {
        min_trading_days: 5,
        max_drawdown: 12.0,
        max_daily_drawdown: 4.0,
        profit_target: 12.0,
    };

    pub const fn for_program(program: ProgramType) -> Self {
        match program {
            ProgramType::Standard => Self::STANDARD,
            ProgramType::Instant => Self::INSTANT,
        }
    }
}

/// Profit relative to the program's starting balance, in percent.
pub fn profit_percentage(balance: Decimal, starting_balance: Decimal) -> f64 {
    if starting_balance <= dec!(0) {
        return 0.0;
    }
    ((balance - starting_balance) / starting_balance * dec!(100))
        .to_f64()
        .unwrap_or(0.0)
}

/// Checks a snapshot against the program's four rules.
///
/// Drawdown rules pass while `current <= target`; trading days and profit pass once
/// `current >= target`. The daily rule is judged on the account's all-time worst day.
pub fn evaluate_objectives(
    snapshot: &MetricsSnapshot,
    program: ProgramType,
    starting_balance: Decimal,
) -> ObjectiveSet {
    let rules = ProgramRules::for_program(program);
    let profit = profit_percentage(snapshot.balance, starting_balance);

    ObjectiveSet {
        min_trading_days: at_least(snapshot.trading_days as f64, rules.min_trading_days as f64),
        max_drawdown: at_most(snapshot.max_drawdown, rules.max_drawdown),
        max_daily_drawdown: at_most(snapshot.max_daily_drawdown, rules.max_daily_drawdown),
        profit_target: at_least(profit, rules.profit_target),
    }
}

fn at_most(current: f64, target: f64) -> ObjectiveResult {
    ObjectiveResult { target, current, passed: current <= target }
}

fn at_least(current: f64, target: f64) -> ObjectiveResult {
    ObjectiveResult { target, current, passed: current >= target }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(balance: Decimal) -> MetricsSnapshot {
        MetricsSnapshot {
            balance,
            equity: balance,
            ..Default::default()
        }
    }

    #[test]
    fn lifetime_drawdown_limit_is_inclusive() {
        let mut s = snapshot(dec!(100000));
        s.max_drawdown = 15.00;
        assert!(evaluate_objectives(&s, ProgramType::Standard, dec!(100000)).max_drawdown.passed);

        s.max_drawdown = 15.01;
        assert!(!evaluate_objectives(&s, ProgramType::Standard, dec!(100000)).max_drawdown.passed);
    }

    #[test]
    fn profit_is_relative_to_starting_balance() {
        let s = snapshot(dec!(105000));
        let result = evaluate_objectives(&s, ProgramType::Standard, dec!(100000));
        assert_eq!(result.profit_target.current, 5.0);
        assert_eq!(result.profit_target.target, 10.0);
        assert!(!result.profit_target.passed);
    }

    #[test]
    fn instant_program_is_stricter_on_daily_drawdown() {
        let mut s = snapshot(dec!(100000));
        s.max_daily_drawdown = 6.2;
        assert!(evaluate_objectives(&s, ProgramType::Standard, dec!(100000)).max_daily_drawdown.passed);
        let instant = evaluate_objectives(&s, ProgramType::Instant, dec!(100000));
        assert!(!instant.max_daily_drawdown.passed);
        assert_eq!(instant.max_daily_drawdown.target, 4.0);
        assert!(instant.drawdown_breached());
    }

    #[test]
    fn trading_days_and_profit_pass_at_threshold() {
        let mut s = snapshot(dec!(112000));
        s.trading_days = 5;
        let result = evaluate_objectives(&s, ProgramType::Instant, dec!(100000));
        assert!(result.min_trading_days.passed);
        assert!(result.profit_target.passed);
        assert!(result.all_passed());

        s.trading_days = 4;
        assert!(!evaluate_objectives(&s, ProgramType::Instant, dec!(100000)).min_trading_days.passed);
    }

    #[test]
    fn zero_starting_balance_yields_zero_profit() {
        assert_eq!(profit_percentage(dec!(5000), dec!(0)), 0.0);
    }
}
