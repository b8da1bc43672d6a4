// In crates/analytics/src/trading_days.rs

use chrono::NaiveDate;
use core_types::ClassifiedTrade;
use std::collections::BTreeMap;

/// A calendar day only counts once it has at least this many real trades.
pub const MIN_TRADES_PER_DAY: usize = 2;

/// Upper bound of the estimate used when neither trades nor a reported count exist.
pub const ESTIMATE_CAP: u32 = 30;

/// Counts the calendar days (by open timestamp) with at least two real trades.
///
/// When no trade records came back at all, the platform's own count is used as-is, and
/// failing that the count is estimated as `min(total_trades / 3, 30)`.
pub fn count_trading_days(
    trades: &[ClassifiedTrade],
    reported: Option<u32>,
    total_trades: u32,
) -> u32 {
    if trades.is_empty() {
        return reported.unwrap_or_else(|| estimate_trading_days(total_trades));
    }

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for classified in trades.iter().filter(|t| t.is_real) {
        if let Some(opened) = classified.trade.open_time {
            *per_day.entry(opened.date_naive()).or_default() += 1;
        }
    }

    per_day
        .values()
        .filter(|&&count| count >= MIN_TRADES_PER_DAY)
        .count() as u32
}

pub fn estimate_trading_days(total_trades: u32) -> u32 {
    (total_trades / 3).min(ESTIMATE_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_types::{Direction, RawTrade};

    fn trade_on(day: u32, hour: u32, is_real: bool) -> ClassifiedTrade {
        ClassifiedTrade {
            trade: RawTrade {
                id: format!("{day}-{hour}"),
                symbol: Some("EURUSD".to_string()),
                open_time: Some(Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()),
                ..Default::default()
            },
            is_real,
            direction: Direction::Buy,
        }
    }

    #[test]
    fn days_need_two_real_trades() {
        let trades = vec![
            trade_on(1, 9, true),
            trade_on(1, 15, true),
            trade_on(2, 9, true),
            trade_on(3, 9, true),
            trade_on(3, 10, false),
        ];
        assert_eq!(count_trading_days(&trades, Some(99), 5), 1);
    }

    #[test]
    fn count_rises_only_when_a_day_crosses_the_threshold() {
        let mut trades = vec![trade_on(1, 9, true), trade_on(1, 10, true)];
        assert_eq!(count_trading_days(&trades, None, 0), 1);

        trades.push(trade_on(1, 11, true));
        assert_eq!(count_trading_days(&trades, None, 0), 1);

        trades.push(trade_on(2, 11, true));
        assert_eq!(count_trading_days(&trades, None, 0), 1);

        trades.push(trade_on(2, 12, true));
        assert_eq!(count_trading_days(&trades, None, 0), 2);
    }

    #[test]
    fn ledger_rows_never_count() {
        let trades = vec![trade_on(1, 9, false), trade_on(1, 10, false)];
        assert_eq!(count_trading_days(&trades, Some(4), 10), 0);
    }

    #[test]
    fn reported_count_used_verbatim_without_trades() {
        assert_eq!(count_trading_days(&[], Some(7), 100), 7);
    }

    #[test]
    fn estimate_is_a_third_of_trades_capped_at_thirty() {
        assert_eq!(count_trading_days(&[], None, 0), 0);
        assert_eq!(count_trading_days(&[], None, 17), 5);
        assert_eq!(count_trading_days(&[], None, 500), 30);
    }
}
