// In crates/analytics/src/chart.rs

use core_types::{ChartPoint, ClassifiedTrade, EquitySample, TradeView};
use std::cmp::Reverse;

/// Expands each hourly bucket into a start and an end point, sorted chronologically.
///
/// Adjacent buckets share a boundary timestamp; only the first point at any given
/// timestamp is kept.
pub fn build_equity_chart(samples: &[EquitySample]) -> Vec<ChartPoint> {
    let mut points = Vec::with_capacity(samples.len() * 2);

    for sample in samples {
        let Some(end_equity) = sample.current_equity() else {
            continue;
        };
        let end_balance = sample
            .end_balance
            .or(sample.average_balance)
            .or(sample.start_balance)
            .unwrap_or(end_equity);

        points.push(ChartPoint {
            timestamp: sample.start_time,
            equity: sample.start_equity.unwrap_or(end_equity),
            balance: sample.start_balance.unwrap_or(end_balance),
        });
        points.push(ChartPoint {
            timestamp: sample.end_time,
            equity: end_equity,
            balance: end_balance,
        });
    }

    points.sort_by_key(|p| p.timestamp);
    points.dedup_by_key(|p| p.timestamp);
    points
}

/// The most recent real trades, newest first, capped at `limit`.
pub fn recent_trades(trades: &[ClassifiedTrade], limit: usize) -> Vec<TradeView> {
    let mut real: Vec<&ClassifiedTrade> = trades.iter().filter(|t| t.is_real).collect();
    real.sort_by_key(|t| Reverse(t.trade.close_time.or(t.trade.open_time)));

    real.into_iter()
        .take(limit)
        .map(|t| TradeView {
            id: t.trade.id.clone(),
            symbol: t.trade.symbol.clone(),
            direction: t.direction,
            volume: t.trade.volume,
            open_price: t.trade.open_price,
            close_price: t.trade.close_price,
            profit: t.trade.profit,
            open_time: t.trade.open_time,
            close_time: t.trade.close_time,
            commission: t.trade.commission,
            swap: t.trade.swap,
            is_open: t.trade.is_open,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::{Direction, RawTrade};
    use rust_decimal_macros::dec;

    #[test]
    fn chart_has_two_points_per_bucket_and_is_sorted() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let later = EquitySample {
            start_time: t0 + Duration::hours(2),
            end_time: t0 + Duration::hours(3),
            start_equity: Some(dec!(1010)),
            end_equity: Some(dec!(1020)),
            start_balance: Some(dec!(1000)),
            end_balance: Some(dec!(1000)),
            ..Default::default()
        };
        let earlier = EquitySample {
            start_time: t0,
            end_time: t0 + Duration::hours(1),
            start_equity: Some(dec!(1000)),
            end_equity: Some(dec!(990)),
            ..Default::default()
        };
        let empty = EquitySample {
            start_time: t0 + Duration::hours(5),
            end_time: t0 + Duration::hours(6),
            ..Default::default()
        };

        let chart = build_equity_chart(&[later, earlier, empty]);
        assert_eq!(chart.len(), 4);
        assert!(chart.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(chart[0].equity, dec!(1000));
        assert_eq!(chart[1].equity, dec!(990));
        // No balance reported: the equity stands in.
        assert_eq!(chart[1].balance, dec!(990));
        assert_eq!(chart[3].equity, dec!(1020));
    }

    #[test]
    fn shared_boundaries_are_not_duplicated() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let bucket = |h: i64, eq| EquitySample {
            start_time: t0 + Duration::hours(h),
            end_time: t0 + Duration::hours(h + 1),
            end_equity: Some(eq),
            ..Default::default()
        };
        let chart = build_equity_chart(&[bucket(0, dec!(1)), bucket(1, dec!(2))]);
        assert_eq!(chart.len(), 3);
    }

    #[test]
    fn recent_trades_are_newest_first_and_capped() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let trades: Vec<ClassifiedTrade> = (0..60)
            .map(|i| ClassifiedTrade {
                trade: RawTrade {
                    id: i.to_string(),
                    symbol: Some("EURUSD".to_string()),
                    open_time: Some(t0 + Duration::minutes(i)),
                    close_time: Some(t0 + Duration::minutes(i + 5)),
                    ..Default::default()
                },
                is_real: i % 7 != 0,
                direction: Direction::Sell,
            })
            .collect();

        let recent = recent_trades(&trades, 50);
        assert_eq!(recent.len(), 50);
        assert_eq!(recent[0].id, "59");
        assert!(recent.iter().all(|t| t.id.parse::<i64>().unwrap() % 7 != 0));
        assert_eq!(recent[0].direction, Direction::Sell);
    }
}
