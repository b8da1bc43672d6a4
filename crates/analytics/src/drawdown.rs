// In crates/analytics/src/drawdown.rs

use chrono::NaiveDate;
use core_types::EquitySample;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Worst single-day intraday drawdown across the series, in percent.
///
/// Samples are grouped by calendar day. Within a day the running high only ever rises,
/// and every sample is measured against the high seen so far that day. A day with a
/// single sample therefore contributes 0, as does an empty series.
pub fn daily_drawdown(samples: &[EquitySample]) -> f64 {
    let mut days: BTreeMap<NaiveDate, Vec<&EquitySample>> = BTreeMap::new();
    for sample in samples {
        days.entry(sample.day()).or_default().push(sample);
    }

    days.into_iter()
        .map(|(day, mut bucket)| {
            bucket.sort_by_key(|s| s.start_time);
            let worst = intraday_drawdown(&bucket);
            tracing::trace!(%day, drawdown = worst, "Computed intraday drawdown");
            worst
        })
        .fold(0.0, f64::max)
}

fn intraday_drawdown(day: &[&EquitySample]) -> f64 {
    let mut day_high: Option<Decimal> = None;
    let mut worst = 0.0_f64;

    for equity in day.iter().filter_map(|s| s.current_equity()) {
        // Non-positive equity is bad data; it neither sets the high nor counts as a drop.
        if equity <= dec!(0) {
            continue;
        }
        let high = match day_high {
            Some(h) if h >= equity => h,
            _ => {
                day_high = Some(equity);
                equity
            }
        };
        worst = worst.max(percent_below(high, equity));
    }

    worst
}

/// Lifetime peak-to-trough drawdown over the series, in percent.
///
/// Used only when the platform does not report its own lifetime figure.
pub fn max_drawdown(samples: &[EquitySample]) -> f64 {
    let mut ordered: Vec<&EquitySample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.start_time);

    let mut peak_equity = dec!(0);
    let mut worst = 0.0_f64;
    for equity in ordered.iter().filter_map(|s| s.current_equity()) {
        if equity <= dec!(0) {
            continue;
        }
        peak_equity = peak_equity.max(equity);
        worst = worst.max(percent_below(peak_equity, equity));
    }
    worst
}

/// `(high - current) / high * 100`, clamped to `[0, 100]`.
fn percent_below(high: Decimal, current: Decimal) -> f64 {
    if high <= dec!(0) {
        return 0.0;
    }
    ((high - current) / high * dec!(100))
        .to_f64()
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
}
