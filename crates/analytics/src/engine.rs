use crate::drawdown::{daily_drawdown, max_drawdown};
use crate::objectives::profit_percentage;
use crate::trading_days::count_trading_days;
use crate::types::{SnapshotInputs, TradeStats};
use core_types::{ClassifiedTrade, EquitySample, MetricsSnapshot};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// The engine responsible for turning bridge data into a canonical metrics snapshot.
#[derive(Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a snapshot from whatever the bridge delivered.
    ///
    /// `max_daily_drawdown` is set to this evaluation's daily drawdown; merging it with
    /// the account's history is the caller's job.
    pub fn assemble(&self, inputs: SnapshotInputs<'_>) -> MetricsSnapshot {
        let platform = inputs.platform;
        let (balance, equity) = match inputs.account {
            Some(state) => (state.balance, state.equity),
            None => latest_balance_and_equity(inputs.equity),
        };

        // Local trade statistics win whenever trade records exist; the platform's
        // aggregates only fill in when the trade fetch came back empty.
        let stats = if inputs.trades.is_empty() {
            platform_trade_stats(inputs)
        } else {
            self.trade_stats(inputs.trades)
        };

        let win_rate = if stats.total > 0 {
            stats.won as f64 / stats.total as f64 * 100.0
        } else {
            0.0
        };
        let average_rrr = if stats.average_loss.is_zero() {
            0.0
        } else {
            (stats.average_win / stats.average_loss).abs().to_f64().unwrap_or(0.0)
        };

        let daily = if inputs.equity.is_empty() {
            platform.relative_drawdown.unwrap_or(0.0).clamp(0.0, 100.0)
        } else {
            daily_drawdown(inputs.equity)
        };
        let lifetime = platform
            .max_drawdown
            .map(|dd| dd.clamp(0.0, 100.0))
            .unwrap_or_else(|| max_drawdown(inputs.equity));

        MetricsSnapshot {
            balance,
            equity,
            open_profit: equity - balance,
            trades: stats.total,
            won_trades: stats.won,
            lost_trades: stats.lost,
            average_win: stats.average_win,
            average_loss: stats.average_loss,
            expectancy: stats.expectancy,
            profit_factor: stats.profit_factor,
            max_drawdown: lifetime,
            daily_drawdown: daily,
            max_daily_drawdown: daily,
            lots: stats.lots,
            commissions: stats.commissions,
            win_rate,
            average_rrr,
            trading_days: count_trading_days(inputs.trades, platform.trading_days, stats.total),
            profit_percentage: profit_percentage(balance, inputs.starting_balance),
        }
    }

    /// Calculates win/loss statistics over the real, closed trades.
    pub fn trade_stats(&self, trades: &[ClassifiedTrade]) -> TradeStats {
        let closed: Vec<&ClassifiedTrade> = trades
            .iter()
            .filter(|t| t.is_real && !t.trade.is_open)
            .collect();

        let mut stats = TradeStats {
            total: closed.len() as u32,
            ..Default::default()
        };
        if closed.is_empty() {
            return stats;
        }

        for t in &closed {
            let pnl = t.trade.profit;
            if pnl > dec!(0) {
                stats.won += 1;
                stats.gross_profit += pnl;
            } else if pnl < dec!(0) {
                stats.lost += 1;
                stats.gross_loss += pnl;
            }
            stats.lots += t.trade.volume;
            stats.commissions += t.trade.commission;
        }

        if stats.won > 0 {
            stats.average_win = stats.gross_profit / Decimal::from(stats.won);
        }
        if stats.lost > 0 {
            stats.average_loss = stats.gross_loss / Decimal::from(stats.lost);
        }
        stats.expectancy = (stats.gross_profit + stats.gross_loss) / Decimal::from(stats.total);
        stats.profit_factor = if stats.gross_loss < dec!(0) {
            (stats.gross_profit / stats.gross_loss.abs()).to_f64()
        } else {
            None
        };

        stats
    }
}

fn platform_trade_stats(inputs: SnapshotInputs<'_>) -> TradeStats {
    let p = inputs.platform;
    TradeStats {
        total: p.trades.unwrap_or(0),
        won: p.won_trades.unwrap_or(0),
        lost: p.lost_trades.unwrap_or(0),
        average_win: p.average_win.unwrap_or_default(),
        average_loss: p.average_loss.unwrap_or_default(),
        expectancy: p.expectancy.unwrap_or_default(),
        profit_factor: p.profit_factor.filter(|pf| pf.is_finite()),
        lots: p.lots.unwrap_or_default(),
        commissions: p.commissions.unwrap_or_default(),
        ..Default::default()
    }
}

/// Balance and equity of the most recent equity bucket, for when the account state
/// itself could not be fetched.
fn latest_balance_and_equity(samples: &[EquitySample]) -> (Decimal, Decimal) {
    let Some(latest) = samples.iter().max_by_key(|s| s.end_time) else {
        return (dec!(0), dec!(0));
    };
    let balance = latest
        .end_balance
        .or(latest.average_balance)
        .or(latest.start_balance)
        .unwrap_or_default();
    let equity = latest.current_equity().unwrap_or(balance);
    (balance, equity)
}
