// In crates/analytics/src/classifier.rs

use app_config::ClassifierSettings;
use core_types::{ClassifiedTrade, Direction, RawTrade};

/// Separates real market executions from ledger rows (balance operations, credits,
/// bonuses, commission-only rows and so on).
///
/// The deny list is matched as a case-insensitive substring of the broker's type tag,
/// so `BALANCE` covers both `DEAL_TYPE_BALANCE` and a bare `balance`.
#[derive(Debug, Clone)]
pub struct TradeClassifier {
    excluded: Vec<String>,
}

impl TradeClassifier {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = excluded
            .into_iter()
            .map(|m| m.as_ref().trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { excluded }
    }

    pub fn from_settings(settings: &ClassifierSettings) -> Self {
        Self::new(&settings.excluded_types)
    }

    /// Classifies one raw trade. Never fails: anything it cannot make sense of ends up
    /// with `Direction::Unknown`.
    pub fn classify(&self, trade: RawTrade) -> ClassifiedTrade {
        let tag = trade.type_tag.to_ascii_uppercase();
        let is_ledger_row = self.excluded.iter().any(|marker| tag.contains(marker.as_str()));
        let has_symbol = trade
            .symbol
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());

        ClassifiedTrade {
            is_real: !is_ledger_row && has_symbol,
            direction: direction_of(&tag),
            trade,
        }
    }

    pub fn classify_all(&self, trades: Vec<RawTrade>) -> Vec<ClassifiedTrade> {
        trades.into_iter().map(|t| self.classify(t)).collect()
    }
}

impl Default for TradeClassifier {
    fn default() -> Self {
        Self::from_settings(&ClassifierSettings::default())
    }
}

/// `BUY`, `BUY_LIMIT`, `POSITION_TYPE_BUY`... all map to buy; likewise for sell.
fn direction_of(upper_tag: &str) -> Direction {
    if upper_tag.contains("BUY") {
        Direction::Buy
    } else if upper_tag.contains("SELL") {
        Direction::Sell
    } else {
        Direction::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(type_tag: &str, symbol: Option<&str>) -> RawTrade {
        RawTrade {
            id: "1".to_string(),
            type_tag: type_tag.to_string(),
            symbol: symbol.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn balance_rows_are_excluded_regardless_of_symbol() {
        let classifier = TradeClassifier::default();
        assert!(!classifier.classify(trade("DEAL_TYPE_BALANCE", None)).is_real);
        assert!(!classifier.classify(trade("DEAL_TYPE_BALANCE", Some("EURUSD"))).is_real);
    }

    #[test]
    fn buy_limit_with_symbol_is_a_real_buy() {
        let classified = TradeClassifier::default().classify(trade("BUY_LIMIT", Some("EURUSD")));
        assert!(classified.is_real);
        assert_eq!(classified.direction, Direction::Buy);
    }

    #[test]
    fn direction_is_normalized_across_vocabularies() {
        let classifier = TradeClassifier::default();
        for tag in ["buy", "BUY_STOP", "BUY_MARKET", "POSITION_TYPE_BUY", "DEAL_TYPE_BUY"] {
            assert_eq!(classifier.classify(trade(tag, Some("XAUUSD"))).direction, Direction::Buy);
        }
        for tag in ["sell", "SELL_LIMIT", "ORDER_TYPE_SELL_STOP", "DEAL_TYPE_SELL"] {
            assert_eq!(classifier.classify(trade(tag, Some("XAUUSD"))).direction, Direction::Sell);
        }
    }

    #[test]
    fn unknown_tag_with_symbol_is_still_real() {
        let classified = TradeClassifier::default().classify(trade("SWAPPED?", Some("GBPUSD")));
        assert!(classified.is_real);
        assert_eq!(classified.direction, Direction::Unknown);
    }

    #[test]
    fn missing_or_blank_symbol_is_not_real() {
        let classifier = TradeClassifier::default();
        assert!(!classifier.classify(trade("DEAL_TYPE_BUY", None)).is_real);
        assert!(!classifier.classify(trade("DEAL_TYPE_BUY", Some("  "))).is_real);
    }

    #[test]
    fn custom_vocabulary_is_honoured() {
        let classifier = TradeClassifier::new(["rebate", ""]);
        assert!(!classifier.classify(trade("Deal_Rebate", Some("EURUSD"))).is_real);
        // The default markers are not implied by a custom list.
        assert!(classifier.classify(trade("DEAL_TYPE_BONUS", Some("EURUSD"))).is_real);
    }

    #[test]
    fn commission_only_rows_are_excluded() {
        let classifier = TradeClassifier::default();
        assert!(!classifier.classify(trade("DEAL_TYPE_COMMISSION_DAILY", Some("EURUSD"))).is_real);
        assert!(!classifier.classify(trade("DEAL_TYPE_CREDIT", Some("EURUSD"))).is_real);
        assert!(!classifier.classify(trade("DEAL_TYPE_CORRECTION", None)).is_real);
    }
}
