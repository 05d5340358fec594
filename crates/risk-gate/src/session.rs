use chrono::{DateTime, Utc};
use signal_core::TradeType;
use std::collections::HashMap;

/// Contract lots carried per underlying unit in realized P&L math.
const PNL_LOT_MULTIPLIER: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub trade_type: TradeType,
    pub lots: u32,
    pub entry_price: f64,
    pub last_trade_time: DateTime<Utc>,
}

/// Running risk state for the trading day: realized P&L, trade count
/// and the open book. Reset by the daily rollover; open positions
/// survive the reset.
#[derive(Debug, Default)]
pub struct RiskSession {
    pub daily_pnl: f64,
    pub daily_trades: u32,
    positions: HashMap<String, OpenPosition>,
}

impl RiskSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, symbol: &str) -> Option<&OpenPosition> {
        self.positions.get(symbol)
    }

    pub fn open_symbols(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(|s| s.as_str())
    }

    /// Record a fill: bumps the day's trade count and restarts the
    /// symbol's cooling-period clock.
    pub fn update_position(
        &mut self,
        symbol: &str,
        trade_type: TradeType,
        lots: u32,
        entry_price: f64,
    ) {
        self.update_position_at(symbol, trade_type, lots, entry_price, Utc::now());
    }

    pub fn update_position_at(
        &mut self,
        symbol: &str,
        trade_type: TradeType,
        lots: u32,
        entry_price: f64,
        at: DateTime<Utc>,
    ) {
        self.daily_trades += 1;
        self.positions.insert(
            symbol.to_string(),
            OpenPosition {
                trade_type,
                lots,
                entry_price,
                last_trade_time: at,
            },
        );
    }

    /// Close out a symbol, realizing its P&L into the daily total.
    /// Returns the realized amount when the symbol was actually open.
    pub fn close_position(&mut self, symbol: &str, exit_price: f64) -> Option<f64> {
        let position = self.positions.remove(symbol)?;
        let pnl = (exit_price - position.entry_price) * position.lots as f64 * PNL_LOT_MULTIPLIER;
        self.daily_pnl += pnl;
        Some(pnl)
    }

    pub fn reset_daily(&mut self) {
        self.daily_pnl = 0.0;
        self.daily_trades = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_bump_trade_count_and_stamp_clock() {
        let mut session = RiskSession::new();
        session.update_position("NIFTY", TradeType::Intraday, 2, 150.0);
        session.update_position("BANKNIFTY", TradeType::Intraday, 1, 300.0);

        assert_eq!(session.daily_trades, 2);
        assert!(session.position("NIFTY").is_some());
        assert_eq!(session.open_symbols().count(), 2);
    }

    #[test]
    fn closing_realizes_pnl() {
        let mut session = RiskSession::new();
        session.update_position("NIFTY", TradeType::Intraday, 2, 150.0);

        let pnl = session.close_position("NIFTY", 160.0);
        // (160 - 150) * 2 lots * 50
        assert_eq!(pnl, Some(1000.0));
        assert_eq!(session.daily_pnl, 1000.0);
        assert!(session.position("NIFTY").is_none());

        assert_eq!(session.close_position("NIFTY", 170.0), None);
    }

    #[test]
    fn rollover_clears_counters_but_not_the_book() {
        let mut session = RiskSession::new();
        session.update_position("NIFTY", TradeType::Swing, 1, 150.0);
        session.update_position("TCS", TradeType::Swing, 1, 3900.0);
        session.close_position("TCS", 3850.0);

        session.reset_daily();
        assert_eq!(session.daily_pnl, 0.0);
        assert_eq!(session.daily_trades, 0);
        assert!(session.position("NIFTY").is_some());
    }
}
