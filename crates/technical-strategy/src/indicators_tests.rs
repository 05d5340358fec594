#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use chrono::Utc;
    use signal_core::{Bar, TradeSignal};

    fn bar(high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            timestamp: Utc::now(),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    fn flat_bars(close: f64, count: usize) -> Vec<Bar> {
        (0..count).map(|_| bar(close, close, close, 1000.0)).collect()
    }

    #[test]
    fn test_vwap_weights_by_volume() {
        let bars = vec![bar(12.0, 8.0, 10.0, 100.0), bar(22.0, 18.0, 20.0, 300.0)];
        // typical prices 10 and 20, weighted 1:3
        let result = vwap(&bars);
        assert!((result - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_vwap_zero_volume() {
        let bars = vec![bar(12.0, 8.0, 10.0, 0.0)];
        assert_eq!(vwap(&bars), 0.0);
    }

    #[test]
    fn test_rsi_short_series_is_neutral() {
        let closes = vec![100.0, 101.0, 102.0];
        assert_eq!(rsi(&closes, 14), 50.0);
    }

    #[test]
    fn test_rsi_pure_uptrend_saturates() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&closes, 14), 100.0);
    }

    #[test]
    fn test_rsi_pure_downtrend_hits_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_eq!(rsi(&closes, 14), 0.0);
    }

    #[test]
    fn test_rsi_balanced_changes_sit_midrange() {
        // alternating +1/-1 gives equal average gain and loss
        let closes: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let result = rsi(&closes, 14);
        assert!((result - 50.0).abs() < 5.0);
    }

    #[test]
    fn test_ema_short_series_returns_last() {
        let prices = vec![100.0, 105.0, 110.0];
        assert_eq!(ema(&prices, 20), 110.0);
        assert_eq!(ema(&[], 20), 0.0);
    }

    #[test]
    fn test_ema_constant_series() {
        let prices = vec![50.0; 30];
        assert!((ema(&prices, 20) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_ema_tracks_recent_prices() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let ema20 = ema(&prices, 20);
        let ema50 = ema(&prices, 50);
        // shorter period hugs the rising trend more closely
        assert!(ema20 > ema50);
        assert!(ema20 < prices[prices.len() - 1]);
    }

    #[test]
    fn test_opening_range_breakout() {
        let mut bars: Vec<Bar> = (0..5).map(|_| bar(101.0, 99.0, 100.0, 1000.0)).collect();
        bars.extend((0..2).map(|_| bar(101.0, 99.0, 100.0, 1000.0)));
        bars.push(bar(103.5, 102.0, 103.0, 1000.0)); // close above range high
        bars.extend(flat_bars(100.0, 7));

        assert_eq!(opening_range_break(&bars, 5), TradeSignal::Buy);
    }

    #[test]
    fn test_opening_range_breakdown() {
        let mut bars: Vec<Bar> = (0..5).map(|_| bar(101.0, 99.0, 100.0, 1000.0)).collect();
        bars.push(bar(99.0, 97.0, 97.5, 1000.0)); // close below range low
        bars.extend(flat_bars(100.0, 6));

        assert_eq!(opening_range_break(&bars, 5), TradeSignal::Sell);
    }

    #[test]
    fn test_opening_range_quiet_session_holds() {
        let bars = flat_bars(100.0, 12);
        assert_eq!(opening_range_break(&bars, 5), TradeSignal::Hold);
        // not enough bars to judge a break
        assert_eq!(opening_range_break(&bars[..6], 5), TradeSignal::Hold);
    }

    #[test]
    fn test_support_resistance_window_extremes() {
        let bars = vec![
            bar(100.0, 90.0, 95.0, 1000.0),
            bar(105.0, 92.0, 98.0, 1000.0),
            bar(110.0, 88.0, 102.0, 1000.0),
        ];
        assert_eq!(support_resistance(&bars), (88.0, 110.0));
        assert_eq!(support_resistance(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }
}
