use signal_core::{Bar, TradeSignal};

/// Volume-Weighted Average Price for a session
pub fn vwap(bars: &[Bar]) -> f64 {
    let mut tpv_sum = 0.0;
    let mut volume_sum = 0.0;

    for bar in bars {
        let typical_price = (bar.high + bar.low + bar.close) / 3.0;
        tpv_sum += typical_price * bar.volume;
        volume_sum += bar.volume;
    }

    if volume_sum > 0.0 {
        tpv_sum / volume_sum
    } else {
        0.0
    }
}

/// Relative Strength Index, simple average over the last `period` changes.
/// Returns the neutral 50 when the series is too short.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let tail = &deltas[deltas.len() - period..];

    let avg_gain = tail.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss = tail.iter().filter(|d| **d < 0.0).map(|d| -d).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Exponential Moving Average seeded at the first price.
/// Falls back to the last price when the series is shorter than `period`.
pub fn ema(prices: &[f64], period: usize) -> f64 {
    let last = match prices.last() {
        Some(last) => *last,
        None => return 0.0,
    };
    if prices.len() < period {
        return last;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema = prices[0];
    for price in &prices[1..] {
        ema = (price - ema) * multiplier + ema;
    }
    ema
}

/// Opening Range Breakout: the first `range_bars` bars define the range,
/// a close beyond it within the following five bars confirms the break.
pub fn opening_range_break(bars: &[Bar], range_bars: usize) -> TradeSignal {
    if bars.len() < range_bars + 5 {
        return TradeSignal::Hold;
    }

    let opening_high = bars[..range_bars]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let opening_low = bars[..range_bars]
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);

    for bar in &bars[range_bars..range_bars + 5] {
        if bar.close > opening_high {
            return TradeSignal::Buy;
        } else if bar.close < opening_low {
            return TradeSignal::Sell;
        }
    }

    TradeSignal::Hold
}

/// Session support and resistance taken as the extreme low and high of the window.
pub fn support_resistance(bars: &[Bar]) -> (f64, f64) {
    if bars.is_empty() {
        return (0.0, 0.0);
    }

    let support = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let resistance = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    (support, resistance)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
