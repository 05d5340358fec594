use async_trait::async_trait;
use signal_core::{
    MarketInputs, RuleTally, SignalError, SignalProducer, SignalResult, TradeSignal, TradeType,
};

use crate::indicators::{ema, mean, rsi, support_resistance};

const DOMINANCE: f64 = 1.4;
const BASE_CONFIDENCE: u32 = 45;
const MIN_DAILY_BARS: usize = 20;

/// Multi-day positioning: EMA trend alignment, 20-day extremes,
/// accumulation/distribution volume and RSI reversal confirmation.
/// Also labels the option structure that fits the trend/IV regime.
pub struct SwingStrategyProducer;

/// Option structure for a trend/volatility combination. Rich IV favors
/// credit spreads, cheap IV favors outright longs.
pub fn suggest_spread(price: f64, iv: f64, ema20: f64, ema50: f64) -> &'static str {
    let bullish = price > ema20 && ema20 > ema50;
    let bearish = price < ema20 && ema20 < ema50;
    let high_iv = iv > 25.0;

    match (bullish, bearish, high_iv) {
        (true, _, false) => "Long Call or Bull Call Spread",
        (true, _, true) => "Bull Put Spread (credit)",
        (_, true, false) => "Long Put or Bear Put Spread",
        (_, true, true) => "Bear Call Spread (credit)",
        _ => "Iron Condor (neutral)",
    }
}

#[async_trait]
impl SignalProducer for SwingStrategyProducer {
    fn id(&self) -> &'static str {
        "swing_strategy"
    }

    fn trade_type(&self) -> TradeType {
        TradeType::Swing
    }

    async fn evaluate(
        &self,
        symbol: &str,
        inputs: &MarketInputs,
    ) -> Result<SignalResult, SignalError> {
        let market = match &inputs.market {
            Some(market) => market,
            None => {
                return Ok(SignalResult::abstain(
                    self.id(),
                    "No market data provided for swing analysis",
                    self.trade_type(),
                ));
            }
        };

        let bars = &market.daily;
        if bars.len() < MIN_DAILY_BARS {
            return Ok(SignalResult::abstain(
                self.id(),
                "Insufficient daily data for swing analysis",
                self.trade_type(),
            ));
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let current_price = closes[closes.len() - 1];

        let mut tally = RuleTally::new();

        // 1. Trend alignment on the higher timeframe
        let ema20 = ema(&closes, 20);
        let ema50 = if closes.len() >= 50 {
            ema(&closes, 50)
        } else {
            ema20
        };

        if current_price > ema20 && ema20 > ema50 {
            tally.vote(TradeSignal::Buy, 25, "Bullish trend: Price > EMA20 > EMA50");
        } else if current_price < ema20 && ema20 < ema50 {
            tally.vote(TradeSignal::Sell, 25, "Bearish trend: Price < EMA20 < EMA50");
        } else {
            tally.vote(TradeSignal::Hold, 5, "Mixed trend signals");
        }

        // 2. 20-day extremes as weekly levels
        let (weekly_low, weekly_high) = support_resistance(&bars[bars.len() - 20..]);

        if (current_price - weekly_low).abs() / weekly_low < 0.02 {
            tally.vote(
                TradeSignal::Buy,
                20,
                format!("Near weekly support {weekly_low:.2}"),
            );
        } else if (current_price - weekly_high).abs() / weekly_high < 0.02 {
            tally.vote(
                TradeSignal::Sell,
                20,
                format!("Near weekly resistance {weekly_high:.2}"),
            );
        }

        // 3. Accumulation vs distribution
        let avg_volume = mean(&volumes[volumes.len() - 20..]);
        let recent_volume = mean(&volumes[volumes.len() - 5..]);

        if recent_volume > avg_volume * 1.3 {
            if closes[closes.len() - 1] > closes[closes.len() - 5] {
                tally.vote(
                    TradeSignal::Buy,
                    15,
                    "High volume + price rise = accumulation",
                );
            } else {
                tally.vote(
                    TradeSignal::Sell,
                    15,
                    "High volume + price drop = distribution",
                );
            }
        }

        // 4. RSI with short-term reversal confirmation
        let rsi_value = rsi(&closes, 14);
        let recent_mean = mean(&closes[closes.len() - 5..]);
        if rsi_value < 30.0 && current_price > recent_mean {
            tally.vote(
                TradeSignal::Buy,
                20,
                format!("RSI {rsi_value:.1} oversold with price recovery"),
            );
        } else if rsi_value > 70.0 && current_price < recent_mean {
            tally.vote(
                TradeSignal::Sell,
                20,
                format!("RSI {rsi_value:.1} overbought with price weakness"),
            );
        }

        // 5. Option structure for the regime
        let iv = inputs
            .option_chain
            .as_ref()
            .and_then(|chain| chain.iv_current)
            .unwrap_or(20.0);
        let spread = suggest_spread(current_price, iv, ema20, ema50);

        let (signal, confidence) = tally.resolve(DOMINANCE, BASE_CONFIDENCE);
        tracing::debug!(
            "swing_strategy {}: buy={} sell={} -> {}",
            symbol,
            tally.buy_score(),
            tally.sell_score(),
            signal.as_label()
        );

        let metadata = serde_json::json!({
            "current_price": current_price,
            "ema20": ema20,
            "ema50": ema50,
            "weekly_high": weekly_high,
            "weekly_low": weekly_low,
            "avg_volume": avg_volume,
            "recent_volume": recent_volume,
            "rsi": rsi_value,
            "suggested_spread": spread,
        });

        Ok(SignalResult::new(
            self.id(),
            signal,
            confidence,
            tally.reasoning(),
            metadata,
            self.trade_type(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use signal_core::{Bar, MarketData};

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

    fn market(daily: Vec<Bar>) -> MarketInputs {
        let spot = daily.last().map(|b| b.close).unwrap_or(0.0);
        MarketInputs {
            market: Some(MarketData {
                symbol: "NIFTY".to_string(),
                spot_price: spot,
                intraday: Vec::new(),
                daily,
                support_levels: Vec::new(),
                resistance_levels: Vec::new(),
                as_of: Utc::now(),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_market_abstains() {
        let result = SwingStrategyProducer
            .evaluate("NIFTY", &MarketInputs::default())
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::NoSignal);
        assert_eq!(result.reasoning, "No market data provided for swing analysis");
    }

    #[tokio::test]
    async fn thin_daily_history_abstains() {
        let daily: Vec<Bar> = (0..10).map(|_| bar(101.0, 99.0, 100.0, 1000.0)).collect();
        let result = SwingStrategyProducer
            .evaluate("NIFTY", &market(daily))
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::NoSignal);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.reasoning, "Insufficient daily data for swing analysis");
    }

    #[tokio::test]
    async fn aligned_uptrend_votes_buy() {
        // steadily rising closes; one old spike keeps the 20-day high
        // far enough away that no resistance vote fires
        let daily: Vec<Bar> = (0..60)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.5;
                let high = if i == 50 { 150.0 } else { close };
                bar(high, close - 0.1, close, 1000.0)
            })
            .collect();

        let result = SwingStrategyProducer
            .evaluate("NIFTY", &market(daily))
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::Buy);
        assert_eq!(result.confidence, 70.0);
        assert_eq!(result.reasoning, "Bullish trend: Price > EMA20 > EMA50");
        assert_eq!(
            result.metadata["suggested_spread"],
            "Long Call or Bull Call Spread"
        );
    }

    #[tokio::test]
    async fn dip_onto_weekly_support_votes_buy() {
        let mut daily: Vec<Bar> = (0..25).map(|_| bar(102.0, 99.5, 100.0, 1000.0)).collect();
        for close in [99.6, 99.3, 99.0, 98.7, 98.5] {
            daily.push(bar(close + 2.0, close - 0.5, close, 1000.0));
        }

        let result = SwingStrategyProducer
            .evaluate("NIFTY", &market(daily))
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::Buy);
        assert_eq!(result.confidence, 65.0);
        assert!(result.reasoning.contains("Mixed trend signals"));
        assert!(result.reasoning.contains("Near weekly support 98.00"));
    }

    #[tokio::test]
    async fn volume_surge_with_rising_price_reads_accumulation() {
        let mut daily: Vec<Bar> = (0..20).map(|_| bar(103.0, 97.0, 100.0, 1000.0)).collect();
        daily.extend((0..4).map(|_| bar(103.0, 97.0, 100.0, 3000.0)));
        daily.push(bar(103.5, 97.0, 100.5, 3000.0));

        let result = SwingStrategyProducer
            .evaluate("NIFTY", &market(daily))
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::Buy);
        assert_eq!(result.confidence, 60.0);
        assert!(result.reasoning.contains("accumulation"));
    }

    #[test]
    fn spread_table_covers_all_regimes() {
        // bullish stack, cheap then rich IV
        assert_eq!(
            suggest_spread(110.0, 20.0, 105.0, 100.0),
            "Long Call or Bull Call Spread"
        );
        assert_eq!(
            suggest_spread(110.0, 30.0, 105.0, 100.0),
            "Bull Put Spread (credit)"
        );
        // bearish stack
        assert_eq!(
            suggest_spread(90.0, 20.0, 95.0, 100.0),
            "Long Put or Bear Put Spread"
        );
        assert_eq!(
            suggest_spread(90.0, 30.0, 95.0, 100.0),
            "Bear Call Spread (credit)"
        );
        // no alignment
        assert_eq!(suggest_spread(100.0, 20.0, 101.0, 99.0), "Iron Condor (neutral)");
    }
}
