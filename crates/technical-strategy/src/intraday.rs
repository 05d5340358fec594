use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Asia::Kolkata;
use signal_core::{
    MarketInputs, RuleTally, SignalError, SignalProducer, SignalResult, TradeSignal, TradeType,
};

use crate::indicators::{mean, opening_range_break, rsi, vwap};

const DOMINANCE: f64 = 1.3;
const BASE_CONFIDENCE: u32 = 40;

/// Session hours (IST) during which intraday entries are taken.
/// Setups near the open and close chase noise, so they are skipped.
const ENTRY_WINDOW: std::ops::Range<u32> = 10..14;

/// Intraday technicals: VWAP positioning, opening-range breakout,
/// volume confirmation, level proximity and RSI extremes.
pub struct IntradayStrategyProducer;

impl IntradayStrategyProducer {
    pub fn is_optimal_entry_time(at: DateTime<Utc>) -> bool {
        ENTRY_WINDOW.contains(&at.with_timezone(&Kolkata).hour())
    }
}

#[async_trait]
impl SignalProducer for IntradayStrategyProducer {
    fn id(&self) -> &'static str {
        "intraday_strategy"
    }

    fn trade_type(&self) -> TradeType {
        TradeType::Intraday
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
                    "No market data provided for intraday analysis",
                    self.trade_type(),
                ));
            }
        };

        let ist_hour = market.as_of.with_timezone(&Kolkata).hour();
        if !Self::is_optimal_entry_time(market.as_of) {
            return Ok(SignalResult::new(
                self.id(),
                TradeSignal::Hold,
                0.0,
                format!("Outside intraday window - current hour {ist_hour:02}:00 IST"),
                serde_json::json!({}),
                self.trade_type(),
            ));
        }

        let bars = &market.intraday;
        if bars.is_empty() {
            return Ok(SignalResult::abstain(
                self.id(),
                "No intraday OHLC data available",
                self.trade_type(),
            ));
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let current_price = closes[closes.len() - 1];

        let mut tally = RuleTally::new();

        // 1. VWAP positioning
        let session_vwap = vwap(bars);
        if current_price > session_vwap * 1.005 {
            tally.vote(
                TradeSignal::Buy,
                20,
                format!("Price {current_price:.2} above VWAP {session_vwap:.2} - bullish"),
            );
        } else if current_price < session_vwap * 0.995 {
            tally.vote(
                TradeSignal::Sell,
                20,
                format!("Price {current_price:.2} below VWAP {session_vwap:.2} - bearish"),
            );
        } else {
            tally.vote(TradeSignal::Hold, 5, "Price near VWAP - neutral");
        }

        // 2. Opening range breakout
        match opening_range_break(bars, 5) {
            TradeSignal::Buy => tally.vote(
                TradeSignal::Buy,
                25,
                "Opening Range Breakout - bullish momentum",
            ),
            TradeSignal::Sell => tally.vote(
                TradeSignal::Sell,
                25,
                "Opening Range Breakdown - bearish momentum",
            ),
            _ => {}
        }

        // 3. Volume confirmation
        let avg_volume = if volumes.len() >= 10 {
            mean(&volumes[volumes.len() - 10..])
        } else {
            mean(&volumes)
        };
        let current_volume = volumes[volumes.len() - 1];
        if closes.len() >= 2 && current_volume > avg_volume * 1.5 {
            let direction = if closes[closes.len() - 1] > closes[closes.len() - 2] {
                TradeSignal::Buy
            } else {
                TradeSignal::Sell
            };
            tally.vote(
                direction,
                15,
                format!(
                    "Volume spike {:.1}x avg - confirming",
                    current_volume / avg_volume
                ),
            );
        }

        // 4. Level proximity, nearest hit per side
        for &support in &market.support_levels {
            if (current_price - support).abs() / support < 0.005 {
                tally.vote(TradeSignal::Buy, 20, format!("Support bounce at {support}"));
                break;
            }
        }
        for &resistance in &market.resistance_levels {
            if (current_price - resistance).abs() / resistance < 0.005 {
                tally.vote(
                    TradeSignal::Sell,
                    20,
                    format!("Resistance rejection at {resistance}"),
                );
                break;
            }
        }

        // 5. RSI extremes
        let rsi_value = rsi(&closes, 14);
        if rsi_value < 30.0 {
            tally.vote(
                TradeSignal::Buy,
                10,
                format!("RSI oversold {rsi_value:.1} - potential bounce"),
            );
        } else if rsi_value > 70.0 {
            tally.vote(
                TradeSignal::Sell,
                10,
                format!("RSI overbought {rsi_value:.1} - potential pullback"),
            );
        }

        let (signal, confidence) = tally.resolve(DOMINANCE, BASE_CONFIDENCE);
        tracing::debug!(
            "intraday_strategy {}: buy={} sell={} -> {}",
            symbol,
            tally.buy_score(),
            tally.sell_score(),
            signal.as_label()
        );

        let metadata = serde_json::json!({
            "current_price": current_price,
            "vwap": session_vwap,
            "avg_volume": avg_volume,
            "current_volume": current_volume,
            "support_levels": market.support_levels,
            "resistance_levels": market.resistance_levels,
            "rsi": rsi_value,
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
