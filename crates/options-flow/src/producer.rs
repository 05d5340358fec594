use async_trait::async_trait;
use signal_core::{
    MarketInputs, RuleTally, SignalError, SignalProducer, SignalResult, TradeSignal, TradeType,
};

const DOMINANCE: f64 = 1.5;
const BASE_CONFIDENCE: u32 = 50;

/// Reads institutional positioning out of the option chain.
///
/// PCR extremes are treated as contrarian, OI buildup as confirmation,
/// IV percentile as a buy-vs-sell-premium regime switch, and max pain
/// as a magnet into expiry. The buy side must out-score the sell side
/// by 1.5x before this producer commits to a direction.
pub struct OptionsFlowProducer;

#[async_trait]
impl SignalProducer for OptionsFlowProducer {
    fn id(&self) -> &'static str {
        "options_flow"
    }

    fn trade_type(&self) -> TradeType {
        TradeType::Both
    }

    async fn evaluate(
        &self,
        symbol: &str,
        inputs: &MarketInputs,
    ) -> Result<SignalResult, SignalError> {
        let chain = match &inputs.option_chain {
            Some(chain) => chain,
            None => {
                return Ok(SignalResult::abstain(
                    self.id(),
                    "No option chain data provided",
                    self.trade_type(),
                ));
            }
        };

        let pcr = chain.pcr.unwrap_or(1.0);
        let oi_change = chain.oi_change_pct.unwrap_or(0.0);
        let iv_percentile = chain.iv_percentile.unwrap_or(50.0);
        // Missing max pain defaults to spot so the magnet rule stays silent.
        let max_pain = chain.max_pain.unwrap_or(chain.spot_price);
        let delta = chain.delta.unwrap_or(0.5);

        let mut tally = RuleTally::new();

        if pcr > 1.3 {
            tally.vote(
                TradeSignal::Buy,
                15,
                "PCR > 1.3 indicates extreme bearish sentiment - contrarian bullish",
            );
        } else if pcr < 0.7 {
            tally.vote(
                TradeSignal::Sell,
                15,
                "PCR < 0.7 indicates extreme bullish sentiment - contrarian bearish",
            );
        } else {
            tally.vote(TradeSignal::Hold, 5, "PCR in neutral zone");
        }

        if oi_change > 10.0 {
            tally.vote(
                TradeSignal::Buy,
                10,
                "Strong OI buildup suggests institutional interest",
            );
        } else if oi_change < -10.0 {
            tally.vote(TradeSignal::Sell, 10, "OI unwinding suggests weaker hands");
        }

        if iv_percentile > 80.0 {
            tally.vote(
                TradeSignal::Sell,
                10,
                "IV in top 20% - expensive options, favor selling strategies",
            );
        } else if iv_percentile < 20.0 {
            tally.vote(
                TradeSignal::Buy,
                10,
                "IV in bottom 20% - cheap options, favor buying strategies",
            );
        }

        if chain.spot_price < max_pain * 0.98 {
            tally.vote(
                TradeSignal::Buy,
                10,
                "Spot below max pain - upward magnet toward expiry",
            );
        } else if chain.spot_price > max_pain * 1.02 {
            tally.vote(
                TradeSignal::Sell,
                10,
                "Spot above max pain - downward magnet toward expiry",
            );
        }

        if delta.abs() > 0.7 {
            tally.vote(
                TradeSignal::Hold,
                5,
                "High delta - directional exposure is high",
            );
        }

        let (signal, confidence) = tally.resolve(DOMINANCE, BASE_CONFIDENCE);
        tracing::debug!(
            "options_flow {}: buy={} sell={} -> {}",
            symbol,
            tally.buy_score(),
            tally.sell_score(),
            signal.as_label()
        );

        let metadata = serde_json::json!({
            "pcr": pcr,
            "oi_change_pct": oi_change,
            "iv_current": chain.iv_current.unwrap_or(20.0),
            "iv_percentile": iv_percentile,
            "max_pain": max_pain,
            "spot_price": chain.spot_price,
            "delta": delta,
            "theta": chain.theta.unwrap_or(-0.1),
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
    use signal_core::OptionChainSnapshot;

    fn neutral_chain() -> OptionChainSnapshot {
        OptionChainSnapshot {
            symbol: "NIFTY".to_string(),
            spot_price: 22_000.0,
            pcr: Some(1.0),
            oi_change_pct: Some(0.0),
            iv_current: Some(20.0),
            iv_percentile: Some(50.0),
            max_pain: Some(22_000.0),
            delta: Some(0.5),
            theta: Some(-10.0),
            premium: Some(120.0),
            lot_size: 50,
            as_of: Utc::now(),
        }
    }

    fn inputs_with(chain: OptionChainSnapshot) -> MarketInputs {
        MarketInputs {
            option_chain: Some(chain),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn extreme_pcr_alone_yields_contrarian_buy() {
        let mut chain = neutral_chain();
        chain.pcr = Some(1.35);
        let result = OptionsFlowProducer
            .evaluate("NIFTY", &inputs_with(chain))
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::Buy);
        assert_eq!(result.confidence, 65.0);
        assert!(result.reasoning.contains("contrarian bullish"));
    }

    #[tokio::test]
    async fn missing_chain_abstains() {
        let result = OptionsFlowProducer
            .evaluate("NIFTY", &MarketInputs::default())
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::NoSignal);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.reasoning, "No option chain data provided");
    }

    #[tokio::test]
    async fn bearish_chain_stacks_sell_points() {
        let mut chain = neutral_chain();
        chain.pcr = Some(0.65);
        chain.oi_change_pct = Some(-12.0);
        let result = OptionsFlowProducer
            .evaluate("NIFTY", &inputs_with(chain))
            .await
            .unwrap();

        // 15 (PCR) + 10 (OI unwinding) on the sell side
        assert_eq!(result.signal, TradeSignal::Sell);
        assert_eq!(result.confidence, 75.0);
    }

    #[tokio::test]
    async fn neutral_chain_holds_at_base() {
        let result = OptionsFlowProducer
            .evaluate("NIFTY", &inputs_with(neutral_chain()))
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::Hold);
        assert_eq!(result.confidence, 50.0);
        assert_eq!(result.reasoning, "PCR in neutral zone");
    }

    #[tokio::test]
    async fn max_pain_magnet_votes_toward_strike() {
        let mut chain = neutral_chain();
        chain.max_pain = Some(23_000.0); // spot 22k sits >2% below
        let result = OptionsFlowProducer
            .evaluate("NIFTY", &inputs_with(chain))
            .await
            .unwrap();

        assert!(result.reasoning.contains("upward magnet"));
        assert_eq!(result.signal, TradeSignal::Buy);
    }

    #[tokio::test]
    async fn missing_max_pain_keeps_the_magnet_silent() {
        let mut chain = neutral_chain();
        chain.max_pain = None;
        let result = OptionsFlowProducer
            .evaluate("NIFTY", &inputs_with(chain))
            .await
            .unwrap();

        assert!(!result.reasoning.contains("magnet"));
        assert_eq!(result.metadata["max_pain"], 22_000.0);
    }

    #[tokio::test]
    async fn metadata_carries_chain_readings() {
        let result = OptionsFlowProducer
            .evaluate("NIFTY", &inputs_with(neutral_chain()))
            .await
            .unwrap();

        assert_eq!(result.metadata["pcr"], 1.0);
        assert_eq!(result.metadata["spot_price"], 22_000.0);
        assert_eq!(result.metadata["iv_percentile"], 50.0);
    }

    #[tokio::test]
    async fn high_delta_warns_without_flipping_direction() {
        let mut chain = neutral_chain();
        chain.pcr = Some(1.35);
        chain.delta = Some(0.85);
        let result = OptionsFlowProducer
            .evaluate("NIFTY", &inputs_with(chain))
            .await
            .unwrap();

        assert_eq!(result.signal, TradeSignal::Buy);
        assert!(result.reasoning.contains("High delta"));
    }
}
