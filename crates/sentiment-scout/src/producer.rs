use async_trait::async_trait;
use signal_core::{
    MarketInputs, NewsCategory, RuleTally, SignalError, SignalProducer, SignalResult, TradeSignal,
    TradeType,
};

const DOMINANCE: f64 = 1.3;
const BASE_CONFIDENCE: u32 = 40;

/// Macro and flow sentiment: institutional flows, global futures,
/// premarket gap, crude, currency, news tone and the volatility index.
///
/// Absent sentiment data is an opinion ("no opinion", HOLD at 50),
/// not a failure, unlike the data-starved abstains elsewhere.
pub struct SentimentScoutProducer;

#[async_trait]
impl SignalProducer for SentimentScoutProducer {
    fn id(&self) -> &'static str {
        "sentiment_scout"
    }

    fn trade_type(&self) -> TradeType {
        TradeType::Both
    }

    async fn evaluate(
        &self,
        symbol: &str,
        inputs: &MarketInputs,
    ) -> Result<SignalResult, SignalError> {
        let sentiment = match &inputs.sentiment {
            Some(sentiment) => sentiment,
            None => {
                return Ok(SignalResult::new(
                    self.id(),
                    TradeSignal::Hold,
                    50.0,
                    "No sentiment data - neutral stance",
                    serde_json::json!({}),
                    self.trade_type(),
                ));
            }
        };

        let fii_flow = sentiment.fii_net_flow.unwrap_or(0.0);
        let dii_flow = sentiment.dii_net_flow.unwrap_or(0.0);
        let dow_futures = sentiment.dow_futures_pct.unwrap_or(0.0);
        let nasdaq_futures = sentiment.nasdaq_futures_pct.unwrap_or(0.0);
        let sgx_nifty = sentiment.sgx_nifty_gap.unwrap_or(0.0);
        let crude = sentiment.crude_price.unwrap_or(0.0);
        let inr_usd = sentiment.usdinr.unwrap_or(83.0);
        let vix = sentiment.vix.unwrap_or(15.0);
        let (news_category, news_score, breaking) = match &sentiment.news {
            Some(news) => (
                news.category,
                news.score,
                news.breaking_headline.clone().unwrap_or_default(),
            ),
            None => (NewsCategory::Neutral, 0.0, String::new()),
        };

        let mut tally = RuleTally::new();

        // 1. Institutional flows (rupees crore)
        if fii_flow > 500.0 {
            tally.vote(
                TradeSignal::Buy,
                15,
                format!("Strong FII buying: ₹{fii_flow} Cr"),
            );
        } else if fii_flow < -500.0 {
            tally.vote(
                TradeSignal::Sell,
                15,
                format!("Strong FII selling: ₹{} Cr", fii_flow.abs()),
            );
        }

        if fii_flow > 0.0 && dii_flow < 0.0 {
            tally.vote(
                TradeSignal::Hold,
                5,
                "FII buying vs DII selling - mixed signals",
            );
        } else if fii_flow < 0.0 && dii_flow > 0.0 {
            tally.vote(
                TradeSignal::Buy,
                10,
                "DII absorbing FII selling - local support",
            );
        }

        // 2. Global cues
        if dow_futures > 0.5 && nasdaq_futures > 0.5 {
            tally.vote(
                TradeSignal::Buy,
                10,
                format!("US futures up: Dow {dow_futures}%, NQ {nasdaq_futures}%"),
            );
        } else if dow_futures < -0.5 && nasdaq_futures < -0.5 {
            tally.vote(
                TradeSignal::Sell,
                10,
                format!("US futures down: Dow {dow_futures}%, NQ {nasdaq_futures}%"),
            );
        }

        if sgx_nifty > 50.0 {
            tally.vote(
                TradeSignal::Buy,
                15,
                format!("SGX Nifty +{sgx_nifty} points - positive premarket"),
            );
        } else if sgx_nifty < -50.0 {
            tally.vote(
                TradeSignal::Sell,
                15,
                format!("SGX Nifty {sgx_nifty} points - negative premarket"),
            );
        }

        // 3. Crude impact on the import bill
        if crude > 85.0 {
            tally.vote(
                TradeSignal::Sell,
                10,
                format!("High crude ${crude} - import bill pressure"),
            );
        } else if crude < 70.0 {
            tally.vote(
                TradeSignal::Buy,
                10,
                format!("Low crude ${crude} - positive for India"),
            );
        }

        // 4. Currency
        if inr_usd > 84.0 {
            tally.vote(
                TradeSignal::Sell,
                10,
                format!("Weak INR {inr_usd} - capital flight risk"),
            );
        } else if inr_usd < 82.0 {
            tally.vote(
                TradeSignal::Buy,
                10,
                format!("Strong INR {inr_usd} - positive for flows"),
            );
        }

        // 5. News tone, with breaking-headline keywords as fallback
        let breaking_lower = breaking.to_lowercase();
        if news_category == NewsCategory::Positive && news_score > 0.6 {
            tally.vote(
                TradeSignal::Buy,
                15,
                format!("Positive news sentiment: {:.0}%", news_score * 100.0),
            );
        } else if news_category == NewsCategory::Negative && news_score < -0.6 {
            tally.vote(
                TradeSignal::Sell,
                15,
                format!("Negative news sentiment: {:.0}%", news_score.abs() * 100.0),
            );
        } else if breaking_lower.contains("rate cut") {
            tally.vote(TradeSignal::Buy, 20, "Rate cut news - bullish for equities");
        } else if breaking_lower.contains("rate hike") {
            tally.vote(TradeSignal::Sell, 20, "Rate hike news - bearish for equities");
        }

        // 6. Volatility regime
        if vix > 20.0 {
            tally.vote(TradeSignal::Hold, 5, format!("High VIX {vix} - caution advised"));
        } else if vix < 12.0 {
            tally.vote(
                TradeSignal::Buy,
                10,
                format!("Low VIX {vix} - complacency, opportunity for breakout"),
            );
        }

        let (signal, confidence) = tally.resolve(DOMINANCE, BASE_CONFIDENCE);
        tracing::debug!(
            "sentiment_scout {}: buy={} sell={} -> {}",
            symbol,
            tally.buy_score(),
            tally.sell_score(),
            signal.as_label()
        );

        let reasoning = if tally.is_empty() {
            "Neutral sentiment - no strong signals".to_string()
        } else {
            tally.reasoning()
        };

        let metadata = serde_json::json!({
            "fii_flow": fii_flow,
            "dii_flow": dii_flow,
            "dow_futures": dow_futures,
            "nasdaq_futures": nasdaq_futures,
            "sgx_nifty": sgx_nifty,
            "crude_usd": crude,
            "inr_usd": inr_usd,
            "news_sentiment": news_category,
            "news_score": news_score,
            "vix": vix,
        });

        Ok(SignalResult::new(
            self.id(),
            signal,
            confidence,
            reasoning,
            metadata,
            self.trade_type(),
        ))
    }
}
