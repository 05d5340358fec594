use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use signal_core::{
    Bar, MarketData, NewsCategory, NewsSentiment, OptionChainSnapshot, SentimentSnapshot,
    SignalError,
};

use crate::retry::{retry_with_backoff, RetryPolicy};

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

const CACHE_TTL_SECS: i64 = 300; // 5 minutes

/// Stub NSE market-data source.
///
/// Shapes match the real feeds; values are plausible randoms. Swap
/// this for an nsepy/broker-backed implementation without touching
/// the producers.
pub struct NseDataFetcher {
    /// Cache option chain per symbol (5-min TTL)
    chain_cache: DashMap<String, CacheEntry<OptionChainSnapshot>>,
    /// Cache the market-wide sentiment snapshot (5-min TTL)
    sentiment_cache: DashMap<String, CacheEntry<SentimentSnapshot>>,
    retry: RetryPolicy,
}

impl NseDataFetcher {
    pub fn new() -> Self {
        Self::with_retry_policy(RetryPolicy::default())
    }

    pub fn with_retry_policy(retry: RetryPolicy) -> Self {
        Self {
            chain_cache: DashMap::new(),
            sentiment_cache: DashMap::new(),
            retry,
        }
    }

    /// Option-chain snapshot for an underlying (NIFTY, BANKNIFTY, ...).
    pub async fn get_option_chain(&self, symbol: &str) -> Result<OptionChainSnapshot, SignalError> {
        if let Some(entry) = self.chain_cache.get(symbol) {
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < CACHE_TTL_SECS {
                tracing::debug!("Option chain cache hit for {} ({}s old)", symbol, age);
                return Ok(entry.data.clone());
            }
        }

        let chain = build_option_chain(symbol);
        self.chain_cache.insert(
            symbol.to_string(),
            CacheEntry {
                data: chain.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(chain)
    }

    /// Intraday bars plus level hints; daily bars included only when a
    /// positional horizon asks for them.
    pub async fn get_market_data(
        &self,
        symbol: &str,
        include_daily: bool,
    ) -> Result<MarketData, SignalError> {
        let as_of = Utc::now();
        let spot = spot_price(symbol);

        let daily = if include_daily {
            build_daily_bars(spot, 50, as_of)
        } else {
            Vec::new()
        };

        Ok(MarketData {
            symbol: symbol.to_string(),
            spot_price: spot,
            intraday: build_intraday_bars(spot, 25, as_of),
            daily,
            support_levels: vec![spot * 0.99, spot * 0.985],
            resistance_levels: vec![spot * 1.01, spot * 1.015],
            as_of,
        })
    }

    /// Market-wide sentiment snapshot. The institutional-flows lookup
    /// runs under the bounded retry policy; its final failure is a
    /// hard error for the caller.
    pub async fn get_sentiment_data(&self) -> Result<SentimentSnapshot, SignalError> {
        if let Some(entry) = self.sentiment_cache.get("GLOBAL") {
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < CACHE_TTL_SECS {
                tracing::debug!("Sentiment cache hit ({}s old)", age);
                return Ok(entry.data.clone());
            }
        }

        let (fii, dii) = retry_with_backoff(self.retry, "institutional flows", || async {
            Ok::<_, SignalError>(sample_institutional_flows())
        })
        .await?;

        let snapshot = build_sentiment_snapshot(fii, dii);
        self.sentiment_cache.insert(
            "GLOBAL".to_string(),
            CacheEntry {
                data: snapshot.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(snapshot)
    }
}

impl Default for NseDataFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn spot_price(symbol: &str) -> f64 {
    let base = match symbol {
        "NIFTY" => 22_450.0,
        "BANKNIFTY" => 47_500.0,
        "FINNIFTY" => 20_500.0,
        "RELIANCE" => 2_950.0,
        "TCS" => 3_950.0,
        _ => 25_000.0,
    };
    base * rand::thread_rng().gen_range(0.99..1.01)
}

fn lot_size(symbol: &str) -> u32 {
    if symbol.contains("NIFTY") {
        50
    } else {
        25
    }
}

fn build_option_chain(symbol: &str) -> OptionChainSnapshot {
    let mut rng = rand::thread_rng();
    let spot = spot_price(symbol);

    OptionChainSnapshot {
        symbol: symbol.to_string(),
        spot_price: spot,
        pcr: Some(rng.gen_range(0.8..1.4)),
        oi_change_pct: Some(rng.gen_range(-15.0..15.0)),
        iv_current: Some(rng.gen_range(15.0..35.0)),
        iv_percentile: Some(rng.gen_range(20.0..80.0)),
        max_pain: Some(spot * rng.gen_range(0.98..1.02)),
        delta: Some(rng.gen_range(0.3..0.7)),
        theta: Some(rng.gen_range(-20.0..-5.0)),
        premium: Some(rng.gen_range(50.0..200.0)),
        lot_size: lot_size(symbol),
        as_of: Utc::now(),
    }
}

fn build_intraday_bars(base: f64, count: usize, as_of: DateTime<Utc>) -> Vec<Bar> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let noise: f64 = rng.gen_range(-0.005..0.005);
            let close = base * (1.0 + noise * (i as f64 - 12.0) / 12.0);
            Bar {
                timestamp: as_of - Duration::minutes(((count - i) * 15) as i64),
                open: close * (1.0 + rng.gen_range(-0.002..0.002)),
                high: close * (1.0 + rng.gen_range(0.0..0.005)),
                low: close * (1.0 + rng.gen_range(-0.005..0.0)),
                close,
                volume: rng.gen_range(10_000..=100_000) as f64,
            }
        })
        .collect()
}

fn build_daily_bars(base: f64, count: usize, as_of: DateTime<Utc>) -> Vec<Bar> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let noise: f64 = rng.gen_range(-0.02..0.02);
            let close = base * (1.0 + noise);
            Bar {
                timestamp: as_of - Duration::days((count - i) as i64),
                open: close * (1.0 + rng.gen_range(-0.005..0.005)),
                high: close * (1.0 + rng.gen_range(0.0..0.01)),
                low: close * (1.0 + rng.gen_range(-0.01..0.0)),
                close,
                volume: rng.gen_range(100_000..=1_000_000) as f64,
            }
        })
        .collect()
}

fn sample_institutional_flows() -> (f64, f64) {
    let mut rng = rand::thread_rng();
    (
        rng.gen_range(-1_000..=1_000) as f64,
        rng.gen_range(-500..=500) as f64,
    )
}

fn build_sentiment_snapshot(fii: f64, dii: f64) -> SentimentSnapshot {
    let mut rng = rand::thread_rng();
    let category = match rng.gen_range(0..3) {
        0 => NewsCategory::Positive,
        1 => NewsCategory::Negative,
        _ => NewsCategory::Neutral,
    };

    SentimentSnapshot {
        fii_net_flow: Some(fii),
        dii_net_flow: Some(dii),
        dow_futures_pct: Some(rng.gen_range(-0.8..0.8)),
        nasdaq_futures_pct: Some(rng.gen_range(-1.0..1.0)),
        sgx_nifty_gap: Some(rng.gen_range(-100..=100) as f64),
        crude_price: Some(rng.gen_range(65.0..90.0)),
        usdinr: Some(rng.gen_range(82.0..85.0)),
        news: Some(NewsSentiment {
            category,
            score: rng.gen_range(-0.8..0.8),
            breaking_headline: None,
        }),
        vix: Some(rng.gen_range(12.0..22.0)),
        as_of: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn intraday_bars_are_chronological() {
        let fetcher = NseDataFetcher::new();
        let data = fetcher.get_market_data("NIFTY", false).await.unwrap();

        assert_eq!(data.intraday.len(), 25);
        assert!(data.daily.is_empty());
        for pair in data.intraday.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn daily_bars_included_for_positional_runs() {
        let fetcher = NseDataFetcher::new();
        let data = fetcher.get_market_data("NIFTY", true).await.unwrap();
        assert_eq!(data.daily.len(), 50);
        assert_eq!(data.support_levels.len(), 2);
        assert_eq!(data.resistance_levels.len(), 2);
    }

    #[tokio::test]
    async fn chain_fields_fall_in_stub_ranges() {
        let fetcher = NseDataFetcher::new();
        let chain = fetcher.get_option_chain("BANKNIFTY").await.unwrap();

        let pcr = chain.pcr.unwrap();
        assert!((0.8..=1.4).contains(&pcr));
        let ivp = chain.iv_percentile.unwrap();
        assert!((20.0..=80.0).contains(&ivp));
        assert_eq!(chain.lot_size, 50);

        let chain = fetcher.get_option_chain("RELIANCE").await.unwrap();
        assert_eq!(chain.lot_size, 25);
    }

    #[tokio::test]
    async fn chain_is_cached_within_ttl() {
        let fetcher = NseDataFetcher::new();
        let first = fetcher.get_option_chain("NIFTY").await.unwrap();
        let second = fetcher.get_option_chain("NIFTY").await.unwrap();
        // second hit comes from cache, not a fresh random draw
        assert_eq!(first.as_of, second.as_of);
        assert_eq!(first.pcr, second.pcr);
    }
}
