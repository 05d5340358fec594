use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TradeType;

/// OHLCV bar. Fetchers deliver bars chronologically, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Option-chain snapshot for one underlying.
///
/// Absent fields mean "not supplied", never zero. Producers substitute
/// their documented neutral defaults instead of computing with 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    pub symbol: String,
    pub spot_price: f64,
    /// Put-call ratio by open interest. Neutral default 1.0.
    pub pcr: Option<f64>,
    /// Open-interest change, percent. Neutral default 0.
    pub oi_change_pct: Option<f64>,
    pub iv_current: Option<f64>,
    /// IV rank within its recent range, 0-100. Neutral default 50.
    pub iv_percentile: Option<f64>,
    /// Max-pain strike for the active expiry. Neutral default: spot.
    pub max_pain: Option<f64>,
    /// ATM call delta. Neutral default 0.5.
    pub delta: Option<f64>,
    pub theta: Option<f64>,
    /// ATM option premium per share, used for sizing and margin.
    pub premium: Option<f64>,
    pub lot_size: u32,
    pub as_of: DateTime<Utc>,
}

/// Price history plus level hints for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: String,
    pub spot_price: f64,
    pub intraday: Vec<Bar>,
    pub daily: Vec<Bar>,
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
    /// Snapshot time. The intraday session gate reads this, not the
    /// wall clock, so evaluations are reproducible.
    pub as_of: DateTime<Utc>,
}

/// Categorical news tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSentiment {
    pub category: NewsCategory,
    /// -1.0 to 1.0.
    pub score: f64,
    pub breaking_headline: Option<String>,
}

/// Macro/flow sentiment snapshot. All fields optional; a missing
/// field falls back to the consuming rule's documented default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    /// Foreign institutional net flow, rupees crore.
    pub fii_net_flow: Option<f64>,
    /// Domestic institutional net flow, rupees crore.
    pub dii_net_flow: Option<f64>,
    pub dow_futures_pct: Option<f64>,
    pub nasdaq_futures_pct: Option<f64>,
    /// Pre-market gap vs previous close, index points.
    pub sgx_nifty_gap: Option<f64>,
    pub crude_price: Option<f64>,
    pub usdinr: Option<f64>,
    pub news: Option<NewsSentiment>,
    pub vix: Option<f64>,
    pub as_of: DateTime<Utc>,
}

/// Everything fetched for one evaluation round. Each producer reads
/// the slices it needs and ignores the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketInputs {
    pub option_chain: Option<OptionChainSnapshot>,
    pub market: Option<MarketData>,
    pub sentiment: Option<SentimentSnapshot>,
    /// Holding horizon requested for this round. The risk gate sizes
    /// margin against the leverage allowed for this horizon.
    pub trade_type: TradeType,
}
