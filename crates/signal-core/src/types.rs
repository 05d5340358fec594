use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categorical outcome of a producer evaluation.
///
/// Data producers emit Buy/Sell/Hold/NoSignal; the risk gate emits
/// Approve/Reduce/Block; Error is substituted by the pipeline when a
/// producer faults. NoSignal and Error always carry confidence 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
    NoSignal,
    Approve,
    Reduce,
    Block,
    Error,
}

impl TradeSignal {
    /// Total mapping into a direction class. Every tag resolves;
    /// never compare signal strings to decide direction.
    pub fn direction(&self) -> DirectionClass {
        match self {
            TradeSignal::Buy | TradeSignal::Approve => DirectionClass::Bullish,
            TradeSignal::Sell | TradeSignal::Block => DirectionClass::Bearish,
            TradeSignal::Hold
            | TradeSignal::NoSignal
            | TradeSignal::Reduce
            | TradeSignal::Error => DirectionClass::Neutral,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            TradeSignal::Buy => "BUY",
            TradeSignal::Sell => "SELL",
            TradeSignal::Hold => "HOLD",
            TradeSignal::NoSignal => "NO_SIGNAL",
            TradeSignal::Approve => "APPROVE",
            TradeSignal::Reduce => "REDUCE",
            TradeSignal::Block => "BLOCK",
            TradeSignal::Error => "ERROR",
        }
    }
}

/// Direction class used by the weighted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionClass {
    Bullish,
    Bearish,
    Neutral,
}

impl DirectionClass {
    /// Vote multiplier: +1 bullish, -1 bearish, 0 neutral.
    pub fn multiplier(&self) -> f64 {
        match self {
            DirectionClass::Bullish => 1.0,
            DirectionClass::Bearish => -1.0,
            DirectionClass::Neutral => 0.0,
        }
    }
}

/// Holding horizon a producer targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    #[default]
    Intraday,
    Swing,
    Both,
}

impl TradeType {
    pub fn as_label(&self) -> &'static str {
        match self {
            TradeType::Intraday => "INTRADAY",
            TradeType::Swing => "SWING",
            TradeType::Both => "BOTH",
        }
    }
}

/// Normalized result from any signal producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResult {
    /// Stable identifier, also the weight-table lookup key.
    pub producer_id: String,
    pub signal: TradeSignal,
    /// 0-100. Zero means "no signal could be computed", not
    /// "computed and zero".
    pub confidence: f64,
    pub reasoning: String,
    /// Diagnostics only. Aggregation scoring never reads this.
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub trade_type: TradeType,
}

impl SignalResult {
    /// Build a result, clamping confidence to [0,100]. NoSignal and
    /// Error are forced to confidence 0.
    pub fn new(
        producer_id: impl Into<String>,
        signal: TradeSignal,
        confidence: f64,
        reasoning: impl Into<String>,
        metadata: serde_json::Value,
        trade_type: TradeType,
    ) -> Self {
        let confidence = match signal {
            TradeSignal::NoSignal | TradeSignal::Error => 0.0,
            _ => confidence.clamp(0.0, 100.0),
        };
        Self {
            producer_id: producer_id.into(),
            signal,
            confidence,
            reasoning: reasoning.into(),
            metadata,
            timestamp: Utc::now(),
            trade_type,
        }
    }

    /// Abstain marker: required input was missing.
    pub fn abstain(
        producer_id: impl Into<String>,
        reasoning: impl Into<String>,
        trade_type: TradeType,
    ) -> Self {
        Self::new(
            producer_id,
            TradeSignal::NoSignal,
            0.0,
            reasoning,
            serde_json::json!({}),
            trade_type,
        )
    }

    /// Substitute for a producer that faulted. Treated by the
    /// aggregator exactly like an abstain.
    pub fn fault(
        producer_id: impl Into<String>,
        fault: impl std::fmt::Display,
        trade_type: TradeType,
    ) -> Self {
        Self::new(
            producer_id,
            TradeSignal::Error,
            0.0,
            format!("Producer failed: {fault}"),
            serde_json::json!({}),
            trade_type,
        )
    }

    pub fn direction(&self) -> DirectionClass {
        self.signal.direction()
    }
}

/// Final aggregated decision for one symbol.
///
/// Immutable after construction. Contributing results are carried
/// verbatim for audit and replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub id: Uuid,
    pub symbol: String,
    pub signal: TradeSignal,
    /// Composite probability expressed as 0-100.
    pub confidence: f64,
    pub reasoning: String,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub trade_type: TradeType,
    pub contributions: Vec<SignalResult>,
}

impl Decision {
    /// Suggested position size in lots, read from the risk gate's
    /// contribution metadata if present.
    pub fn suggested_lots(&self) -> Option<u32> {
        self.contributions
            .iter()
            .find(|r| r.producer_id == "risk_gate")
            .and_then(|r| r.metadata.get("suggested_lots"))
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
    }
}
