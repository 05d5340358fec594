use chrono::Utc;
use serde::Serialize;
use signal_core::{Decision, DirectionClass, SignalResult, TradeSignal, TradeType};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::weights::WeightTable;

const DEFAULT_THRESHOLD: f64 = 0.70;

/// Running statistics over the in-process decision history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DecisionStats {
    pub total_decisions: usize,
    pub above_threshold: usize,
    pub threshold_hit_rate: f64,
    pub avg_confidence: f64,
}

/// Weighted-vote aggregator. Folds producer results into a composite
/// probability, applies the decision threshold and keeps an append-only
/// history for statistics.
///
/// BLOCK and APPROVE participate in the vote through their direction
/// class; a BLOCK is a bearish-weighted contribution, not a veto.
pub struct DecisionEngine {
    weights: WeightTable,
    threshold: f64,
    history: Mutex<Vec<Decision>>,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(WeightTable::default())
    }
}

impl DecisionEngine {
    pub fn new(weights: WeightTable) -> Self {
        Self {
            weights,
            threshold: DEFAULT_THRESHOLD,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Weight table from PRODUCER_WEIGHTS, execution threshold from
    /// MIN_PROBABILITY_THRESHOLD (clamped to [0.50, 0.99]).
    pub fn from_env() -> Self {
        let threshold = std::env::var("MIN_PROBABILITY_THRESHOLD")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .map(|t| t.clamp(0.50, 0.99))
            .unwrap_or(DEFAULT_THRESHOLD);

        Self {
            weights: WeightTable::from_env(),
            threshold,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.50, 0.99);
        self
    }

    /// Execution threshold as a probability in [0.50, 0.99].
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Combine producer results into a single decision for the symbol.
    ///
    /// Every result's weight counts toward the denominator, including
    /// HOLD and abstaining producers: a crowd of neutral votes dilutes
    /// the composite toward 50% instead of being ignored. Input order
    /// should be producer registration order so the reasoning excerpt
    /// ordering stays reproducible.
    pub async fn combine(
        &self,
        symbol: &str,
        results: Vec<SignalResult>,
        trade_type: TradeType,
    ) -> Decision {
        if results.is_empty() {
            return Decision {
                id: Uuid::new_v4(),
                symbol: symbol.to_string(),
                signal: TradeSignal::NoSignal,
                confidence: 0.0,
                reasoning: "No producer results received".to_string(),
                metadata: serde_json::json!({}),
                timestamp: Utc::now(),
                trade_type,
                contributions: Vec::new(),
            };
        }

        let mut bullish: Vec<(String, f64, String)> = Vec::new();
        let mut bearish: Vec<(String, f64, String)> = Vec::new();
        let mut neutral_count = 0usize;
        let mut total_weighted_score = 0.0;
        let mut total_weight = 0.0;

        for result in &results {
            let weight = self.weights.get(&result.producer_id);
            let normalized = result.confidence / 100.0;
            let contribution = result.direction().multiplier() * normalized * weight;

            match result.direction() {
                DirectionClass::Bullish => bullish.push((
                    result.producer_id.clone(),
                    result.confidence,
                    result.reasoning.clone(),
                )),
                DirectionClass::Bearish => bearish.push((
                    result.producer_id.clone(),
                    result.confidence,
                    result.reasoning.clone(),
                )),
                DirectionClass::Neutral => neutral_count += 1,
            }

            total_weighted_score += contribution;
            total_weight += weight;
        }

        let composite_score = if total_weight > 0.0 {
            total_weighted_score / total_weight
        } else {
            0.0
        };
        let composite_probability = (composite_score + 1.0) / 2.0;
        let final_confidence = composite_probability * 100.0;
        let threshold_pct = self.threshold * 100.0;

        let signal = if final_confidence >= threshold_pct && composite_score > 0.0 {
            TradeSignal::Buy
        } else if final_confidence >= threshold_pct && composite_score < 0.0 {
            TradeSignal::Sell
        } else if final_confidence >= 50.0 {
            TradeSignal::Hold
        } else {
            TradeSignal::NoSignal
        };

        let mut reasoning_parts = vec![format!("Composite probability: {final_confidence:.1}%")];

        if !bullish.is_empty() {
            let names: Vec<&str> = bullish.iter().map(|(id, _, _)| id.as_str()).collect();
            reasoning_parts.push(format!("Bullish producers: {}", names.join(", ")));
        }
        if !bearish.is_empty() {
            let names: Vec<&str> = bearish.iter().map(|(id, _, _)| id.as_str()).collect();
            reasoning_parts.push(format!("Bearish producers: {}", names.join(", ")));
        }

        // High-conviction contributors get a short excerpt of their own
        // reasoning in the audit trail.
        for (id, confidence, reason) in bullish.iter().chain(bearish.iter()) {
            if *confidence > 70.0 {
                let excerpt: String = reason.chars().take(50).collect();
                reasoning_parts.push(format!("{id}: {excerpt}..."));
            }
        }

        match signal {
            TradeSignal::NoSignal => {
                reasoning_parts.push(format!("Below threshold ({threshold_pct:.0}%) - no trade"));
            }
            TradeSignal::Buy | TradeSignal::Sell => {
                reasoning_parts.push(format!("Above threshold - EXECUTE {}", signal.as_label()));
            }
            _ => {}
        }

        let metadata = serde_json::json!({
            "composite_probability": composite_probability,
            "composite_score": composite_score,
            "bullish_producers": bullish.len(),
            "bearish_producers": bearish.len(),
            "neutral_producers": neutral_count,
            "threshold": self.threshold,
            "threshold_met": final_confidence >= threshold_pct,
        });

        tracing::info!(
            "{}: {} at {:.1}% ({} bullish, {} bearish, {} neutral)",
            symbol,
            signal.as_label(),
            final_confidence,
            bullish.len(),
            bearish.len(),
            neutral_count
        );

        let decision = Decision {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            signal,
            confidence: final_confidence,
            reasoning: reasoning_parts.join(" | "),
            metadata,
            timestamp: Utc::now(),
            trade_type,
            contributions: results,
        };

        self.history.lock().await.push(decision.clone());
        decision
    }

    /// The single authoritative execution gate: only a directional
    /// decision at or above the threshold may trade.
    pub fn should_execute(&self, decision: &Decision) -> bool {
        decision.confidence >= self.threshold * 100.0
            && matches!(decision.signal, TradeSignal::Buy | TradeSignal::Sell)
    }

    pub async fn stats(&self) -> DecisionStats {
        let history = self.history.lock().await;
        let total = history.len();
        if total == 0 {
            return DecisionStats::default();
        }

        let threshold_pct = self.threshold * 100.0;
        let above = history
            .iter()
            .filter(|d| d.confidence >= threshold_pct)
            .count();
        let avg_confidence =
            history.iter().map(|d| d.confidence).sum::<f64>() / total as f64;

        DecisionStats {
            total_decisions: total,
            above_threshold: above,
            threshold_hit_rate: above as f64 / total as f64,
            avg_confidence,
        }
    }
}
