use crate::TradeSignal;

/// One fired rule: direction, points, and the explanation shown in
/// the reasoning trail.
#[derive(Debug, Clone)]
pub struct RuleVote {
    pub direction: TradeSignal,
    pub points: u32,
    pub explanation: String,
}

/// Ordered accumulator for a producer's rule votes.
///
/// Rules append in evaluation order; nothing short-circuits. Hold
/// votes appear in the reasoning but never count toward either
/// directional score.
#[derive(Debug, Default)]
pub struct RuleTally {
    votes: Vec<RuleVote>,
}

impl RuleTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vote(&mut self, direction: TradeSignal, points: u32, explanation: impl Into<String>) {
        self.votes.push(RuleVote {
            direction,
            points,
            explanation: explanation.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn buy_score(&self) -> u32 {
        self.score_for(TradeSignal::Buy)
    }

    pub fn sell_score(&self) -> u32 {
        self.score_for(TradeSignal::Sell)
    }

    fn score_for(&self, direction: TradeSignal) -> u32 {
        self.votes
            .iter()
            .filter(|v| v.direction == direction)
            .map(|v| v.points)
            .sum()
    }

    /// Fired explanations joined in evaluation order.
    pub fn reasoning(&self) -> String {
        self.votes
            .iter()
            .map(|v| v.explanation.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Resolve the tally into a final signal and confidence.
    ///
    /// One side wins only when it beats the other by the dominance
    /// ratio; otherwise the call is Hold at exactly 50. Directional
    /// confidence is base + winning score, capped at 95.
    pub fn resolve(&self, dominance: f64, base: u32) -> (TradeSignal, f64) {
        let buy = self.buy_score() as f64;
        let sell = self.sell_score() as f64;

        if buy > sell * dominance {
            (TradeSignal::Buy, (base as f64 + buy).min(95.0))
        } else if sell > buy * dominance {
            (TradeSignal::Sell, (base as f64 + sell).min(95.0))
        } else {
            (TradeSignal::Hold, 50.0)
        }
    }
}
