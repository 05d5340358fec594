use std::collections::HashMap;

/// Weight assigned to producers missing from the table. Small but
/// non-zero so an unlisted producer still influences the vote weakly
/// instead of being dropped.
pub const FALLBACK_WEIGHT: f64 = 0.1;

/// Per-producer vote weights. Weights need not sum to 1; the engine
/// normalizes by the total observed weight at aggregation time.
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: HashMap<String, f64>,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::from_pairs([
            ("options_flow", 0.25),
            ("intraday_strategy", 0.20),
            ("swing_strategy", 0.20),
            ("sentiment_scout", 0.15),
            ("risk_gate", 0.20),
        ])
    }
}

impl WeightTable {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            weights: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Read the table from PRODUCER_WEIGHTS, a JSON object mapping
    /// producer id to weight. Malformed JSON or any weight outside
    /// [0,1] falls back to the full default table.
    pub fn from_env() -> Self {
        let raw = match std::env::var("PRODUCER_WEIGHTS") {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str::<HashMap<String, f64>>(&raw) {
            Ok(weights) if weights.values().all(|w| (0.0..=1.0).contains(w)) => {
                Self { weights }
            }
            Ok(_) => {
                tracing::warn!("PRODUCER_WEIGHTS has weights outside [0,1], using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!("PRODUCER_WEIGHTS is not a JSON object ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, producer_id: &str) -> f64 {
        self.weights
            .get(producer_id)
            .copied()
            .unwrap_or(FALLBACK_WEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_all_producers() {
        let table = WeightTable::default();
        assert_eq!(table.get("options_flow"), 0.25);
        assert_eq!(table.get("intraday_strategy"), 0.20);
        assert_eq!(table.get("swing_strategy"), 0.20);
        assert_eq!(table.get("sentiment_scout"), 0.15);
        assert_eq!(table.get("risk_gate"), 0.20);
    }

    #[test]
    fn unknown_producer_gets_fallback() {
        let table = WeightTable::default();
        assert_eq!(table.get("mystery_producer"), FALLBACK_WEIGHT);
    }

    #[test]
    fn from_pairs_builds_custom_table() {
        let table = WeightTable::from_pairs([("a", 0.5), ("b", 0.3)]);
        assert_eq!(table.get("a"), 0.5);
        assert_eq!(table.get("b"), 0.3);
        assert_eq!(table.get("c"), FALLBACK_WEIGHT);
    }
}
