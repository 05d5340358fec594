/// Correlation above which a new position counts as doubling up on an
/// existing one.
pub const CORRELATION_LIMIT: f64 = 0.7;

/// Fixed pairwise correlations between the index underlyings, keyed by
/// unordered pair.
const CORRELATIONS: [(&str, &str, f64); 3] = [
    ("NIFTY", "BANKNIFTY", 0.80),
    ("NIFTY", "FINNIFTY", 0.85),
    ("BANKNIFTY", "FINNIFTY", 0.90),
];

/// Correlation for an unordered symbol pair. Pairs not in the table
/// read as uncorrelated; same-symbol overlap is the cooling gate's
/// concern, not this one's.
pub fn pair_correlation(a: &str, b: &str) -> f64 {
    CORRELATIONS
        .iter()
        .find(|(x, y, _)| (a == *x && b == *y) || (a == *y && b == *x))
        .map(|(_, _, c)| *c)
        .unwrap_or(0.0)
}
