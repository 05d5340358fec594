use serde::{Deserialize, Serialize};
use std::env;

/// Runtime settings for the agent binary. Everything has a
/// conservative default; an unparseable value falls back with a
/// warning instead of aborting startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// When true, executable signals are logged and alerted but no
    /// order is placed.
    pub dry_run: bool,
    pub database_url: String,
    pub journal_path: String,
    pub scan_symbols: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            database_url: "sqlite:data/tradebot.db".to_string(),
            journal_path: "data/decisions.jsonl".to_string(),
            scan_symbols: vec![
                "NIFTY".to_string(),
                "BANKNIFTY".to_string(),
                "FINNIFTY".to_string(),
            ],
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dry_run: env_bool("DRY_RUN", defaults.dry_run),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            journal_path: env::var("JOURNAL_PATH").unwrap_or(defaults.journal_path),
            scan_symbols: env::var("SCAN_SYMBOLS")
                .map(|raw| parse_symbol_list(&raw))
                .unwrap_or(defaults.scan_symbols),
        }
    }
}

fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => raw.trim().to_lowercase().parse().unwrap_or_else(|_| {
            tracing::warn!("Unparseable {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let config = AgentConfig::default();
        assert!(config.dry_run);
        assert_eq!(config.scan_symbols, vec!["NIFTY", "BANKNIFTY", "FINNIFTY"]);
    }

    #[test]
    fn symbol_list_is_trimmed_and_uppercased() {
        assert_eq!(
            parse_symbol_list(" nifty, BANKNIFTY ,, tcs"),
            vec!["NIFTY", "BANKNIFTY", "TCS"]
        );
        assert!(parse_symbol_list("").is_empty());
    }
}
