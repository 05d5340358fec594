/// Capital and exposure limits. Loaded from the environment with
/// conservative defaults sized for a one-lakh account.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub total_capital: f64,
    pub max_loss_per_trade: f64,
    pub max_daily_loss: f64,
    pub max_daily_trades: u32,
    pub intraday_leverage: f64,
    pub swing_leverage: f64,
    pub cooling_period_minutes: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            total_capital: 100_000.0,
            max_loss_per_trade: 2_000.0,
            max_daily_loss: 10_000.0,
            max_daily_trades: 10,
            intraday_leverage: 4.0,
            swing_leverage: 2.0,
            cooling_period_minutes: 15,
        }
    }
}

impl RiskConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            total_capital: env_f64("TOTAL_CAPITAL", defaults.total_capital),
            max_loss_per_trade: env_f64("MAX_LOSS_PER_TRADE", defaults.max_loss_per_trade),
            max_daily_loss: env_f64("MAX_DAILY_LOSS", defaults.max_daily_loss),
            max_daily_trades: env_parse("MAX_DAILY_TRADES", defaults.max_daily_trades),
            intraday_leverage: env_f64("INTRADAY_LEVERAGE", defaults.intraday_leverage),
            swing_leverage: env_f64("SWING_LEVERAGE", defaults.swing_leverage),
            cooling_period_minutes: env_parse(
                "COOLING_PERIOD_MINUTES",
                defaults.cooling_period_minutes,
            ),
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_parse(key, default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
