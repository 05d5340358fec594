use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use signal_core::{
    MarketInputs, OptionChainSnapshot, SignalError, SignalProducer, SignalResult, TradeSignal,
    TradeType,
};
use tokio::sync::Mutex;

use crate::config::RiskConfig;
use crate::correlation::{pair_correlation, CORRELATION_LIMIT};
use crate::session::RiskSession;

const MAX_LOTS: u32 = 10;
const MARGIN_HEADROOM: f64 = 0.8;

/// Capital-preservation gates run in order before any trade.
///
/// Limit breaches (daily loss, trade cap, zero position size) block
/// outright at confidence 0. Softer concerns shave points off a
/// starting confidence of 100 until the APPROVE/REDUCE/BLOCK mapping
/// tips over.
pub struct RiskGateProducer {
    config: RiskConfig,
    session: Arc<Mutex<RiskSession>>,
}

impl RiskGateProducer {
    pub fn new(config: RiskConfig) -> Self {
        Self::with_session(config, Arc::new(Mutex::new(RiskSession::new())))
    }

    pub fn with_session(config: RiskConfig, session: Arc<Mutex<RiskSession>>) -> Self {
        Self { config, session }
    }

    /// Shared handle to the running session, for fill/close accounting
    /// by the execution side.
    pub fn session(&self) -> Arc<Mutex<RiskSession>> {
        Arc::clone(&self.session)
    }
}

#[async_trait]
impl SignalProducer for RiskGateProducer {
    fn id(&self) -> &'static str {
        "risk_gate"
    }

    fn trade_type(&self) -> TradeType {
        TradeType::Both
    }

    async fn evaluate(
        &self,
        symbol: &str,
        inputs: &MarketInputs,
    ) -> Result<SignalResult, SignalError> {
        let config = &self.config;
        let session = self.session.lock().await;

        let mut confidence = 100.0_f64;
        let mut notes: Vec<String> = Vec::new();

        if session.daily_pnl < -config.max_daily_loss {
            tracing::warn!(
                "risk_gate blocking {}: daily pnl {} beyond limit",
                symbol,
                session.daily_pnl
            );
            return Ok(SignalResult::new(
                self.id(),
                TradeSignal::Block,
                0.0,
                format!("Daily loss limit breached: ₹{}", session.daily_pnl.abs()),
                serde_json::json!({ "daily_pnl": session.daily_pnl }),
                self.trade_type(),
            ));
        }

        if session.daily_trades >= config.max_daily_trades {
            return Ok(SignalResult::new(
                self.id(),
                TradeSignal::Block,
                0.0,
                format!("Max daily trades reached: {}", session.daily_trades),
                serde_json::json!({ "daily_trades": session.daily_trades }),
                self.trade_type(),
            ));
        }

        // Doubling up on a correlated index is a concentration, not a
        // hard stop. One penalty no matter how many symbols overlap.
        for open_symbol in session.open_symbols() {
            let correlation = pair_correlation(symbol, open_symbol);
            if correlation > CORRELATION_LIMIT {
                confidence -= 30.0;
                notes.push(format!(
                    "High correlation with open {open_symbol} ({correlation:.2})"
                ));
                break;
            }
        }

        let suggested_lots = position_size(inputs.option_chain.as_ref(), config);
        if suggested_lots == 0 {
            return Ok(SignalResult::new(
                self.id(),
                TradeSignal::Block,
                0.0,
                "Position size reduced to 0",
                serde_json::json!({ "suggested_lots": 0 }),
                self.trade_type(),
            ));
        }

        let required_margin = estimate_margin(inputs.option_chain.as_ref(), suggested_lots);
        let leverage = match inputs.trade_type {
            TradeType::Swing => config.swing_leverage,
            _ => config.intraday_leverage,
        };
        let available_margin = config.total_capital * leverage;
        if required_margin > available_margin * MARGIN_HEADROOM {
            confidence -= 30.0;
            notes.push("High margin utilization".to_string());
        }

        if let Some(position) = session.position(symbol) {
            let minutes = (Utc::now() - position.last_trade_time).num_seconds() as f64 / 60.0;
            if minutes < config.cooling_period_minutes as f64 {
                confidence -= 25.0;
                notes.push(format!("Cooling period: {minutes:.0}m ago"));
            }
        }

        if let Some(chain) = &inputs.option_chain {
            let iv_percentile = chain.iv_percentile.unwrap_or(50.0);
            if iv_percentile > 80.0 {
                confidence -= 10.0;
                notes.push(format!("High IV {iv_percentile}%"));
            }
        }

        let signal = if confidence >= 70.0 {
            TradeSignal::Approve
        } else if confidence >= 50.0 {
            TradeSignal::Reduce
        } else {
            TradeSignal::Block
        };

        let reasoning = if notes.is_empty() {
            "Risk checks passed".to_string()
        } else {
            notes.join(" | ")
        };

        let metadata = serde_json::json!({
            "suggested_lots": suggested_lots,
            "required_margin": required_margin,
            "available_margin": available_margin,
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

/// Lots affordable inside the per-trade loss budget, capped at 10.
/// No chain means no premium economics to size against; default to a
/// single lot.
fn position_size(chain: Option<&OptionChainSnapshot>, config: &RiskConfig) -> u32 {
    let chain = match chain {
        Some(chain) => chain,
        None => return 1,
    };

    let premium = chain.premium.unwrap_or(100.0);
    let per_lot_cost = premium * chain.lot_size as f64;
    let max_lots = if per_lot_cost > 0.0 {
        (config.max_loss_per_trade / per_lot_cost) as u32
    } else {
        MAX_LOTS
    };
    max_lots.min(MAX_LOTS)
}

/// Rough exchange-margin estimate with a 20% buffer over premium value.
fn estimate_margin(chain: Option<&OptionChainSnapshot>, lots: u32) -> f64 {
    match chain {
        Some(chain) => lots as f64 * chain.premium.unwrap_or(100.0) * chain.lot_size as f64 * 1.2,
        None => lots as f64 * 50_000.0,
    }
}
