use std::sync::Arc;

use anyhow::{bail, Context, Result};
use decision_engine::DecisionEngine;
use decision_log::{DecisionJournal, TradeHistory};
use market_data::NseDataFetcher;
use notification::{Alert, NotificationService};
use options_flow::OptionsFlowProducer;
use risk_gate::{RiskConfig, RiskGateProducer, RiskSession};
use sentiment_scout::SentimentScoutProducer;
use signal_core::{Decision, MarketInputs, TradeType};
use technical_strategy::{IntradayStrategyProducer, SwingStrategyProducer};
use tokio::sync::Mutex;

use crate::config::AgentConfig;
use crate::executor::TradeExecutor;
use crate::pipeline::SignalPipeline;

/// Wires the data fetcher, the five producers, the decision engine
/// and the side-effect sinks together.
pub struct TradingOrchestrator {
    config: AgentConfig,
    fetcher: NseDataFetcher,
    pipeline: SignalPipeline,
    engine: DecisionEngine,
    journal: DecisionJournal,
    executor: TradeExecutor,
    notifier: NotificationService,
    session: Arc<Mutex<RiskSession>>,
}

impl TradingOrchestrator {
    pub async fn new(config: AgentConfig) -> Result<Self> {
        let risk_gate = RiskGateProducer::new(RiskConfig::from_env());
        let session = risk_gate.session();

        // Registration order pins the weight-table ids and the order
        // reasoning excerpts appear in.
        let mut pipeline = SignalPipeline::new();
        pipeline.register(Arc::new(OptionsFlowProducer));
        pipeline.register(Arc::new(IntradayStrategyProducer));
        pipeline.register(Arc::new(SwingStrategyProducer));
        pipeline.register(Arc::new(SentimentScoutProducer));
        pipeline.register(Arc::new(risk_gate));

        let engine = DecisionEngine::from_env();
        let history = TradeHistory::new(&config.database_url)
            .await
            .context("initializing trade history")?;
        let executor = TradeExecutor::new(history, Arc::clone(&session));

        tracing::info!("TradingOrchestrator initialized");
        tracing::info!("  Producers: {}", pipeline.producer_count());
        tracing::info!("  Threshold: {:.0}%", engine.threshold() * 100.0);
        tracing::info!("  Dry run: {}", config.dry_run);
        tracing::info!("  Database: {}", config.database_url);

        Ok(Self {
            fetcher: NseDataFetcher::new(),
            pipeline,
            engine,
            journal: DecisionJournal::new(&config.journal_path),
            executor,
            notifier: NotificationService::from_env(),
            session,
            config,
        })
    }

    /// Full analysis round for one symbol: fetch, fan out, aggregate,
    /// journal, then execute and alert when the decision clears the
    /// threshold. A fetch failure blanks that producer's input; a
    /// failed execution is logged, never propagated — the caller
    /// always gets the decision.
    pub async fn analyze_symbol(&self, symbol: &str, trade_type: TradeType) -> Result<Decision> {
        let symbol = validate_symbol(symbol)?;
        tracing::info!("Analyzing {} | {}", symbol, trade_type.as_label());

        let option_chain = match self.fetcher.get_option_chain(&symbol).await {
            Ok(chain) => Some(chain),
            Err(e) => {
                tracing::warn!("Option chain unavailable for {}: {}", symbol, e);
                None
            }
        };
        let market = match self
            .fetcher
            .get_market_data(&symbol, trade_type == TradeType::Swing)
            .await
        {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("Market data unavailable for {}: {}", symbol, e);
                None
            }
        };
        let sentiment = match self.fetcher.get_sentiment_data().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Sentiment unavailable: {}", e);
                None
            }
        };

        let inputs = MarketInputs {
            option_chain,
            market,
            sentiment,
            trade_type,
        };

        let results = self.pipeline.run(&symbol, &inputs).await;
        for result in &results {
            tracing::info!(
                "  {}: {} ({:.0}%)",
                result.producer_id,
                result.signal.as_label(),
                result.confidence
            );
        }

        let decision = self.engine.combine(&symbol, results, trade_type).await;
        if let Err(e) = self.journal.append(&decision) {
            tracing::warn!("Failed to journal decision: {}", e);
        }

        let execute = self.engine.should_execute(&decision);
        tracing::info!(
            "FINAL DECISION {}: {} at {:.1}% (execute: {})",
            symbol,
            decision.signal.as_label(),
            decision.confidence,
            if execute { "YES" } else { "NO" }
        );

        if execute {
            let lots = decision.suggested_lots().unwrap_or(1);
            self.notifier.send_alert(Alert::trade_signal(
                &decision.symbol,
                decision.signal.as_label(),
                decision.confidence,
                lots,
                &decision.reasoning,
            ));

            if self.config.dry_run {
                tracing::info!("DRY RUN - order for {} not placed", symbol);
            } else if let Err(e) = self.place_order(&decision, &inputs, lots).await {
                tracing::error!("Trade execution failed for {}: {}", symbol, e);
            }
        }

        Ok(decision)
    }

    async fn place_order(
        &self,
        decision: &Decision,
        inputs: &MarketInputs,
        lots: u32,
    ) -> Result<()> {
        let chain = inputs
            .option_chain
            .as_ref()
            .context("no option chain to price the order")?;
        let premium = chain.premium.context("option chain carries no premium")?;

        let executed = self
            .executor
            .execute_trade(decision, premium, lots, chain.lot_size)
            .await?;
        tracing::info!(
            "Order {} filled: trade #{} ({} lots)",
            executed.order.order_id,
            executed.trade_id,
            lots
        );
        Ok(())
    }

    /// Evaluate the configured symbol list as intraday candidates. A
    /// symbol that fails is logged and skipped; the scan itself only
    /// fails on setup errors.
    pub async fn run_scan(&self) -> Result<()> {
        let symbols = self.config.scan_symbols.clone();
        tracing::info!("Scanning {} symbols for opportunities", symbols.len());

        let mut decisions = Vec::new();
        for symbol in &symbols {
            match self.analyze_symbol(symbol, TradeType::Intraday).await {
                Ok(decision) => decisions.push(decision),
                Err(e) => tracing::error!("Skipping {}: {}", symbol, e),
            }
        }

        let threshold_pct = self.engine.threshold() * 100.0;
        let opportunities: Vec<&Decision> = decisions
            .iter()
            .filter(|d| d.confidence >= threshold_pct)
            .collect();

        tracing::info!(
            "Scan complete: {} symbols, {} opportunities",
            symbols.len(),
            opportunities.len()
        );
        for opportunity in &opportunities {
            tracing::info!(
                "  {}: {} ({:.0}%)",
                opportunity.symbol,
                opportunity.signal.as_label(),
                opportunity.confidence
            );
        }

        let stats = self.engine.stats().await;
        tracing::info!(
            "Session stats: {} decisions, {:.0}% above threshold, avg confidence {:.1}%",
            stats.total_decisions,
            stats.threshold_hit_rate * 100.0,
            stats.avg_confidence
        );

        let executed = decisions
            .iter()
            .filter(|d| self.engine.should_execute(d))
            .count();
        let net_pnl = self.session.lock().await.daily_pnl;
        self.notifier
            .send_alert_async(&Alert::daily_report(decisions.len(), executed, net_pnl))
            .await;

        Ok(())
    }
}

/// Uppercase A-Z only, at most 20 characters. Rejected symbols never
/// reach the fetcher.
fn validate_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        bail!("symbol cannot be empty");
    }
    if symbol.len() > 20 {
        bail!("symbol too long: {symbol}");
    }
    if !symbol.chars().all(|c| c.is_ascii_uppercase()) {
        bail!("invalid symbol format: {raw}");
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_journal(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "trader-agent-{}-{}.jsonl",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn symbols_are_normalized_and_validated() {
        assert_eq!(validate_symbol(" nifty ").unwrap(), "NIFTY");
        assert_eq!(validate_symbol("BANKNIFTY").unwrap(), "BANKNIFTY");
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("NIFTY50").is_err());
        assert!(validate_symbol("NIFTY-FUT").is_err());
        assert!(validate_symbol("A".repeat(21).as_str()).is_err());
    }

    #[tokio::test]
    async fn analysis_round_journals_a_five_producer_decision() {
        let journal_path = scratch_journal("round");
        let config = AgentConfig {
            dry_run: true,
            database_url: "sqlite::memory:".to_string(),
            journal_path: journal_path.display().to_string(),
            scan_symbols: vec!["NIFTY".to_string()],
        };

        let orchestrator = TradingOrchestrator::new(config).await.unwrap();
        let decision = orchestrator
            .analyze_symbol("NIFTY", TradeType::Intraday)
            .await
            .unwrap();

        assert_eq!(decision.symbol, "NIFTY");
        assert_eq!(decision.contributions.len(), 5);
        assert!((0.0..=100.0).contains(&decision.confidence));

        let journaled = orchestrator.journal.recent(5).unwrap();
        assert_eq!(journaled.len(), 1);
        assert_eq!(journaled[0].symbol, "NIFTY");

        let _ = std::fs::remove_file(&journal_path);
    }

    #[tokio::test]
    async fn invalid_symbol_is_rejected_before_any_fetch() {
        let journal_path = scratch_journal("invalid");
        let config = AgentConfig {
            dry_run: true,
            database_url: "sqlite::memory:".to_string(),
            journal_path: journal_path.display().to_string(),
            scan_symbols: Vec::new(),
        };

        let orchestrator = TradingOrchestrator::new(config).await.unwrap();
        assert!(orchestrator
            .analyze_symbol("NIFTY 50", TradeType::Intraday)
            .await
            .is_err());
        assert!(orchestrator.journal.recent(5).unwrap().is_empty());

        let _ = std::fs::remove_file(&journal_path);
    }
}
