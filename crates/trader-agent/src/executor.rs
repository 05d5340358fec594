use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use decision_log::{NewTrade, TradeHistory};
use risk_gate::RiskSession;
use signal_core::{Decision, TradeSignal};
use tokio::sync::Mutex;

/// A filled (simulated) order.
#[derive(Debug, Clone)]
pub struct BrokerOrder {
    pub order_id: String,
    pub symbol: String,
    pub transaction_type: String,
    pub quantity: u32,
    pub price: f64,
    pub product: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Stand-in broker: assigns sequential order ids and fills every
/// order immediately at the requested price.
pub struct MockBroker {
    order_counter: u64,
    orders: HashMap<String, BrokerOrder>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            order_counter: 1000,
            orders: HashMap::new(),
        }
    }

    pub fn place_order(
        &mut self,
        symbol: &str,
        transaction_type: &str,
        quantity: u32,
        price: f64,
    ) -> BrokerOrder {
        self.order_counter += 1;
        let order = BrokerOrder {
            order_id: format!("ORDER{}", self.order_counter),
            symbol: symbol.to_string(),
            transaction_type: transaction_type.to_string(),
            quantity,
            price,
            product: "MIS".to_string(),
            status: "COMPLETE".to_string(),
            timestamp: Utc::now(),
        };
        self.orders.insert(order.order_id.clone(), order.clone());
        order
    }

    #[allow(dead_code)]
    pub fn order_status(&self, order_id: &str) -> Option<&BrokerOrder> {
        self.orders.get(order_id)
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ExecutedTrade {
    pub order: BrokerOrder,
    pub trade_id: i64,
}

/// Places mock orders for executable decisions, records them in the
/// trade history and keeps the risk session's book current.
pub struct TradeExecutor {
    broker: Mutex<MockBroker>,
    history: TradeHistory,
    session: Arc<Mutex<RiskSession>>,
}

impl TradeExecutor {
    pub fn new(history: TradeHistory, session: Arc<Mutex<RiskSession>>) -> Self {
        Self {
            broker: Mutex::new(MockBroker::new()),
            history,
            session,
        }
    }

    pub async fn execute_trade(
        &self,
        decision: &Decision,
        entry_price: f64,
        lots: u32,
        lot_size: u32,
    ) -> Result<ExecutedTrade> {
        if !matches!(decision.signal, TradeSignal::Buy | TradeSignal::Sell) {
            bail!(
                "signal must be BUY or SELL, got {}",
                decision.signal.as_label()
            );
        }
        if lots == 0 {
            bail!("quantity must be positive");
        }
        if entry_price <= 0.0 {
            bail!("price must be positive, got {entry_price}");
        }

        let label = decision.signal.as_label();
        let quantity = lots * lot_size;
        tracing::info!(
            "Executing trade: {} {} {} @ {:.2} ({} lots)",
            label,
            quantity,
            decision.symbol,
            entry_price,
            lots
        );

        let order = self
            .broker
            .lock()
            .await
            .place_order(&decision.symbol, label, quantity, entry_price);
        tracing::info!("Order placed: {}", order.order_id);

        let trade_id = self
            .history
            .log_trade(&NewTrade {
                symbol: decision.symbol.clone(),
                signal: label.to_string(),
                entry_price,
                quantity: quantity as i64,
                confidence: decision.confidence,
                strategy: decision.trade_type.as_label().to_string(),
            })
            .await
            .context("recording trade")?;

        self.session.lock().await.update_position(
            &decision.symbol,
            decision.trade_type,
            lots,
            entry_price,
        );

        Ok(ExecutedTrade { order, trade_id })
    }

    /// Close an open trade at the given price. P&L is side-aware: a
    /// SELL entry profits when price falls.
    #[allow(dead_code)]
    pub async fn close_position(&self, trade_id: i64, exit_price: f64) -> Result<f64> {
        let trades = self.history.open_trades().await?;
        let trade = trades
            .into_iter()
            .find(|t| t.id == trade_id)
            .with_context(|| format!("no open trade with id {trade_id}"))?;

        let pnl = if trade.signal == "BUY" {
            (exit_price - trade.entry_price) * trade.quantity as f64
        } else {
            (trade.entry_price - exit_price) * trade.quantity as f64
        };

        self.history.close_trade(trade_id, exit_price, pnl).await?;
        if let Some(realized) = self
            .session
            .lock()
            .await
            .close_position(&trade.symbol, exit_price)
        {
            tracing::debug!("Session realized {:.2} on {}", realized, trade.symbol);
        }

        tracing::info!("Closed trade {}: P&L = {:.2}", trade_id, pnl);
        Ok(pnl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use signal_core::TradeType;
    use uuid::Uuid;

    fn decision(signal: TradeSignal, confidence: f64) -> Decision {
        Decision {
            id: Uuid::new_v4(),
            symbol: "NIFTY".to_string(),
            signal,
            confidence,
            reasoning: String::new(),
            metadata: json!({}),
            timestamp: Utc::now(),
            trade_type: TradeType::Intraday,
            contributions: Vec::new(),
        }
    }

    async fn executor() -> TradeExecutor {
        let history = TradeHistory::new("sqlite::memory:").await.unwrap();
        TradeExecutor::new(history, Arc::new(Mutex::new(RiskSession::new())))
    }

    #[tokio::test]
    async fn buy_decision_places_and_records_an_order() {
        let executor = executor().await;

        let executed = executor
            .execute_trade(&decision(TradeSignal::Buy, 78.0), 150.0, 2, 50)
            .await
            .unwrap();

        assert_eq!(executed.order.order_id, "ORDER1001");
        assert_eq!(executed.order.status, "COMPLETE");
        assert_eq!(executed.order.product, "MIS");
        assert_eq!(executed.order.quantity, 100);

        let open = executor.history.open_trades().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].signal, "BUY");
        assert_eq!(open[0].quantity, 100);
        assert_eq!(open[0].strategy.as_deref(), Some("INTRADAY"));

        assert_eq!(executor.session.lock().await.daily_trades, 1);
    }

    #[tokio::test]
    async fn order_ids_are_sequential() {
        let executor = executor().await;

        let first = executor
            .execute_trade(&decision(TradeSignal::Buy, 80.0), 100.0, 1, 50)
            .await
            .unwrap();
        let second = executor
            .execute_trade(&decision(TradeSignal::Sell, 75.0), 100.0, 1, 50)
            .await
            .unwrap();

        assert_eq!(first.order.order_id, "ORDER1001");
        assert_eq!(second.order.order_id, "ORDER1002");
    }

    #[tokio::test]
    async fn non_directional_or_malformed_orders_are_rejected() {
        let executor = executor().await;

        let hold = decision(TradeSignal::Hold, 60.0);
        assert!(executor.execute_trade(&hold, 100.0, 1, 50).await.is_err());

        let buy = decision(TradeSignal::Buy, 80.0);
        assert!(executor.execute_trade(&buy, 0.0, 1, 50).await.is_err());
        assert!(executor.execute_trade(&buy, 100.0, 0, 50).await.is_err());

        assert!(executor.history.open_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closing_a_short_profits_when_price_falls() {
        let executor = executor().await;

        let executed = executor
            .execute_trade(&decision(TradeSignal::Sell, 80.0), 200.0, 1, 50)
            .await
            .unwrap();
        let pnl = executor.close_position(executed.trade_id, 180.0).await.unwrap();

        // (200 - 180) * 50 units
        assert_eq!(pnl, 1000.0);
        assert!(executor.history.open_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closing_an_unknown_trade_fails() {
        let executor = executor().await;
        assert!(executor.close_position(99, 100.0).await.is_err());
    }
}
