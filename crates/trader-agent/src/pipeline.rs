use std::sync::Arc;

use signal_core::{MarketInputs, SignalError, SignalProducer, SignalResult};
use tokio::sync::Semaphore;

/// One permit per registered producer.
const FAN_OUT_PERMITS: usize = 5;

/// Fans the registered producers out across a bounded worker pool and
/// collects their results in registration order, not completion order,
/// so the reasoning assembled downstream is reproducible run to run.
pub struct SignalPipeline {
    producers: Vec<Arc<dyn SignalProducer>>,
    permits: Arc<Semaphore>,
}

impl SignalPipeline {
    pub fn new() -> Self {
        Self {
            producers: Vec::new(),
            permits: Arc::new(Semaphore::new(FAN_OUT_PERMITS)),
        }
    }

    pub fn register(&mut self, producer: Arc<dyn SignalProducer>) {
        self.producers.push(producer);
    }

    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    /// Run every producer against the same inputs. A producer that
    /// returns Err or panics contributes an Error result at confidence
    /// 0 in its slot; it never takes the other producers down with it.
    pub async fn run(&self, symbol: &str, inputs: &MarketInputs) -> Vec<SignalResult> {
        let mut handles = Vec::with_capacity(self.producers.len());
        for producer in &self.producers {
            let producer = Arc::clone(producer);
            let permits = Arc::clone(&self.permits);
            let symbol = symbol.to_string();
            let inputs = inputs.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| SignalError::Calculation(format!("worker pool closed: {e}")))?;
                producer.evaluate(&symbol, &inputs).await
            }));
        }

        let mut results = Vec::with_capacity(self.producers.len());
        for (producer, handle) in self.producers.iter().zip(handles) {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    tracing::warn!("Producer {} failed: {}", producer.id(), e);
                    SignalResult::fault(producer.id(), e, producer.trade_type())
                }
                Err(e) => {
                    tracing::error!("Producer {} task aborted: {}", producer.id(), e);
                    SignalResult::fault(producer.id(), e, producer.trade_type())
                }
            };
            results.push(result);
        }
        results
    }
}

impl Default for SignalPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use signal_core::{TradeSignal, TradeType};
    use std::time::Duration;

    struct StubProducer {
        id: &'static str,
        delay_ms: u64,
        confidence: f64,
    }

    #[async_trait]
    impl SignalProducer for StubProducer {
        fn id(&self) -> &'static str {
            self.id
        }

        fn trade_type(&self) -> TradeType {
            TradeType::Both
        }

        async fn evaluate(
            &self,
            _symbol: &str,
            _inputs: &MarketInputs,
        ) -> Result<SignalResult, SignalError> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(SignalResult::new(
                self.id,
                TradeSignal::Buy,
                self.confidence,
                "stub fired",
                serde_json::json!({}),
                TradeType::Both,
            ))
        }
    }

    struct BrokenProducer;

    #[async_trait]
    impl SignalProducer for BrokenProducer {
        fn id(&self) -> &'static str {
            "broken"
        }

        fn trade_type(&self) -> TradeType {
            TradeType::Both
        }

        async fn evaluate(
            &self,
            _symbol: &str,
            _inputs: &MarketInputs,
        ) -> Result<SignalResult, SignalError> {
            Err(SignalError::Fetch("upstream timed out".to_string()))
        }
    }

    struct PanickingProducer;

    #[async_trait]
    impl SignalProducer for PanickingProducer {
        fn id(&self) -> &'static str {
            "panicky"
        }

        fn trade_type(&self) -> TradeType {
            TradeType::Both
        }

        async fn evaluate(
            &self,
            _symbol: &str,
            _inputs: &MarketInputs,
        ) -> Result<SignalResult, SignalError> {
            panic!("rule table exploded")
        }
    }

    #[tokio::test]
    async fn results_come_back_in_registration_order() {
        let mut pipeline = SignalPipeline::new();
        pipeline.register(Arc::new(StubProducer {
            id: "slow",
            delay_ms: 50,
            confidence: 80.0,
        }));
        pipeline.register(Arc::new(StubProducer {
            id: "fast",
            delay_ms: 0,
            confidence: 60.0,
        }));

        let results = pipeline.run("NIFTY", &MarketInputs::default()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].producer_id, "slow");
        assert_eq!(results[1].producer_id, "fast");
    }

    #[tokio::test]
    async fn faulted_producer_is_substituted() {
        let mut pipeline = SignalPipeline::new();
        pipeline.register(Arc::new(BrokenProducer));
        pipeline.register(Arc::new(StubProducer {
            id: "healthy",
            delay_ms: 0,
            confidence: 70.0,
        }));

        let results = pipeline.run("NIFTY", &MarketInputs::default()).await;

        assert_eq!(results[0].producer_id, "broken");
        assert_eq!(results[0].signal, TradeSignal::Error);
        assert_eq!(results[0].confidence, 0.0);
        assert!(results[0].reasoning.contains("upstream timed out"));
        assert_eq!(results[1].producer_id, "healthy");
        assert_eq!(results[1].confidence, 70.0);
    }

    #[tokio::test]
    async fn panicking_producer_does_not_abort_the_round() {
        let mut pipeline = SignalPipeline::new();
        pipeline.register(Arc::new(PanickingProducer));
        pipeline.register(Arc::new(StubProducer {
            id: "healthy",
            delay_ms: 0,
            confidence: 90.0,
        }));

        let results = pipeline.run("NIFTY", &MarketInputs::default()).await;

        assert_eq!(results[0].signal, TradeSignal::Error);
        assert_eq!(results[0].confidence, 0.0);
        assert_eq!(results[1].producer_id, "healthy");
        assert_eq!(results[1].signal, TradeSignal::Buy);
    }
}
