use crate::{MarketInputs, SignalError, SignalResult, TradeType};
use async_trait::async_trait;

/// Contract shared by every specialist producer.
///
/// Producers are side-effect-free with respect to their inputs and may
/// run concurrently. A producer whose required input is absent returns
/// an abstain result, not an error; Err is reserved for genuine faults
/// and is substituted by the pipeline with an Error result so the
/// remaining producers are unaffected.
#[async_trait]
pub trait SignalProducer: Send + Sync {
    /// Stable identifier, used as the weight-table key.
    fn id(&self) -> &'static str;

    /// Horizon this producer speaks for.
    fn trade_type(&self) -> TradeType;

    async fn evaluate(
        &self,
        symbol: &str,
        inputs: &MarketInputs,
    ) -> Result<SignalResult, SignalError>;
}
