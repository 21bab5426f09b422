use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

/// Execution Engine configuration
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Deltas smaller than this many units are not traded (rounding noise)
    pub min_trade_qty: Decimal,
    /// Deltas worth less than this are not traded
    pub min_trade_notional: Decimal,
    /// Quantities round toward zero to this step (1 = whole shares)
    pub quantity_step: Decimal,
    /// Bounded retry budget for broker errors classified transient
    pub max_transient_retries: u32,
    /// Base delay between transient retries (doubles per attempt)
    pub retry_backoff: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            min_trade_qty: Decimal::ONE,
            min_trade_notional: dec!(1),
            quantity_step: Decimal::ONE,
            max_transient_retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}
