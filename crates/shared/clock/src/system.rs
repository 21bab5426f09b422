use chrono::Utc;
use meridian_core::Timestamp;
use meridian_ports::Clock;

/// Real UTC wall clock for live trading
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
