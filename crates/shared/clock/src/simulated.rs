use std::sync::RwLock;

use meridian_core::Timestamp;
use meridian_ports::Clock;

/// Clock driven by the backtest session driver.
///
/// Time only moves when [`SimulatedClock::advance_to`] is called, once per
/// historical bar-close event. Reads between advances all observe the same
/// instant, which keeps every decision in a cycle stamped identically.
pub struct SimulatedClock {
    current: RwLock<Timestamp>,
}

impl SimulatedClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Advance simulated time. Going backwards is a driver bug; time is
    /// clamped forward rather than rewound.
    pub fn advance_to(&self, timestamp: Timestamp) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if timestamp > *current {
            *current = timestamp;
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Timestamp {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn name(&self) -> &str {
        "SimulatedClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn advances_monotonically() {
        let start = Utc::now();
        let clock = SimulatedClock::new(start);
        assert_eq!(clock.now(), start);

        let later = start + Duration::minutes(30);
        clock.advance_to(later);
        assert_eq!(clock.now(), later);

        // Rewinding is clamped
        clock.advance_to(start);
        assert_eq!(clock.now(), later);
    }
}
