use std::collections::BTreeMap;

use chrono::Duration;
use log::info;
use meridian_core::{Bar, InstrumentId, Timestamp};
use meridian_ports::{BarFeed, CycleBars, FeedError};
use rust_decimal_macros::dec;

/// Historical bar replay behind the `BarFeed` port.
///
/// Applies the loader hygiene rules before anything reaches the strategy:
/// bars with a close under 1.00 or non-positive volume are dropped, and a
/// duplicate (instrument, timestamp) keeps only the last occurrence. What
/// survives is grouped by timestamp so each `next_cycle` call yields one
/// bar-close boundary across instruments.
pub struct ReplayFeed {
    cycles: BTreeMap<Timestamp, Vec<Bar>>,
    interval: Duration,
}

impl ReplayFeed {
    pub fn new(bars: Vec<Bar>, interval: Duration) -> Self {
        let raw_count = bars.len();

        // Keep-last per (instrument, timestamp), dropping unclean bars
        let mut deduped: BTreeMap<(InstrumentId, Timestamp), Bar> = BTreeMap::new();
        for bar in bars {
            if bar.close < dec!(1.00) || bar.volume <= dec!(0) {
                continue;
            }
            deduped.insert((bar.instrument_id.clone(), bar.timestamp), bar);
        }

        let mut cycles: BTreeMap<Timestamp, Vec<Bar>> = BTreeMap::new();
        let kept = deduped.len();
        for ((_, timestamp), bar) in deduped {
            cycles.entry(timestamp).or_default().push(bar);
        }

        if kept < raw_count {
            info!(
                "Replay feed: kept {} of {} bars after hygiene",
                kept, raw_count
            );
        }
        Self { cycles, interval }
    }

    /// Number of bar-close boundaries remaining
    pub fn remaining_cycles(&self) -> usize {
        self.cycles.len()
    }
}

impl BarFeed for ReplayFeed {
    fn next_cycle(&mut self) -> Result<Option<CycleBars>, FeedError> {
        let Some((&timestamp, _)) = self.cycles.first_key_value() else {
            return Ok(None);
        };
        let bars = self.cycles.remove(&timestamp).unwrap_or_default();
        // The cycle fires when these bars have fully closed
        Ok(Some(CycleBars::new(timestamp + self.interval, bars)))
    }
}
