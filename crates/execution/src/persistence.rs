//! Crash-recovery persistence.
//!
//! The engine's last-known holdings and open order set are flushed to a JSON
//! file at teardown (and whenever the driver chooses), keyed by instrument
//! and order id, so a restarted process can resume without re-submitting
//! orders that are already working at the broker.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;
use meridian_core::{Holding, InstrumentId, Order, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Persisted engine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub taken_at: Timestamp,
    pub cash: Decimal,
    pub holdings: BTreeMap<InstrumentId, Holding>,
    pub open_orders: Vec<Order>,
}

/// JSON-file snapshot store
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a snapshot, replacing any previous one
    pub fn save(&self, snapshot: &EngineSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| Error::Persistence(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| Error::Persistence(e.to_string()))?;
        info!(
            "Persisted engine snapshot ({} holdings, {} open orders) to {}",
            snapshot.holdings.len(),
            snapshot.open_orders.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the snapshot if one exists
    pub fn load(&self) -> Result<Option<EngineSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw =
            std::fs::read_to_string(&self.path).map_err(|e| Error::Persistence(e.to_string()))?;
        let snapshot =
            serde_json::from_str(&raw).map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meridian_core::Side;
    use rust_decimal_macros::dec;

    #[test]
    fn snapshot_round_trips_through_disk() {
        let mut holdings = BTreeMap::new();
        holdings.insert(InstrumentId::from("AAA"), Holding::new(dec!(10), dec!(100)));
        let snapshot = EngineSnapshot {
            taken_at: Utc::now(),
            cash: dec!(9000),
            holdings,
            open_orders: vec![Order::new("BBB", Side::Buy, dec!(5), Utc::now())],
        };

        let path = std::env::temp_dir().join(format!("meridian-snap-{}.json", uuid::Uuid::new_v4()));
        let store = JsonStateStore::new(&path);
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.cash, snapshot.cash);
        assert_eq!(loaded.holdings, snapshot.holdings);
        assert_eq!(loaded.open_orders.len(), 1);
        assert_eq!(loaded.open_orders[0].id, snapshot.open_orders[0].id);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_loads_as_none() {
        let store = JsonStateStore::new(
            std::env::temp_dir().join(format!("meridian-missing-{}.json", uuid::Uuid::new_v4())),
        );
        assert!(store.load().unwrap().is_none());
    }
}
