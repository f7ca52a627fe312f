//! Store configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for talking to the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound for each product or entitlement fetch, in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
        }
    }
}

impl StoreConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl ConfigSection for StoreConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::in_range(
            self.fetch_timeout_secs,
            1,
            120,
            "store.fetch_timeout_secs",
        )])
    }

    fn merge(&mut self, other: Self) {
        self.fetch_timeout_secs = other.fetch_timeout_secs;
    }

    fn section_name(&self) -> &'static str {
        "store"
    }
}
