use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::StatisticsBucket;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

impl GeneralConfig {
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(Error::InvalidConfig(format!("unknown log level '{}'", self.log_level)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Bucket used when a recompute request does not name one.
    pub default_bucket: StatisticsBucket,
    /// Days before today covered when a recompute request has no start date.
    pub lookback_days: u32,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self { default_bucket: StatisticsBucket::Monthly, lookback_days: 90 }
    }
}

impl StatisticsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(Error::InvalidConfig("lookback_days must be at least 1".to_string()));
        }
        Ok(())
    }
}
