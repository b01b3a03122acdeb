//! Serde structs for the on-disk automation config.
//!
//! The same struct is read from RON, TOML or JSON:
//!
//! ```ron
//! (
//!     tick_interval: 60,
//!     connectors: ["GravelPath", "WoodPath"],
//! )
//! ```

use serde::Deserialize;
use tilework_core::scheduler::DEFAULT_TICK_INTERVAL;

/// Top-level automation config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationConfigData {
    /// Ticks between automation cycles. Must be at least 1.
    #[serde(default = "default_tick_interval")]
    pub tick_interval: u32,
    /// Connector names, matched case-insensitively against the catalog.
    #[serde(default)]
    pub connectors: Vec<String>,
}

impl Default for AutomationConfigData {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            connectors: Vec::new(),
        }
    }
}

fn default_tick_interval() -> u32 {
    DEFAULT_TICK_INTERVAL
}
