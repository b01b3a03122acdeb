//! Automation config: load, validate and resolve into engine types.
//!
//! ```text
//! automation.{ron,toml,json} --deserialize--> AutomationConfigData
//!                            --validate-----> tick_interval >= 1
//!                            --resolve------> ResolvedConfig { SchedulerConfig, ConnectorRegistry }
//! ```
//!
//! Connector names that match nothing in the catalog are not an error. They
//! are logged and otherwise ignored.

use crate::loader::{DataLoadError, Format, deserialize_file, deserialize_str, find_data_file};
use crate::schema::AutomationConfigData;
use std::path::Path;
use tilework_core::connector::ConnectorRegistry;
use tilework_core::scheduler::{Scheduler, SchedulerConfig};
use tracing::{debug, warn};

/// Base name of the config file looked up by [`find_config`].
pub const CONFIG_BASE_NAME: &str = "automation";

/// Config ready to hand to [`Scheduler::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub scheduler: SchedulerConfig,
    pub connectors: ConnectorRegistry,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            connectors: ConnectorRegistry::empty(),
        }
    }
}

impl ResolvedConfig {
    pub fn into_scheduler(self) -> Scheduler {
        Scheduler::new(self.scheduler, self.connectors)
    }
}

/// Load and resolve a config file. The format comes from the extension.
pub fn load_config(path: &Path) -> Result<ResolvedConfig, DataLoadError> {
    let data: AutomationConfigData = deserialize_file(path)?;
    resolve(data, path)
}

/// Load `automation.{ron,toml,json}` from `dir`, or defaults if none exists.
pub fn find_config(dir: &Path) -> Result<ResolvedConfig, DataLoadError> {
    match find_data_file(dir, CONFIG_BASE_NAME)? {
        Some(path) => load_config(&path),
        None => {
            debug!(dir = %dir.display(), "no automation config found, using defaults");
            Ok(ResolvedConfig::default())
        }
    }
}

/// Parse and resolve config held in memory. `origin` only labels errors.
pub fn parse_config(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<ResolvedConfig, DataLoadError> {
    let data: AutomationConfigData = deserialize_str(content, format, origin)?;
    resolve(data, origin)
}

/// Validate the raw data and resolve connector names.
pub fn resolve(data: AutomationConfigData, origin: &Path) -> Result<ResolvedConfig, DataLoadError> {
    if data.tick_interval == 0 {
        return Err(DataLoadError::Invalid {
            file: origin.to_path_buf(),
            field: "tick_interval",
            detail: "must be at least 1".into(),
        });
    }

    let connectors = ConnectorRegistry::from_names(&data.connectors);
    for name in connectors.unmatched() {
        warn!(file = %origin.display(), connector = %name, "unknown connector name ignored");
    }
    debug!(
        file = %origin.display(),
        tick_interval = data.tick_interval,
        connectors = connectors.len(),
        "automation config resolved"
    );

    Ok(ResolvedConfig {
        scheduler: SchedulerConfig {
            tick_interval: data.tick_interval,
        },
        connectors,
    })
}
