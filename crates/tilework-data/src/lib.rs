pub mod config;
pub mod loader;
pub mod schema;

pub use config::{ResolvedConfig, find_config, load_config, parse_config};
pub use loader::{DataLoadError, Format};
