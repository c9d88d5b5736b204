//! Configuration module for engine settings and YAML loading

pub mod logging;
mod loader;
mod types;

pub use loader::{load_config, load_config_from_str};
pub use types::{AppConfig, EngineConfig, LoopTiming, MonitorEntry, ViewEntry};
