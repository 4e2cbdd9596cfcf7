//! Configuration management for IMF tools.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults for every missing key
//!
//! # Example
//!
//! ```no_run
//! use imf_core::config::{ConfigManager, ConfigSection};
//! use imf_core::logging::LogLevel;
//!
//! let mut config = ConfigManager::new(".config/imf.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Asset map: {}", config.settings().discovery.asset_map_name);
//!
//! config.settings_mut().logging.level = LogLevel::Debug;
//! config.update_section(ConfigSection::Logging).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{ConfigSection, DiscoverySettings, LoggingSettings, Settings};
