//! Settings struct with TOML-based sections.
//!
//! Each section maps to a TOML table and can be rewritten on its own.

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// How package documents are located in a directory.
    #[serde(default)]
    pub discovery: DiscoverySettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// File names used to find the documents of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    /// File name of the asset map at the package root.
    #[serde(default = "default_asset_map_name")]
    pub asset_map_name: String,

    /// Prefix of composition playlist file names (`<prefix>*.xml`).
    #[serde(default = "default_composition_prefix")]
    pub composition_prefix: String,

    /// Prefix of output profile list file names (`<prefix>*.xml`).
    #[serde(default = "default_output_profile_prefix")]
    pub output_profile_prefix: String,
}

fn default_asset_map_name() -> String {
    "ASSETMAP.xml".to_string()
}

fn default_composition_prefix() -> String {
    "CPL".to_string()
}

fn default_output_profile_prefix() -> String {
    "OPL".to_string()
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            asset_map_name: default_asset_map_name(),
            composition_prefix: default_composition_prefix(),
            output_profile_prefix: default_output_profile_prefix(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level when `RUST_LOG` is unset.
    #[serde(default)]
    pub level: LogLevel,

    /// Include module paths in log lines.
    #[serde(default)]
    pub show_target: bool,

    /// Prefix log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            show_target: false,
            show_timestamps: true,
        }
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level,
            show_target: settings.show_target,
            show_timestamps: settings.show_timestamps,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Discovery,
    Logging,
}

impl ConfigSection {
    /// Every section, in file order.
    pub const ALL: [ConfigSection; 2] = [ConfigSection::Discovery, ConfigSection::Logging];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Discovery => "discovery",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Discovery => "Package document discovery",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
