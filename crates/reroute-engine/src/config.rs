//! # Engine Configuration
//!
//! Loads the supply network description and engine settings.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     REROUTE_BASE_CURRENCY=USD                                          │
//! │     REROUTE_DYNAMIC_RANK_CUTOFF=3                                      │
//! │     REROUTE_DYNAMIC_UNIT_COST=2000       (cents)                       │
//! │     REROUTE_MULTIHOP_UNIT_COST=2600      (cents)                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     explicit path, else $REROUTE_CONFIG, else                          │
//! │     ~/.config/reroute/network.toml (Linux)                             │
//! │     ~/Library/Application Support/com.reroute.reroute/network.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     The reference network: 5 warehouses, 3 hubs, 6 cities             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [logging]
//! filter = "info,reroute=debug"
//!
//! [settings]
//! dynamic_unit_cost_cents = 2000
//! multihop_unit_cost_cents = 2600
//! dynamic_rank_cutoff = 3
//!
//! [currency]
//! base = "USD"
//! per_base = { INR = 83.5 }
//!
//! [[warehouses]]
//! id = "Warehouse_North"
//! capacity = 3000
//! location = "North"
//! priority = 1
//!
//! # hubs, destinations, routes ...
//! ```
//! A file replaces the reference network section by section: a file that
//! lists warehouses but no hubs yields a network without hubs.

use reroute_core::{CostModel, CurrencyCode, Money, NetworkConfig, NetworkModel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::logging::DEFAULT_LOG_FILTER;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "REROUTE_CONFIG";

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerouteConfig {
    #[serde(default)]
    pub logging: LogSettings,

    #[serde(flatten)]
    pub network: NetworkConfig,
}

impl Default for RerouteConfig {
    fn default() -> Self {
        RerouteConfig {
            logging: LogSettings::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl RerouteConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading network config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using the reference network");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns the reference network if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load network config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses TOML without applying environment overrides or validation.
    pub fn from_toml_str(contents: &str) -> EngineResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration as pretty TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Network config saved");
        Ok(path)
    }

    /// Checks that the configuration builds a usable network.
    ///
    /// Builds a throwaway [`NetworkModel`] and [`CostModel`], so every
    /// rule those constructors enforce is checked here too.
    pub fn validate(&self) -> EngineResult<()> {
        if self.network.warehouses.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one warehouse is required".into(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "logging.filter must not be empty".into(),
            ));
        }

        CostModel::from_settings(&self.network.currency)?;
        NetworkModel::from_config(self.network.clone())?;
        Ok(())
    }

    /// Applies `REROUTE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and skipped.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(code) = lookup("REROUTE_BASE_CURRENCY") {
            match code.parse::<CurrencyCode>() {
                Ok(parsed) => {
                    debug!(currency = %parsed, "Overriding base currency from environment");
                    self.network.currency.base = parsed;
                }
                Err(e) => warn!(value = %code, error = %e, "Ignoring REROUTE_BASE_CURRENCY"),
            }
        }

        if let Some(cutoff) = lookup("REROUTE_DYNAMIC_RANK_CUTOFF") {
            match cutoff.trim().parse::<u32>() {
                Ok(rank) => {
                    debug!(rank, "Overriding dynamic rank cutoff from environment");
                    self.network.settings.dynamic_rank_cutoff = Some(rank);
                }
                Err(_) => warn!(value = %cutoff, "Ignoring REROUTE_DYNAMIC_RANK_CUTOFF"),
            }
        }

        if let Some(cost) = lookup("REROUTE_DYNAMIC_UNIT_COST") {
            match cost.trim().parse::<i64>() {
                Ok(cents) => self.network.settings.dynamic_unit_cost = Money::from_cents(cents),
                Err(_) => warn!(value = %cost, "Ignoring REROUTE_DYNAMIC_UNIT_COST"),
            }
        }

        if let Some(cost) = lookup("REROUTE_MULTIHOP_UNIT_COST") {
            match cost.trim().parse::<i64>() {
                Ok(cents) => self.network.settings.multihop_unit_cost = Money::from_cents(cents),
                Err(_) => warn!(value = %cost, "Ignoring REROUTE_MULTIHOP_UNIT_COST"),
            }
        }
    }

    /// `$REROUTE_CONFIG`, else `network.toml` in the platform config dir.
    pub fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        directories::ProjectDirs::from("com", "reroute", "reroute")
            .map(|dirs| dirs.config_dir().join("network.toml"))
    }
}
