//! # Network Configuration
//!
//! Serde records describing a supply network, plus the reference network
//! used when no configuration file is supplied.
//!
//! This module only *describes* a network. It performs no I/O and no
//! cross-record validation; [`NetworkModel::from_config`] does the latter
//! and `reroute-engine` reads these records from TOML.
//!
//! ## File Format
//! ```toml
//! [[warehouses]]
//! id = "Warehouse_North"
//! capacity = 3000
//! location = "North"
//! priority = 1
//!
//! [[hubs]]
//! id = "Hub_Midwest"
//! location = "Midwest"
//! max_throughput = 4500
//!
//! [[destinations]]
//! id = "Boston"
//! demand = 250
//!
//! [[routes]]
//! id = 1
//! origin = "Warehouse_North"
//! destination = "Boston"
//! unit_cost_cents = 1000
//!
//! [settings]
//! dynamic_unit_cost_cents = 2000
//! multihop_unit_cost_cents = 2600
//!
//! [currency]
//! base = "USD"
//!
//! [currency.per_base]
//! INR = 83.5
//! ```
//!
//! [`NetworkModel::from_config`]: crate::network::NetworkModel::from_config

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::{CurrencyCode, Money};
use crate::types::{Destination, Hub, Warehouse};

// =============================================================================
// Route Spec
// =============================================================================

/// A configured (primary) route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Must sit in the primary namespace (1..100).
    pub id: u32,
    pub origin: String,
    pub destination: String,
    #[serde(rename = "unit_cost_cents")]
    pub unit_cost: Money,
    /// Lane limit below the warehouse capacity, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
}

impl RouteSpec {
    pub fn new(
        id: u32,
        origin: impl Into<String>,
        destination: impl Into<String>,
        unit_cost: Money,
    ) -> Self {
        RouteSpec {
            id,
            origin: origin.into(),
            destination: destination.into(),
            unit_cost,
            capacity: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

// =============================================================================
// Network Settings
// =============================================================================

/// Pricing and eligibility rules for synthesized routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Flat per-unit cost of a dynamic (direct, synthesized) route.
    #[serde(rename = "dynamic_unit_cost_cents", default = "default_dynamic_unit_cost")]
    pub dynamic_unit_cost: Money,

    /// Flat per-unit cost of a warehouse → hub → destination route.
    #[serde(rename = "multihop_unit_cost_cents", default = "default_multihop_unit_cost")]
    pub multihop_unit_cost: Money,

    /// Warehouses ranked above this do not get dynamic lanes.
    /// `None` makes every warehouse eligible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_rank_cutoff: Option<u32>,
}

fn default_dynamic_unit_cost() -> Money {
    Money::from_cents(2000)
}

fn default_multihop_unit_cost() -> Money {
    Money::from_cents(2600)
}

impl Default for NetworkSettings {
    fn default() -> Self {
        NetworkSettings {
            dynamic_unit_cost: default_dynamic_unit_cost(),
            multihop_unit_cost: default_multihop_unit_cost(),
            dynamic_rank_cutoff: None,
        }
    }
}

// =============================================================================
// Currency Settings
// =============================================================================

/// Base currency plus fixed conversion rates.
///
/// `per_base["INR"] = 83.5` reads "one base unit buys 83.5 INR". Rates are
/// injected so tests can run with synthetic values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySettings {
    #[serde(default = "default_base_currency")]
    pub base: CurrencyCode,

    #[serde(default)]
    pub per_base: BTreeMap<CurrencyCode, f64>,
}

fn default_base_currency() -> CurrencyCode {
    CurrencyCode::from_static("USD")
}

impl Default for CurrencySettings {
    fn default() -> Self {
        let mut per_base = BTreeMap::new();
        per_base.insert(CurrencyCode::from_static("INR"), 83.50);

        CurrencySettings {
            base: default_base_currency(),
            per_base,
        }
    }
}

// =============================================================================
// Network Config
// =============================================================================

/// Complete static description of a supply network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub settings: NetworkSettings,

    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub warehouses: Vec<Warehouse>,

    #[serde(default)]
    pub hubs: Vec<Hub>,

    #[serde(default)]
    pub destinations: Vec<Destination>,

    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

impl NetworkConfig {
    /// An empty network with default settings. Mostly useful for tests that
    /// build a topology from scratch.
    pub fn empty() -> Self {
        NetworkConfig {
            settings: NetworkSettings::default(),
            currency: CurrencySettings::default(),
            warehouses: Vec::new(),
            hubs: Vec::new(),
            destinations: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn with_warehouse(mut self, id: &str, capacity: u64, location: &str, priority: u32) -> Self {
        self.warehouses.push(Warehouse {
            id: id.to_string(),
            capacity,
            location: location.to_string(),
            priority,
        });
        self
    }

    pub fn with_hub(mut self, id: &str, location: &str, max_throughput: u64) -> Self {
        self.hubs.push(Hub {
            id: id.to_string(),
            location: location.to_string(),
            max_throughput,
        });
        self
    }

    pub fn with_destination(mut self, id: &str, demand: u64) -> Self {
        self.destinations.push(Destination::new(id, demand));
        self
    }

    pub fn with_route(mut self, route: RouteSpec) -> Self {
        self.routes.push(route);
        self
    }
}

/// The reference network: five warehouses, three hubs, six cities and the
/// ten legacy lanes (ids 1-10).
impl Default for NetworkConfig {
    fn default() -> Self {
        let lanes: [(u32, &str, &str, i64); 10] = [
            (1, "Warehouse_North", "Boston", 1000),
            (2, "Warehouse_North", "New York", 1100),
            (3, "Warehouse_North", "Chicago", 1500),
            (4, "Warehouse_South", "Boston", 1400),
            (5, "Warehouse_North", "Philadelphia", 1200),
            (6, "Warehouse_South", "Chicago", 1300),
            (7, "Warehouse_South", "New York", 1250),
            (8, "Warehouse_South", "Philadelphia", 1150),
            (9, "Warehouse_North", "Miami", 1800),
            (10, "Warehouse_North", "Dallas", 1700),
        ];

        let config = NetworkConfig::empty()
            .with_warehouse("Warehouse_North", 3000, "North", 1)
            .with_warehouse("Warehouse_South", 3000, "South", 2)
            .with_warehouse("Warehouse_East", 2500, "East", 3)
            .with_warehouse("Warehouse_West", 2500, "West", 4)
            .with_warehouse("Warehouse_Central", 3500, "Central", 5)
            .with_hub("Hub_Northeast", "Northeast", 5000)
            .with_hub("Hub_Midwest", "Midwest", 4500)
            .with_hub("Hub_Southeast", "Southeast", 4000)
            .with_destination("Boston", 250)
            .with_destination("New York", 400)
            .with_destination("Chicago", 300)
            .with_destination("Philadelphia", 400)
            .with_destination("Miami", 200)
            .with_destination("Dallas", 350);

        lanes
            .into_iter()
            .fold(config, |config, (id, origin, destination, cents)| {
                config.with_route(RouteSpec::new(id, origin, destination, Money::from_cents(cents)))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_network_shape() {
        let config = NetworkConfig::default();
        assert_eq!(config.warehouses.len(), 5);
        assert_eq!(config.hubs.len(), 3);
        assert_eq!(config.destinations.len(), 6);
        assert_eq!(config.routes.len(), 10);
        assert_eq!(config.currency.base.as_str(), "USD");

        let supply: u64 = config.warehouses.iter().map(|w| w.capacity).sum();
        assert_eq!(supply, 14_500);
    }

    #[test]
    fn test_json_round_trip_keeps_money_as_cents() {
        let spec = RouteSpec::new(1, "Warehouse_North", "Boston", Money::from_cents(1000));
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"unit_cost_cents\":1000"));
        assert!(!json.contains("capacity"));

        let back: RouteSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_settings_defaults_when_missing() {
        let config: NetworkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.settings, NetworkSettings::default());
        assert!(config.warehouses.is_empty());
    }
}
