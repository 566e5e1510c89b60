//! Network fixtures shared by the unit tests.

use crate::config::{CurrencySettings, NetworkConfig, RouteSpec};
use crate::cost::CostModel;
use crate::money::Money;
use crate::network::NetworkModel;

/// The default five-warehouse, three-hub network.
pub fn reference_network() -> NetworkModel {
    NetworkModel::from_config(NetworkConfig::default()).unwrap()
}

/// The reference network without any hubs, so there is no multihop fallback.
pub fn no_hub_network() -> NetworkModel {
    let mut config = NetworkConfig::default();
    config.hubs.clear();
    NetworkModel::from_config(config).unwrap()
}

/// Five warehouses (3000, 3000, 2500, 2500, 3500), one hub and a "Metro"
/// destination fed directly by routes 1-5.
pub fn single_hub_network(hub_throughput: u64) -> NetworkModel {
    let capacities = [3000, 3000, 2500, 2500, 3500];
    let mut config = NetworkConfig::empty()
        .with_hub("Hub_Central", "Central", hub_throughput)
        .with_destination("Metro", 10_000);

    for (i, capacity) in capacities.into_iter().enumerate() {
        let rank = i as u32 + 1;
        let id = format!("Warehouse_{}", rank);
        config = config
            .with_warehouse(&id, capacity, "Region", rank)
            .with_route(RouteSpec::new(rank, id.as_str(), "Metro", Money::from_cents(1000 + 100 * rank as i64)));
    }

    NetworkModel::from_config(config).unwrap()
}

pub fn cost_model() -> CostModel {
    CostModel::from_settings(&CurrencySettings::default()).unwrap()
}
