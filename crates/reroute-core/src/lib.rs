//! # reroute-core: Disruption-Aware Shipment Planning
//!
//! This crate is the optimisation core of the rerouting system. Given a
//! supply network, a structured shipment requirement and a set of
//! disruption events, it computes the cheapest feasible plan, a plan that
//! holds up across several scenarios, and the diff against the undisrupted
//! baseline.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rerouting Pipeline                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │         Extraction & risk sources (outside this workspace)      │   │
//! │  │   free text ──► ShipmentRequirement    news ──► DisruptionEvent │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ reroute-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  network  │  │   cost    │  │  solver   │  │  impact   │  │   │
//! │  │   │  routes   │─►│  prices   │─►│ guardian  │─►│   diff    │  │   │
//! │  │   │  ids      │  │  budgets  │  │  plans    │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TEXT PARSING • DETERMINISTIC                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 reroute-engine (sessions, config)               │   │
//! │  │            TOML config, logging, shared planning sessions       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`network`] - Warehouses, hubs, destinations, route synthesis
//! - [`cost`] - Disruption folding, effective costs, currency conversion
//! - [`solver`] - Single-scenario min-cost plans
//! - [`guardian`] - Multi-scenario robust plans
//! - [`impact`] - Baseline vs mitigated diff
//! - [`money`] - Integer money in base-currency cents
//! - [`config`] - Serde records describing a network
//!
//! ## Example Usage
//!
//! ```rust
//! use reroute_core::{
//!     generate_impact_report, solve_mitigation_plan, CostModel, DisruptionEvent,
//!     NetworkConfig, NetworkModel, RouteId, ShipmentRequirement,
//! };
//!
//! let config = NetworkConfig::default();
//! let costs = CostModel::from_settings(&config.currency).unwrap();
//! let network = NetworkModel::from_config(config).unwrap();
//!
//! let requirement = ShipmentRequirement::new("New York", 400).unwrap();
//! let collapse = DisruptionEvent::new([RouteId(2)], "Infrastructure Collapse", 20.0).unwrap();
//!
//! let baseline = solve_mitigation_plan(&network, &costs, &requirement, &[]).unwrap();
//! let mitigated = solve_mitigation_plan(&network, &costs, &requirement, &[collapse]).unwrap();
//! let report = generate_impact_report(&baseline, &mitigated);
//!
//! assert_eq!(mitigated.total_cost.cents(), 500_000);
//! assert_eq!(report.cost_delta.cents(), 60_000);
//! assert!(report.routes_added.contains(&RouteId(7)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod cost;
pub mod error;
pub mod flow;
pub mod guardian;
pub mod impact;
pub mod money;
pub mod network;
pub mod plan;
pub mod solver;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{CurrencySettings, NetworkConfig, NetworkSettings, RouteSpec};
pub use cost::{CostModel, DisruptionState, ExchangeRates};
pub use error::{CoreError, CoreResult, ValidationError};
pub use guardian::{CandidateSource, GuardianPlan, GuardianSolver};
pub use impact::{ImpactReport, ImpactReportBuilder, RouteChange};
pub use money::{CurrencyCode, Money};
pub use network::{NetworkModel, NetworkSummary, RouteView};
pub use plan::{Plan, SolveOutcome};
pub use solver::MitigationSolver;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// First id handed to a synthesized direct route. Ids below are primary.
pub const DYNAMIC_ROUTE_START_ID: u32 = 100;

/// First id handed to a warehouse → hub → destination route.
pub const MULTIHOP_ROUTE_START_ID: u32 = 1000;

/// Longest accepted warehouse, hub or destination name.
pub const MAX_NODE_ID_LEN: usize = 100;

/// Largest accepted warehouse capacity, hub throughput or destination demand.
pub const MAX_CAPACITY: u64 = 1_000_000_000_000;

// =============================================================================
// Entry Points
// =============================================================================

/// Cheapest plan for one requirement under one set of disruptions.
pub fn solve_mitigation_plan(
    network: &NetworkModel,
    costs: &CostModel,
    requirement: &ShipmentRequirement,
    disruptions: &[DisruptionEvent],
) -> CoreResult<Plan> {
    MitigationSolver::new(network, costs).solve(requirement, disruptions)
}

/// Plan that stays feasible, and cheapest in the worst case, across
/// several disruption scenarios.
pub fn solve_guardian_plan(
    network: &NetworkModel,
    costs: &CostModel,
    requirement: &ShipmentRequirement,
    scenarios: &[Vec<DisruptionEvent>],
) -> CoreResult<GuardianPlan> {
    GuardianSolver::new(network, costs).solve(requirement, scenarios)
}

pub fn generate_impact_report(baseline: &Plan, mitigated: &Plan) -> ImpactReport {
    ImpactReportBuilder::new().build(baseline, mitigated)
}
