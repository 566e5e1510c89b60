//! # Mitigation Solver
//!
//! Minimum-cost allocation of one shipment requirement over the routes a
//! network offers under one disruption state.
//!
//! ## Flow Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            cap = warehouse                cap = route (post-disruption) │
//! │  source ──────────────► Warehouse_North ──────────────────► sink        │
//! │     │                          │                              ▲         │
//! │     │                          │ multihop route               │         │
//! │     │                          ▼                              │         │
//! │     │                     Hub_Midwest ───────────────────────┘         │
//! │     │                                  cap = hub throughput             │
//! │     └─────────────────► Warehouse_South ──► ...                         │
//! │                                                                         │
//! │  Flow limit = requested quantity. Whatever cannot be pushed through    │
//! │  is reported as unmet demand, never as an error.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::cost::{CostModel, DisruptionState};
use crate::error::CoreResult;
use crate::flow::{ArcCost, FlowNetwork};
use crate::money::Money;
use crate::network::{NetworkModel, RouteView};
use crate::plan::{Plan, SolveOutcome};
use crate::types::{DisruptionEvent, ShipmentRequirement};

/// Solves single-scenario mitigation plans against a fixed network.
#[derive(Debug, Clone, Copy)]
pub struct MitigationSolver<'a> {
    network: &'a NetworkModel,
    costs: &'a CostModel,
}

impl<'a> MitigationSolver<'a> {
    pub fn new(network: &'a NetworkModel, costs: &'a CostModel) -> Self {
        MitigationSolver { network, costs }
    }

    pub fn network(&self) -> &'a NetworkModel {
        self.network
    }

    pub fn costs(&self) -> &'a CostModel {
        self.costs
    }

    /// Cheapest plan for `requirement` under `events`.
    ///
    /// Errors only on malformed input (bad ranges, unknown budget currency).
    /// Shortfalls, closed networks and unknown destinations come back as a
    /// plan with the matching [`SolveOutcome`].
    pub fn solve(
        &self,
        requirement: &ShipmentRequirement,
        events: &[DisruptionEvent],
    ) -> CoreResult<Plan> {
        requirement.validate()?;
        for event in events {
            event.validate()?;
        }

        let state = DisruptionState::from_events(events);
        self.solve_state(requirement, &state)
    }

    /// The plan with no disruption at all.
    pub fn baseline(&self, requirement: &ShipmentRequirement) -> CoreResult<Plan> {
        requirement.validate()?;
        self.solve_state(requirement, &DisruptionState::clear())
    }

    /// Solves against an already folded disruption state.
    pub fn solve_state(
        &self,
        requirement: &ShipmentRequirement,
        state: &DisruptionState,
    ) -> CoreResult<Plan> {
        let view = self.prepare(requirement, state)?;
        self.solve_view(requirement, &view, state)
    }

    /// Resolves the route view and reports disruption targets that match
    /// no route, after synthesis so freshly assigned ids count as known.
    pub(crate) fn prepare(
        &self,
        requirement: &ShipmentRequirement,
        state: &DisruptionState,
    ) -> CoreResult<RouteView> {
        let destination = self
            .network
            .request_destination(&requirement.destination, requirement.quantity);
        let view = self.network.resolve(&destination, state)?;
        self.costs
            .report_unknown_targets(state, |id| self.network.knows_route(id));

        debug!(
            destination = %requirement.destination,
            direct = view.direct.len(),
            multihop = view.multihop.len(),
            disrupted = state.targets().count(),
            "Resolved route view"
        );
        Ok(view)
    }

    /// Solves against a resolved view. The view must come from
    /// [`MitigationSolver::prepare`] (or the network's `resolve`).
    pub(crate) fn solve_view(
        &self,
        requirement: &ShipmentRequirement,
        view: &RouteView,
        state: &DisruptionState,
    ) -> CoreResult<Plan> {
        let budget = requirement
            .budget
            .as_ref()
            .map(|b| self.costs.budget_in_base(b))
            .transpose()?;
        let destination = requirement.destination.as_str();
        let quantity = requirement.quantity;

        if view.is_empty() && !view.predefined {
            warn!(destination = %destination, "Destination is unknown and no route could be synthesized");
            return Ok(Plan::empty(destination, quantity, SolveOutcome::UnresolvedDestination));
        }

        let priced = self.costs.price(view, state);
        if priced.iter().all(|p| p.capacity == 0) {
            warn!(destination = %destination, routes = priced.len(), "Every route is at zero capacity");
            return Ok(Plan::empty(destination, quantity, SolveOutcome::NoCapacity));
        }

        // Build the graph in ascending route id order so node and arc
        // numbering, and therefore tie-breaking, is stable.
        let mut graph = FlowNetwork::new();
        let source = graph.add_node();
        let sink = graph.add_node();
        let mut warehouse_nodes: BTreeMap<&str, usize> = BTreeMap::new();
        let mut hub_nodes: BTreeMap<&str, usize> = BTreeMap::new();
        let mut route_arcs = Vec::with_capacity(priced.len());

        for priced_route in priced.iter().filter(|p| p.capacity > 0) {
            let route = &priced_route.route;
            let Some(warehouse) = self.network.warehouse(&route.origin) else {
                continue;
            };

            let from = match warehouse_nodes.get(warehouse.id.as_str()) {
                Some(node) => *node,
                None => {
                    let node = graph.add_node();
                    graph.add_arc(source, node, warehouse.capacity, ArcCost::default());
                    warehouse_nodes.insert(warehouse.id.as_str(), node);
                    node
                }
            };

            let to = match &route.hub {
                None => sink,
                Some(hub_id) => {
                    let Some(hub) = self.network.hub(hub_id) else {
                        continue;
                    };
                    match hub_nodes.get(hub.id.as_str()) {
                        Some(node) => *node,
                        None => {
                            let node = graph.add_node();
                            graph.add_arc(node, sink, hub.max_throughput, ArcCost::default());
                            hub_nodes.insert(hub.id.as_str(), node);
                            node
                        }
                    }
                }
            };

            let cost = ArcCost::new(
                priced_route.unit_cost.cents(),
                route.hops(),
                warehouse.priority,
                route.id.get(),
            );
            let arc = graph.add_arc(from, to, priced_route.capacity, cost);
            route_arcs.push((route.id, arc, priced_route.unit_cost));
        }

        let shipped = graph.min_cost_flow(source, sink, quantity);
        debug!(destination = %destination, requested = quantity, shipped, "Flow solved");

        let mut plan = Plan::from_allocations(
            destination,
            quantity,
            route_arcs
                .iter()
                .map(|(id, arc, unit_cost)| (*id, graph.flow(*arc), *unit_cost)),
        );
        if let Some(budget) = budget {
            plan = plan.with_budget(budget);
        }

        log_plan(&plan, budget);
        Ok(plan)
    }
}

fn log_plan(plan: &Plan, budget: Option<Money>) {
    if let Some(overage) = plan.budget_overage {
        warn!(
            destination = %plan.destination,
            total_cost = %plan.total_cost,
            budget = %budget.unwrap_or_default(),
            overage = %overage,
            "Plan exceeds budget"
        );
    }
    info!(
        destination = %plan.destination,
        outcome = %plan.outcome,
        routes = plan.allocations.len(),
        total_cost = %plan.total_cost,
        unmet = plan.unmet_demand,
        "Mitigation plan ready"
    );
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::money::CurrencyCode;
    use crate::testing::{cost_model, no_hub_network, reference_network, single_hub_network};
    use crate::types::{Budget, RouteId};

    fn new_york(quantity: u64) -> ShipmentRequirement {
        ShipmentRequirement::new("New York", quantity).unwrap()
    }

    #[test]
    fn test_baseline_takes_cheapest_lane() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);

        let plan = solver.baseline(&new_york(400)).unwrap();
        assert_eq!(plan.allocations, BTreeMap::from([(RouteId(2), 400)]));
        assert_eq!(plan.total_cost.cents(), 440_000);
        assert!(plan.feasible);
        assert_eq!(plan.outcome, SolveOutcome::Satisfied);
    }

    #[test]
    fn test_reroutes_around_expensive_lane() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let collapse = DisruptionEvent::new([RouteId(2)], "Infrastructure Collapse", 20.0).unwrap();

        let plan = solver.solve(&new_york(400), &[collapse]).unwrap();
        assert_eq!(plan.allocations, BTreeMap::from([(RouteId(7), 400)]));
        assert_eq!(plan.total_cost.cents(), 500_000);
        assert_eq!(plan.unmet_demand, 0);
        assert!(plan.total_cost > solver.baseline(&new_york(400)).unwrap().total_cost);
    }

    #[test]
    fn test_multihop_fallback_caps_at_hub_throughput() {
        let network = single_hub_network(4000);
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let blocked = DisruptionEvent::blocking((1..=5).map(RouteId), "Regional Flood");

        let requirement = ShipmentRequirement::new("Metro", 10_000).unwrap();
        let plan = solver.solve(&requirement, &[blocked]).unwrap();

        assert_eq!(plan.allocated(), 4000);
        assert_eq!(plan.unmet_demand, 6000);
        assert!(!plan.feasible);
        assert_eq!(plan.outcome, SolveOutcome::PartiallyInfeasible);
        assert!(plan.routes().all(|id| id.get() >= 1000 && id.get() <= 1004));
        // best-ranked warehouse fills first
        assert_eq!(plan.units_on(RouteId(1000)), 3000);
        assert_eq!(plan.units_on(RouteId(1001)), 1000);
        assert_eq!(plan.total_cost.cents(), 4000 * 2600);
    }

    #[test]
    fn test_splits_when_one_lane_is_not_enough() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);

        let plan = solver
            .baseline(&ShipmentRequirement::new("Chicago", 5000).unwrap())
            .unwrap();
        assert_eq!(plan.units_on(RouteId(6)), 3000);
        assert_eq!(plan.units_on(RouteId(3)), 2000);
        assert_eq!(plan.total_cost.cents(), 6_900_000);
        assert!(plan.feasible);
    }

    #[test]
    fn test_shortfall_is_reported_as_unmet() {
        // Boston has routes 1 (North) and 4 (South), 3000 units each, and
        // no hub to fall back on.
        let network = no_hub_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);

        let plan = solver
            .baseline(&ShipmentRequirement::new("Boston", 7000).unwrap())
            .unwrap();
        assert_eq!(plan.allocated(), 6000);
        assert_eq!(plan.unmet_demand, 1000);
        assert_eq!(plan.outcome, SolveOutcome::PartiallyInfeasible);
    }

    #[test]
    fn test_hubs_cover_what_direct_lanes_cannot() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);

        let plan = solver
            .baseline(&ShipmentRequirement::new("Boston", 7000).unwrap())
            .unwrap();
        assert_eq!(plan.units_on(RouteId(1)), 3000);
        assert_eq!(plan.units_on(RouteId(4)), 3000);
        assert_eq!(plan.unmet_demand, 0);
        assert_eq!(plan.total_cost.cents(), 3000 * 1000 + 3000 * 1400 + 1000 * 2600);
    }

    #[test]
    fn test_partially_blocked_destination_tops_up_through_hubs() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let collapse = DisruptionEvent::blocking([RouteId(2)], "Infrastructure Collapse");

        let plan = solver.solve(&new_york(10_000), &[collapse]).unwrap();
        assert_eq!(plan.unmet_demand, 0);
        assert!(plan.feasible);
        assert_eq!(plan.outcome, SolveOutcome::Satisfied);
        assert_eq!(plan.units_on(RouteId(2)), 0);
        assert_eq!(plan.units_on(RouteId(7)), 3000);

        let via_hubs: u64 = plan
            .allocations
            .iter()
            .filter(|(id, _)| id.get() >= 1000)
            .map(|(_, units)| units)
            .sum();
        assert_eq!(via_hubs, 7000);
        assert_eq!(plan.total_cost.cents(), 3000 * 1250 + 7000 * 2600);
    }

    #[test]
    fn test_collapse_and_surge_reroute_to_next_lane() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let events = [
            DisruptionEvent::blocking([RouteId(2)], "Infrastructure Collapse"),
            DisruptionEvent::new([RouteId(7)], "Labor Strike", 20.0).unwrap(),
        ];

        let baseline = solver.baseline(&new_york(400)).unwrap();
        let plan = solver.solve(&new_york(400), &events).unwrap();

        assert_eq!(plan.allocations, BTreeMap::from([(RouteId(7), 400)]));
        assert_eq!(plan.total_cost.cents(), 400 * 25_000);
        assert!(plan.total_cost > baseline.total_cost);
        assert_eq!(plan.unmet_demand, 0);
        assert_eq!(plan.outcome, SolveOutcome::Satisfied);
    }

    #[test]
    fn test_budget_overage_in_foreign_currency() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let inr: CurrencyCode = "INR".parse().unwrap();
        let budget = Budget::new(Money::from_cents(30_000_000), inr).unwrap();

        let plan = solver.baseline(&new_york(400).with_budget(budget)).unwrap();
        assert_eq!(plan.total_cost.cents(), 440_000);
        assert_eq!(plan.budget_overage, Some(Money::from_cents(80_719)));
        assert!(plan.feasible);
    }

    #[test]
    fn test_unknown_budget_currency_is_an_error() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let budget = Budget::new(Money::from_cents(100), "EUR".parse().unwrap()).unwrap();

        assert!(solver.baseline(&new_york(10).with_budget(budget)).is_err());
    }

    #[test]
    fn test_unseen_city_gets_dynamic_lanes() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);

        let plan = solver
            .baseline(&ShipmentRequirement::new("Seattle", 100).unwrap())
            .unwrap();
        assert_eq!(plan.allocations, BTreeMap::from([(RouteId(100), 100)]));
        assert_eq!(plan.total_cost.cents(), 100 * 2000);
    }

    #[test]
    fn test_unresolved_destination() {
        let mut config = NetworkConfig::default();
        config.hubs.clear();
        config.settings.dynamic_rank_cutoff = Some(0);
        let network = crate::network::NetworkModel::from_config(config).unwrap();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);

        let plan = solver
            .baseline(&ShipmentRequirement::new("Atlantis", 50).unwrap())
            .unwrap();
        assert_eq!(plan.outcome, SolveOutcome::UnresolvedDestination);
        assert_eq!(plan.unmet_demand, 50);
        assert!(plan.allocations.is_empty());
    }

    #[test]
    fn test_no_capacity_when_everything_is_blocked() {
        let network = no_hub_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let blocked = DisruptionEvent::blocking([RouteId(2), RouteId(7)], "Port Closure");

        let plan = solver.solve(&new_york(400), &[blocked]).unwrap();
        assert_eq!(plan.outcome, SolveOutcome::NoCapacity);
        assert_eq!(plan.unmet_demand, 400);
        assert_eq!(plan.total_cost, Money::zero());
    }

    #[test]
    fn test_unknown_route_reference_is_ignored() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let ghost = DisruptionEvent::new([RouteId(77), RouteId(4242)], "Generic Delay", 9.0).unwrap();

        let plan = solver.solve(&new_york(400), &[ghost]).unwrap();
        assert_eq!(plan, solver.baseline(&new_york(400)).unwrap());
    }

    #[test]
    fn test_zero_disruption_matches_baseline_and_is_deterministic() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let requirement = ShipmentRequirement::new("Philadelphia", 3500).unwrap();

        let first = solver.solve(&requirement, &[]).unwrap();
        let second = solver.solve(&requirement, &[]).unwrap();
        assert_eq!(first, solver.baseline(&requirement).unwrap());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_cost_never_drops_when_disruptions_are_added() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let requirement = ShipmentRequirement::new("Chicago", 4000).unwrap();

        let mut events = Vec::new();
        let mut previous = solver.solve(&requirement, &events).unwrap();
        for (id, multiplier) in [(6, 2.0), (3, 1.5), (6, 4.0)] {
            events.push(DisruptionEvent::new([RouteId(id)], "Strike", multiplier).unwrap());
            let next = solver.solve(&requirement, &events).unwrap();
            assert!(next.total_cost >= previous.total_cost);
            previous = next;
        }
    }

    #[test]
    fn test_flow_conservation() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let squeeze = DisruptionEvent::new([RouteId(6)], "Flood", 1.0)
            .unwrap()
            .with_capacity_factor(0.1)
            .unwrap();

        let plan = solver
            .solve(&ShipmentRequirement::new("Chicago", 4000).unwrap(), &[squeeze])
            .unwrap();
        assert_eq!(plan.units_on(RouteId(6)), 300);
        assert_eq!(plan.units_on(RouteId(3)), 3000);
        assert_eq!(plan.allocated() + plan.unmet_demand, plan.requested);
        let recomputed: Money = plan
            .allocations
            .iter()
            .map(|(id, units)| plan.unit_costs[id].times_units(*units))
            .sum();
        assert_eq!(recomputed, plan.total_cost);
    }

    #[test]
    fn test_rejects_malformed_events() {
        let network = reference_network();
        let costs = cost_model();
        let solver = MitigationSolver::new(&network, &costs);
        let mut bad = DisruptionEvent::new([RouteId(2)], "Discount", 1.0).unwrap();
        bad.cost_multiplier = 0.5;

        assert!(solver.solve(&new_york(10), &[bad]).is_err());
    }
}
