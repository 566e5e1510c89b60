//! # Guardian Solver
//!
//! Picks one allocation that holds up across several disruption scenarios.
//!
//! ## Candidate Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  scenarios S0 .. Sn-1                                                   │
//! │       │                                                                 │
//! │       ├── optimum under S0 ──┐                                          │
//! │       ├── optimum under S1 ──┤      evaluate every candidate            │
//! │       ├── ...                ├───►  under every scenario:               │
//! │       └── optimum under the  │      delivered = min(units, capacity)    │
//! │           merged worst case ─┘      cost = delivered × scenario price   │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │  robust candidates exist?  (zero unmet in every scenario)               │
//! │     ├── yes ──► min worst-case cost, then total cost, then order        │
//! │     └── no  ──► min total unmet, then worst-case cost, then order       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scenario optima are solved on the rayon pool. Route views are resolved
//! first, one scenario after another, so synthesized ids never depend on
//! thread scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};
use ts_rs::TS;

use crate::cost::{CostModel, DisruptionState};
use crate::error::CoreResult;
use crate::money::Money;
use crate::network::{NetworkModel, RouteView};
use crate::plan::{Plan, SolveOutcome};
use crate::solver::MitigationSolver;
use crate::types::{DisruptionEvent, Route, RouteId, ShipmentRequirement};

// =============================================================================
// Output Types
// =============================================================================

/// Where the chosen allocation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// The optimum of the scenario at this index.
    Scenario(usize),
    /// The optimum under every scenario's effects applied at once.
    WorstCase,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::Scenario(index) => write!(f, "scenario {}", index),
            CandidateSource::WorstCase => write!(f, "worst case"),
        }
    }
}

/// A plan chosen to be robust across scenarios.
///
/// `plan.total_cost` is the worst-case scenario cost and `plan.unmet_demand`
/// the worst-case shortfall. `plan.unit_costs` holds the highest price each
/// route reaches in any scenario, so the cost identity of a single-scenario
/// [`Plan`] is an upper bound here rather than an equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuardianPlan {
    pub plan: Plan,
    /// Cost of the delivered units, per scenario.
    pub scenario_costs: Vec<Money>,
    /// Undeliverable units, per scenario.
    pub scenario_unmet: Vec<u64>,
    pub worst_case_cost: Money,
    /// Zero unmet demand in every scenario.
    pub robust: bool,
    pub chosen: CandidateSource,
}

// =============================================================================
// Evaluation
// =============================================================================

#[derive(Debug)]
struct Evaluation {
    source: CandidateSource,
    plan: Plan,
    costs: Vec<Money>,
    unmet: Vec<u64>,
}

impl Evaluation {
    fn worst_cost(&self) -> Money {
        self.costs.iter().copied().max().unwrap_or_default()
    }

    fn total_cost(&self) -> Money {
        self.costs.iter().copied().sum()
    }

    fn total_unmet(&self) -> u64 {
        self.unmet.iter().sum()
    }

    fn worst_unmet(&self) -> u64 {
        self.unmet.iter().copied().max().unwrap_or(0)
    }

    fn robust(&self) -> bool {
        self.unmet.iter().all(|u| *u == 0)
    }
}

// =============================================================================
// Guardian Solver
// =============================================================================

/// Multi-scenario planner built on [`MitigationSolver`].
#[derive(Debug, Clone, Copy)]
pub struct GuardianSolver<'a> {
    solver: MitigationSolver<'a>,
}

impl<'a> GuardianSolver<'a> {
    pub fn new(network: &'a NetworkModel, costs: &'a CostModel) -> Self {
        GuardianSolver {
            solver: MitigationSolver::new(network, costs),
        }
    }

    /// Robust plan for `requirement` across `scenarios`.
    ///
    /// Each scenario is a list of events applied together. An empty list of
    /// scenarios is treated as a single undisrupted one.
    pub fn solve(
        &self,
        requirement: &ShipmentRequirement,
        scenarios: &[Vec<DisruptionEvent>],
    ) -> CoreResult<GuardianPlan> {
        requirement.validate()?;
        for event in scenarios.iter().flatten() {
            event.validate()?;
        }

        let mut states: Vec<DisruptionState> = scenarios
            .iter()
            .map(|events| DisruptionState::from_events(events))
            .collect();
        if states.is_empty() {
            states.push(DisruptionState::clear());
        }

        let views = states
            .iter()
            .map(|state| self.solver.prepare(requirement, state))
            .collect::<CoreResult<Vec<RouteView>>>()?;
        let merged = DisruptionState::merged(&states);
        let merged_view = self.solver.prepare(requirement, &merged)?;

        let scenario_optima = states
            .par_iter()
            .zip(views.par_iter())
            .map(|(state, view)| self.solver.solve_view(requirement, view, state))
            .collect::<CoreResult<Vec<Plan>>>()?;
        let worst_case_optimum = self.solver.solve_view(requirement, &merged_view, &merged)?;

        let routes: BTreeMap<RouteId, &Route> = views
            .iter()
            .chain(std::iter::once(&merged_view))
            .flat_map(|view| view.routes())
            .map(|route| (route.id, route))
            .collect();

        let candidates: Vec<Evaluation> = scenario_optima
            .into_iter()
            .enumerate()
            .map(|(index, plan)| {
                self.evaluate(CandidateSource::Scenario(index), plan, &states, &routes)
            })
            .collect();
        let worst_case =
            self.evaluate(CandidateSource::WorstCase, worst_case_optimum, &states, &routes);

        for evaluation in candidates.iter().chain(std::iter::once(&worst_case)) {
            debug!(
                candidate = %evaluation.source,
                worst_cost = %evaluation.worst_cost(),
                total_unmet = evaluation.total_unmet(),
                "Evaluated guardian candidate"
            );
        }
        let chosen = select(candidates, worst_case);

        let budget = requirement
            .budget
            .as_ref()
            .map(|b| self.solver.costs().budget_in_base(b))
            .transpose()?;
        let guardian = self.finish(chosen, &states, &routes, budget);

        info!(
            destination = %requirement.destination,
            scenarios = guardian.scenario_costs.len(),
            chosen = %guardian.chosen,
            worst_case_cost = %guardian.worst_case_cost,
            robust = guardian.robust,
            "Guardian plan ready"
        );
        Ok(guardian)
    }

    /// Prices a candidate under every scenario.
    fn evaluate(
        &self,
        source: CandidateSource,
        plan: Plan,
        states: &[DisruptionState],
        routes: &BTreeMap<RouteId, &Route>,
    ) -> Evaluation {
        let costs = self.solver.costs();
        let mut scenario_costs = Vec::with_capacity(states.len());
        let mut scenario_unmet = Vec::with_capacity(states.len());

        for state in states {
            let mut cost = Money::zero();
            let mut delivered = 0;
            for (id, units) in &plan.allocations {
                let Some(route) = routes.get(id) else { continue };
                let shipped = (*units).min(costs.effective_capacity(route, state));
                cost += costs.effective_cost(route, state).times_units(shipped);
                delivered += shipped;
            }
            scenario_costs.push(cost);
            scenario_unmet.push(plan.requested.saturating_sub(delivered));
        }

        Evaluation {
            source,
            plan,
            costs: scenario_costs,
            unmet: scenario_unmet,
        }
    }

    fn finish(
        &self,
        chosen: Evaluation,
        states: &[DisruptionState],
        routes: &BTreeMap<RouteId, &Route>,
        budget: Option<Money>,
    ) -> GuardianPlan {
        let costs = self.solver.costs();
        let worst_case_cost = chosen.worst_cost();
        let worst_unmet = chosen.worst_unmet();
        let robust = chosen.robust();

        let mut plan = chosen.plan;
        for (id, unit_cost) in plan.unit_costs.iter_mut() {
            if let Some(route) = routes.get(id) {
                if let Some(worst) = states.iter().map(|s| costs.effective_cost(route, s)).max() {
                    *unit_cost = worst;
                }
            }
        }
        plan.total_cost = worst_case_cost;
        plan.unmet_demand = worst_unmet;
        plan.feasible = worst_unmet == 0;
        if !plan.allocations.is_empty() {
            plan.outcome = if worst_unmet == 0 {
                SolveOutcome::Satisfied
            } else {
                SolveOutcome::PartiallyInfeasible
            };
        }
        if let Some(budget) = budget {
            plan = plan.with_budget(budget);
        }

        GuardianPlan {
            plan,
            scenario_costs: chosen.costs,
            scenario_unmet: chosen.unmet,
            worst_case_cost,
            robust,
            chosen: chosen.source,
        }
    }
}

/// Robust candidates sort first, by worst-case cost then total cost.
/// Otherwise the least total shortfall wins, then the cheaper worst case.
/// The last field keeps candidate order as the final tie-break.
fn selection_key(index: usize, evaluation: &Evaluation) -> (bool, u64, Money, Money, usize) {
    let robust = evaluation.robust();
    (
        !robust,
        evaluation.total_unmet(),
        evaluation.worst_cost(),
        if robust {
            evaluation.total_cost()
        } else {
            Money::zero()
        },
        index,
    )
}

fn select(scenario_candidates: Vec<Evaluation>, worst_case: Evaluation) -> Evaluation {
    let worst_case_key = selection_key(scenario_candidates.len(), &worst_case);
    scenario_candidates
        .into_iter()
        .enumerate()
        .fold((worst_case_key, worst_case), |best, (index, candidate)| {
            let key = selection_key(index, &candidate);
            if key < best.0 {
                (key, candidate)
            } else {
                best
            }
        })
        .1
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cost_model, no_hub_network, reference_network};

    fn new_york() -> ShipmentRequirement {
        ShipmentRequirement::new("New York", 400).unwrap()
    }

    fn strike(route: u32, multiplier: f64) -> Vec<DisruptionEvent> {
        vec![DisruptionEvent::new([RouteId(route)], "Labor Strike", multiplier).unwrap()]
    }

    fn collapse(route: u32) -> Vec<DisruptionEvent> {
        vec![DisruptionEvent::blocking([RouteId(route)], "Infrastructure Collapse")]
    }

    #[test]
    fn test_picks_cheapest_worst_case() {
        let network = reference_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);

        let result = guardian
            .solve(&new_york(), &[strike(2, 3.0), strike(7, 3.0)])
            .unwrap();

        // S0 optimum (route 7) costs 1,500,000 under S1; S1 optimum (route 2)
        // costs 1,320,000 under S0. The merged case ties with S1 and loses
        // on order.
        assert_eq!(result.chosen, CandidateSource::Scenario(1));
        assert_eq!(result.plan.allocations, BTreeMap::from([(RouteId(2), 400)]));
        assert_eq!(result.worst_case_cost.cents(), 1_320_000);
        assert_eq!(
            result.scenario_costs,
            vec![Money::from_cents(1_320_000), Money::from_cents(440_000)]
        );
        assert_eq!(result.plan.total_cost, result.worst_case_cost);
        assert_eq!(result.plan.unit_costs[&RouteId(2)].cents(), 3300);
        assert!(result.robust);
        assert!(result.plan.feasible);
    }

    #[test]
    fn test_merged_candidate_survives_both_closures() {
        let network = reference_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);

        let result = guardian.solve(&new_york(), &[collapse(2), collapse(7)]).unwrap();

        assert_eq!(result.chosen, CandidateSource::WorstCase);
        assert!(result.robust);
        assert_eq!(result.scenario_unmet, vec![0, 0]);
        assert_eq!(result.worst_case_cost.cents(), 1_040_000);
        assert!(result.plan.routes().all(|id| id.get() >= 1000));
        assert_eq!(result.plan.outcome, SolveOutcome::Satisfied);
    }

    #[test]
    fn test_least_unmet_when_nothing_is_robust() {
        let network = no_hub_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);

        let result = guardian.solve(&new_york(), &[collapse(2), collapse(7)]).unwrap();

        // Both scenario optima strand 400 units in the other scenario; the
        // merged candidate strands them everywhere. S1 wins on cost.
        assert!(!result.robust);
        assert_eq!(result.chosen, CandidateSource::Scenario(1));
        assert_eq!(result.scenario_unmet, vec![400, 0]);
        assert_eq!(result.plan.unmet_demand, 400);
        assert_eq!(result.worst_case_cost.cents(), 440_000);
        assert_eq!(result.plan.outcome, SolveOutcome::PartiallyInfeasible);
        assert!(!result.plan.feasible);
    }

    #[test]
    fn test_empty_scenario_set_is_the_baseline() {
        let network = reference_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);
        let baseline = MitigationSolver::new(&network, &costs)
            .baseline(&new_york())
            .unwrap();

        let result = guardian.solve(&new_york(), &[]).unwrap();
        assert_eq!(result.chosen, CandidateSource::Scenario(0));
        assert_eq!(result.plan, baseline);
        assert_eq!(result.scenario_costs.len(), 1);
    }

    #[test]
    fn test_worst_case_no_worse_than_any_single_candidate() {
        let network = reference_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);
        let solver = MitigationSolver::new(&network, &costs);
        let requirement = ShipmentRequirement::new("Chicago", 3500).unwrap();
        let scenarios = vec![strike(6, 2.0), strike(3, 1.5), vec![]];

        let result = guardian.solve(&requirement, &scenarios).unwrap();
        assert!(result.robust);

        let routes = network.all_routes(false, false);
        let states: Vec<DisruptionState> = scenarios
            .iter()
            .map(|events| DisruptionState::from_events(events))
            .collect();
        let worst_case_of = |plan: &Plan| -> Money {
            states
                .iter()
                .map(|state| {
                    plan.allocations
                        .iter()
                        .filter_map(|(id, units)| {
                            let route = routes.iter().find(|r| r.id == *id)?;
                            Some(costs.effective_cost(route, state).times_units(*units))
                        })
                        .sum::<Money>()
                })
                .max()
                .unwrap_or_default()
        };

        for events in &scenarios {
            let optimum = solver.solve(&requirement, events).unwrap();
            assert!(result.worst_case_cost <= worst_case_of(&optimum));
        }
    }

    #[test]
    fn test_worst_case_cost_dominates_scenario_optima() {
        let network = reference_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);
        let solver = MitigationSolver::new(&network, &costs);
        let requirement = ShipmentRequirement::new("Chicago", 3500).unwrap();
        let scenarios = vec![strike(6, 2.0), strike(3, 1.5), vec![]];

        let result = guardian.solve(&requirement, &scenarios).unwrap();
        assert!(result.robust);
        assert_eq!(result.worst_case_cost.cents(), 7_400_000);

        for (index, events) in scenarios.iter().enumerate() {
            let optimum = solver.solve(&requirement, events).unwrap();
            assert!(result.worst_case_cost >= optimum.total_cost);
            assert!(result.scenario_costs[index] >= optimum.total_cost);
        }
    }

    #[test]
    fn test_fallback_still_dominates_best_scenario_optimum() {
        let network = no_hub_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);
        let solver = MitigationSolver::new(&network, &costs);
        let scenarios = vec![collapse(2), collapse(7)];

        let result = guardian.solve(&new_york(), &scenarios).unwrap();
        assert!(!result.robust);

        let optima: Vec<Plan> = scenarios
            .iter()
            .map(|events| solver.solve(&new_york(), events).unwrap())
            .collect();
        let best = optima.iter().map(|p| p.total_cost).min().unwrap();
        assert!(result.worst_case_cost >= best);

        // Where the fallback delivers in full it pays at least that scenario's optimum.
        for (index, optimum) in optima.iter().enumerate() {
            if result.scenario_unmet[index] == 0 {
                assert!(result.scenario_costs[index] >= optimum.total_cost);
            }
        }
    }

    #[test]
    fn test_agrees_with_mitigation_solver_on_partial_closures() {
        let network = reference_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);
        let solver = MitigationSolver::new(&network, &costs);
        let requirement = ShipmentRequirement::new("New York", 10_000).unwrap();
        let scenarios = vec![collapse(2), collapse(7)];

        for events in &scenarios {
            let optimum = solver.solve(&requirement, events).unwrap();
            assert_eq!(optimum.unmet_demand, 0);
        }

        let result = guardian.solve(&requirement, &scenarios).unwrap();
        assert!(result.robust);
        assert_eq!(result.chosen, CandidateSource::WorstCase);
        assert_eq!(result.scenario_unmet, vec![0, 0]);
        assert_eq!(result.worst_case_cost.cents(), 10_000 * 2600);
    }

    #[test]
    fn test_repeatable_across_runs() {
        let network = reference_network();
        let costs = cost_model();
        let guardian = GuardianSolver::new(&network, &costs);
        let scenarios = vec![collapse(2), strike(7, 2.0), collapse(7)];

        let first = guardian.solve(&new_york(), &scenarios).unwrap();
        let second = guardian.solve(&new_york(), &scenarios).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_serializes_candidate_source() {
        assert_eq!(
            serde_json::to_string(&CandidateSource::Scenario(2)).unwrap(),
            r#"{"scenario":2}"#
        );
        assert_eq!(
            serde_json::to_string(&CandidateSource::WorstCase).unwrap(),
            r#""worst_case""#
        );
    }
}
