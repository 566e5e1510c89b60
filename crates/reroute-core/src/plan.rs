//! # Plans
//!
//! Solver output records. Everything here serializes to JSON for the
//! presentation layer and exports TypeScript bindings through `ts-rs`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::types::RouteId;

// =============================================================================
// Solve Outcome
// =============================================================================

/// How a solve ended. Solvers always return a plan; this says what kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SolveOutcome {
    /// The full quantity is allocated.
    Satisfied,
    /// Some units are allocated, the rest is reported as unmet demand.
    PartiallyInfeasible,
    /// Routes exist but every one of them is at zero capacity.
    NoCapacity,
    /// The destination is unknown and nothing could be synthesized for it.
    UnresolvedDestination,
}

impl SolveOutcome {
    /// Outcome for a solve that shipped `allocated` of `requested` units
    /// over at least one usable route.
    pub fn from_shortfall(requested: u64, allocated: u64) -> Self {
        if allocated >= requested {
            SolveOutcome::Satisfied
        } else if allocated == 0 {
            SolveOutcome::NoCapacity
        } else {
            SolveOutcome::PartiallyInfeasible
        }
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveOutcome::Satisfied => write!(f, "satisfied"),
            SolveOutcome::PartiallyInfeasible => write!(f, "partially_infeasible"),
            SolveOutcome::NoCapacity => write!(f, "no_capacity"),
            SolveOutcome::UnresolvedDestination => write!(f, "unresolved_destination"),
        }
    }
}

// =============================================================================
// Plan
// =============================================================================

/// A shipping plan for one requirement under one disruption state.
///
/// ## Invariants
/// - `allocations` holds only positive entries
/// - `Σ allocations + unmet_demand == requested`
/// - `total_cost == Σ allocation × unit_costs[route]`
/// - `feasible == (unmet_demand == 0)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Plan {
    pub destination: String,
    pub requested: u64,
    /// Units per route, ascending route id.
    pub allocations: BTreeMap<RouteId, u64>,
    /// Per-unit cost actually charged on each allocated route.
    pub unit_costs: BTreeMap<RouteId, Money>,
    pub total_cost: Money,
    pub feasible: bool,
    pub unmet_demand: u64,
    /// Amount by which `total_cost` exceeds the budget, if any.
    #[serde(default)]
    pub budget_overage: Option<Money>,
    pub outcome: SolveOutcome,
}

impl Plan {
    /// A plan that ships nothing.
    pub fn empty(destination: impl Into<String>, requested: u64, outcome: SolveOutcome) -> Self {
        Plan {
            destination: destination.into(),
            requested,
            allocations: BTreeMap::new(),
            unit_costs: BTreeMap::new(),
            total_cost: Money::zero(),
            feasible: requested == 0,
            unmet_demand: requested,
            budget_overage: None,
            outcome,
        }
    }

    /// Builds a plan from per-route allocations and their unit costs.
    ///
    /// Zero allocations are dropped; totals, feasibility and the outcome are
    /// derived.
    pub fn from_allocations(
        destination: impl Into<String>,
        requested: u64,
        allocations: impl IntoIterator<Item = (RouteId, u64, Money)>,
    ) -> Self {
        let mut plan = Plan::empty(destination, requested, SolveOutcome::NoCapacity);
        for (id, units, unit_cost) in allocations {
            if units == 0 {
                continue;
            }
            *plan.allocations.entry(id).or_insert(0) += units;
            plan.unit_costs.insert(id, unit_cost);
            plan.total_cost = plan.total_cost.saturating_add(unit_cost.times_units(units));
        }

        let allocated = plan.allocated();
        plan.unmet_demand = requested.saturating_sub(allocated);
        plan.feasible = plan.unmet_demand == 0;
        plan.outcome = SolveOutcome::from_shortfall(requested, allocated);
        plan
    }

    /// Records how far the plan exceeds `budget`. Within budget clears it.
    pub fn with_budget(mut self, budget: Money) -> Self {
        let over = self.total_cost - budget;
        self.budget_overage = if over.is_positive() { Some(over) } else { None };
        self
    }

    pub fn allocated(&self) -> u64 {
        self.allocations.values().sum()
    }

    pub fn units_on(&self, route: RouteId) -> u64 {
        self.allocations.get(&route).copied().unwrap_or(0)
    }

    pub fn routes(&self) -> impl Iterator<Item = RouteId> + '_ {
        self.allocations.keys().copied()
    }

    pub fn over_budget(&self) -> bool {
        self.budget_overage.is_some()
    }
}
