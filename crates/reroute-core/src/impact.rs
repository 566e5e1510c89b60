//! # Impact Report
//!
//! Diff between the plan the business would have run and the plan it runs
//! now. Pure data: wording and formatting belong to the presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::money::Money;
use crate::plan::Plan;
use crate::types::RouteId;

/// What happened to a single route between the two plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum RouteChange {
    Added {
        route: RouteId,
        units: u64,
        unit_cost: Money,
    },
    Removed {
        route: RouteId,
        units: u64,
        unit_cost: Money,
    },
    Reweighted {
        route: RouteId,
        units_before: u64,
        units_after: u64,
        unit_cost_before: Money,
        unit_cost_after: Money,
    },
}

impl RouteChange {
    pub fn route(&self) -> RouteId {
        match self {
            RouteChange::Added { route, .. }
            | RouteChange::Removed { route, .. }
            | RouteChange::Reweighted { route, .. } => *route,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImpactReport {
    pub baseline: Plan,
    pub mitigated: Plan,
    /// Mitigated minus baseline total cost.
    pub cost_delta: Money,
    /// Used by the mitigated plan only.
    pub routes_added: BTreeSet<RouteId>,
    /// Used by the baseline plan only.
    pub routes_removed: BTreeSet<RouteId>,
    /// Used by both, with a different flow or unit cost.
    pub routes_reweighted: BTreeSet<RouteId>,
    /// Mitigated minus baseline unmet demand.
    pub unmet_delta: i64,
}

impl ImpactReport {
    /// False when the mitigated plan is identical in routes, flows and cost.
    pub fn has_changes(&self) -> bool {
        !self.routes_added.is_empty()
            || !self.routes_removed.is_empty()
            || !self.routes_reweighted.is_empty()
            || !self.cost_delta.is_zero()
            || self.unmet_delta != 0
    }

    /// Per-route detail in ascending route id order.
    pub fn route_changes(&self) -> Vec<RouteChange> {
        let mut changes = Vec::new();
        let touched = self
            .routes_added
            .iter()
            .chain(&self.routes_removed)
            .chain(&self.routes_reweighted)
            .copied()
            .collect::<BTreeSet<_>>();

        for route in touched {
            let before = self.baseline.units_on(route);
            let after = self.mitigated.units_on(route);
            let cost_before = self.baseline.unit_costs.get(&route).copied().unwrap_or_default();
            let cost_after = self.mitigated.unit_costs.get(&route).copied().unwrap_or_default();

            changes.push(if before == 0 {
                RouteChange::Added {
                    route,
                    units: after,
                    unit_cost: cost_after,
                }
            } else if after == 0 {
                RouteChange::Removed {
                    route,
                    units: before,
                    unit_cost: cost_before,
                }
            } else {
                RouteChange::Reweighted {
                    route,
                    units_before: before,
                    units_after: after,
                    unit_cost_before: cost_before,
                    unit_cost_after: cost_after,
                }
            });
        }
        changes
    }
}

/// Builds [`ImpactReport`]s. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpactReportBuilder;

impl ImpactReportBuilder {
    pub fn new() -> Self {
        ImpactReportBuilder
    }

    pub fn build(&self, baseline: &Plan, mitigated: &Plan) -> ImpactReport {
        let before: BTreeSet<RouteId> = baseline.routes().collect();
        let after: BTreeSet<RouteId> = mitigated.routes().collect();

        let routes_reweighted = before
            .intersection(&after)
            .filter(|id| {
                baseline.units_on(**id) != mitigated.units_on(**id)
                    || baseline.unit_costs.get(id) != mitigated.unit_costs.get(id)
            })
            .copied()
            .collect();

        ImpactReport {
            cost_delta: mitigated.total_cost - baseline.total_cost,
            routes_added: after.difference(&before).copied().collect(),
            routes_removed: before.difference(&after).copied().collect(),
            routes_reweighted,
            unmet_delta: mitigated.unmet_demand as i64 - baseline.unmet_demand as i64,
            baseline: baseline.clone(),
            mitigated: mitigated.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(allocations: &[(u32, u64, i64)]) -> Plan {
        Plan::from_allocations(
            "New York",
            400,
            allocations
                .iter()
                .map(|(id, units, cents)| (RouteId(*id), *units, Money::from_cents(*cents))),
        )
    }

    #[test]
    fn test_reroute_report() {
        let baseline = plan(&[(2, 400, 1100)]);
        let mitigated = plan(&[(7, 400, 1250)]);
        let report = ImpactReportBuilder::new().build(&baseline, &mitigated);

        assert_eq!(report.cost_delta.cents(), 60_000);
        assert_eq!(report.routes_added, BTreeSet::from([RouteId(7)]));
        assert_eq!(report.routes_removed, BTreeSet::from([RouteId(2)]));
        assert!(report.routes_reweighted.is_empty());
        assert_eq!(report.unmet_delta, 0);
        assert!(report.has_changes());

        let changes = report.route_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].route(), RouteId(2));
        assert!(matches!(changes[0], RouteChange::Removed { units: 400, .. }));
        assert!(matches!(changes[1], RouteChange::Added { units: 400, .. }));
    }

    #[test]
    fn test_reweighted_on_flow_or_price() {
        let baseline = plan(&[(6, 300, 1300), (3, 100, 1500)]);
        let mitigated = plan(&[(6, 300, 2600), (3, 50, 1500)]);
        let report = ImpactReportBuilder::new().build(&baseline, &mitigated);

        assert_eq!(report.routes_reweighted, BTreeSet::from([RouteId(3), RouteId(6)]));
        assert_eq!(report.unmet_delta, 50);
        assert!(matches!(
            report.route_changes()[1],
            RouteChange::Reweighted {
                units_before: 300,
                units_after: 300,
                ..
            }
        ));
    }

    #[test]
    fn test_identical_plans_report_no_changes() {
        let baseline = plan(&[(2, 400, 1100)]);
        let report = ImpactReportBuilder::new().build(&baseline, &baseline);
        assert!(!report.has_changes());
        assert!(report.route_changes().is_empty());
        assert!(report.cost_delta.is_zero());
    }

    #[test]
    fn test_negative_deltas() {
        let baseline = plan(&[(7, 200, 1250)]);
        let mitigated = plan(&[(2, 400, 1100)]);
        let report = ImpactReportBuilder::new().build(&baseline, &mitigated);
        assert_eq!(report.cost_delta.cents(), 440_000 - 250_000);
        assert_eq!(report.unmet_delta, -200);

        let cheaper = ImpactReportBuilder::new().build(&mitigated, &baseline);
        assert!(cheaper.cost_delta.is_negative());
    }
}
