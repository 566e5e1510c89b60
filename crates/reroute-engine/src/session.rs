//! # Planning Session
//!
//! One validated network plus its cost model, shared by every request a
//! service handles.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PlanningSession (Clone, Send + Sync)                                   │
//! │  ├── Arc<NetworkModel>   immutable, except the memoised route ids       │
//! │  └── Arc<CostModel>      exchange rates                                 │
//! │                                                                         │
//! │  request thread A ──┐                                                   │
//! │  request thread B ──┼──► solve_mitigation_plan / solve_guardian_plan    │
//! │  request thread C ──┘    (no locks held during a solve)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use reroute_core::{
    CostModel, DisruptionEvent, GuardianPlan, GuardianSolver, ImpactReport, ImpactReportBuilder,
    MitigationSolver, NetworkConfig, NetworkModel, NetworkSummary, Plan, ShipmentRequirement,
};
use tracing::info;

use crate::config::RerouteConfig;
use crate::error::EngineResult;

#[derive(Debug, Clone)]
pub struct PlanningSession {
    network: Arc<NetworkModel>,
    costs: Arc<CostModel>,
}

impl PlanningSession {
    pub fn new(network: NetworkConfig) -> EngineResult<Self> {
        let costs = CostModel::from_settings(&network.currency)?;
        let network = NetworkModel::from_config(network)?;

        let summary = network.validate();
        info!(
            supply = summary.total_supply,
            demand = summary.total_demand,
            routes = summary.total_routes,
            "Planning session ready"
        );

        Ok(PlanningSession {
            network: Arc::new(network),
            costs: Arc::new(costs),
        })
    }

    pub fn from_config(config: &RerouteConfig) -> EngineResult<Self> {
        Self::new(config.network.clone())
    }

    pub fn network(&self) -> &NetworkModel {
        &self.network
    }

    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    pub fn summary(&self) -> NetworkSummary {
        self.network.validate()
    }

    pub fn solve_mitigation_plan(
        &self,
        requirement: &ShipmentRequirement,
        disruptions: &[DisruptionEvent],
    ) -> EngineResult<Plan> {
        Ok(MitigationSolver::new(&self.network, &self.costs).solve(requirement, disruptions)?)
    }

    pub fn baseline(&self, requirement: &ShipmentRequirement) -> EngineResult<Plan> {
        Ok(MitigationSolver::new(&self.network, &self.costs).baseline(requirement)?)
    }

    pub fn solve_guardian_plan(
        &self,
        requirement: &ShipmentRequirement,
        scenarios: &[Vec<DisruptionEvent>],
    ) -> EngineResult<GuardianPlan> {
        Ok(GuardianSolver::new(&self.network, &self.costs).solve(requirement, scenarios)?)
    }

    pub fn generate_impact_report(&self, baseline: &Plan, mitigated: &Plan) -> ImpactReport {
        ImpactReportBuilder::new().build(baseline, mitigated)
    }

    /// Baseline, mitigated plan and their diff in one call.
    pub fn assess(
        &self,
        requirement: &ShipmentRequirement,
        disruptions: &[DisruptionEvent],
    ) -> EngineResult<ImpactReport> {
        let baseline = self.baseline(requirement)?;
        let mitigated = self.solve_mitigation_plan(requirement, disruptions)?;
        Ok(self.generate_impact_report(&baseline, &mitigated))
    }
}
