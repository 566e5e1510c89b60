//! # Network Model
//!
//! The authoritative, queryable graph for a planning session.
//!
//! ## Route Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Routes for one destination                          │
//! │                                                                         │
//! │  configured lanes to it?                                               │
//! │     ├── yes ──► primary routes (ids 1..100)                            │
//! │     └── no  ──► dynamic routes, one per eligible warehouse             │
//! │                 (ids 100..1000, priority order)                        │
//! │                           │                                             │
//! │                           ▼                                             │
//! │  direct capacity left after disruption covers the demand?              │
//! │     ├── yes ──► done                                                   │
//! │     └── no  ──► + multihop routes warehouse → hub → destination        │
//! │                 (ids 1000.., every warehouse × every hub)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Id Stability
//! Synthesized ids are memoised per lane (destination, origin, hub) in a
//! registry guarded by a mutex. The first call that needs a lane assigns the
//! smallest unused id of its namespace; every later call gets the same id.
//! Everything else in the model is immutable after [`NetworkModel::from_config`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};
use ts_rs::TS;

use crate::config::{NetworkConfig, NetworkSettings};
use crate::cost::DisruptionState;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Destination, Hub, Route, RouteId, RouteKind, Warehouse};
use crate::validation::{
    validate_capacity, validate_node_id, validate_primary_route_id, validate_unit_cost,
};
use crate::{DYNAMIC_ROUTE_START_ID, MULTIHOP_ROUTE_START_ID};

// =============================================================================
// Lane Registry
// =============================================================================

/// The node sequence of a route, without pricing or capacity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Lane {
    origin: String,
    hub: Option<String>,
    destination: String,
}

impl Lane {
    fn direct(origin: &str, destination: &str) -> Self {
        Lane {
            origin: origin.to_string(),
            hub: None,
            destination: destination.to_string(),
        }
    }

    fn via_hub(origin: &str, hub: &str, destination: &str) -> Self {
        Lane {
            origin: origin.to_string(),
            hub: Some(hub.to_string()),
            destination: destination.to_string(),
        }
    }
}

#[derive(Debug)]
struct LaneRegistry {
    ids: BTreeMap<Lane, RouteId>,
    lanes: BTreeMap<RouteId, Lane>,
    next_dynamic: u32,
    next_multihop: u32,
}

impl Default for LaneRegistry {
    fn default() -> Self {
        LaneRegistry {
            ids: BTreeMap::new(),
            lanes: BTreeMap::new(),
            next_dynamic: DYNAMIC_ROUTE_START_ID,
            next_multihop: MULTIHOP_ROUTE_START_ID,
        }
    }
}

impl LaneRegistry {
    /// Returns the lane's id, assigning the next free one on first sight.
    fn assign(&mut self, lane: Lane, kind: RouteKind) -> CoreResult<RouteId> {
        if let Some(id) = self.ids.get(&lane) {
            return Ok(*id);
        }

        let next = match kind {
            RouteKind::Dynamic => &mut self.next_dynamic,
            RouteKind::Multihop => &mut self.next_multihop,
            RouteKind::Primary => return Err(CoreError::RouteNamespaceExhausted { kind }),
        };
        let limit = match kind {
            RouteKind::Dynamic => MULTIHOP_ROUTE_START_ID,
            _ => u32::MAX,
        };
        if *next >= limit {
            return Err(CoreError::RouteNamespaceExhausted { kind });
        }

        let id = RouteId(*next);
        *next += 1;

        debug!(route_id = id.get(), %kind, origin = %lane.origin, destination = %lane.destination, "Registered synthesized lane");
        self.ids.insert(lane.clone(), id);
        self.lanes.insert(id, lane);
        Ok(id)
    }

    fn count(&self, kind: RouteKind) -> usize {
        self.lanes.keys().filter(|id| id.kind() == kind).count()
    }
}

// =============================================================================
// Route View
// =============================================================================

/// The routes one solve call may use for one destination.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteView {
    pub destination: Destination,
    /// Whether the destination has a configured demand record.
    pub predefined: bool,
    /// Primary or dynamic routes, ascending id.
    pub direct: Vec<Route>,
    /// Present only when no direct route kept capacity.
    pub multihop: Vec<Route>,
}

impl RouteView {
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.direct.iter().chain(self.multihop.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.multihop.is_empty()
    }

    pub fn uses_multihop(&self) -> bool {
        !self.multihop.is_empty()
    }
}

// =============================================================================
// Network Summary
// =============================================================================

/// Aggregate figures for pre-flight checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NetworkSummary {
    pub total_supply: u64,
    /// Sum of the configured demand records.
    pub total_demand: u64,
    pub surplus: i64,
    pub primary_routes: usize,
    pub dynamic_routes: usize,
    pub multihop_routes: usize,
    pub direct_routes: usize,
    pub total_routes: usize,
    pub warehouses: usize,
    pub hubs: usize,
    pub destinations: usize,
}

impl NetworkSummary {
    /// False when `quantity` exceeds everything the warehouses hold, so
    /// callers can skip the solver entirely.
    pub fn can_supply(&self, quantity: u64) -> bool {
        quantity <= self.total_supply
    }
}

// =============================================================================
// Network Model
// =============================================================================

/// Warehouses, hubs, destinations and routes of one planning session.
///
/// `Send + Sync`: share it behind an `Arc` across concurrent solves.
#[derive(Debug)]
pub struct NetworkModel {
    /// Sorted by priority rank.
    warehouses: Vec<Warehouse>,
    /// Sorted by id.
    hubs: Vec<Hub>,
    destinations: BTreeMap<String, Destination>,
    /// Sorted by id.
    static_routes: Vec<Route>,
    settings: NetworkSettings,
    registry: Mutex<LaneRegistry>,
}

impl NetworkModel {
    /// Validates a configuration and builds the model.
    ///
    /// ## Rejected
    /// - Empty or duplicate node ids, duplicate warehouse ranks
    /// - Zero capacities or throughputs
    /// - Route ids outside 1..100, duplicates
    /// - Routes naming unknown warehouses or destinations
    /// - Negative unit costs
    pub fn from_config(config: NetworkConfig) -> CoreResult<Self> {
        let NetworkConfig {
            settings,
            currency: _,
            mut warehouses,
            mut hubs,
            destinations,
            routes,
        } = config;

        validate_unit_cost("dynamic_unit_cost", settings.dynamic_unit_cost)?;
        validate_unit_cost("multihop_unit_cost", settings.multihop_unit_cost)?;

        let mut names = HashSet::new();
        let mut ranks = HashSet::new();
        for w in &warehouses {
            validate_node_id("warehouse id", &w.id)?;
            validate_capacity(&format!("capacity of {}", w.id), w.capacity)?;
            if !names.insert(w.id.clone()) {
                return Err(duplicate("warehouse id", &w.id));
            }
            if !ranks.insert(w.priority) {
                return Err(duplicate("warehouse priority", &w.priority.to_string()));
            }
        }
        for h in &hubs {
            validate_node_id("hub id", &h.id)?;
            validate_capacity(&format!("max_throughput of {}", h.id), h.max_throughput)?;
            if !names.insert(h.id.clone()) {
                return Err(duplicate("hub id", &h.id));
            }
        }

        let mut destination_map = BTreeMap::new();
        for d in destinations {
            validate_node_id("destination id", &d.id)?;
            validate_capacity(&format!("demand of {}", d.id), d.demand)?;
            if names.contains(&d.id) || destination_map.contains_key(&d.id) {
                return Err(duplicate("destination id", &d.id));
            }
            destination_map.insert(d.id.clone(), d);
        }

        let mut route_ids = HashSet::new();
        let mut static_routes = Vec::with_capacity(routes.len());
        for spec in routes {
            validate_primary_route_id(spec.id)?;
            if !route_ids.insert(spec.id) {
                return Err(duplicate("route id", &spec.id.to_string()));
            }
            validate_unit_cost(&format!("unit cost of route {}", spec.id), spec.unit_cost)?;

            let origin = warehouses.iter().find(|w| w.id == spec.origin).ok_or_else(|| {
                ValidationError::UnknownReference {
                    field: format!("route {} origin", spec.id),
                    entity: "warehouse".to_string(),
                    id: spec.origin.clone(),
                }
            })?;
            if !destination_map.contains_key(&spec.destination) {
                return Err(ValidationError::UnknownReference {
                    field: format!("route {} destination", spec.id),
                    entity: "destination".to_string(),
                    id: spec.destination.clone(),
                }
                .into());
            }

            let capacity = match spec.capacity {
                Some(limit) => {
                    validate_capacity(&format!("capacity of route {}", spec.id), limit)?;
                    limit.min(origin.capacity)
                }
                None => origin.capacity,
            };
            static_routes.push(Route::direct(
                RouteId(spec.id),
                spec.origin,
                spec.destination,
                spec.unit_cost,
                capacity,
            ));
        }

        warehouses.sort_by_key(|w| w.priority);
        hubs.sort_by(|a, b| a.id.cmp(&b.id));
        static_routes.sort_by_key(|r| r.id);

        info!(
            warehouses = warehouses.len(),
            hubs = hubs.len(),
            destinations = destination_map.len(),
            routes = static_routes.len(),
            "Network model built"
        );

        Ok(NetworkModel {
            warehouses,
            hubs,
            destinations: destination_map,
            static_routes,
            settings,
            registry: Mutex::new(LaneRegistry::default()),
        })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Warehouses in tie-break order.
    pub fn warehouses_by_priority(&self) -> &[Warehouse] {
        &self.warehouses
    }

    pub fn hubs(&self) -> &[Hub] {
        &self.hubs
    }

    pub fn warehouse(&self, id: &str) -> Option<&Warehouse> {
        self.warehouses.iter().find(|w| w.id == id)
    }

    pub fn hub(&self, id: &str) -> Option<&Hub> {
        self.hubs.iter().find(|h| h.id == id)
    }

    /// The configured demand record, if the destination is predefined.
    pub fn destination(&self, id: &str) -> Option<&Destination> {
        self.destinations.get(id)
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    pub fn total_supply(&self) -> u64 {
        self.warehouses
            .iter()
            .fold(0u64, |total, w| total.saturating_add(w.capacity))
    }

    /// True for configured routes and for any lane synthesized so far.
    pub fn knows_route(&self, id: RouteId) -> bool {
        match id.kind() {
            RouteKind::Primary => self.static_routes.iter().any(|r| r.id == id),
            _ => self.registry.lock().lanes.contains_key(&id),
        }
    }

    /// Demand for a destination at request time: the requested quantity.
    pub fn request_destination(&self, id: &str, quantity: u64) -> Destination {
        Destination::new(id, quantity)
    }

    // =========================================================================
    // Route Queries
    // =========================================================================

    /// Static routes plus, if requested, routes synthesized for `destination`.
    ///
    /// Unlike [`NetworkModel::resolve`], this does not look at disruptions:
    /// asking for multihop routes always synthesizes them.
    pub fn get_routes(
        &self,
        destination: &Destination,
        include_dynamic: bool,
        include_multihop: bool,
    ) -> CoreResult<Vec<Route>> {
        let mut routes = self.static_routes.clone();
        if include_dynamic {
            routes.extend(self.dynamic_routes(destination)?);
        }
        if include_multihop {
            routes.extend(self.multihop_routes(destination)?);
        }
        routes.sort_by_key(|r| r.id);
        Ok(routes)
    }

    /// Every configured route plus every lane synthesized so far.
    ///
    /// Synthesized lanes carry their capacity without a demand bound, since
    /// no request is in scope here.
    pub fn all_routes(&self, include_dynamic: bool, include_multihop: bool) -> Vec<Route> {
        let mut routes = self.static_routes.clone();
        let registry = self.registry.lock();
        for (id, lane) in &registry.lanes {
            let wanted = match id.kind() {
                RouteKind::Dynamic => include_dynamic,
                RouteKind::Multihop => include_multihop,
                RouteKind::Primary => false,
            };
            if wanted {
                if let Some(route) = self.build_route(*id, lane, None) {
                    routes.push(route);
                }
            }
        }
        routes
    }

    /// Direct routes into `destination`: the configured ones, or synthesized
    /// dynamic lanes when none are configured.
    pub fn direct_routes(&self, destination: &Destination) -> CoreResult<Vec<Route>> {
        let configured: Vec<Route> = self
            .static_routes
            .iter()
            .filter(|r| r.destination == destination.id)
            .cloned()
            .collect();

        if configured.is_empty() {
            self.dynamic_routes(destination)
        } else {
            Ok(configured)
        }
    }

    /// Dynamic lanes for a destination without configured routes.
    ///
    /// One lane per warehouse within the rank cutoff, registered in priority
    /// order. Empty when the destination already has configured routes.
    pub fn dynamic_routes(&self, destination: &Destination) -> CoreResult<Vec<Route>> {
        if self
            .static_routes
            .iter()
            .any(|r| r.destination == destination.id)
        {
            return Ok(Vec::new());
        }

        let cutoff = self.settings.dynamic_rank_cutoff;
        let eligible = self
            .warehouses
            .iter()
            .filter(|w| cutoff.map_or(true, |max| w.priority <= max));

        let mut registry = self.registry.lock();
        let mut routes = Vec::new();
        for warehouse in eligible {
            let lane = Lane::direct(&warehouse.id, &destination.id);
            let id = registry.assign(lane.clone(), RouteKind::Dynamic)?;
            if let Some(route) = self.build_route(id, &lane, Some(destination.demand)) {
                routes.push(route);
            }
        }
        Ok(routes)
    }

    /// Warehouse → hub → destination lanes through every hub.
    pub fn multihop_routes(&self, destination: &Destination) -> CoreResult<Vec<Route>> {
        let mut registry = self.registry.lock();
        let mut routes = Vec::new();
        for hub in self.hubs.iter().filter(|h| h.max_throughput > 0) {
            for warehouse in &self.warehouses {
                let lane = Lane::via_hub(&warehouse.id, &hub.id, &destination.id);
                let id = registry.assign(lane.clone(), RouteKind::Multihop)?;
                if let Some(route) = self.build_route(id, &lane, Some(destination.demand)) {
                    routes.push(route);
                }
            }
        }
        Ok(routes)
    }

    /// Routes a solve call may use for `destination` under `state`.
    pub fn resolve(
        &self,
        destination: &Destination,
        state: &DisruptionState,
    ) -> CoreResult<RouteView> {
        let direct = self.direct_routes(destination)?;
        let deliverable = self.direct_deliverable(&direct, state);

        let multihop = if deliverable >= destination.demand {
            Vec::new()
        } else {
            debug!(
                destination = %destination.id,
                direct = direct.len(),
                deliverable,
                demand = destination.demand,
                "Direct capacity short of demand; synthesizing multihop routes"
            );
            self.multihop_routes(destination)?
        };

        Ok(RouteView {
            destination: destination.clone(),
            predefined: self.destinations.contains_key(&destination.id),
            direct,
            multihop,
        })
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Aggregate supply, demand and route counts.
    pub fn validate(&self) -> NetworkSummary {
        let total_supply = self.total_supply();
        let total_demand: u64 = self.destinations.values().map(|d| d.demand).sum();

        let registry = self.registry.lock();
        let primary_routes = self.static_routes.len();
        let dynamic_routes = registry.count(RouteKind::Dynamic);
        let multihop_routes = registry.count(RouteKind::Multihop);

        NetworkSummary {
            total_supply,
            total_demand,
            surplus: total_supply as i64 - total_demand as i64,
            primary_routes,
            dynamic_routes,
            multihop_routes,
            direct_routes: primary_routes + dynamic_routes,
            total_routes: primary_routes + dynamic_routes + multihop_routes,
            warehouses: self.warehouses.len(),
            hubs: self.hubs.len(),
            destinations: self.destinations.len(),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Units the direct routes can carry under `state`, with routes that
    /// share an origin bounded together by that warehouse's capacity.
    fn direct_deliverable(&self, direct: &[Route], state: &DisruptionState) -> u64 {
        let mut by_origin: BTreeMap<&str, u64> = BTreeMap::new();
        for route in direct {
            let open = by_origin.entry(route.origin.as_str()).or_insert(0);
            *open = open.saturating_add(state.remaining_capacity(route));
        }

        by_origin
            .into_iter()
            .map(|(origin, open)| self.warehouse(origin).map_or(0, |w| open.min(w.capacity)))
            .fold(0u64, u64::saturating_add)
    }

    fn build_route(&self, id: RouteId, lane: &Lane, demand: Option<u64>) -> Option<Route> {
        let warehouse = self.warehouse(&lane.origin)?;
        match &lane.hub {
            None => Some(Route::direct(
                id,
                &lane.origin,
                &lane.destination,
                self.settings.dynamic_unit_cost,
                warehouse.capacity,
            )),
            Some(hub_id) => {
                let hub = self.hub(hub_id)?;
                let mut capacity = warehouse.capacity.min(hub.max_throughput);
                if let Some(demand) = demand {
                    capacity = capacity.min(demand);
                }
                Some(Route::via_hub(
                    id,
                    &lane.origin,
                    hub_id,
                    &lane.destination,
                    self.settings.multihop_unit_cost,
                    capacity,
                ))
            }
        }
    }
}

fn duplicate(field: &str, value: &str) -> CoreError {
    ValidationError::Duplicate {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
