//! # Min-Cost Flow
//!
//! Successive shortest paths over a small residual graph. Networks here
//! have a handful of warehouses and hubs and at most a few dozen routes, so
//! Bellman-Ford per augmentation is plenty and keeps negative residual arcs
//! simple to handle.
//!
//! ## Arc Costs
//! Costs are compared lexicographically:
//! ```text
//!   (cents, hops, warehouse rank, route id)
//! ```
//! The first field is the real objective. The others only separate plans of
//! equal cost, so the solver prefers fewer hops, then better-ranked
//! warehouses, then lower route ids, and the same input always yields the
//! same allocation.

use std::ops::{Add, Neg};

// =============================================================================
// Arc Cost
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArcCost {
    pub cents: i64,
    pub hops: i64,
    pub rank: i64,
    pub route: i64,
}

impl ArcCost {
    pub fn new(cents: i64, hops: u32, rank: u32, route: u32) -> Self {
        ArcCost {
            cents,
            hops: hops as i64,
            rank: rank as i64,
            route: route as i64,
        }
    }
}

impl Add for ArcCost {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        ArcCost {
            cents: self.cents + other.cents,
            hops: self.hops + other.hops,
            rank: self.rank + other.rank,
            route: self.route + other.route,
        }
    }
}

impl Neg for ArcCost {
    type Output = Self;

    fn neg(self) -> Self {
        ArcCost {
            cents: -self.cents,
            hops: -self.hops,
            rank: -self.rank,
            route: -self.route,
        }
    }
}

// =============================================================================
// Flow Network
// =============================================================================

/// Handle to an arc added with [`FlowNetwork::add_arc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcId(usize);

#[derive(Debug, Clone)]
struct ResidualArc {
    to: usize,
    residual: u64,
    cost: ArcCost,
    /// Index of the paired reverse arc.
    rev: usize,
}

/// A directed graph with capacities and lexicographic costs.
#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    arcs: Vec<ResidualArc>,
    adjacency: Vec<Vec<usize>>,
    capacities: Vec<u64>,
}

impl FlowNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self) -> usize {
        self.adjacency.push(Vec::new());
        self.adjacency.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Adds `from → to` plus its zero-capacity reverse arc.
    pub fn add_arc(&mut self, from: usize, to: usize, capacity: u64, cost: ArcCost) -> ArcId {
        let forward = self.arcs.len();
        self.arcs.push(ResidualArc {
            to,
            residual: capacity,
            cost,
            rev: forward + 1,
        });
        self.arcs.push(ResidualArc {
            to: from,
            residual: 0,
            cost: -cost,
            rev: forward,
        });
        self.adjacency[from].push(forward);
        self.adjacency[to].push(forward + 1);
        self.capacities.push(capacity);
        self.capacities.push(0);
        ArcId(forward)
    }

    /// Units currently sent along an arc.
    pub fn flow(&self, arc: ArcId) -> u64 {
        self.capacities[arc.0] - self.arcs[arc.0].residual
    }

    /// Sends up to `limit` units from `source` to `sink` at minimum cost.
    /// Returns the units sent.
    pub fn min_cost_flow(&mut self, source: usize, sink: usize, limit: u64) -> u64 {
        let mut sent = 0;
        while sent < limit {
            let Some(path) = self.shortest_path(source, sink) else {
                break;
            };

            let bottleneck = path
                .iter()
                .map(|&a| self.arcs[a].residual)
                .min()
                .unwrap_or(0)
                .min(limit - sent);
            if bottleneck == 0 {
                break;
            }

            for &a in &path {
                self.arcs[a].residual -= bottleneck;
                let rev = self.arcs[a].rev;
                self.arcs[rev].residual += bottleneck;
            }
            sent += bottleneck;
        }
        sent
    }

    /// Bellman-Ford over arcs with residual capacity. Returns the arc
    /// indices of the cheapest source → sink path.
    fn shortest_path(&self, source: usize, sink: usize) -> Option<Vec<usize>> {
        let n = self.node_count();
        let mut dist: Vec<Option<ArcCost>> = vec![None; n];
        let mut via: Vec<Option<usize>> = vec![None; n];
        dist[source] = Some(ArcCost::default());

        // Residual graphs from successive shortest paths have no negative
        // cycles, so n - 1 rounds settle every distance.
        for _ in 1..n {
            let mut changed = false;
            for node in 0..n {
                let Some(d) = dist[node] else { continue };
                for &a in &self.adjacency[node] {
                    let arc = &self.arcs[a];
                    if arc.residual == 0 {
                        continue;
                    }
                    let candidate = d + arc.cost;
                    if dist[arc.to].map_or(true, |current| candidate < current) {
                        dist[arc.to] = Some(candidate);
                        via[arc.to] = Some(a);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        dist[sink]?;

        let mut path = Vec::new();
        let mut node = sink;
        while node != source {
            let a = via[node]?;
            path.push(a);
            node = self.arcs[self.arcs[a].rev].to;
            if path.len() > self.arcs.len() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
