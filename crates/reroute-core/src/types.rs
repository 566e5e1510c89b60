//! # Domain Types
//!
//! Core domain types shared by the network model, cost model and solvers.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Warehouse     │   │      Hub        │   │  Destination    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id (city)      │       │
//! │  │  capacity       │   │  location       │   │  demand         │       │
//! │  │  location       │   │  max_throughput │   └─────────────────┘       │
//! │  │  priority rank  │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │ Route                        │   │ DisruptionEvent              │   │
//! │  │  id: RouteId ── kind by range│   │  targets: {RouteId}          │   │
//! │  │  origin → [hub] → dest       │   │  cost_multiplier ≥ 1.0       │   │
//! │  │  base_cost, capacity         │   │  capacity_factor 0.0..=1.0   │   │
//! │  └──────────────────────────────┘   └──────────────────────────────┘   │
//! │                                                                         │
//! │  ShipmentRequirement: destination, quantity, budget, date, priority    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Route Id Namespaces
//! ```text
//!   1 ..   99   primary   (static, configured)
//! 100 ..  999   dynamic   (direct lanes synthesized for unseen cities)
//! 1000 ..       multihop  (warehouse → hub → destination)
//! ```
//! The range an id falls in *is* its provenance; consumers never need a
//! separate kind field to tell routes apart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{CurrencyCode, Money};
use crate::validation::{
    validate_budget, validate_capacity_factor, validate_cost_multiplier, validate_node_id,
    validate_quantity,
};
use crate::{DYNAMIC_ROUTE_START_ID, MULTIHOP_ROUTE_START_ID};

// =============================================================================
// Route Id
// =============================================================================

/// Numeric route identifier. See the module docs for the namespace layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct RouteId(pub u32);

impl RouteId {
    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// The namespace this id belongs to.
    pub const fn kind(&self) -> RouteKind {
        if self.0 >= MULTIHOP_ROUTE_START_ID {
            RouteKind::Multihop
        } else if self.0 >= DYNAMIC_ROUTE_START_ID {
            RouteKind::Dynamic
        } else {
            RouteKind::Primary
        }
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RouteId {
    fn from(id: u32) -> Self {
        RouteId(id)
    }
}

// =============================================================================
// Route Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// Configured warehouse → destination lane.
    Primary,
    /// Direct lane synthesized for a destination without a configured route.
    Dynamic,
    /// Warehouse → hub → destination lane.
    Multihop,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Primary => write!(f, "primary"),
            RouteKind::Dynamic => write!(f, "dynamic"),
            RouteKind::Multihop => write!(f, "multihop"),
        }
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// A supply node. Immutable once the network is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,
    /// Units available per planning period.
    pub capacity: u64,
    /// Free-form region tag ("North", "Central").
    pub location: String,
    /// Tie-break rank; lower ranks are preferred and synthesized first.
    pub priority: u32,
}

/// Intermediate distribution hub, only ever the middle node of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub id: String,
    pub location: String,
    /// Units per period the hub can pass through, across all routes using it.
    pub max_throughput: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// City or client name.
    pub id: String,
    /// Units required.
    pub demand: u64,
}

impl Destination {
    /// A destination derived at request time.
    pub fn new(id: impl Into<String>, demand: u64) -> Self {
        Destination {
            id: id.into(),
            demand,
        }
    }
}

// =============================================================================
// Route
// =============================================================================

/// A directed path from a warehouse to a destination, optionally via a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub kind: RouteKind,
    pub origin: String,
    pub hub: Option<String>,
    pub destination: String,
    /// Per-unit cost before any disruption.
    pub base_cost: Money,
    /// Capacity of the weakest node/arc on the path.
    pub capacity: u64,
}

impl Route {
    /// Creates a direct route. The kind follows from the id.
    pub fn direct(
        id: RouteId,
        origin: impl Into<String>,
        destination: impl Into<String>,
        base_cost: Money,
        capacity: u64,
    ) -> Self {
        Route {
            id,
            kind: id.kind(),
            origin: origin.into(),
            hub: None,
            destination: destination.into(),
            base_cost,
            capacity,
        }
    }

    /// Creates a route through `hub`.
    pub fn via_hub(
        id: RouteId,
        origin: impl Into<String>,
        hub: impl Into<String>,
        destination: impl Into<String>,
        base_cost: Money,
        capacity: u64,
    ) -> Self {
        Route {
            id,
            kind: id.kind(),
            origin: origin.into(),
            hub: Some(hub.into()),
            destination: destination.into(),
            base_cost,
            capacity,
        }
    }

    /// Number of arcs on the path (1 for direct, 2 through a hub).
    #[inline]
    pub fn hops(&self) -> u32 {
        if self.hub.is_some() {
            2
        } else {
            1
        }
    }

    #[inline]
    pub fn is_direct(&self) -> bool {
        self.hub.is_none()
    }

    /// Ordered node sequence: origin, optional hub, destination.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes = vec![self.origin.as_str()];
        if let Some(hub) = &self.hub {
            nodes.push(hub.as_str());
        }
        nodes.push(self.destination.as_str());
        nodes
    }
}

// =============================================================================
// Disruption Event
// =============================================================================

/// A condition that raises cost and/or lowers capacity on a set of routes.
///
/// The cost multiplier and the capacity factor are independent: a strike
/// may make a lane expensive without closing it, a bridge collapse may close
/// it without any price signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisruptionEvent {
    pub targets: BTreeSet<RouteId>,
    /// Label from the risk source ("Labor Strike", "Infrastructure Collapse").
    pub impact_type: String,
    /// Per-unit cost multiplier, at least 1.0.
    pub cost_multiplier: f64,
    /// Fraction of capacity that remains: 1.0 unaffected, 0.0 fully blocked.
    #[serde(default)]
    pub capacity_factor: Option<f64>,
}

impl DisruptionEvent {
    /// Creates a cost-only event.
    ///
    /// ## Example
    /// ```rust
    /// use reroute_core::types::{DisruptionEvent, RouteId};
    ///
    /// let strike = DisruptionEvent::new([RouteId(2)], "Labor Strike", 5.0).unwrap();
    /// assert_eq!(strike.capacity_factor, None);
    /// assert!(DisruptionEvent::new([RouteId(2)], "Discount", 0.5).is_err());
    /// ```
    pub fn new(
        targets: impl IntoIterator<Item = RouteId>,
        impact_type: impl Into<String>,
        cost_multiplier: f64,
    ) -> Result<Self, ValidationError> {
        let event = DisruptionEvent {
            targets: targets.into_iter().collect(),
            impact_type: impact_type.into(),
            cost_multiplier,
            capacity_factor: None,
        };
        event.validate()?;
        Ok(event)
    }

    /// Creates an event that closes its targets completely.
    pub fn blocking(
        targets: impl IntoIterator<Item = RouteId>,
        impact_type: impl Into<String>,
    ) -> Self {
        DisruptionEvent {
            targets: targets.into_iter().collect(),
            impact_type: impact_type.into(),
            cost_multiplier: 1.0,
            capacity_factor: Some(0.0),
        }
    }

    /// Sets the remaining capacity fraction.
    pub fn with_capacity_factor(mut self, factor: f64) -> Result<Self, ValidationError> {
        validate_capacity_factor(factor)?;
        self.capacity_factor = Some(factor);
        Ok(self)
    }

    /// Re-checks ranges, for events that arrived through deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_cost_multiplier(self.cost_multiplier)?;
        if let Some(factor) = self.capacity_factor {
            validate_capacity_factor(factor)?;
        }
        Ok(())
    }
}

// =============================================================================
// Shipment Requirement
// =============================================================================

/// Budget ceiling in the currency the requester stated it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub amount: Money,
    pub currency: CurrencyCode,
}

impl Budget {
    pub fn new(amount: Money, currency: CurrencyCode) -> Result<Self, ValidationError> {
        validate_budget(amount)?;
        Ok(Budget { amount, currency })
    }
}

/// Urgency tag attached by the requirement extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentPriority {
    Urgent,
    Expedited,
    Standard,
}

impl FromStr for ShipmentPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "urgent" | "emergency" | "critical" => Ok(ShipmentPriority::Urgent),
            "expedited" | "express" | "rush" | "fast" => Ok(ShipmentPriority::Expedited),
            "standard" | "normal" | "regular" => Ok(ShipmentPriority::Standard),
            other => Err(ValidationError::InvalidFormat {
                field: "priority".to_string(),
                reason: format!("unknown priority '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ShipmentPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentPriority::Urgent => write!(f, "urgent"),
            ShipmentPriority::Expedited => write!(f, "expedited"),
            ShipmentPriority::Standard => write!(f, "standard"),
        }
    }
}

/// Structured shipment request, as produced by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRequirement {
    pub destination: String,
    pub quantity: u64,
    #[serde(default)]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<ShipmentPriority>,
}

impl ShipmentRequirement {
    /// Creates a requirement with no budget, date or priority.
    ///
    /// ## Example
    /// ```rust
    /// use reroute_core::types::ShipmentRequirement;
    ///
    /// let req = ShipmentRequirement::new("Boston", 500).unwrap();
    /// assert_eq!(req.quantity, 500);
    /// assert!(ShipmentRequirement::new("Boston", 0).is_err());
    /// assert!(ShipmentRequirement::new("  ", 10).is_err());
    /// ```
    pub fn new(destination: impl Into<String>, quantity: u64) -> Result<Self, ValidationError> {
        let destination = destination.into().trim().to_string();
        validate_node_id("destination", &destination)?;
        validate_quantity(quantity)?;

        Ok(ShipmentRequirement {
            destination,
            quantity,
            budget: None,
            delivery_date: None,
            priority: None,
        })
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_delivery_date(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(date);
        self
    }

    pub fn with_priority(mut self, priority: ShipmentPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Re-checks field ranges, for requirements that arrived through
    /// deserialization rather than [`ShipmentRequirement::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_node_id("destination", &self.destination)?;
        validate_quantity(self.quantity)?;
        if let Some(budget) = &self.budget {
            validate_budget(budget.amount)?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
