//! # reroute-engine
//!
//! Configuration loading, log setup and a shareable [`PlanningSession`]
//! around `reroute-core`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use reroute_engine::{init_tracing, PlanningSession, RerouteConfig};
//! use reroute_core::ShipmentRequirement;
//!
//! let config = RerouteConfig::load(None)?;
//! init_tracing(&config.logging);
//!
//! let session = PlanningSession::from_config(&config)?;
//! let requirement = ShipmentRequirement::new("Chicago", 500)?;
//! let plan = session.solve_mitigation_plan(&requirement, &[])?;
//! println!("{}", plan.total_cost);
//! # Ok::<(), reroute_engine::EngineError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::{LogSettings, RerouteConfig};
pub use error::{EngineError, EngineResult};
pub use logging::init_tracing;
pub use session::PlanningSession;
