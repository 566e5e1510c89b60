//! # Error Types
//!
//! Domain-specific error types for reroute-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  reroute-core errors (this file)                                       │
//! │  ├── CoreError        - Malformed input that cannot be solved          │
//! │  └── ValidationError  - Field-level input validation failures          │
//! │                                                                         │
//! │  reroute-engine errors (separate crate)                                │
//! │  └── EngineError      - Config file / environment failures             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What is NOT an error
//! "No route exists", "demand exceeds capacity" and "over budget" are business
//! answers. They come back inside a [`Plan`](crate::plan::Plan) as
//! [`SolveOutcome`](crate::plan::SolveOutcome) flags, never through this module.

use thiserror::Error;

use crate::types::RouteKind;

// =============================================================================
// Core Error
// =============================================================================

/// Hard failures of the core.
///
/// Only malformed inputs end up here. Callers are expected to fix the input,
/// not to retry.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A budget was stated in a currency with no configured exchange rate.
    #[error("No exchange rate configured for currency {currency} (base {base})")]
    UnknownCurrency { currency: String, base: String },

    /// Every id of a synthesized namespace has been handed out.
    ///
    /// ## When This Occurs
    /// - More than 900 dynamic lanes registered on one model
    /// - Multihop ids reached `u32::MAX`
    #[error("Route id namespace for {kind} routes is exhausted")]
    RouteNamespaceExhausted { kind: RouteKind },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised while constructing a network from configuration, or when a
/// requirement / disruption record is built from extracted fields.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    /// Invalid format (e.g., lowercase currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two warehouses with the same id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A record references a node that is not part of the network.
    #[error("{field} references unknown {entity} '{id}'")]
    UnknownReference {
        field: String,
        entity: String,
        id: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
