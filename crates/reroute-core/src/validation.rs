//! # Validation Module
//!
//! Input validation for network configuration and per-call records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Extraction collaborator (outside this workspace)             │
//! │  ├── Free text → structured fields                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Record constructors (types.rs)                               │
//! │  ├── THIS MODULE: quantity > 0, budget ≥ 0, multiplier ≥ 1 ...         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: NetworkModel::from_config                                    │
//! │  ├── THIS MODULE: positive capacities, id namespaces                   │
//! │  └── Cross-record checks (duplicates, unknown references)             │
//! │                                                                         │
//! │  Nothing past layer 3 raises: solvers report outcomes, not errors.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{DYNAMIC_ROUTE_START_ID, MAX_CAPACITY, MAX_NODE_ID_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a node id (warehouse, hub or destination name).
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 100 characters
/// - No `->`, which is reserved for lane keys in logs
///
/// ## Example
/// ```rust
/// use reroute_core::validation::validate_node_id;
///
/// assert!(validate_node_id("destination", "New York").is_ok());
/// assert!(validate_node_id("destination", "").is_err());
/// ```
pub fn validate_node_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_NODE_ID_LEN {
        return Err(ValidationError::OutOfRange {
            field: format!("{} length", field),
            min: "1".to_string(),
            max: MAX_NODE_ID_LEN.to_string(),
        });
    }

    if id.contains("->") {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain '->'".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested quantity. Must be positive.
pub fn validate_quantity(quantity: u64) -> ValidationResult<()> {
    if quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a configured capacity or throughput.
///
/// Zero is rejected: a warehouse that can never ship is a configuration
/// mistake, while a lane closed by an incident is modelled as a disruption.
/// The upper bound keeps supply totals and unit-cost products in range.
pub fn validate_capacity(field: &str, capacity: u64) -> ValidationResult<()> {
    if capacity == 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if capacity > MAX_CAPACITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "1".to_string(),
            max: MAX_CAPACITY.to_string(),
        });
    }

    Ok(())
}

/// Validates a budget amount. Zero is allowed.
pub fn validate_budget(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "budget".to_string(),
            min: "0".to_string(),
            max: i64::MAX.to_string(),
        });
    }

    Ok(())
}

/// Validates a per-unit route cost. Zero is allowed (owned fleet).
pub fn validate_unit_cost(field: &str, cost: Money) -> ValidationResult<()> {
    if cost.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: i64::MAX.to_string(),
        });
    }

    Ok(())
}

/// Validates a disruption cost multiplier.
///
/// ## Rules
/// - Finite
/// - At least 1.0 (disruptions never make a lane cheaper)
///
/// ## Example
/// ```rust
/// use reroute_core::validation::validate_cost_multiplier;
///
/// assert!(validate_cost_multiplier(20.0).is_ok());
/// assert!(validate_cost_multiplier(0.8).is_err());
/// assert!(validate_cost_multiplier(f64::INFINITY).is_err());
/// ```
pub fn validate_cost_multiplier(multiplier: f64) -> ValidationResult<()> {
    if !multiplier.is_finite() || multiplier < 1.0 {
        return Err(ValidationError::OutOfRange {
            field: "cost_multiplier".to_string(),
            min: "1.0".to_string(),
            max: "finite".to_string(),
        });
    }

    Ok(())
}

/// Validates a remaining-capacity fraction (0.0 blocked, 1.0 unaffected).
pub fn validate_capacity_factor(factor: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&factor) {
        return Err(ValidationError::OutOfRange {
            field: "capacity_factor".to_string(),
            min: "0.0".to_string(),
            max: "1.0".to_string(),
        });
    }

    Ok(())
}

/// Validates an exchange rate (units of a currency per one base unit).
pub fn validate_exchange_rate(currency: &str, rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: format!("exchange rate for {}", currency),
        });
    }

    Ok(())
}

/// Validates that a configured route id sits in the primary namespace.
pub fn validate_primary_route_id(id: u32) -> ValidationResult<()> {
    if id == 0 || id >= DYNAMIC_ROUTE_START_ID {
        return Err(ValidationError::OutOfRange {
            field: "primary route id".to_string(),
            min: "1".to_string(),
            max: (DYNAMIC_ROUTE_START_ID - 1).to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_node_id() {
        assert!(validate_node_id("warehouse", "Warehouse_North").is_ok());
        assert!(validate_node_id("destination", "Los Angeles").is_ok());

        assert!(validate_node_id("destination", "").is_err());
        assert!(validate_node_id("destination", "   ").is_err());
        assert!(validate_node_id("destination", "A->B").is_err());
        assert!(validate_node_id("destination", &"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity_and_capacity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_capacity("capacity", 3000).is_ok());
        assert!(validate_capacity("capacity", 0).is_err());
        assert!(validate_capacity("capacity", MAX_CAPACITY).is_ok());
        assert!(matches!(
            validate_capacity("capacity", MAX_CAPACITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_money_fields() {
        assert!(validate_budget(Money::zero()).is_ok());
        assert!(validate_budget(Money::from_cents(-1)).is_err());
        assert!(validate_unit_cost("cost", Money::zero()).is_ok());
        assert!(validate_unit_cost("cost", Money::from_cents(-5)).is_err());
    }

    #[test]
    fn test_validate_capacity_factor() {
        assert!(validate_capacity_factor(0.0).is_ok());
        assert!(validate_capacity_factor(0.25).is_ok());
        assert!(validate_capacity_factor(1.0).is_ok());
        assert!(validate_capacity_factor(1.01).is_err());
        assert!(validate_capacity_factor(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_exchange_rate() {
        assert!(validate_exchange_rate("INR", 83.5).is_ok());
        assert!(validate_exchange_rate("INR", 0.0).is_err());
        assert!(validate_exchange_rate("INR", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_primary_route_id() {
        assert!(validate_primary_route_id(1).is_ok());
        assert!(validate_primary_route_id(99).is_ok());
        assert!(validate_primary_route_id(0).is_err());
        assert!(validate_primary_route_id(100).is_err());
    }
}
