//! # Cost Model
//!
//! Turns routes into weighted arcs for a given disruption state, and
//! normalises budgets into the base currency.
//!
//! ## Disruption Folding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  events                          per-route effect                       │
//! │  ─────────────────────────────   ─────────────────────────────────────  │
//! │  Strike   {2}     ×5.0            route 2: ×20.0, factor 0.0            │
//! │  Collapse {1, 2}  ×20.0, 0.0  ─►  route 1: ×20.0, factor 0.0            │
//! │  Delay    {1}     ×2.0, 0.5       (max multiplier, min factor)          │
//! │                                                                         │
//! │  Multipliers never compound: the most severe event on a route wins.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::CurrencySettings;
use crate::error::{CoreError, CoreResult};
use crate::money::{CurrencyCode, Money};
use crate::network::RouteView;
use crate::types::{Budget, DisruptionEvent, Route, RouteId};
use crate::validation::{validate_exchange_rate, ValidationResult};

// =============================================================================
// Disruption State
// =============================================================================

/// The combined effect of all events on a single route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEffect {
    pub multiplier: f64,
    pub capacity_factor: f64,
}

impl Default for RouteEffect {
    fn default() -> Self {
        RouteEffect {
            multiplier: 1.0,
            capacity_factor: 1.0,
        }
    }
}

impl RouteEffect {
    fn absorb(&mut self, other: RouteEffect) {
        self.multiplier = self.multiplier.max(other.multiplier);
        self.capacity_factor = self.capacity_factor.min(other.capacity_factor);
    }
}

/// Disruption events folded per route id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisruptionState {
    effects: BTreeMap<RouteId, RouteEffect>,
}

impl DisruptionState {
    /// No disruption at all.
    pub fn clear() -> Self {
        Self::default()
    }

    /// Folds events, keeping the most severe multiplier and capacity factor
    /// per route.
    pub fn from_events(events: &[DisruptionEvent]) -> Self {
        let mut state = Self::default();
        for event in events {
            let effect = RouteEffect {
                multiplier: event.cost_multiplier,
                capacity_factor: event.capacity_factor.unwrap_or(1.0),
            };
            for id in &event.targets {
                state.effects.entry(*id).or_default().absorb(effect);
            }
        }
        state
    }

    /// Worst case over several states: every route takes its most severe
    /// effect from any of them.
    pub fn merged<'a>(states: impl IntoIterator<Item = &'a DisruptionState>) -> Self {
        let mut merged = Self::default();
        for state in states {
            for (id, effect) in &state.effects {
                merged.effects.entry(*id).or_default().absorb(*effect);
            }
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn effect(&self, id: RouteId) -> RouteEffect {
        self.effects.get(&id).copied().unwrap_or_default()
    }

    pub fn multiplier(&self, id: RouteId) -> f64 {
        self.effect(id).multiplier
    }

    pub fn capacity_factor(&self, id: RouteId) -> f64 {
        self.effect(id).capacity_factor
    }

    /// Route capacity left after disruption, rounded down.
    pub fn remaining_capacity(&self, route: &Route) -> u64 {
        let factor = self.capacity_factor(route.id);
        if factor >= 1.0 {
            route.capacity
        } else {
            (route.capacity as f64 * factor).floor() as u64
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = RouteId> + '_ {
        self.effects.keys().copied()
    }

    /// Targeted ids that `known` does not recognise, in ascending order.
    pub fn unknown_targets(&self, known: impl Fn(RouteId) -> bool) -> Vec<RouteId> {
        self.targets().filter(|id| !known(*id)).collect()
    }
}

// =============================================================================
// Exchange Rates
// =============================================================================

/// Fixed conversion rates into the base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRates {
    base: CurrencyCode,
    per_base: BTreeMap<CurrencyCode, f64>,
}

impl ExchangeRates {
    /// Rates table that only knows the base currency.
    pub fn new(base: CurrencyCode) -> Self {
        ExchangeRates {
            base,
            per_base: BTreeMap::new(),
        }
    }

    /// Adds "one base unit buys `rate` units of `currency`".
    pub fn with_rate(mut self, currency: CurrencyCode, rate: f64) -> ValidationResult<Self> {
        validate_exchange_rate(currency.as_str(), rate)?;
        self.per_base.insert(currency, rate);
        Ok(self)
    }

    pub fn from_settings(settings: &CurrencySettings) -> ValidationResult<Self> {
        settings
            .per_base
            .iter()
            .try_fold(Self::new(settings.base.clone()), |rates, (code, rate)| {
                rates.with_rate(code.clone(), *rate)
            })
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Converts an amount stated in `currency` into base currency cents.
    ///
    /// ## Example
    /// ```rust
    /// use reroute_core::cost::ExchangeRates;
    /// use reroute_core::money::Money;
    ///
    /// let rates = ExchangeRates::new("USD".parse().unwrap())
    ///     .with_rate("INR".parse().unwrap(), 80.0)
    ///     .unwrap();
    /// let inr = "INR".parse().unwrap();
    /// assert_eq!(rates.to_base(Money::from_cents(8_000), &inr).unwrap().cents(), 100);
    /// ```
    pub fn to_base(&self, amount: Money, currency: &CurrencyCode) -> CoreResult<Money> {
        if *currency == self.base {
            return Ok(amount);
        }

        let rate = self
            .per_base
            .get(currency)
            .ok_or_else(|| CoreError::UnknownCurrency {
                currency: currency.to_string(),
                base: self.base.to_string(),
            })?;

        Ok(amount.scale(1.0 / rate))
    }
}

// =============================================================================
// Cost Model
// =============================================================================

/// A route with its post-disruption unit cost and capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedRoute {
    pub route: Route,
    pub unit_cost: Money,
    pub capacity: u64,
}

/// Per-unit pricing of routes under a disruption state.
///
/// Base costs are fixed on the routes themselves when the network is built;
/// this type only overlays disruptions and owns the currency table.
#[derive(Debug, Clone)]
pub struct CostModel {
    rates: ExchangeRates,
}

impl CostModel {
    pub fn new(rates: ExchangeRates) -> Self {
        CostModel { rates }
    }

    pub fn from_settings(settings: &CurrencySettings) -> CoreResult<Self> {
        Ok(Self::new(ExchangeRates::from_settings(settings)?))
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    /// Base cost × the most severe multiplier targeting the route.
    pub fn effective_cost(&self, route: &Route, state: &DisruptionState) -> Money {
        let multiplier = state.multiplier(route.id);
        if multiplier == 1.0 {
            route.base_cost
        } else {
            route.base_cost.scale(multiplier)
        }
    }

    pub fn effective_capacity(&self, route: &Route, state: &DisruptionState) -> u64 {
        state.remaining_capacity(route)
    }

    pub fn price_route(&self, route: &Route, state: &DisruptionState) -> PricedRoute {
        PricedRoute {
            unit_cost: self.effective_cost(route, state),
            capacity: self.effective_capacity(route, state),
            route: route.clone(),
        }
    }

    /// Prices every route of a view, in ascending route id order.
    pub fn price(&self, view: &RouteView, state: &DisruptionState) -> Vec<PricedRoute> {
        let mut priced: Vec<PricedRoute> = view
            .routes()
            .map(|route| self.price_route(route, state))
            .collect();
        priced.sort_by_key(|p| p.route.id);
        priced
    }

    /// Budget ceiling in base currency.
    pub fn budget_in_base(&self, budget: &Budget) -> CoreResult<Money> {
        let converted = self.rates.to_base(budget.amount, &budget.currency)?;
        if budget.currency != *self.rates.base() {
            debug!(
                amount = %budget.amount,
                currency = %budget.currency,
                base = %self.rates.base(),
                converted = %converted,
                "Converted budget into base currency"
            );
        }
        Ok(converted)
    }

    /// Logs and returns disruption targets the network does not contain.
    pub fn report_unknown_targets(
        &self,
        state: &DisruptionState,
        known: impl Fn(RouteId) -> bool,
    ) -> Vec<RouteId> {
        let unknown = state.unknown_targets(known);
        for id in &unknown {
            warn!(route_id = id.get(), "Disruption references unknown route; ignoring");
        }
        unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RouteId;

    fn route(id: u32, cents: i64, capacity: u64) -> Route {
        Route::direct(RouteId(id), "W", "D", Money::from_cents(cents), capacity)
    }

    fn usd_inr() -> ExchangeRates {
        ExchangeRates::new("USD".parse().unwrap())
            .with_rate("INR".parse().unwrap(), 83.5)
            .unwrap()
    }

    #[test]
    fn test_most_severe_event_wins() {
        let events = vec![
            DisruptionEvent::new([RouteId(2)], "Labor Strike", 5.0).unwrap(),
            DisruptionEvent::new([RouteId(1), RouteId(2)], "Collapse", 20.0)
                .unwrap()
                .with_capacity_factor(0.0)
                .unwrap(),
            DisruptionEvent::new([RouteId(1)], "Delay", 2.0)
                .unwrap()
                .with_capacity_factor(0.5)
                .unwrap(),
        ];
        let state = DisruptionState::from_events(&events);

        assert_eq!(state.multiplier(RouteId(2)), 20.0);
        assert_eq!(state.multiplier(RouteId(1)), 20.0);
        assert_eq!(state.capacity_factor(RouteId(1)), 0.0);
        assert_eq!(state.multiplier(RouteId(3)), 1.0);
        assert_eq!(state.capacity_factor(RouteId(3)), 1.0);
    }

    #[test]
    fn test_multiplier_and_capacity_are_independent() {
        let model = CostModel::new(usd_inr());
        let r = route(4, 1000, 3000);

        let pricey = DisruptionState::from_events(&[
            DisruptionEvent::new([RouteId(4)], "Strike", 3.0).unwrap()
        ]);
        assert_eq!(model.effective_cost(&r, &pricey).cents(), 3000);
        assert_eq!(model.effective_capacity(&r, &pricey), 3000);

        let narrowed = DisruptionState::from_events(&[DisruptionEvent::new([RouteId(4)], "Flood", 1.0)
            .unwrap()
            .with_capacity_factor(0.25)
            .unwrap()]);
        assert_eq!(model.effective_cost(&r, &narrowed).cents(), 1000);
        assert_eq!(model.effective_capacity(&r, &narrowed), 750);
    }

    #[test]
    fn test_remaining_capacity_rounds_down() {
        let r = route(1, 100, 7);
        let state = DisruptionState::from_events(&[DisruptionEvent::new([RouteId(1)], "Fog", 1.0)
            .unwrap()
            .with_capacity_factor(0.5)
            .unwrap()]);
        assert_eq!(state.remaining_capacity(&r), 3);
    }

    #[test]
    fn test_merged_state_takes_worst_of_each() {
        let a = DisruptionState::from_events(&[DisruptionEvent::blocking([RouteId(2)], "Collapse")]);
        let b = DisruptionState::from_events(&[DisruptionEvent::new([RouteId(2), RouteId(7)], "Strike", 4.0)
            .unwrap()]);
        let merged = DisruptionState::merged([&a, &b]);

        assert_eq!(merged.capacity_factor(RouteId(2)), 0.0);
        assert_eq!(merged.multiplier(RouteId(2)), 4.0);
        assert_eq!(merged.multiplier(RouteId(7)), 4.0);
        assert_eq!(merged.targets().collect::<Vec<_>>(), vec![RouteId(2), RouteId(7)]);
    }

    #[test]
    fn test_unknown_targets() {
        let state = DisruptionState::from_events(&[
            DisruptionEvent::new([RouteId(1), RouteId(77), RouteId(5000)], "Generic Delay", 2.0).unwrap(),
        ]);
        let model = CostModel::new(usd_inr());
        let unknown = model.report_unknown_targets(&state, |id| id.get() < 11);
        assert_eq!(unknown, vec![RouteId(77), RouteId(5000)]);
    }

    #[test]
    fn test_budget_conversion() {
        let model = CostModel::new(usd_inr());
        let inr = Budget::new(Money::from_cents(30_000_000), "INR".parse().unwrap()).unwrap();
        assert_eq!(model.budget_in_base(&inr).unwrap().cents(), 359_281);

        let usd = Budget::new(Money::from_cents(10_000), "USD".parse().unwrap()).unwrap();
        assert_eq!(model.budget_in_base(&usd).unwrap().cents(), 10_000);

        let eur = Budget::new(Money::from_cents(10_000), "EUR".parse().unwrap()).unwrap();
        assert!(matches!(
            model.budget_in_base(&eur),
            Err(CoreError::UnknownCurrency { .. })
        ));
    }

    #[test]
    fn test_rates_reject_bad_values() {
        let rates = ExchangeRates::new("USD".parse().unwrap());
        assert!(rates.clone().with_rate("INR".parse().unwrap(), 0.0).is_err());
        assert!(rates.with_rate("INR".parse().unwrap(), -1.0).is_err());
        assert!(CostModel::from_settings(&CurrencySettings::default()).is_ok());
    }
}
