//! Cost allocation arithmetic.
//!
//! Converts between a customer's percentage share of a project and the
//! absolute amount it represents, and aggregates allocations per project.
//! Every function is total: non-finite or otherwise unusable input degrades
//! to zero so a partially loaded dashboard still renders.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Upper bound for the summed percentages of one project.
pub(crate) const FULL_ALLOCATION: f64 = 100.0;

/// Slack used when comparing a summed allocation against 100%.
pub(crate) const ALLOCATION_TOLERANCE: f64 = 1e-9;

/// Decimals used by summary figures (cards, totals).
pub(crate) const SUMMARY_DECIMALS: usize = 1;

/// Decimals used by detail figures (per-customer shares).
pub(crate) const DETAIL_DECIMALS: usize = 2;

/// Anything that carries a customer's share of a project.
///
/// A share is reported either as a percentage or as an absolute allocated
/// amount; implementors return `None` for the side they do not know.
pub(crate) trait CostShare {
    fn cost_percentage(&self) -> Option<f64>;

    fn allocated_cost(&self) -> Option<f64> {
        None
    }
}

impl CostShare for f64 {
    fn cost_percentage(&self) -> Option<f64> {
        Some(*self)
    }
}

impl CostShare for Option<f64> {
    fn cost_percentage(&self) -> Option<f64> {
        *self
    }
}

impl<T: CostShare + ?Sized> CostShare for &T {
    fn cost_percentage(&self) -> Option<f64> {
        (**self).cost_percentage()
    }

    fn allocated_cost(&self) -> Option<f64> {
        (**self).allocated_cost()
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// `total_cost * percentage / 100`. A negative or non-finite total counts as 0.
/// The percentage is deliberately not clamped here.
pub(crate) fn percentage_to_amount(total_cost: f64, percentage: f64) -> f64 {
    let total = if total_cost.is_finite() && total_cost >= 0.0 {
        total_cost
    } else {
        0.0
    };
    if !percentage.is_finite() {
        return 0.0;
    }
    let amount = total * percentage / 100.0;
    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

/// Share of `total_cost` that `amount` represents, in percent. Zero when the
/// total is not positive.
pub(crate) fn amount_to_percentage(total_cost: f64, amount: f64) -> f64 {
    if !total_cost.is_finite() || !amount.is_finite() || total_cost <= 0.0 {
        return 0.0;
    }
    let pct = amount / total_cost * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

pub(crate) fn clamp_percentage(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, FULL_ALLOCATION)
}

/// Sum of all known percentages; missing and non-finite entries count as 0.
pub(crate) fn sum_allocated_percentage<I>(allocations: I) -> f64
where
    I: IntoIterator,
    I::Item: CostShare,
{
    allocations
        .into_iter()
        .filter_map(|a| finite(a.cost_percentage()))
        .sum()
}

/// Percentage still free on a project, never below 0.
pub(crate) fn remaining_percentage<I>(allocations: I) -> f64
where
    I: IntoIterator,
    I::Item: CostShare,
{
    clamp_percentage(FULL_ALLOCATION - sum_allocated_percentage(allocations))
}

/// Whether adding `percentage` keeps the project at or below 100%.
pub(crate) fn can_allocate<I>(allocations: I, percentage: f64) -> bool
where
    I: IntoIterator,
    I::Item: CostShare,
{
    if !percentage.is_finite() {
        return false;
    }
    sum_allocated_percentage(allocations) + percentage <= FULL_ALLOCATION + ALLOCATION_TOLERANCE
}

/// Absolute cost carried by one allocation.
///
/// Resolution order: the cost-overview value, then the allocation's own
/// `allocated_cost`, then its percentage of `total_cost`, then 0.
pub(crate) fn resolve_allocated_cost<A: CostShare>(
    allocation: &A,
    total_cost: f64,
    overview_allocated_cost: Option<f64>,
) -> f64 {
    if let Some(cost) = finite(overview_allocated_cost) {
        return cost;
    }
    if let Some(cost) = finite(allocation.allocated_cost()) {
        return cost;
    }
    match finite(allocation.cost_percentage()) {
        Some(pct) => percentage_to_amount(total_cost, pct),
        None => 0.0,
    }
}

/// Percentage carried by one allocation, derived from its amount when the
/// percentage itself is unknown.
pub(crate) fn resolve_percentage<A: CostShare>(allocation: &A, total_cost: f64) -> f64 {
    if let Some(pct) = finite(allocation.cost_percentage()) {
        return pct;
    }
    match finite(allocation.allocated_cost()) {
        Some(cost) => amount_to_percentage(total_cost, cost),
        None => 0.0,
    }
}

/// `amount` in millions with a fixed number of decimals, e.g. `"2.5"`.
/// Display only.
pub(crate) fn format_millions(amount: f64, decimals: usize) -> String {
    let millions = if amount.is_finite() {
        amount / 1_000_000.0
    } else {
        0.0
    };
    let text = format!("{millions:.decimals$}");
    // small negatives round to "-0.0"
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

pub(crate) fn from_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or_default()
}

#[cfg(test)]
mod tests;
