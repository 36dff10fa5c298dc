use rust_decimal::Decimal;

use crate::alloc::{self, CostShare};

/// A customer's share of one project.
#[derive(Debug, Clone)]
pub(crate) struct ProjectCustomer {
    pub(crate) id: Option<i64>,
    pub(crate) project_id: i64,
    pub(crate) customer_id: i64,
    /// Joined from `customers` when read back; empty on a fresh value.
    pub(crate) customer_name: String,
    pub(crate) cost_percentage: Decimal,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ProjectCustomer {
    pub(crate) fn new(project_id: i64, customer_id: i64, cost_percentage: Decimal) -> Self {
        let now = super::timestamp();
        Self {
            id: None,
            project_id,
            customer_id,
            customer_name: String::new(),
            cost_percentage,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl CostShare for ProjectCustomer {
    fn cost_percentage(&self) -> Option<f64> {
        Some(alloc::to_f64(self.cost_percentage))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AllocationDetail {
    pub(crate) customer_id: i64,
    pub(crate) cost_percentage: Decimal,
}

/// Whether a project's allocations add up to exactly 100%.
#[derive(Debug, Clone)]
pub(crate) struct AllocationValidation {
    pub(crate) project_id: i64,
    pub(crate) total_percentage: Decimal,
    /// True when the total is exactly 100, or when nothing is allocated yet.
    pub(crate) is_valid: bool,
    pub(crate) customer_count: usize,
    pub(crate) details: Vec<AllocationDetail>,
}

impl AllocationValidation {
    pub(crate) fn from_allocations(project_id: i64, allocations: &[ProjectCustomer]) -> Self {
        let total_percentage: Decimal = allocations.iter().map(|a| a.cost_percentage).sum();
        let is_valid = allocations.is_empty() || total_percentage == Decimal::ONE_HUNDRED;
        Self {
            project_id,
            total_percentage,
            is_valid,
            customer_count: allocations.len(),
            details: allocations
                .iter()
                .map(|a| AllocationDetail {
                    customer_id: a.customer_id,
                    cost_percentage: a.cost_percentage,
                })
                .collect(),
        }
    }
}
