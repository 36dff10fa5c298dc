use rust_decimal::Decimal;

use super::{Expense, Project, ProjectCustomer};
use crate::alloc::{self, CostShare};

#[derive(Debug, Clone)]
pub(crate) struct ProjectCostDetail {
    pub(crate) customer_id: i64,
    pub(crate) customer_name: String,
    pub(crate) cost_percentage: Decimal,
    pub(crate) allocated_cost: Decimal,
}

impl CostShare for ProjectCostDetail {
    fn cost_percentage(&self) -> Option<f64> {
        Some(alloc::to_f64(self.cost_percentage))
    }

    fn allocated_cost(&self) -> Option<f64> {
        Some(alloc::to_f64(self.allocated_cost))
    }
}

/// Cost breakdown by customer for one project.
#[derive(Debug, Clone)]
pub(crate) struct ProjectCostOverview {
    pub(crate) project_id: i64,
    pub(crate) project_name: String,
    pub(crate) total_expenses: Decimal,
    pub(crate) customers: Vec<ProjectCostDetail>,
}

impl ProjectCostOverview {
    pub(crate) fn allocated_cost_for(&self, customer_id: i64) -> Option<Decimal> {
        self.customers
            .iter()
            .find(|c| c.customer_id == customer_id)
            .map(|c| c.allocated_cost)
    }

    pub(crate) fn allocated_percentage(&self) -> Decimal {
        self.customers
            .iter()
            .fold(Decimal::ZERO, |acc, c| acc.saturating_add(c.cost_percentage))
    }

    /// Part of the project cost no customer carries.
    pub(crate) fn unallocated_cost(&self) -> Decimal {
        let allocated = self
            .customers
            .iter()
            .fold(Decimal::ZERO, |acc, c| acc.saturating_add(c.allocated_cost));
        self.total_expenses
            .saturating_sub(allocated)
            .max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CustomerCostDetail {
    pub(crate) project_id: i64,
    pub(crate) project_name: String,
    pub(crate) cost_percentage: Decimal,
    pub(crate) total_expenses: Decimal,
    pub(crate) allocated_cost: Decimal,
}

/// Everything one customer pays for, across projects.
#[derive(Debug, Clone)]
pub(crate) struct CustomerCostOverview {
    pub(crate) customer_id: i64,
    pub(crate) customer_name: String,
    pub(crate) total_cost: Decimal,
    pub(crate) projects: Vec<CustomerCostDetail>,
}

/// A project together with its expenses, allocations and cost overview.
#[derive(Debug, Clone)]
pub(crate) struct ProjectDetail {
    pub(crate) project: Project,
    pub(crate) expenses: Vec<Expense>,
    pub(crate) allocations: Vec<ProjectCustomer>,
    pub(crate) overview: ProjectCostOverview,
}
