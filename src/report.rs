use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::db::Database;
use crate::error::DomainError;
use crate::models::checked_sum;

pub(crate) const TOP_CUSTOMERS: usize = 5;

#[derive(Debug, Clone)]
pub(crate) struct ProjectRow {
    pub(crate) project_id: i64,
    pub(crate) name: String,
    pub(crate) total_cost: Decimal,
    pub(crate) allocated_percentage: Decimal,
    pub(crate) customer_count: usize,
    /// Share of the cost across all projects, 0..=100.
    pub(crate) share_of_total: Decimal,
}

impl ProjectRow {
    pub(crate) fn is_fully_allocated(&self) -> bool {
        self.allocated_percentage == Decimal::ONE_HUNDRED
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CustomerRow {
    pub(crate) customer_id: i64,
    pub(crate) name: String,
    pub(crate) allocated_cost: Decimal,
    pub(crate) project_count: usize,
}

/// Portfolio-wide figures shown on the dashboard and the reports screen.
#[derive(Debug, Clone, Default)]
pub(crate) struct Report {
    pub(crate) customer_count: usize,
    pub(crate) project_count: usize,
    pub(crate) expense_count: i64,
    pub(crate) total_cost: Decimal,
    pub(crate) average_project_cost: Decimal,
    pub(crate) projects: Vec<ProjectRow>,
    /// Every customer with at least one allocation, largest cost first.
    pub(crate) customers: Vec<CustomerRow>,
    pub(crate) top_customers: Vec<CustomerRow>,
    pub(crate) fully_allocated: usize,
}

impl Report {
    pub(crate) fn build(db: &Database) -> Result<Self> {
        let customers = db.get_customers()?;
        let projects = db.get_projects()?;

        let mut rows = Vec::with_capacity(projects.len());
        let mut by_customer: HashMap<i64, CustomerRow> = HashMap::new();

        for project in &projects {
            let Some(project_id) = project.id else {
                continue;
            };
            let overview = db.get_project_cost_overview(project_id)?;
            for detail in &overview.customers {
                let entry = by_customer
                    .entry(detail.customer_id)
                    .or_insert_with(|| CustomerRow {
                        customer_id: detail.customer_id,
                        name: detail.customer_name.clone(),
                        allocated_cost: Decimal::ZERO,
                        project_count: 0,
                    });
                entry.allocated_cost = entry
                    .allocated_cost
                    .checked_add(detail.allocated_cost)
                    .ok_or(DomainError::AmountOverflow)?;
                entry.project_count += 1;
            }
            rows.push(ProjectRow {
                project_id,
                name: project.name.clone(),
                total_cost: overview.total_expenses,
                allocated_percentage: overview.allocated_percentage(),
                customer_count: overview.customers.len(),
                share_of_total: Decimal::ZERO,
            });
        }

        let total_cost = checked_sum(rows.iter().map(|r| r.total_cost))?;
        if total_cost > Decimal::ZERO {
            for row in &mut rows {
                row.share_of_total =
                    (row.total_cost / total_cost * Decimal::ONE_HUNDRED).round_dp(2);
            }
        }
        rows.sort_by(|a, b| b.total_cost.cmp(&a.total_cost).then(a.name.cmp(&b.name)));

        let average_project_cost = if rows.is_empty() {
            Decimal::ZERO
        } else {
            (total_cost / Decimal::from(rows.len())).round_dp(2)
        };

        let mut customer_rows: Vec<CustomerRow> = by_customer.into_values().collect();
        customer_rows.sort_by(|a, b| {
            b.allocated_cost
                .cmp(&a.allocated_cost)
                .then(a.name.cmp(&b.name))
        });
        let top_customers = customer_rows.iter().take(TOP_CUSTOMERS).cloned().collect();

        let fully_allocated = rows.iter().filter(|r| r.is_fully_allocated()).count();

        Ok(Self {
            customer_count: customers.len(),
            project_count: rows.len(),
            expense_count: db.expense_count()?,
            total_cost,
            average_project_cost,
            projects: rows,
            customers: customer_rows,
            top_customers,
            fully_allocated,
        })
    }

    pub(crate) fn customer(&self, customer_id: i64) -> Option<&CustomerRow> {
        self.customers.iter().find(|c| c.customer_id == customer_id)
    }

    pub(crate) fn project(&self, project_id: i64) -> Option<&ProjectRow> {
        self.projects.iter().find(|p| p.project_id == project_id)
    }

    /// Projects whose allocations do not add up to 100% yet.
    pub(crate) fn incomplete_projects(&self) -> impl Iterator<Item = &ProjectRow> {
        self.projects.iter().filter(|r| !r.is_fully_allocated())
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
