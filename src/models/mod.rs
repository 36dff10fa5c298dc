mod allocation;
mod customer;
mod expense;
mod overview;
mod project;

pub(crate) use allocation::{AllocationValidation, ProjectCustomer};
pub(crate) use customer::{Customer, CustomerUpdate};
pub(crate) use expense::{Expense, ExpenseUpdate};
pub(crate) use overview::{
    CustomerCostDetail, CustomerCostOverview, ProjectCostDetail, ProjectCostOverview,
    ProjectDetail,
};
pub(crate) use project::{Project, ProjectUpdate};

use rust_decimal::Decimal;

use crate::error::DomainError;

pub(crate) const MAX_NAME_LEN: usize = 255;

/// Current UTC time as stored in `created_at` / `updated_at`.
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Names and expense types are 1..=255 characters after trimming.
pub(crate) fn validate_name(field: &'static str, value: &str) -> Result<(), DomainError> {
    let len = value.trim().chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(DomainError::InvalidName { field });
    }
    Ok(())
}

/// Cost percentages must lie in (0, 100].
pub(crate) fn validate_percentage(pct: Decimal) -> Result<(), DomainError> {
    if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(DomainError::InvalidPercentage(pct));
    }
    Ok(())
}

/// Largest single expense amount accepted, in kroner.
pub(crate) const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

pub(crate) fn validate_amount(amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::InvalidAmount(amount));
    }
    let max = Decimal::from(MAX_AMOUNT);
    if amount > max {
        return Err(DomainError::AmountTooLarge { amount, max });
    }
    Ok(())
}

/// Sum of money values, failing instead of overflowing.
pub(crate) fn checked_sum<I>(values: I) -> Result<Decimal, DomainError>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v).ok_or(DomainError::AmountOverflow)
    })
}
