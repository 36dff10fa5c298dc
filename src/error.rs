use rust_decimal::Decimal;
use thiserror::Error;

/// Business-rule rejections raised by the store.
///
/// These travel inside `anyhow::Error`; callers that need to react to a
/// specific rejection use `err.downcast_ref::<DomainError>()`.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum DomainError {
    #[error("Customer {0} not found")]
    CustomerNotFound(i64),

    #[error("Project {0} not found")]
    ProjectNotFound(i64),

    #[error("Expense {0} not found")]
    ExpenseNotFound(i64),

    #[error("Customer {customer_id} not found in project {project_id}")]
    AllocationNotFound { project_id: i64, customer_id: i64 },

    #[error("Customer with this name already exists: {0}")]
    DuplicateCustomerName(String),

    #[error("Customer already added to this project")]
    AlreadyLinked { project_id: i64, customer_id: i64 },

    #[error("Cost percentage must be greater than 0 and at most 100 (got {0})")]
    InvalidPercentage(Decimal),

    #[error("Allocation exceeds 100% (current: {current}%, adding: {adding}%)")]
    AllocationExceeded { current: Decimal, adding: Decimal },

    #[error("{field} must be between 1 and 255 characters")]
    InvalidName { field: &'static str },

    #[error("Amount must be greater than 0 (got {0})")]
    InvalidAmount(Decimal),

    #[error("Amount must be at most {max} (got {amount})")]
    AmountTooLarge { amount: Decimal, max: Decimal },

    #[error("Cost total is out of range")]
    AmountOverflow,
}
