use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub(crate) struct Expense {
    pub(crate) id: Option<i64>,
    pub(crate) project_id: i64,
    pub(crate) expense_type: String,
    pub(crate) amount: Decimal,
    pub(crate) description: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl Expense {
    pub(crate) fn new(
        project_id: i64,
        expense_type: String,
        amount: Decimal,
        description: Option<String>,
    ) -> Self {
        let now = super::timestamp();
        Self {
            id: None,
            project_id,
            expense_type,
            amount,
            description: description.filter(|d| !d.trim().is_empty()),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Sum of the amounts in a slice of expenses, saturating at `Decimal::MAX`.
    pub(crate) fn total(expenses: &[Expense]) -> Decimal {
        expenses
            .iter()
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount))
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ExpenseUpdate {
    pub(crate) expense_type: Option<String>,
    pub(crate) amount: Option<Decimal>,
    pub(crate) description: Option<String>,
}
