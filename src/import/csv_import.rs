use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::{validate_amount, validate_name, Expense};

/// Column positions of an expense CSV.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExpenseCsvLayout {
    pub(crate) project_column: usize,
    pub(crate) type_column: usize,
    pub(crate) amount_column: usize,
    pub(crate) description_column: Option<usize>,
    pub(crate) has_header: bool,
}

impl Default for ExpenseCsvLayout {
    /// `ID, ProjectID, ExpenseType, Amount, Description`
    fn default() -> Self {
        Self {
            project_column: 1,
            type_column: 2,
            amount_column: 3,
            description_column: Some(4),
            has_header: true,
        }
    }
}

/// Result of parsing: the expenses that parsed cleanly, tagged with their
/// file row number, and one message per rejected row.
#[derive(Debug, Default)]
pub(crate) struct ParsedExpenses {
    pub(crate) expenses: Vec<(usize, Expense)>,
    pub(crate) errors: Vec<String>,
}

impl ParsedExpenses {
    pub(crate) fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    /// Read the CSV and return headers + all rows as strings for preview.
    pub(crate) fn preview(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let mut all_rows: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result.context("Failed to read CSV record")?;
            all_rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        if all_rows.is_empty() {
            anyhow::bail!("CSV file is empty");
        }

        // A header row has no numeric fields
        let first_row = &all_rows[0];
        let looks_like_header = first_row
            .iter()
            .all(|field| field.trim().is_empty() || parse_decimal(field).is_err());

        if looks_like_header {
            let headers = all_rows.remove(0);
            Ok((headers, all_rows))
        } else {
            Ok((Vec::new(), all_rows))
        }
    }

    /// Turn raw rows into expenses. Rows are numbered the way a spreadsheet
    /// shows them, so the first data row under a header is row 2.
    pub(crate) fn parse(rows: &[Vec<String>], layout: &ExpenseCsvLayout) -> ParsedExpenses {
        let first_row = if layout.has_header { 2 } else { 1 };
        let mut parsed = ParsedExpenses::default();

        for (i, row) in rows.iter().enumerate() {
            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let row_number = first_row + i;
            match parse_row(row, layout) {
                Ok(expense) => parsed.expenses.push((row_number, expense)),
                Err(e) => parsed.errors.push(format!("Row {row_number}: {e}")),
            }
        }

        parsed
    }
}

fn field<'a>(row: &'a [String], column: usize, name: &str) -> Result<&'a str> {
    row.get(column)
        .map(|s| s.trim())
        .with_context(|| format!("missing {name}"))
}

fn parse_row(row: &[String], layout: &ExpenseCsvLayout) -> Result<Expense> {
    let project_raw = field(row, layout.project_column, "ProjectID")?;
    let project_id: i64 = project_raw
        .parse()
        .with_context(|| format!("invalid ProjectID '{project_raw}'"))?;

    let expense_type = field(row, layout.type_column, "ExpenseType")?;
    validate_name("ExpenseType", expense_type)?;

    let amount_raw = field(row, layout.amount_column, "Amount")?;
    let amount = parse_decimal(amount_raw)?;
    validate_amount(amount)?;

    let description = layout
        .description_column
        .and_then(|c| row.get(c))
        .map(|s| s.trim().to_string());

    Ok(Expense::new(
        project_id,
        expense_type.to_string(),
        amount,
        description,
    ))
}

/// Lenient amount parser: strips currency markers, spaces and thousand
/// separators; `(500)` means -500. Empty input is zero.
pub(crate) fn parse_decimal(s: &str) -> Result<Decimal> {
    let mut cleaned = s.trim().to_string();
    for marker in ["NOK", "kr", "$", "€", "£"] {
        cleaned = cleaned.replace(marker, "");
    }
    let cleaned = cleaned
        .replace([',', ' ', '\u{a0}', '"'], "")
        .replace('(', "-")
        .replace(')', "");
    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned).with_context(|| format!("invalid Amount '{}'", s.trim()))
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
