mod csv_import;
mod detect;

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

use crate::db::Database;

pub(crate) use csv_import::{parse_decimal, CsvImporter, ExpenseCsvLayout};
use detect::layout_for;

/// Header written by the exporter and expected by the importer.
pub(crate) const EXPORT_HEADERS: [&str; 5] =
    ["ID", "ProjectID", "ExpenseType", "Amount", "Description"];

#[derive(Debug, PartialEq)]
pub(crate) enum ImportOutcome {
    /// Every row was written.
    Imported {
        count: usize,
        projects_created: usize,
    },
    /// Some rows failed; nothing was written.
    Partial { parsed: usize, errors: Vec<String> },
}

/// Import expenses from a CSV file.
///
/// All-or-nothing: a single bad row (or a row pointing at an unknown project
/// when `create_missing_projects` is off) leaves the database untouched and
/// reports every problem found.
pub(crate) fn import_expenses(
    db: &mut Database,
    path: &Path,
    create_missing_projects: bool,
) -> Result<ImportOutcome> {
    let (headers, rows) = CsvImporter::preview(path)?;
    let layout = layout_for(&headers);
    let mut parsed = CsvImporter::parse(&rows, &layout);

    let project_ids: BTreeSet<i64> = parsed.expenses.iter().map(|(_, e)| e.project_id).collect();
    let mut missing = BTreeSet::new();
    for &id in &project_ids {
        if db.get_project_by_id(id)?.is_none() {
            missing.insert(id);
        }
    }

    if !create_missing_projects && !missing.is_empty() {
        for (row, expense) in &parsed.expenses {
            if missing.contains(&expense.project_id) {
                parsed
                    .errors
                    .push(format!("Row {row}: Project {} not found", expense.project_id));
            }
        }
        parsed.errors.sort_by_key(|e| row_number(e));
    }

    if !parsed.is_clean() {
        tracing::warn!(
            path = %path.display(),
            errors = parsed.errors.len(),
            "csv import rejected"
        );
        return Ok(ImportOutcome::Partial {
            parsed: parsed.expenses.len(),
            errors: parsed.errors,
        });
    }

    let placeholders: Vec<i64> = if create_missing_projects {
        missing.into_iter().collect()
    } else {
        Vec::new()
    };
    let expenses: Vec<_> = parsed.expenses.into_iter().map(|(_, e)| e).collect();
    let count = db.insert_expenses_batch(&expenses, &placeholders)?;
    let projects_created = placeholders.len();
    tracing::info!(path = %path.display(), count, projects_created, "csv import finished");
    Ok(ImportOutcome::Imported {
        count,
        projects_created,
    })
}

fn row_number(error: &str) -> usize {
    error
        .strip_prefix("Row ")
        .and_then(|rest| rest.split(':').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}
