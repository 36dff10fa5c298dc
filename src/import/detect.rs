use super::ExpenseCsvLayout;

/// Map header names to column positions. Matching ignores case, spaces and
/// underscores, so `ProjectID`, `project_id` and `Project Id` are the same.
/// Returns `None` when the project, type or amount column cannot be found.
pub(crate) fn detect_layout(headers: &[String]) -> Option<ExpenseCsvLayout> {
    if headers.is_empty() {
        return None;
    }
    let h: Vec<String> = headers.iter().map(|s| normalize(s)).collect();

    let project_column = col_index(&h, &["projectid", "project"])?;
    let type_column = col_index(&h, &["expensetype", "type", "category"])?;
    let amount_column = col_index(&h, &["amount", "cost", "sum"])?;
    let description_column = col_index(&h, &["description", "desc", "note", "notes"]);

    Some(ExpenseCsvLayout {
        project_column,
        type_column,
        amount_column,
        description_column,
        has_header: true,
    })
}

/// Layout for a file: detected from its headers, positional otherwise.
pub(crate) fn layout_for(headers: &[String]) -> ExpenseCsvLayout {
    match detect_layout(headers) {
        Some(layout) => layout,
        None => ExpenseCsvLayout {
            has_header: !headers.is_empty(),
            ..ExpenseCsvLayout::default()
        },
    }
}

fn normalize(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn col_index(headers: &[String], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
