#![allow(clippy::unwrap_used)]

use super::*;

fn h(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ── Header detection ──────────────────────────────────────────

#[test]
fn test_detect_standard_headers() {
    let layout =
        detect_layout(&h(&["ID", "ProjectID", "ExpenseType", "Amount", "Description"])).unwrap();
    assert_eq!(layout, ExpenseCsvLayout::default());
}

#[test]
fn test_detect_reordered_headers() {
    let layout = detect_layout(&h(&["Amount", "Description", "expense_type", "Project Id"])).unwrap();
    assert_eq!(layout.amount_column, 0);
    assert_eq!(layout.description_column, Some(1));
    assert_eq!(layout.type_column, 2);
    assert_eq!(layout.project_column, 3);
}

#[test]
fn test_detect_without_description() {
    let layout = detect_layout(&h(&["project", "type", "cost"])).unwrap();
    assert_eq!(layout.description_column, None);
    assert_eq!(layout.amount_column, 2);
}

#[test]
fn test_detect_strips_bom() {
    let layout = detect_layout(&h(&["\u{feff}ProjectID", "ExpenseType", "Amount"])).unwrap();
    assert_eq!(layout.project_column, 0);
}

#[test]
fn test_detect_unknown_headers() {
    assert!(detect_layout(&h(&["Date", "Payee", "Memo"])).is_none());
    assert!(detect_layout(&[]).is_none());
}

// ── Fallback layout ───────────────────────────────────────────

#[test]
fn test_layout_for_headerless_file() {
    let layout = layout_for(&[]);
    assert!(!layout.has_header);
    assert_eq!(layout.project_column, 1);
}

#[test]
fn test_layout_for_unrecognized_header_is_positional() {
    let layout = layout_for(&h(&["a", "b", "c", "d", "e"]));
    assert!(layout.has_header);
    assert_eq!(layout.amount_column, 3);
}
