#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::app::*;
use crate::db::Database;
use crate::models::{Customer, Expense, Project};

fn project_with_cost(db: &Database, name: &str, cost: rust_decimal::Decimal) -> i64 {
    let id = db.insert_project(&Project::new(name.into(), None)).unwrap();
    db.insert_expense(&Expense::new(id, "Labor".into(), cost, None))
        .unwrap();
    id
}

fn customer_id(db: &Database, name: &str) -> i64 {
    db.find_customer_by_name(name).unwrap().unwrap().id.unwrap()
}

fn sharing_app(db: &Database) -> App {
    let mut app = App::new();
    app.screen = Screen::CostSharing;
    app.refresh_all(db).unwrap();
    app
}

#[test]
fn test_link_percentage_in_percent_mode() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = project_with_cost(&db, "Bybanen", dec!(1_000_000));
    db.add_customer_to_project(pid, customer_id(&db, "Acme Corp"), dec!(60))
        .unwrap();
    let app = sharing_app(&db);

    assert_eq!(app.link_percentage(30.0, None), Ok(30.0));
    assert_eq!(app.link_percentage(40.0, None), Ok(40.0));
    assert_eq!(
        app.link_percentage(50.0, None),
        Err("Allocation exceeds 100% (40.00% left)".to_string())
    );
    assert_eq!(
        app.link_percentage(0.0, None),
        Err("Share must be greater than 0".to_string())
    );
}

#[test]
fn test_link_percentage_replacing_ignores_own_share() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = project_with_cost(&db, "Bybanen", dec!(1_000_000));
    let acme = customer_id(&db, "Acme Corp");
    db.add_customer_to_project(pid, acme, dec!(60)).unwrap();
    let app = sharing_app(&db);

    assert_eq!(app.link_percentage(100.0, Some(acme)), Ok(100.0));
    // values above 100 are clamped before the check
    assert_eq!(app.link_percentage(150.0, Some(acme)), Ok(100.0));
    assert!(app.link_percentage(150.0, None).is_err());
}

#[test]
fn test_link_percentage_in_amount_mode() {
    let db = Database::open_in_memory().unwrap();
    project_with_cost(&db, "Bybanen", dec!(1_000_000));
    let mut app = sharing_app(&db);
    app.link_mode = app.link_mode.toggle();

    assert_eq!(app.link_mode, LinkMode::Amount);
    assert_eq!(app.link_percentage(250_000.0, None), Ok(25.0));
    assert_eq!(app.link_percentage(2_000_000.0, None), Ok(100.0));
}

#[test]
fn test_link_amount_needs_expenses() {
    let db = Database::open_in_memory().unwrap();
    db.insert_project(&Project::new("Empty".into(), None)).unwrap();
    let mut app = sharing_app(&db);
    app.link_mode = LinkMode::Amount;

    assert!(app
        .link_percentage(1000.0, None)
        .unwrap_err()
        .contains("no expenses"));
}

#[test]
fn test_search_filters_current_screen_only() {
    let db = Database::open_in_memory().unwrap();
    let mut app = App::new();
    app.search_input = "acme".into();

    app.refresh_all(&db).unwrap();
    assert_eq!(app.customers.len(), 3);

    app.screen = Screen::Customers;
    app.refresh_customers(&db).unwrap();
    assert_eq!(app.customers.len(), 1);
    assert_eq!(app.selected_customer().unwrap().name, "Acme Corp");
}

#[test]
fn test_search_matches_description() {
    let db = Database::open_in_memory().unwrap();
    db.insert_customer(&Customer::new(
        "Bergen Kommune".into(),
        Some("Municipality west".into()),
    ))
    .unwrap();
    let mut app = App::new();
    app.screen = Screen::Customers;
    app.search_input = "MUNICIPAL".into();
    app.refresh_customers(&db).unwrap();
    assert_eq!(app.customers.len(), 1);
}

#[test]
fn test_cycle_project_wraps() {
    let db = Database::open_in_memory().unwrap();
    project_with_cost(&db, "Alpha", dec!(100));
    project_with_cost(&db, "Beta", dec!(200));
    let mut app = sharing_app(&db);
    assert_eq!(app.project_index, 0);

    app.cycle_project(&db, -1).unwrap();
    assert_eq!(app.project_index, 1);
    assert!(app.status_message.starts_with("Project: "));

    app.cycle_project(&db, 1).unwrap();
    assert_eq!(app.project_index, 0);
}

#[test]
fn test_refresh_clamps_selection_after_delete() {
    let db = Database::open_in_memory().unwrap();
    let mut app = App::new();
    app.screen = Screen::Customers;
    app.refresh_all(&db).unwrap();
    app.customer_index = 2;

    let last = app.selected_customer().unwrap().id.unwrap();
    db.delete_customer(last).unwrap();
    app.refresh_all(&db).unwrap();
    assert_eq!(app.customer_index, 1);
}
