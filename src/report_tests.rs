#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::{Customer, Expense, Project};
use rust_decimal_macros::dec;

fn project_with_cost(db: &Database, name: &str, cost: Decimal) -> i64 {
    let pid = db.insert_project(&Project::new(name.into(), None)).unwrap();
    db.insert_expense(&Expense::new(pid, "Labor".into(), cost, None))
        .unwrap();
    pid
}

#[test]
fn test_empty_report() {
    let db = Database::open_in_memory().unwrap();
    let report = Report::build(&db).unwrap();
    assert_eq!(report.customer_count, 3);
    assert_eq!(report.project_count, 0);
    assert_eq!(report.total_cost, Decimal::ZERO);
    assert_eq!(report.average_project_cost, Decimal::ZERO);
    assert!(report.top_customers.is_empty());
}

#[test]
fn test_report_totals_and_shares() {
    let mut db = Database::open_in_memory().unwrap();
    let big = project_with_cost(&db, "Big", dec!(3_000_000));
    let small = project_with_cost(&db, "Small", dec!(1_000_000));
    let acme = db.find_customer_by_name("Acme Corp").unwrap().unwrap().id.unwrap();
    let tech = db
        .find_customer_by_name("TechStart Inc")
        .unwrap()
        .unwrap()
        .id
        .unwrap();

    db.add_customer_to_project(big, acme, dec!(60)).unwrap();
    db.add_customer_to_project(big, tech, dec!(40)).unwrap();
    db.add_customer_to_project(small, tech, dec!(50)).unwrap();

    let report = Report::build(&db).unwrap();
    assert_eq!(report.project_count, 2);
    assert_eq!(report.expense_count, 2);
    assert_eq!(report.total_cost, dec!(4_000_000));
    assert_eq!(report.average_project_cost, dec!(2_000_000));
    assert_eq!(report.fully_allocated, 1);

    assert_eq!(report.projects[0].name, "Big");
    assert_eq!(report.projects[0].share_of_total, dec!(75));
    assert_eq!(report.projects[1].allocated_percentage, dec!(50));

    let incomplete: Vec<_> = report.incomplete_projects().map(|r| r.name.as_str()).collect();
    assert_eq!(incomplete, vec!["Small"]);

    assert_eq!(report.top_customers[0].name, "Acme Corp");
    assert_eq!(report.top_customers[0].allocated_cost, dec!(1_800_000));
    assert_eq!(report.top_customers[1].name, "TechStart Inc");
    assert_eq!(report.top_customers[1].allocated_cost, dec!(1_700_000));
    assert_eq!(report.top_customers[1].project_count, 2);
}

#[test]
fn test_top_customers_capped() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = project_with_cost(&db, "Many", dec!(1000));
    for i in 0..7 {
        let cid = db
            .insert_customer(&Customer::new(format!("C{i}"), None))
            .unwrap();
        db.add_customer_to_project(pid, cid, Decimal::from(i + 1))
            .unwrap();
    }

    let report = Report::build(&db).unwrap();
    assert_eq!(report.top_customers.len(), TOP_CUSTOMERS);
    assert_eq!(report.top_customers[0].name, "C6");
    assert_eq!(report.customers.len(), 7);
    assert_eq!(report.project(pid).unwrap().customer_count, 7);

    let last = db.find_customer_by_name("C0").unwrap().unwrap();
    assert_eq!(
        report.customer(last.id.unwrap()).unwrap().allocated_cost,
        dec!(10)
    );
}

#[test]
fn test_report_at_largest_amounts() {
    let db = Database::open_in_memory().unwrap();
    let max = Decimal::from(crate::models::MAX_AMOUNT);
    project_with_cost(&db, "North", max);
    project_with_cost(&db, "South", max);
    let report = Report::build(&db).unwrap();
    assert_eq!(report.total_cost, max * dec!(2));
    assert_eq!(report.average_project_cost, max);
    assert_eq!(report.projects[0].share_of_total, dec!(50));
}
