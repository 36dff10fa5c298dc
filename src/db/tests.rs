#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn domain_error(err: &anyhow::Error) -> &DomainError {
    err.downcast_ref::<DomainError>().unwrap()
}

fn add_project(db: &Database, name: &str) -> i64 {
    db.insert_project(&Project::new(name.into(), None)).unwrap()
}

fn add_customer(db: &Database, name: &str) -> i64 {
    db.insert_customer(&Customer::new(name.into(), None)).unwrap()
}

fn add_expense(db: &Database, project_id: i64, amount: Decimal) -> i64 {
    db.insert_expense(&Expense::new(project_id, "Labor".into(), amount, None))
        .unwrap()
}

// ── Default data ──────────────────────────────────────────────

#[test]
fn test_default_customers_seeded() {
    let db = Database::open_in_memory().unwrap();
    let customers = db.get_customers().unwrap();
    assert_eq!(customers.len(), 3);
    assert!(customers.iter().any(|c| c.name == "Acme Corp"));
    assert!(customers.iter().any(|c| c.name == "Global Solutions"));
}

#[test]
fn test_default_customers_not_reseeded() {
    let mut db = Database::open_in_memory().unwrap();
    add_customer(&db, "Extra");
    db.seed_default_customers().unwrap();
    assert_eq!(db.customer_count().unwrap(), 4);
}

#[test]
fn test_open_file_database_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("costshare.db");
    {
        let db = Database::open(&path).unwrap();
        add_project(&db, "Persisted");
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.project_count().unwrap(), 1);
    assert_eq!(db.customer_count().unwrap(), 3);
}

// ── Customers ─────────────────────────────────────────────────

#[test]
fn test_customer_crud() {
    let db = Database::open_in_memory().unwrap();
    let id = add_customer(&db, "Bergen Kommune");

    let fetched = db.get_customer_by_id(id).unwrap().unwrap();
    assert_eq!(fetched.name, "Bergen Kommune");

    let found = db.find_customer_by_name("bergen kommune").unwrap();
    assert_eq!(found.and_then(|c| c.id), Some(id));

    let updated = db
        .update_customer(
            id,
            &CustomerUpdate {
                description: Some("Municipality".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Bergen Kommune");
    assert_eq!(updated.description.as_deref(), Some("Municipality"));

    db.delete_customer(id).unwrap();
    assert!(db.get_customer_by_id(id).unwrap().is_none());
}

#[test]
fn test_customer_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_customer_by_id(99999).unwrap().is_none());
    let err = db.delete_customer(99999).unwrap_err();
    assert_eq!(domain_error(&err), &DomainError::CustomerNotFound(99999));
}

#[test]
fn test_duplicate_customer_name_rejected() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .insert_customer(&Customer::new("Acme Corp".into(), None))
        .unwrap_err();
    assert!(matches!(
        domain_error(&err),
        DomainError::DuplicateCustomerName(_)
    ));
}

#[test]
fn test_rename_customer_onto_existing_name_rejected() {
    let db = Database::open_in_memory().unwrap();
    let id = add_customer(&db, "Vestland");
    let err = db
        .update_customer(
            id,
            &CustomerUpdate {
                name: Some("TechStart Inc".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn test_customer_name_validation() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.insert_customer(&Customer::new("  ".into(), None)).is_err());
    assert!(db
        .insert_customer(&Customer::new("x".repeat(256), None))
        .is_err());
}

// ── Projects ──────────────────────────────────────────────────

#[test]
fn test_project_crud() {
    let db = Database::open_in_memory().unwrap();
    let id = add_project(&db, "Bybanen");

    assert_eq!(db.get_project_by_id(id).unwrap().unwrap().name, "Bybanen");
    assert!(db.find_project_by_name("BYBANEN").unwrap().is_some());

    let updated = db
        .update_project(
            id,
            &ProjectUpdate {
                name: Some("Bybanen Fase 4".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Bybanen Fase 4");
    assert_eq!(db.get_projects().unwrap().len(), 1);

    db.delete_project(id).unwrap();
    assert_eq!(db.project_count().unwrap(), 0);
}

#[test]
fn test_batch_creates_placeholder_projects() {
    let mut db = Database::open_in_memory().unwrap();
    let expense = Expense::new(42, "Labor".into(), dec!(100), None);
    assert_eq!(db.insert_expenses_batch(&[expense.clone()], &[42]).unwrap(), 1);
    assert_eq!(db.insert_expenses_batch(&[expense], &[42]).unwrap(), 1);
    let project = db.get_project_by_id(42).unwrap().unwrap();
    assert_eq!(project.name, "Project 42");
    assert_eq!(db.project_count().unwrap(), 1);
    assert_eq!(db.get_project_total(42).unwrap(), dec!(200));
}

#[test]
fn test_failed_batch_leaves_no_placeholder_projects() {
    let mut db = Database::open_in_memory().unwrap();
    let good = Expense::new(42, "Labor".into(), dec!(100), None);
    let bad = Expense::new(42, "Labor".into(), Decimal::ZERO, None);
    let err = db.insert_expenses_batch(&[good, bad], &[42]).unwrap_err();
    assert!(matches!(domain_error(&err), DomainError::InvalidAmount(_)));
    assert!(db.get_project_by_id(42).unwrap().is_none());
    assert_eq!(db.expense_count().unwrap(), 0);
}

#[test]
fn test_delete_project_cascades() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Doomed");
    let cid = add_customer(&db, "Payer");
    let eid = add_expense(&db, pid, dec!(1000));
    db.add_customer_to_project(pid, cid, dec!(50)).unwrap();

    db.delete_project(pid).unwrap();

    assert!(db.get_expense_by_id(eid).unwrap().is_none());
    assert!(db.get_project_customer(pid, cid).unwrap().is_none());
    assert!(db.get_customer_by_id(cid).unwrap().is_some());
}

#[test]
fn test_delete_customer_cascades_allocations() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Shared");
    let cid = add_customer(&db, "Leaving");
    db.add_customer_to_project(pid, cid, dec!(30)).unwrap();

    db.delete_customer(cid).unwrap();
    assert!(db.get_project_customers(pid).unwrap().is_empty());
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_expense_crud() {
    let db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Tunnel");
    let id = add_expense(&db, pid, dec!(1234.567));

    let fetched = db.get_expense_by_id(id).unwrap().unwrap();
    assert_eq!(fetched.amount, dec!(1234.57));
    assert_eq!(fetched.expense_type, "Labor");

    let updated = db
        .update_expense(
            id,
            &ExpenseUpdate {
                amount: Some(dec!(2000)),
                description: Some("Overtime".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.amount, dec!(2000));
    assert_eq!(
        db.get_expense_by_id(id).unwrap().unwrap().description.as_deref(),
        Some("Overtime")
    );

    db.delete_expense(id).unwrap();
    assert_eq!(db.expense_count().unwrap(), 0);
}

#[test]
fn test_expense_requires_project() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .insert_expense(&Expense::new(777, "Labor".into(), dec!(10), None))
        .unwrap_err();
    assert_eq!(domain_error(&err), &DomainError::ProjectNotFound(777));
}

#[test]
fn test_expense_amount_must_be_positive() {
    let db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Zero");
    let err = db
        .insert_expense(&Expense::new(pid, "Labor".into(), Decimal::ZERO, None))
        .unwrap_err();
    assert!(matches!(domain_error(&err), DomainError::InvalidAmount(_)));
}

#[test]
fn test_expense_amount_upper_bound() {
    let db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Huge");
    let huge = dec!(50000000000000000000000000000);
    let err = db
        .insert_expense(&Expense::new(pid, "Labor".into(), huge, None))
        .unwrap_err();
    assert!(matches!(
        domain_error(&err),
        DomainError::AmountTooLarge { .. }
    ));
    assert_eq!(db.expense_count().unwrap(), 0);

    let id = add_expense(&db, pid, dec!(100));
    let err = db
        .update_expense(
            id,
            &ExpenseUpdate {
                amount: Some(huge),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        domain_error(&err),
        DomainError::AmountTooLarge { .. }
    ));
}

/// Rows written before the amount bound existed must not crash the totals.
fn insert_raw_amount(db: &Database, project_id: i64, amount: &str) {
    db.conn
        .execute(
            "INSERT INTO expenses (project_id, expense_type, amount, created_at, updated_at)
             VALUES (?1, 'Labor', ?2, '', '')",
            params![project_id, amount],
        )
        .unwrap();
}

#[test]
fn test_overflowing_totals_are_errors() {
    let mut db = Database::open_in_memory().unwrap();
    let summed = add_project(&db, "Summed");
    insert_raw_amount(&db, summed, "50000000000000000000000000000");
    insert_raw_amount(&db, summed, "50000000000000000000000000000");
    let err = db.get_project_total(summed).unwrap_err();
    assert_eq!(domain_error(&err), &DomainError::AmountOverflow);

    let shared = add_project(&db, "Shared");
    let a = add_customer(&db, "A");
    insert_raw_amount(&db, shared, "50000000000000000000000000000");
    db.add_customer_to_project(shared, a, dec!(50)).unwrap();
    let err = db.get_project_cost_overview(shared).unwrap_err();
    assert_eq!(domain_error(&err), &DomainError::AmountOverflow);
    let err = db.get_customer_cost_overview(a).unwrap_err();
    assert_eq!(domain_error(&err), &DomainError::AmountOverflow);
}

#[test]
fn test_expense_batch_is_all_or_nothing() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Batch");
    let good = Expense::new(pid, "Labor".into(), dec!(100), None);
    let bad = Expense::new(pid + 100, "Labor".into(), dec!(100), None);

    assert!(db.insert_expenses_batch(&[good.clone(), bad], &[]).is_err());
    assert_eq!(db.expense_count().unwrap(), 0);

    assert_eq!(db.insert_expenses_batch(&[good.clone(), good], &[]).unwrap(), 2);
    assert_eq!(db.get_project_total(pid).unwrap(), dec!(200));
}

#[test]
fn test_expense_pagination() {
    let db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Paged");
    for i in 1..=5 {
        add_expense(&db, pid, Decimal::from(i * 10));
    }
    let page = db.get_expenses(2, 2).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].amount, dec!(30));
    assert_eq!(db.get_project_expenses(pid).unwrap().len(), 5);
}

// ── Allocations ───────────────────────────────────────────────

#[test]
fn test_allocation_sixty_forty_is_valid() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Split");
    let a = add_customer(&db, "A");
    let b = add_customer(&db, "B");

    db.add_customer_to_project(pid, a, dec!(60)).unwrap();
    db.add_customer_to_project(pid, b, dec!(40)).unwrap();

    let v = db.validate_project_allocation(pid).unwrap();
    assert_eq!(v.total_percentage, dec!(100));
    assert!(v.is_valid);
    assert_eq!(v.customer_count, 2);
}

#[test]
fn test_allocation_over_hundred_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Over");
    let a = add_customer(&db, "A");
    let b = add_customer(&db, "B");

    db.add_customer_to_project(pid, a, dec!(80)).unwrap();
    let err = db.add_customer_to_project(pid, b, dec!(30)).unwrap_err();
    assert!(err.to_string().contains("exceeds 100%"));
    assert_eq!(
        domain_error(&err),
        &DomainError::AllocationExceeded {
            current: dec!(80),
            adding: dec!(30)
        }
    );
    assert_eq!(db.get_project_customers(pid).unwrap().len(), 1);
}

#[test]
fn test_allocation_update_respects_other_shares() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Rebalance");
    let a = add_customer(&db, "A");
    let b = add_customer(&db, "B");

    db.add_customer_to_project(pid, a, dec!(50)).unwrap();
    db.add_customer_to_project(pid, b, dec!(50)).unwrap();
    let err = db.update_project_customer(pid, a, dec!(60)).unwrap_err();
    assert!(err.to_string().contains("exceeds 100%"));

    db.update_project_customer(pid, b, dec!(20)).unwrap();
    db.update_project_customer(pid, a, dec!(60)).unwrap();
    let updated = db.update_project_customer(pid, b, dec!(40)).unwrap();
    assert_eq!(updated.cost_percentage, dec!(40));
    assert!(db.validate_project_allocation(pid).unwrap().is_valid);
}

#[test]
fn test_single_partial_allocation_incomplete() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Partial");
    let a = add_customer(&db, "A");
    db.add_customer_to_project(pid, a, dec!(75)).unwrap();

    let v = db.validate_project_allocation(pid).unwrap();
    assert_eq!(v.total_percentage, dec!(75));
    assert!(!v.is_valid);
    assert_eq!(v.customer_count, 1);
}

#[test]
fn test_empty_project_validates() {
    let db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Empty");
    let v = db.validate_project_allocation(pid).unwrap();
    assert!(v.is_valid);
    assert_eq!(v.customer_count, 0);
}

#[test]
fn test_duplicate_link_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Twice");
    let a = add_customer(&db, "A");
    db.add_customer_to_project(pid, a, dec!(10)).unwrap();

    let err = db.add_customer_to_project(pid, a, dec!(10)).unwrap_err();
    assert_eq!(err.to_string(), "Customer already added to this project");
}

#[test]
fn test_link_rejects_bad_percentage_and_missing_parents() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Bounds");
    let a = add_customer(&db, "A");

    let err = db.add_customer_to_project(pid, a, Decimal::ZERO).unwrap_err();
    assert!(matches!(domain_error(&err), DomainError::InvalidPercentage(_)));
    assert!(db.add_customer_to_project(pid, a, dec!(100.5)).is_err());
    let err = db.add_customer_to_project(pid, a, dec!(0.001)).unwrap_err();
    assert_eq!(
        domain_error(&err),
        &DomainError::InvalidPercentage(dec!(0.00))
    );

    let err = db.add_customer_to_project(pid, 9999, dec!(10)).unwrap_err();
    assert_eq!(domain_error(&err), &DomainError::CustomerNotFound(9999));
    let err = db.add_customer_to_project(9999, a, dec!(10)).unwrap_err();
    assert_eq!(domain_error(&err), &DomainError::ProjectNotFound(9999));
}

#[test]
fn test_update_rejects_share_that_rounds_to_zero() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Rounding");
    let a = add_customer(&db, "A");
    db.add_customer_to_project(pid, a, dec!(10)).unwrap();

    let err = db.update_project_customer(pid, a, dec!(0.004)).unwrap_err();
    assert!(matches!(domain_error(&err), DomainError::InvalidPercentage(_)));
    assert_eq!(
        db.get_project_customer(pid, a).unwrap().unwrap().cost_percentage,
        dec!(10)
    );
}

#[test]
fn test_unlink() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Unlink");
    let a = add_customer(&db, "A");
    db.add_customer_to_project(pid, a, dec!(100)).unwrap();

    db.remove_customer_from_project(pid, a).unwrap();
    assert!(db.get_project_customer(pid, a).unwrap().is_none());
    let err = db.remove_customer_from_project(pid, a).unwrap_err();
    assert!(matches!(
        domain_error(&err),
        DomainError::AllocationNotFound { .. }
    ));
}

#[test]
fn test_trigger_blocks_direct_overallocation() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Trigger");
    let a = add_customer(&db, "A");
    let b = add_customer(&db, "B");
    db.add_customer_to_project(pid, a, dec!(90)).unwrap();

    let now = timestamp();
    let result = db.conn.execute(
        "INSERT INTO project_customers (project_id, customer_id, cost_percentage, created_at, updated_at)
         VALUES (?1, ?2, '20', ?3, ?3)",
        params![pid, b, now],
    );
    assert!(result.is_err());
}

// ── Cost overviews ────────────────────────────────────────────

#[test]
fn test_project_cost_overview() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Overview");
    let a = add_customer(&db, "A");
    let b = add_customer(&db, "B");
    add_expense(&db, pid, dec!(3_000_000));
    add_expense(&db, pid, dec!(2_000_000));
    db.add_customer_to_project(pid, a, dec!(50)).unwrap();
    db.add_customer_to_project(pid, b, dec!(30)).unwrap();

    let overview = db.get_project_cost_overview(pid).unwrap();
    assert_eq!(overview.project_name, "Overview");
    assert_eq!(overview.total_expenses, dec!(5_000_000));
    assert_eq!(overview.allocated_cost_for(a), Some(dec!(2_500_000)));
    assert_eq!(overview.allocated_cost_for(b), Some(dec!(1_500_000)));
    assert_eq!(overview.unallocated_cost(), dec!(1_000_000));
}

#[test]
fn test_customer_cost_overview_across_projects() {
    let mut db = Database::open_in_memory().unwrap();
    let p1 = add_project(&db, "One");
    let p2 = add_project(&db, "Two");
    let c = add_customer(&db, "Shared Payer");
    add_expense(&db, p1, dec!(1000));
    add_expense(&db, p2, dec!(400));
    db.add_customer_to_project(p1, c, dec!(25)).unwrap();
    db.add_customer_to_project(p2, c, dec!(50)).unwrap();

    let overview = db.get_customer_cost_overview(c).unwrap();
    assert_eq!(overview.projects.len(), 2);
    assert_eq!(overview.projects[0].project_name, "One");
    assert_eq!(overview.projects[0].allocated_cost, dec!(250));
    assert_eq!(overview.projects[1].allocated_cost, dec!(200));
    assert_eq!(overview.total_cost, dec!(450));
}

#[test]
fn test_project_detail_bundles_everything() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Full");
    let a = add_customer(&db, "A");
    add_expense(&db, pid, dec!(800));
    db.add_customer_to_project(pid, a, dec!(100)).unwrap();

    let detail = db.get_project_detail(pid).unwrap();
    assert_eq!(detail.project.name, "Full");
    assert_eq!(detail.expenses.len(), 1);
    assert_eq!(detail.allocations[0].customer_name, "A");
    assert_eq!(detail.overview.allocated_cost_for(a), Some(dec!(800)));
}

#[test]
fn test_overview_for_missing_project() {
    let db = Database::open_in_memory().unwrap();
    let err = db.get_project_cost_overview(5).unwrap_err();
    assert_eq!(domain_error(&err), &DomainError::ProjectNotFound(5));
}

// ── Reset / export ────────────────────────────────────────────

#[test]
fn test_reset_restores_defaults() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Gone");
    add_customer(&db, "Gone Too");
    add_expense(&db, pid, dec!(5));

    db.reset().unwrap();

    assert_eq!(db.project_count().unwrap(), 0);
    assert_eq!(db.expense_count().unwrap(), 0);
    let customers = db.get_customers().unwrap();
    assert_eq!(customers.len(), 3);
    assert!(customers.iter().all(|c| c.id.unwrap() <= 3));
}

#[test]
fn test_export_expenses_to_csv() {
    let db = Database::open_in_memory().unwrap();
    let pid = add_project(&db, "Export");
    db.insert_expense(&Expense::new(
        pid,
        "Materials".into(),
        dec!(99.50),
        Some("Steel, rebar".into()),
    ))
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    assert_eq!(db.export_expenses_to_csv(&path).unwrap(), 1);

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("ID,ProjectID,ExpenseType,Amount,Description"));
    assert_eq!(
        lines.next(),
        Some(format!("1,{pid},Materials,99.50,\"Steel, rebar\"").as_str())
    );
}
