mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::error::DomainError;
use crate::models::*;

pub(crate) struct Database {
    conn: Connection,
}

const CUSTOMER_COLUMNS: &str = "id, name, description, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, name, description, created_at, updated_at";
const EXPENSE_COLUMNS: &str =
    "id, project_id, expense_type, amount, description, created_at, updated_at";
const ALLOCATION_SELECT: &str =
    "SELECT pc.id, pc.project_id, pc.customer_id, c.name, pc.cost_percentage, pc.created_at, pc.updated_at
     FROM project_customers pc JOIN customers c ON c.id = pc.customer_id";

fn decimal(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap_or_default()
}

fn customer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    let amount: String = row.get(3)?;
    Ok(Expense {
        id: Some(row.get(0)?),
        project_id: row.get(1)?,
        expense_type: row.get(2)?,
        amount: decimal(&amount),
        description: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn allocation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectCustomer> {
    let pct: String = row.get(4)?;
    Ok(ProjectCustomer {
        id: Some(row.get(0)?),
        project_id: row.get(1)?,
        customer_id: row.get(2)?,
        customer_name: row.get(3)?,
        cost_percentage: decimal(&pct),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// Free functions so they work on both the connection and an open transaction.

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
    Ok(conn.query_row(sql, params![id], |row| row.get(0))?)
}

fn project_exists(conn: &Connection, id: i64) -> Result<bool> {
    exists(conn, "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)", id)
}

fn customer_exists(conn: &Connection, id: i64) -> Result<bool> {
    exists(conn, "SELECT EXISTS(SELECT 1 FROM customers WHERE id = ?1)", id)
}

fn sum_text_column(conn: &Connection, sql: &str, id: i64) -> Result<Decimal> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
    let mut total = Decimal::ZERO;
    for value in rows {
        total = total
            .checked_add(decimal(&value?))
            .ok_or(DomainError::AmountOverflow)?;
    }
    Ok(total)
}

fn project_total(conn: &Connection, project_id: i64) -> Result<Decimal> {
    sum_text_column(
        conn,
        "SELECT amount FROM expenses WHERE project_id = ?1",
        project_id,
    )
}

fn allocated_total(conn: &Connection, project_id: i64) -> Result<Decimal> {
    sum_text_column(
        conn,
        "SELECT cost_percentage FROM project_customers WHERE project_id = ?1",
        project_id,
    )
}

fn share_of(total: Decimal, pct: Decimal) -> Result<Decimal, DomainError> {
    total
        .checked_mul(pct)
        .map(|v| (v / Decimal::ONE_HUNDRED).round_dp(2))
        .ok_or(DomainError::AmountOverflow)
}

fn insert_expense_row(conn: &Connection, expense: &Expense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (project_id, expense_type, amount, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            expense.project_id,
            expense.expense_type.trim(),
            expense.amount.round_dp(2).to_string(),
            expense.description,
            expense.created_at,
            expense.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn check_expense(conn: &Connection, expense: &Expense) -> Result<()> {
    if !project_exists(conn, expense.project_id)? {
        return Err(DomainError::ProjectNotFound(expense.project_id).into());
    }
    validate_name("Expense type", &expense.expense_type)?;
    validate_amount(expense.amount)?;
    Ok(())
}

/// Create a placeholder project with a fixed id, named "Project {id}".
fn ensure_project_row(conn: &Connection, id: i64) -> Result<bool> {
    if project_exists(conn, id)? {
        return Ok(false);
    }
    let project = Project::new(format!("Project {id}"), None);
    conn.execute(
        "INSERT INTO projects (id, name, description, created_at, updated_at)
         VALUES (?1, ?2, NULL, ?3, ?4)",
        params![id, project.name, project.created_at, project.updated_at],
    )?;
    tracing::info!(id, "placeholder project created");
    Ok(true)
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_customers()?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_customers()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                tracing::info!(from_version, "applying migration");
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_customers(&mut self) -> Result<()> {
        let count = self.customer_count()?;
        if count > 0 {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for (name, description) in schema::DEFAULT_CUSTOMERS {
            let customer = Customer::new((*name).into(), Some((*description).into()));
            tx.execute(
                "INSERT OR IGNORE INTO customers (name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    customer.name,
                    customer.description,
                    customer.created_at,
                    customer.updated_at
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(count = schema::DEFAULT_CUSTOMERS.len(), "seeded default customers");
        Ok(())
    }

    /// Remove every row and reseed the default customers. Ids restart at 1.
    pub(crate) fn reset(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM project_customers;
             DELETE FROM expenses;
             DELETE FROM projects;
             DELETE FROM customers;
             DELETE FROM sqlite_sequence
               WHERE name IN ('project_customers', 'expenses', 'projects', 'customers');",
        )?;
        tx.commit()?;
        tracing::warn!("database reset");
        self.seed_default_customers()
    }

    // ── Customers ─────────────────────────────────────────────

    pub(crate) fn insert_customer(&self, customer: &Customer) -> Result<i64> {
        validate_name("Name", &customer.name)?;
        let name = customer.name.trim();
        let taken: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE name = ?1)",
            params![name],
            |row| row.get(0),
        )?;
        if taken {
            tracing::warn!(name, "duplicate customer name rejected");
            return Err(DomainError::DuplicateCustomerName(name.into()).into());
        }
        self.conn.execute(
            "INSERT INTO customers (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                customer.description,
                customer.created_at,
                customer.updated_at
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, name, "customer created");
        Ok(id)
    }

    pub(crate) fn get_customers(&self) -> Result<Vec<Customer>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name COLLATE NOCASE"
        ))?;
        let rows = stmt.query_map([], customer_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_customer_by_id(&self, id: i64) -> Result<Option<Customer>> {
        let result = self.conn.query_row(
            &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
            params![id],
            customer_from_row,
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>> {
        let result = self.conn.query_row(
            &format!(
                "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE name = ?1 COLLATE NOCASE LIMIT 1"
            ),
            params![name.trim()],
            customer_from_row,
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn update_customer(&self, id: i64, update: &CustomerUpdate) -> Result<Customer> {
        let mut customer = self
            .get_customer_by_id(id)?
            .ok_or(DomainError::CustomerNotFound(id))?;

        if let Some(name) = &update.name {
            validate_name("Name", name)?;
            let name = name.trim();
            let taken: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE name = ?1 AND id != ?2)",
                params![name, id],
                |row| row.get(0),
            )?;
            if taken {
                return Err(DomainError::DuplicateCustomerName(name.into()).into());
            }
            customer.name = name.into();
        }
        if let Some(description) = &update.description {
            customer.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
        }
        customer.updated_at = timestamp();

        self.conn.execute(
            "UPDATE customers SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![customer.name, customer.description, customer.updated_at, id],
        )?;
        tracing::info!(id, "customer updated");
        Ok(customer)
    }

    /// Deleting a customer also drops every allocation it had.
    pub(crate) fn delete_customer(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM customers WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(DomainError::CustomerNotFound(id).into());
        }
        tracing::info!(id, "customer deleted");
        Ok(())
    }

    pub(crate) fn customer_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?)
    }

    // ── Projects ──────────────────────────────────────────────

    pub(crate) fn insert_project(&self, project: &Project) -> Result<i64> {
        validate_name("Name", &project.name)?;
        self.conn.execute(
            "INSERT INTO projects (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                project.name.trim(),
                project.description,
                project.created_at,
                project.updated_at
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, name = project.name.trim(), "project created");
        Ok(id)
    }


    pub(crate) fn get_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name COLLATE NOCASE, id"
        ))?;
        let rows = stmt.query_map([], project_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_project_by_id(&self, id: i64) -> Result<Option<Project>> {
        let result = self.conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            project_from_row,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let result = self.conn.query_row(
            &format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1 COLLATE NOCASE
                 ORDER BY id LIMIT 1"
            ),
            params![name.trim()],
            project_from_row,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<Project> {
        let mut project = self
            .get_project_by_id(id)?
            .ok_or(DomainError::ProjectNotFound(id))?;

        if let Some(name) = &update.name {
            validate_name("Name", name)?;
            project.name = name.trim().into();
        }
        if let Some(description) = &update.description {
            project.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
        }
        project.updated_at = timestamp();

        self.conn.execute(
            "UPDATE projects SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![project.name, project.description, project.updated_at, id],
        )?;
        tracing::info!(id, "project updated");
        Ok(project)
    }

    /// Deleting a project also drops its expenses and allocations.
    pub(crate) fn delete_project(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(DomainError::ProjectNotFound(id).into());
        }
        tracing::info!(id, "project deleted");
        Ok(())
    }

    pub(crate) fn project_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?)
    }

    /// Sum of all expense amounts on a project.
    pub(crate) fn get_project_total(&self, project_id: i64) -> Result<Decimal> {
        project_total(&self.conn, project_id)
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        check_expense(&self.conn, expense)?;
        let id = insert_expense_row(&self.conn, expense)?;
        tracing::info!(
            id,
            project_id = expense.project_id,
            amount = %expense.amount,
            "expense created"
        );
        Ok(id)
    }

    /// Insert all expenses or none of them.
    /// Insert expenses all-or-nothing. Placeholder projects for
    /// `missing_projects` are created in the same transaction.
    pub(crate) fn insert_expenses_batch(
        &mut self,
        expenses: &[Expense],
        missing_projects: &[i64],
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for &id in missing_projects {
            ensure_project_row(&tx, id)?;
        }
        for expense in expenses {
            check_expense(&tx, expense)?;
            insert_expense_row(&tx, expense)?;
        }
        tx.commit()?;
        tracing::info!(count = expenses.len(), "expense batch inserted");
        Ok(expenses.len())
    }

    pub(crate) fn get_expenses(&self, limit: i64, offset: i64) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY id LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit, offset], expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_expense_by_id(&self, id: i64) -> Result<Option<Expense>> {
        let result = self.conn.query_row(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"),
            params![id],
            expense_from_row,
        );
        match result {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn get_project_expenses(&self, project_id: i64) -> Result<Vec<Expense>> {
        if !project_exists(&self.conn, project_id)? {
            return Err(DomainError::ProjectNotFound(project_id).into());
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE project_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![project_id], expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn update_expense(&self, id: i64, update: &ExpenseUpdate) -> Result<Expense> {
        let mut expense = self
            .get_expense_by_id(id)?
            .ok_or(DomainError::ExpenseNotFound(id))?;

        if let Some(expense_type) = &update.expense_type {
            validate_name("Expense type", expense_type)?;
            expense.expense_type = expense_type.trim().into();
        }
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
            expense.amount = amount.round_dp(2);
        }
        if let Some(description) = &update.description {
            expense.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
        }
        expense.updated_at = timestamp();

        self.conn.execute(
            "UPDATE expenses SET expense_type = ?1, amount = ?2, description = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                expense.expense_type,
                expense.amount.to_string(),
                expense.description,
                expense.updated_at,
                id
            ],
        )?;
        tracing::info!(id, "expense updated");
        Ok(expense)
    }

    pub(crate) fn delete_expense(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(DomainError::ExpenseNotFound(id).into());
        }
        tracing::info!(id, "expense deleted");
        Ok(())
    }

    pub(crate) fn expense_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?)
    }

    /// Write every expense as `ID,ProjectID,ExpenseType,Amount,Description`.
    /// Returns the number of rows written.
    pub(crate) fn export_expenses_to_csv(&self, path: &Path) -> Result<usize> {
        let expenses = self.get_expenses(i64::MAX, 0)?;
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(crate::import::EXPORT_HEADERS)?;
        for expense in &expenses {
            writer.write_record([
                expense.id.unwrap_or_default().to_string(),
                expense.project_id.to_string(),
                expense.expense_type.clone(),
                expense.amount.to_string(),
                expense.description.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        tracing::info!(count = expenses.len(), path = %path.display(), "expenses exported");
        Ok(expenses.len())
    }

    // ── Allocations ───────────────────────────────────────────

    /// Link a customer to a project with a cost share.
    ///
    /// The existence checks, the running-total check and the insert happen in
    /// one immediate transaction, so two writers cannot both pass the check.
    pub(crate) fn add_customer_to_project(
        &mut self,
        project_id: i64,
        customer_id: i64,
        cost_percentage: Decimal,
    ) -> Result<ProjectCustomer> {
        let pct = cost_percentage.round_dp(2);
        validate_percentage(pct)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !project_exists(&tx, project_id)? {
            return Err(DomainError::ProjectNotFound(project_id).into());
        }
        if !customer_exists(&tx, customer_id)? {
            return Err(DomainError::CustomerNotFound(customer_id).into());
        }
        let linked: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM project_customers WHERE project_id = ?1 AND customer_id = ?2)",
            params![project_id, customer_id],
            |row| row.get(0),
        )?;
        if linked {
            return Err(DomainError::AlreadyLinked {
                project_id,
                customer_id,
            }
            .into());
        }

        let current = allocated_total(&tx, project_id)?;
        if current + pct > Decimal::ONE_HUNDRED {
            tracing::warn!(project_id, customer_id, %current, adding = %pct, "allocation rejected");
            return Err(DomainError::AllocationExceeded {
                current,
                adding: pct,
            }
            .into());
        }

        let link = ProjectCustomer::new(project_id, customer_id, pct);
        tx.execute(
            "INSERT INTO project_customers (project_id, customer_id, cost_percentage, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project_id,
                customer_id,
                pct.to_string(),
                link.created_at,
                link.updated_at
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::info!(project_id, customer_id, pct = %pct, "customer linked to project");

        self.get_project_customer(project_id, customer_id)?
            .with_context(|| format!("Allocation {id} vanished after insert"))
    }

    pub(crate) fn get_project_customers(&self, project_id: i64) -> Result<Vec<ProjectCustomer>> {
        if !project_exists(&self.conn, project_id)? {
            return Err(DomainError::ProjectNotFound(project_id).into());
        }
        let mut stmt = self.conn.prepare(&format!(
            "{ALLOCATION_SELECT} WHERE pc.project_id = ?1 ORDER BY c.name COLLATE NOCASE"
        ))?;
        let rows = stmt.query_map(params![project_id], allocation_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_project_customer(
        &self,
        project_id: i64,
        customer_id: i64,
    ) -> Result<Option<ProjectCustomer>> {
        let result = self.conn.query_row(
            &format!("{ALLOCATION_SELECT} WHERE pc.project_id = ?1 AND pc.customer_id = ?2"),
            params![project_id, customer_id],
            allocation_from_row,
        );
        match result {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Change a customer's share; the other allocations plus the new share
    /// must stay within 100%.
    pub(crate) fn update_project_customer(
        &mut self,
        project_id: i64,
        customer_id: i64,
        cost_percentage: Decimal,
    ) -> Result<ProjectCustomer> {
        let pct = cost_percentage.round_dp(2);
        validate_percentage(pct)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT cost_percentage FROM project_customers WHERE project_id = ?1 AND customer_id = ?2",
                params![project_id, customer_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(existing) = existing else {
            return Err(DomainError::AllocationNotFound {
                project_id,
                customer_id,
            }
            .into());
        };

        let others = allocated_total(&tx, project_id)? - decimal(&existing);
        if others + pct > Decimal::ONE_HUNDRED {
            tracing::warn!(project_id, customer_id, current = %others, adding = %pct, "allocation update rejected");
            return Err(DomainError::AllocationExceeded {
                current: others,
                adding: pct,
            }
            .into());
        }

        tx.execute(
            "UPDATE project_customers SET cost_percentage = ?1, updated_at = ?2
             WHERE project_id = ?3 AND customer_id = ?4",
            params![pct.to_string(), timestamp(), project_id, customer_id],
        )?;
        tx.commit()?;
        tracing::info!(project_id, customer_id, pct = %pct, "allocation updated");

        self.get_project_customer(project_id, customer_id)?
            .ok_or_else(|| {
                DomainError::AllocationNotFound {
                    project_id,
                    customer_id,
                }
                .into()
            })
    }

    pub(crate) fn remove_customer_from_project(
        &self,
        project_id: i64,
        customer_id: i64,
    ) -> Result<()> {
        let affected = self.conn.execute(
            "DELETE FROM project_customers WHERE project_id = ?1 AND customer_id = ?2",
            params![project_id, customer_id],
        )?;
        if affected == 0 {
            return Err(DomainError::AllocationNotFound {
                project_id,
                customer_id,
            }
            .into());
        }
        tracing::info!(project_id, customer_id, "customer unlinked from project");
        Ok(())
    }

    pub(crate) fn validate_project_allocation(
        &self,
        project_id: i64,
    ) -> Result<AllocationValidation> {
        let allocations = self.get_project_customers(project_id)?;
        Ok(AllocationValidation::from_allocations(
            project_id,
            &allocations,
        ))
    }

    // ── Cost overviews ────────────────────────────────────────

    pub(crate) fn get_project_cost_overview(&self, project_id: i64) -> Result<ProjectCostOverview> {
        let project = self
            .get_project_by_id(project_id)?
            .ok_or(DomainError::ProjectNotFound(project_id))?;
        let total_expenses = project_total(&self.conn, project_id)?;
        let customers = self
            .get_project_customers(project_id)?
            .into_iter()
            .map(|a| {
                Ok(ProjectCostDetail {
                    allocated_cost: share_of(total_expenses, a.cost_percentage)?,
                    customer_id: a.customer_id,
                    customer_name: a.customer_name,
                    cost_percentage: a.cost_percentage,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ProjectCostOverview {
            project_id,
            project_name: project.name,
            total_expenses,
            customers,
        })
    }

    pub(crate) fn get_customer_cost_overview(
        &self,
        customer_id: i64,
    ) -> Result<CustomerCostOverview> {
        let customer = self
            .get_customer_by_id(customer_id)?
            .ok_or(DomainError::CustomerNotFound(customer_id))?;

        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, pc.cost_percentage
             FROM project_customers pc JOIN projects p ON p.id = pc.project_id
             WHERE pc.customer_id = ?1
             ORDER BY p.name COLLATE NOCASE, p.id",
        )?;
        let links = stmt
            .query_map(params![customer_id], |row| {
                let pct: String = row.get(2)?;
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, decimal(&pct)))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut projects = Vec::with_capacity(links.len());
        for (project_id, project_name, cost_percentage) in links {
            let total_expenses = project_total(&self.conn, project_id)?;
            projects.push(CustomerCostDetail {
                project_id,
                project_name,
                cost_percentage,
                total_expenses,
                allocated_cost: share_of(total_expenses, cost_percentage)?,
            });
        }
        let total_cost = checked_sum(projects.iter().map(|p| p.allocated_cost))?;

        Ok(CustomerCostOverview {
            customer_id,
            customer_name: customer.name,
            total_cost,
            projects,
        })
    }

    pub(crate) fn get_project_detail(&self, project_id: i64) -> Result<ProjectDetail> {
        let project = self
            .get_project_by_id(project_id)?
            .ok_or(DomainError::ProjectNotFound(project_id))?;
        Ok(ProjectDetail {
            expenses: self.get_project_expenses(project_id)?,
            allocations: self.get_project_customers(project_id)?,
            overview: self.get_project_cost_overview(project_id)?,
            project,
        })
    }
}

#[cfg(test)]
mod tests;
