use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use super::app::{App, InputMode, PendingAction, Screen};
use crate::alloc;
use crate::config::expand_home;
use crate::db::Database;
use crate::error::DomainError;
use crate::import::{self, parse_decimal, ImportOutcome};
use crate::models::{Customer, CustomerUpdate, Expense, ExpenseUpdate, Project, ProjectUpdate};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit CostShare", cmd_quit, r);
    register_command!("quit", "Quit CostShare", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("c", "Go to Customers", cmd_customers, r);
    register_command!("customers", "Go to Customers", cmd_customers, r);
    register_command!("p", "Go to Projects", cmd_projects, r);
    register_command!("projects", "Go to Projects", cmd_projects, r);
    register_command!("s", "Go to Cost Sharing", cmd_sharing, r);
    register_command!("sharing", "Go to Cost Sharing", cmd_sharing, r);
    register_command!("r", "Go to Reports", cmd_reports, r);
    register_command!("reports", "Go to Reports", cmd_reports, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!(
        "add-customer",
        "Create customer (e.g. :add-customer Bergen Kommune)",
        cmd_add_customer,
        r
    );
    register_command!(
        "add-project",
        "Create project (e.g. :add-project Bybanen)",
        cmd_add_project,
        r
    );
    register_command!(
        "rename",
        "Rename selected customer or project",
        cmd_rename,
        r
    );
    register_command!(
        "describe",
        "Set description of selected customer or project",
        cmd_describe,
        r
    );
    register_command!(
        "delete",
        "Delete selected customer, project or allocation",
        cmd_delete,
        r
    );
    register_command!(
        "add-expense",
        "Add expense to selected project (e.g. :add-expense Labor 150000 Crew)",
        cmd_add_expense,
        r
    );
    register_command!(
        "edit-expense",
        "Change an expense amount (e.g. :edit-expense 12 95000 Materials)",
        cmd_edit_expense,
        r
    );
    register_command!(
        "delete-expense",
        "Delete expense by id (e.g. :delete-expense 12)",
        cmd_delete_expense,
        r
    );
    register_command!(
        "link",
        "Link customer to selected project (e.g. :link Acme Corp 40)",
        cmd_link,
        r
    );
    register_command!(
        "share",
        "Change a customer's share (e.g. :share Acme Corp 60)",
        cmd_share,
        r
    );
    register_command!("unlink", "Remove selected allocation", cmd_unlink, r);
    register_command!(
        "mode",
        "Toggle link mode between percent and amount",
        cmd_mode,
        r
    );
    register_command!(
        "validate",
        "Check that the selected project adds up to 100%",
        cmd_validate,
        r
    );
    register_command!(
        "search",
        "Filter the current list (e.g. :search bergen)",
        cmd_search,
        r
    );
    register_command!(
        "import",
        "Import expenses CSV (e.g. :import ~/expenses.csv --create-projects)",
        cmd_import,
        r
    );
    register_command!(
        "export",
        "Export expenses to CSV (e.g. :export ~/expenses.csv)",
        cmd_export,
        r
    );
    register_command!(
        "reset",
        "Delete everything and restore default customers",
        cmd_reset,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        if let Err(e) = (cmd.run)(args, app, db) {
            // Business-rule rejections are shown, not propagated
            match e.downcast_ref::<DomainError>() {
                Some(domain) => {
                    tracing::debug!(command = cmd_name, error = %domain, "command rejected");
                    app.set_status(domain.to_string());
                }
                None => return Err(e),
            }
        }
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Split `"<name words...> <value>"` into the name and the trailing value.
fn split_trailing_value(args: &str) -> Option<(&str, &str)> {
    let mut parts = args.rsplitn(2, ' ');
    let value = parts.next()?;
    let name = parts.next()?.trim();
    (!name.is_empty()).then_some((name, value))
}

/// Look a customer up by id, then by name. The app's own list may be
/// narrowed by a search, so the full list is loaded.
fn find_customer(db: &Database, key: &str) -> anyhow::Result<Option<Customer>> {
    let customers = db.get_customers()?;
    let by_id = key
        .parse::<i64>()
        .ok()
        .and_then(|id| Customer::find_by_id(&customers, id));
    Ok(by_id
        .or_else(|| Customer::find_by_name(&customers, key))
        .cloned())
}

// ── Navigation ───────────────────────────────────────────────

fn go_to(app: &mut App, db: &mut Database, screen: Screen) -> anyhow::Result<()> {
    app.screen = screen;
    app.search_input.clear();
    app.refresh_all(db)
}

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    go_to(app, db, Screen::Dashboard)
}

fn cmd_customers(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    go_to(app, db, Screen::Customers)
}

fn cmd_projects(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    go_to(app, db, Screen::Projects)
}

fn cmd_sharing(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    go_to(app, db, Screen::CostSharing)
}

fn cmd_reports(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    go_to(app, db, Screen::Reports)
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_search(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if !app.screen.is_searchable() {
        app.screen = Screen::Projects;
    }
    app.search_input = args.to_string();
    app.refresh_all(db)?;
    if args.is_empty() {
        app.set_status("Search cleared");
    } else {
        app.set_status(format!("Searching: {args}"));
    }
    Ok(())
}

// ── Customers and projects ───────────────────────────────────

fn cmd_add_customer(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :add-customer <name>");
        return Ok(());
    }
    db.insert_customer(&Customer::new(args.to_string(), None))?;
    app.screen = Screen::Customers;
    app.refresh_all(db)?;
    if let Some(i) = app.customers.iter().position(|c| c.name == args) {
        app.customer_index = i;
    }
    app.set_status(format!("Created customer: {args}"));
    Ok(())
}

fn cmd_add_project(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :add-project <name>");
        return Ok(());
    }
    let id = db.insert_project(&Project::new(args.to_string(), None))?;
    app.screen = Screen::Projects;
    app.refresh_all(db)?;
    if let Some(i) = app.projects.iter().position(|p| p.id == Some(id)) {
        app.project_index = i;
        app.refresh_selected_project(db)?;
    }
    app.set_status(format!("Created project: {args}"));
    Ok(())
}

fn cmd_rename(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let current = match app.screen {
        Screen::Customers => app.selected_customer().map(|c| c.name.clone()),
        Screen::Projects => app.selected_project().map(|p| p.name.clone()),
        _ => None,
    };
    let Some(current) = current else {
        app.set_status("Select a customer or project first");
        return Ok(());
    };

    if args.is_empty() {
        app.command_input = current;
        app.input_mode = InputMode::Editing;
        app.set_status("Type new name, press Enter to confirm");
        return Ok(());
    }

    rename_selected(args, app, db)
}

/// Apply a new name to the selected customer or project.
pub(crate) fn rename_selected(name: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    match app.screen {
        Screen::Customers => {
            if let Some(id) = app.selected_customer().and_then(|c| c.id) {
                db.update_customer(
                    id,
                    &CustomerUpdate {
                        name: Some(name.to_string()),
                        ..Default::default()
                    },
                )?;
            }
        }
        Screen::Projects => {
            if let Some(id) = app.selected_project_id() {
                db.update_project(
                    id,
                    &ProjectUpdate {
                        name: Some(name.to_string()),
                        ..Default::default()
                    },
                )?;
            }
        }
        _ => return Ok(()),
    }
    app.refresh_all(db)?;
    app.set_status(format!("Renamed to: {name}"));
    Ok(())
}

fn cmd_describe(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    match app.screen {
        Screen::Customers => {
            let Some(id) = app.selected_customer().and_then(|c| c.id) else {
                app.set_status("No customer selected");
                return Ok(());
            };
            db.update_customer(
                id,
                &CustomerUpdate {
                    description: Some(args.to_string()),
                    ..Default::default()
                },
            )?;
        }
        Screen::Projects => {
            let Some(id) = app.selected_project_id() else {
                app.set_status("No project selected");
                return Ok(());
            };
            db.update_project(
                id,
                &ProjectUpdate {
                    description: Some(args.to_string()),
                    ..Default::default()
                },
            )?;
        }
        _ => {
            app.set_status("Go to Customers or Projects first");
            return Ok(());
        }
    }
    app.refresh_all(db)?;
    app.set_status(if args.is_empty() {
        "Description cleared"
    } else {
        "Description updated"
    });
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let action = match app.screen {
        Screen::Customers => app.selected_customer().and_then(|c| {
            c.id.map(|id| PendingAction::DeleteCustomer {
                id,
                name: c.name.clone(),
            })
        }),
        Screen::Projects => app.selected_project().and_then(|p| {
            p.id.map(|id| PendingAction::DeleteProject {
                id,
                name: p.name.clone(),
            })
        }),
        Screen::CostSharing => return cmd_unlink("", app, db),
        _ => None,
    };

    match action {
        Some(action) => request_confirm(app, action),
        None => app.set_status("Nothing selected to delete"),
    }
    Ok(())
}

fn request_confirm(app: &mut App, action: PendingAction) {
    app.confirm_message = match &action {
        PendingAction::DeleteCustomer { name, .. } => {
            format!("Delete customer '{name}' and all its allocations?")
        }
        PendingAction::DeleteProject { name, .. } => {
            format!("Delete project '{name}' with its expenses and allocations?")
        }
        PendingAction::DeleteExpense { label, .. } => format!("Delete expense {label}?"),
        PendingAction::Unlink { name, .. } => format!("Remove '{name}' from this project?"),
        PendingAction::Reset => "Delete ALL data and restore default customers?".to_string(),
    };
    app.pending_action = Some(action);
    app.input_mode = InputMode::Confirm;
}

/// Carry out a confirmed action.
pub(crate) fn run_pending(action: PendingAction, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let message = match action {
        PendingAction::DeleteCustomer { id, name } => {
            db.delete_customer(id)?;
            format!("Deleted customer: {name}")
        }
        PendingAction::DeleteProject { id, name } => {
            db.delete_project(id)?;
            format!("Deleted project: {name}")
        }
        PendingAction::DeleteExpense { id, label } => {
            db.delete_expense(id)?;
            format!("Deleted expense {label}")
        }
        PendingAction::Unlink {
            project_id,
            customer_id,
            name,
        } => {
            db.remove_customer_from_project(project_id, customer_id)?;
            format!("Removed {name} from project")
        }
        PendingAction::Reset => {
            db.reset()?;
            app.search_input.clear();
            app.customer_index = 0;
            app.project_index = 0;
            "Database reset to defaults".to_string()
        }
    };
    app.refresh_all(db)?;
    app.set_status(message);
    Ok(())
}

// ── Expenses ─────────────────────────────────────────────────

fn cmd_add_expense(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(project_id) = app.selected_project_id() else {
        app.set_status("Select a project first");
        return Ok(());
    };

    let mut parts = args.splitn(3, ' ');
    let (Some(expense_type), Some(amount_str)) = (parts.next(), parts.next()) else {
        app.set_status("Usage: :add-expense <type> <amount> [description]");
        return Ok(());
    };
    let description = parts.next().map(|s| s.to_string());

    let amount = match parse_decimal(amount_str) {
        Ok(a) => a,
        Err(_) => {
            app.set_status(format!("Invalid amount: {amount_str}"));
            return Ok(());
        }
    };

    db.insert_expense(&Expense::new(
        project_id,
        expense_type.to_string(),
        amount,
        description,
    ))?;
    app.refresh_all(db)?;
    app.set_status(format!(
        "Added {expense_type} expense of {}",
        super::util::format_amount(amount)
    ));
    Ok(())
}

fn cmd_edit_expense(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let mut parts = args.splitn(3, ' ');
    let (Some(Ok(id)), Some(amount_str)) = (parts.next().map(str::parse::<i64>), parts.next())
    else {
        app.set_status("Usage: :edit-expense <id> <amount> [type]");
        return Ok(());
    };
    let Ok(amount) = parse_decimal(amount_str) else {
        app.set_status(format!("Invalid amount: {amount_str}"));
        return Ok(());
    };

    let updated = db.update_expense(
        id,
        &ExpenseUpdate {
            amount: Some(amount),
            expense_type: parts.next().map(|t| t.trim().to_string()),
            ..Default::default()
        },
    )?;
    app.refresh_all(db)?;
    app.set_status(format!(
        "Expense #{id} is now {} ({})",
        super::util::format_amount(updated.amount),
        updated.expense_type
    ));
    Ok(())
}

fn cmd_delete_expense(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Ok(id) = args.parse::<i64>() else {
        app.set_status("Usage: :delete-expense <id>");
        return Ok(());
    };
    match db.get_expense_by_id(id)? {
        Some(expense) => request_confirm(
            app,
            PendingAction::DeleteExpense {
                id,
                label: format!(
                    "#{id} ({}, {})",
                    expense.expense_type,
                    super::util::format_amount(expense.amount)
                ),
            },
        ),
        None => app.set_status(format!("Expense {id} not found")),
    }
    Ok(())
}

// ── Cost sharing ─────────────────────────────────────────────

fn cmd_link(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    set_share(args, app, db, false)
}

fn cmd_share(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    set_share(args, app, db, true)
}

fn set_share(args: &str, app: &mut App, db: &mut Database, update: bool) -> anyhow::Result<()> {
    let usage = if update {
        "Usage: :share <customer> <value>"
    } else {
        "Usage: :link <customer> <value>"
    };
    let Some(project_id) = app.selected_project_id() else {
        app.set_status("Select a project first");
        return Ok(());
    };
    let Some((customer_key, value_str)) = split_trailing_value(args) else {
        app.set_status(usage);
        return Ok(());
    };
    let value = match parse_decimal(value_str.trim_end_matches('%')) {
        Ok(v) => alloc::to_f64(v),
        Err(_) => {
            app.set_status(format!("Invalid value: {value_str}"));
            return Ok(());
        }
    };
    let Some(customer) = find_customer(db, customer_key)? else {
        app.set_status(format!("Customer '{customer_key}' not found"));
        return Ok(());
    };
    let Some(customer_id) = customer.id else {
        return Ok(());
    };

    let pct = match app.link_percentage(value, update.then_some(customer_id)) {
        Ok(pct) => pct,
        Err(msg) => {
            app.set_status(msg);
            return Ok(());
        }
    };
    let pct = alloc::from_f64(pct).round_dp(2);

    if update {
        db.update_project_customer(project_id, customer_id, pct)?;
    } else {
        db.add_customer_to_project(project_id, customer_id, pct)?;
    }
    app.refresh_all(db)?;
    if let Some(i) = app
        .allocations
        .iter()
        .position(|a| a.customer_id == customer_id)
    {
        app.allocation_index = i;
    }
    let allocated = app
        .overview
        .as_ref()
        .and_then(|o| o.allocated_cost_for(customer_id))
        .map(alloc::to_f64)
        .unwrap_or(0.0);
    app.set_status(format!(
        "{}: {pct}% ({}M)",
        customer.name,
        alloc::format_millions(allocated, alloc::DETAIL_DECIMALS)
    ));
    Ok(())
}

fn cmd_unlink(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let action = app.selected_allocation().map(|a| PendingAction::Unlink {
        project_id: a.project_id,
        customer_id: a.customer_id,
        name: a.customer_name.clone(),
    });
    match action {
        Some(action) => request_confirm(app, action),
        None => app.set_status("No allocation selected"),
    }
    Ok(())
}

fn cmd_mode(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.link_mode = app.link_mode.toggle();
    let mode = app.link_mode;
    app.set_status(format!("Link values are now read as {mode}"));
    Ok(())
}

fn cmd_validate(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(project_id) = app.selected_project_id() else {
        app.set_status("Select a project first");
        return Ok(());
    };
    let v = db.validate_project_allocation(project_id)?;
    app.set_status(if v.is_valid {
        format!(
            "Valid: {}% across {} customer(s)",
            v.total_percentage, v.customer_count
        )
    } else {
        format!(
            "Incomplete: {}% across {} customer(s)",
            v.total_percentage, v.customer_count
        )
    });
    Ok(())
}

// ── Import / export / reset ──────────────────────────────────

fn cmd_import(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let create_projects = args.split_whitespace().any(|a| a == "--create-projects");
    let path_arg = args
        .split_whitespace()
        .filter(|a| !a.starts_with("--"))
        .collect::<Vec<_>>()
        .join(" ");
    if path_arg.is_empty() {
        app.set_status("Usage: :import <file.csv> [--create-projects]");
        return Ok(());
    }
    let path = expand_home(&path_arg);
    if !Path::new(&path).exists() {
        app.set_status(format!("File not found: {path}"));
        return Ok(());
    }

    let outcome = match import::import_expenses(db, Path::new(&path), create_projects) {
        Ok(outcome) => outcome,
        Err(e) if e.downcast_ref::<DomainError>().is_some() => return Err(e),
        Err(e) => {
            tracing::warn!(path = %path, error = %format!("{e:#}"), "import failed");
            app.set_status(format!("Import failed: {e:#}"));
            return Ok(());
        }
    };
    match outcome {
        ImportOutcome::Imported {
            count,
            projects_created,
        } => {
            app.refresh_all(db)?;
            app.set_status(format!(
                "Imported {count} expenses ({projects_created} projects created)"
            ));
        }
        ImportOutcome::Partial { errors, .. } => {
            let first = errors.first().cloned().unwrap_or_default();
            app.set_status(format!(
                "Nothing imported: {} bad row(s). {first}",
                errors.len()
            ));
        }
    }
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/costshare-expenses.csv")
    } else {
        expand_home(args)
    };
    let count = match db.export_expenses_to_csv(Path::new(&path)) {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(path = %path, error = %format!("{e:#}"), "export failed");
            app.set_status(format!("Export failed: {e:#}"));
            return Ok(());
        }
    };
    if count == 0 {
        app.set_status("No expenses to export");
    } else {
        app.set_status(format!("Exported {count} expenses to {path}"));
    }
    Ok(())
}

fn cmd_reset(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    request_confirm(app, PendingAction::Reset);
    Ok(())
}
