use anyhow::Result;
use rust_decimal::Decimal;
use std::path::Path;

use crate::alloc;
use crate::config::expand_home;
use crate::db::Database;
use crate::import::{self, parse_decimal, ImportOutcome};
use crate::models::{Customer, Expense, Project};
use crate::report::Report;
use crate::ui::util::{format_amount, format_m};

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "customers" => cli_customers(db),
        "projects" => cli_projects(db),
        "expenses" => cli_expenses(rest, db),
        "add-customer" => cli_add_customer(rest, db),
        "add-project" => cli_add_project(rest, db),
        "add-expense" => cli_add_expense(rest, db),
        "link" => cli_link(rest, db),
        "unlink" => cli_unlink(rest, db),
        "share" => cli_share(rest, db),
        "overview" => cli_overview(rest, db),
        "customer-overview" => cli_customer_overview(rest, db),
        "validate" => cli_validate(rest, db),
        "import" => cli_import(rest, db),
        "export" => cli_export(rest, db),
        "summary" | "s" => cli_summary(db),
        "reset" => cli_reset(rest, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("costshare {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("CostShare: split project costs between customers");
    println!();
    println!("Usage: costshare [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                  Launch interactive TUI");
    println!("  customers                               List customers");
    println!("  projects                                List projects with totals");
    println!("  expenses <project>                      List expenses of a project");
    println!("  add-customer <name> [description]       Create a customer");
    println!("  add-project <name> [description]        Create a project");
    println!("  add-expense <project> <type> <amount> [description]");
    println!("                                          Add an expense to a project");
    println!("  link <project> <customer> <percent>     Give a customer a share of a project");
    println!("    --amount                              Read the value as kroner instead");
    println!("  share <project> <customer> <percent>    Change an existing share");
    println!("  unlink <project> <customer>             Remove a customer from a project");
    println!("  overview <project>                      Cost split of a project");
    println!("  customer-overview <customer>            Everything a customer pays for");
    println!("  validate <project>                      Check that shares add up to 100%");
    println!("  import <file.csv>                       Import expenses");
    println!("    --create-projects                     Create unknown project ids");
    println!("  export [path]                           Export expenses to CSV");
    println!("  summary                                 Print portfolio summary");
    println!("  reset --yes                             Delete all data, restore defaults");
    println!("  --help, -h                              Show this help");
    println!("  --version, -V                           Show version");
    println!();
    println!("Projects and customers can be given by id or by name.");
    println!("Environment: COSTSHARE_DB (database file), COSTSHARE_LOG (log filter).");
}

// ── Lookups ──────────────────────────────────────────────────

fn resolve_project(db: &Database, key: &str) -> Result<Project> {
    if let Ok(id) = key.parse::<i64>() {
        if let Some(p) = db.get_project_by_id(id)? {
            return Ok(p);
        }
    }
    db.find_project_by_name(key)?
        .ok_or_else(|| anyhow::anyhow!("Project '{key}' not found"))
}

fn resolve_customer(db: &Database, key: &str) -> Result<Customer> {
    if let Ok(id) = key.parse::<i64>() {
        if let Some(c) = db.get_customer_by_id(id)? {
            return Ok(c);
        }
    }
    db.find_customer_by_name(key)?
        .ok_or_else(|| anyhow::anyhow!("Customer '{key}' not found"))
}

fn ids(project: &Project, customer: &Customer) -> Result<(i64, i64)> {
    let pid = project
        .id
        .ok_or_else(|| anyhow::anyhow!("Project has no ID"))?;
    let cid = customer
        .id
        .ok_or_else(|| anyhow::anyhow!("Customer has no ID"))?;
    Ok((pid, cid))
}

/// Positional arguments, with `--flags` removed.
fn positional(args: &[String]) -> Vec<&str> {
    args.iter()
        .map(String::as_str)
        .filter(|a| !a.starts_with("--"))
        .collect()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_share(value: &str) -> Result<Decimal> {
    parse_decimal(value.trim_end_matches('%'))
}

// ── Listing ──────────────────────────────────────────────────

fn cli_customers(db: &mut Database) -> Result<()> {
    let customers = db.get_customers()?;
    if customers.is_empty() {
        println!("No customers");
        return Ok(());
    }

    println!("{:<4} {:<28} Description", "ID", "Name");
    println!("{}", "─".repeat(60));
    for c in &customers {
        println!(
            "{:<4} {:<28} {}",
            c.id.unwrap_or(0),
            c.name,
            c.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn cli_projects(db: &mut Database) -> Result<()> {
    let report = Report::build(db)?;
    if report.projects.is_empty() {
        println!("No projects");
        return Ok(());
    }

    println!(
        "{:<4} {:<28} {:>20} {:>8} {:>5}",
        "ID", "Name", "Total", "Shared", "Cust."
    );
    println!("{}", "─".repeat(69));
    for row in &report.projects {
        println!(
            "{:<4} {:<28} {:>20} {:>7}% {:>5}",
            row.project_id,
            row.name,
            format_amount(row.total_cost),
            row.allocated_percentage.round_dp(2),
            row.customer_count
        );
    }
    Ok(())
}

fn cli_expenses(args: &[String], db: &mut Database) -> Result<()> {
    let Some(key) = args.first() else {
        anyhow::bail!("Usage: costshare expenses <project>");
    };
    let project = resolve_project(db, key)?;
    let expenses = db.get_project_expenses(project.id.unwrap_or_default())?;
    if expenses.is_empty() {
        println!("No expenses for {}", project.name);
        return Ok(());
    }

    println!("{:<5} {:<18} {:>20} Description", "ID", "Type", "Amount");
    println!("{}", "─".repeat(65));
    for e in &expenses {
        println!(
            "{:<5} {:<18} {:>20} {}",
            e.id.unwrap_or(0),
            e.expense_type,
            format_amount(e.amount),
            e.description.as_deref().unwrap_or("")
        );
    }
    println!("{}", "─".repeat(65));
    println!(
        "{:<24} {:>20}",
        "Total",
        format_amount(Expense::total(&expenses))
    );
    Ok(())
}

// ── Mutations ────────────────────────────────────────────────

fn cli_add_customer(args: &[String], db: &mut Database) -> Result<()> {
    let Some(name) = args.first() else {
        anyhow::bail!("Usage: costshare add-customer <name> [description]");
    };
    let id = db.insert_customer(&Customer::new(name.clone(), args.get(1).cloned()))?;
    println!("Created customer {id}: {name}");
    Ok(())
}

fn cli_add_project(args: &[String], db: &mut Database) -> Result<()> {
    let Some(name) = args.first() else {
        anyhow::bail!("Usage: costshare add-project <name> [description]");
    };
    let id = db.insert_project(&Project::new(name.clone(), args.get(1).cloned()))?;
    println!("Created project {id}: {name}");
    Ok(())
}

fn cli_add_expense(args: &[String], db: &mut Database) -> Result<()> {
    let [project_key, expense_type, amount, ..] = args else {
        anyhow::bail!("Usage: costshare add-expense <project> <type> <amount> [description]");
    };
    let project = resolve_project(db, project_key)?;
    let amount = parse_decimal(amount)?;
    let expense = Expense::new(
        project.id.unwrap_or_default(),
        expense_type.clone(),
        amount,
        args.get(3).cloned(),
    );
    let id = db.insert_expense(&expense)?;
    println!(
        "Added expense {id} to {}: {expense_type} {}",
        project.name,
        format_amount(amount)
    );
    Ok(())
}

fn cli_link(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    let [project_key, customer_key, value] = pos[..] else {
        anyhow::bail!("Usage: costshare link <project> <customer> <percent> [--amount]");
    };
    let project = resolve_project(db, project_key)?;
    let customer = resolve_customer(db, customer_key)?;
    let (pid, cid) = ids(&project, &customer)?;
    let value = parse_share(value)?;

    let pct = if has_flag(args, "--amount") {
        let total = alloc::to_f64(db.get_project_total(pid)?);
        if total <= 0.0 {
            anyhow::bail!("Project {} has no expenses; link by percent", project.name);
        }
        let pct = alloc::clamp_percentage(alloc::amount_to_percentage(total, alloc::to_f64(value)));
        let existing = db.get_project_customers(pid)?;
        if !alloc::can_allocate(&existing, pct) {
            anyhow::bail!(
                "Allocation exceeds 100% ({:.2}% left)",
                alloc::remaining_percentage(&existing)
            );
        }
        alloc::from_f64(pct).round_dp(2)
    } else {
        value
    };

    let link = db.add_customer_to_project(pid, cid, pct)?;
    println!(
        "Linked {} to {} at {}%",
        customer.name, project.name, link.cost_percentage
    );
    Ok(())
}

fn cli_share(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    let [project_key, customer_key, value] = pos[..] else {
        anyhow::bail!("Usage: costshare share <project> <customer> <percent>");
    };
    let project = resolve_project(db, project_key)?;
    let customer = resolve_customer(db, customer_key)?;
    let (pid, cid) = ids(&project, &customer)?;

    let link = db.update_project_customer(pid, cid, parse_share(value)?)?;
    println!(
        "{} now pays {}% of {}",
        customer.name, link.cost_percentage, project.name
    );
    Ok(())
}

fn cli_unlink(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positional(args);
    let [project_key, customer_key] = pos[..] else {
        anyhow::bail!("Usage: costshare unlink <project> <customer>");
    };
    let project = resolve_project(db, project_key)?;
    let customer = resolve_customer(db, customer_key)?;
    let (pid, cid) = ids(&project, &customer)?;

    db.remove_customer_from_project(pid, cid)?;
    println!("Removed {} from {}", customer.name, project.name);
    Ok(())
}

// ── Overviews ────────────────────────────────────────────────

fn cli_overview(args: &[String], db: &mut Database) -> Result<()> {
    let Some(key) = args.first() else {
        anyhow::bail!("Usage: costshare overview <project>");
    };
    let project = resolve_project(db, key)?;
    let detail = db.get_project_detail(project.id.unwrap_or_default())?;
    let overview = &detail.overview;
    let total = alloc::to_f64(overview.total_expenses);

    println!("{}", overview.project_name);
    if let Some(desc) = detail.project.description.as_deref() {
        println!("{desc}");
    }
    println!("{}", "─".repeat(60));
    println!(
        "  Expenses:     {} ({} items)",
        format_amount(overview.total_expenses),
        detail.expenses.len()
    );
    println!(
        "  Allocated:    {:.2}%",
        alloc::sum_allocated_percentage(&detail.allocations)
    );
    println!(
        "  Unallocated:  {}",
        format_amount(overview.unallocated_cost())
    );

    if !overview.customers.is_empty() {
        println!();
        println!("{:<28} {:>8} {:>10} {:>20}", "Customer", "Share", "", "Amount");
        for c in &overview.customers {
            let cost = alloc::resolve_allocated_cost(c, total, None);
            println!(
                "{:<28} {:>7}% {:>9}M {:>20}",
                c.customer_name,
                c.cost_percentage.round_dp(2),
                alloc::format_millions(cost, alloc::DETAIL_DECIMALS),
                format_amount(c.allocated_cost)
            );
        }
    }
    Ok(())
}

fn cli_customer_overview(args: &[String], db: &mut Database) -> Result<()> {
    let Some(key) = args.first() else {
        anyhow::bail!("Usage: costshare customer-overview <customer>");
    };
    let customer = resolve_customer(db, key)?;
    let overview = db.get_customer_cost_overview(customer.id.unwrap_or_default())?;

    println!("{}", overview.customer_name);
    println!("{}", "─".repeat(72));
    if overview.projects.is_empty() {
        println!("  Not linked to any project");
        return Ok(());
    }
    println!(
        "{:<28} {:>8} {:>16} {:>16}",
        "Project", "Share", "Project cost", "Pays"
    );
    for p in &overview.projects {
        println!(
            "{:<28} {:>7}% {:>16} {:>16}",
            p.project_name,
            p.cost_percentage.round_dp(2),
            format_m(p.total_expenses, alloc::DETAIL_DECIMALS),
            format_amount(p.allocated_cost)
        );
    }
    println!("{}", "─".repeat(72));
    println!("{:<55} {:>16}", "Total", format_amount(overview.total_cost));
    Ok(())
}

fn cli_validate(args: &[String], db: &mut Database) -> Result<()> {
    let Some(key) = args.first() else {
        anyhow::bail!("Usage: costshare validate <project>");
    };
    let project = resolve_project(db, key)?;
    let v = db.validate_project_allocation(project.id.unwrap_or_default())?;

    println!(
        "{}: {}% across {} customer(s), {}",
        project.name,
        v.total_percentage,
        v.customer_count,
        if v.is_valid { "valid" } else { "incomplete" }
    );
    for d in &v.details {
        let name = db
            .get_customer_by_id(d.customer_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| d.customer_id.to_string());
        println!("  {name:<28} {}%", d.cost_percentage);
    }
    Ok(())
}

fn cli_summary(db: &mut Database) -> Result<()> {
    let report = Report::build(db)?;

    println!("CostShare summary");
    println!("{}", "─".repeat(40));
    println!("  Customers:        {}", report.customer_count);
    println!("  Projects:         {}", report.project_count);
    println!("  Expenses:         {}", report.expense_count);
    println!("  Total cost:       {}", format_amount(report.total_cost));
    println!(
        "  Avg per project:  {}",
        format_amount(report.average_project_cost)
    );
    println!(
        "  Fully allocated:  {}/{}",
        report.fully_allocated, report.project_count
    );

    if !report.top_customers.is_empty() {
        println!();
        println!("Top customers:");
        for c in &report.top_customers {
            println!(
                "  {:<24} {:>10} ({} projects)",
                c.name,
                format_m(c.allocated_cost, alloc::DETAIL_DECIMALS),
                c.project_count
            );
        }
    }

    let incomplete: Vec<_> = report.incomplete_projects().collect();
    if !incomplete.is_empty() {
        println!();
        println!("Not fully allocated:");
        for row in incomplete {
            println!("  {:<24} {:>7}%", row.name, row.allocated_percentage.round_dp(2));
        }
    }
    Ok(())
}

// ── Import / export / reset ──────────────────────────────────

fn cli_import(args: &[String], db: &mut Database) -> Result<()> {
    let Some(file_path) = positional(args).first().map(|p| expand_home(p)) else {
        anyhow::bail!("Usage: costshare import <file.csv> [--create-projects]");
    };
    let path = Path::new(&file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    match import::import_expenses(db, path, has_flag(args, "--create-projects"))? {
        ImportOutcome::Imported {
            count,
            projects_created,
        } => {
            println!("Imported {count} expenses");
            if projects_created > 0 {
                println!("Created {projects_created} missing projects");
            }
            Ok(())
        }
        ImportOutcome::Partial { parsed, errors } => {
            for e in &errors {
                eprintln!("  {e}");
            }
            anyhow::bail!(
                "Nothing imported: {} of {} rows had errors",
                errors.len(),
                parsed + errors.len()
            );
        }
    }
}

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let output_path = positional(args)
        .first()
        .map(|a| expand_home(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/costshare-expenses.csv")
        });

    let count = db.export_expenses_to_csv(Path::new(&output_path))?;
    if count == 0 {
        println!("No expenses to export");
    } else {
        println!("Exported {count} expenses to {output_path}");
    }
    Ok(())
}

fn cli_reset(args: &[String], db: &mut Database) -> Result<()> {
    if !has_flag(args, "--yes") {
        anyhow::bail!("This deletes all data. Run `costshare reset --yes` to confirm");
    }
    db.reset()?;
    println!("Database reset; default customers restored");
    Ok(())
}
