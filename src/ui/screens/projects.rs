use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::alloc;
use crate::models::Expense;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate, window_start};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_project_table(f, chunks[0], app);
    render_expense_panel(f, chunks[1], app);
}

fn render_project_table(f: &mut Frame, area: Rect, app: &App) {
    let title = format!("Projects ({})", app.projects.len());

    if app.projects.is_empty() {
        let hint = if app.search_input.is_empty() {
            "Add one with :add-project <name>".to_string()
        } else {
            format!("No projects matching '{}'", app.search_input)
        };
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No projects", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(hint, theme::dim_style())),
        ])
        .centered()
        .block(theme::panel(title));
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        ["ID", "Name", "Total Cost", "Shared", "Cust."]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );

    let page = area.height.saturating_sub(3) as usize;
    let start = window_start(app.project_index, app.project_scroll, page);

    let rows: Vec<Row> = app
        .projects
        .iter()
        .enumerate()
        .skip(start)
        .take(page)
        .map(|(i, project)| {
            let id = project.id.unwrap_or_default();
            let stats = app.report.project(id);
            let total = stats.map(|r| format_amount(r.total_cost)).unwrap_or_default();
            let pct = stats
                .map(|r| alloc::to_f64(r.allocated_percentage))
                .unwrap_or(0.0);
            let customers = stats.map(|r| r.customer_count).unwrap_or(0);
            let selected = i == app.project_index;

            let pct_cell = Cell::from(format!("{pct:.2}%"));
            Row::new(vec![
                Cell::from(id.to_string()),
                Cell::from(truncate(&project.name, 24)),
                Cell::from(total),
                if selected {
                    pct_cell
                } else {
                    pct_cell.style(Style::default().fg(theme::allocation_color(pct)))
                },
                Cell::from(customers.to_string()),
            ])
            .style(theme::row_style(i, Some(app.project_index)))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(16),
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(theme::panel(title));

    f.render_widget(table, area);
}

fn render_expense_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(project) = app.selected_project() else {
        f.render_widget(theme::panel("Expenses"), area);
        return;
    };

    let total = Expense::total(&app.project_expenses);
    let title = format!(
        "{} · {} expenses · {}",
        truncate(&project.name, 20),
        app.project_expenses.len(),
        format_amount(total)
    );

    if app.project_expenses.is_empty() {
        let mut lines = vec![Line::from("")];
        if let Some(desc) = project.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(Line::from(Span::styled(desc.to_string(), theme::normal_style())));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "No expenses. Add one with :add-expense <type> <amount>",
            theme::dim_style(),
        )));
        f.render_widget(
            Paragraph::new(lines).centered().block(theme::panel(title)),
            area,
        );
        return;
    }

    let header = Row::new(
        ["ID", "Type", "Amount", "Description"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );

    let rows: Vec<Row> = app
        .project_expenses
        .iter()
        .enumerate()
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, expense)| {
            Row::new(vec![
                Cell::from(expense.id.unwrap_or_default().to_string()),
                Cell::from(truncate(&expense.expense_type, 14)),
                Cell::from(format_amount(expense.amount)),
                Cell::from(truncate(expense.description.as_deref().unwrap_or(""), 30)),
            ])
            .style(theme::row_style(i, None))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(15),
            Constraint::Length(17),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(theme::panel(title));

    f.render_widget(table, area);
}
