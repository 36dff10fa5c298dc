use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::alloc;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_m, progress_bar, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // KPIs
            Constraint::Min(6),    // Tables
        ])
        .split(area);

    render_kpis(f, chunks[0], app);

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    render_project_shares(f, tables[0], app);
    render_top_customers(f, tables[1], app);
}

fn render_kpis(f: &mut Frame, area: Rect, app: &App) {
    let r = &app.report;
    let kpi = |label: &'static str, value: String| {
        vec![
            Span::styled(format!("{label} "), theme::dim_style()),
            Span::styled(
                value,
                Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
        ]
    };

    let mut first = kpi("Total cost", format_amount(r.total_cost));
    first.extend(kpi(
        "Average per project",
        format_m(r.average_project_cost, alloc::DETAIL_DECIMALS),
    ));
    let mut second = kpi("Customers", r.customer_count.to_string());
    second.extend(kpi("Projects", r.project_count.to_string()));
    second.extend(kpi("Expenses", r.expense_count.to_string()));
    second.extend(kpi(
        "Fully allocated",
        format!("{}/{}", r.fully_allocated, r.project_count),
    ));

    f.render_widget(
        Paragraph::new(vec![Line::from(first), Line::from(second)]).block(theme::panel("Summary")),
        area,
    );
}

fn render_project_shares(f: &mut Frame, area: Rect, app: &App) {
    if app.report.projects.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled("No projects", theme::dim_style())))
                .centered()
                .block(theme::panel("Cost by Project")),
            area,
        );
        return;
    }

    let header = Row::new(
        ["Project", "Cost", "Of total", "", "Shared"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );
    let rows: Vec<Row> = app
        .report
        .projects
        .iter()
        .enumerate()
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, row)| {
            let share = alloc::to_f64(row.share_of_total);
            let allocated = alloc::to_f64(row.allocated_percentage);
            Row::new(vec![
                Cell::from(truncate(&row.name, 22)),
                Cell::from(format_m(row.total_cost, alloc::DETAIL_DECIMALS)),
                Cell::from(format!("{share:>6.2}%")),
                Cell::from(progress_bar(share / 100.0, 12)),
                Cell::from(format!("{allocated:.0}%"))
                    .style(Style::default().fg(theme::allocation_color(allocated))),
            ])
            .style(theme::row_style(i, None))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(12),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(14),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(theme::panel("Cost by Project"));
    f.render_widget(table, area);
}

fn render_top_customers(f: &mut Frame, area: Rect, app: &App) {
    let title = format!("Top {} Customers", crate::report::TOP_CUSTOMERS);
    if app.report.top_customers.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "No allocations yet",
                theme::dim_style(),
            )))
            .centered()
            .block(theme::panel(title)),
            area,
        );
        return;
    }

    let header = Row::new(
        ["#", "Customer", "Allocated", "Proj."]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );
    let rows: Vec<Row> = app
        .report
        .top_customers
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(truncate(&c.name, 20)),
                Cell::from(format_m(c.allocated_cost, alloc::DETAIL_DECIMALS)),
                Cell::from(c.project_count.to_string()),
            ])
            .style(theme::row_style(i, None))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(10),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(theme::panel(title));
    f.render_widget(table, area);
}
