use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::alloc;
use crate::ui::app::{App, LinkMode};
use crate::ui::theme;
use crate::ui::util::{format_amount, progress_bar, truncate};

const BAR_WIDTH: usize = 20;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let (Some(project), Some(overview)) = (app.selected_project(), app.overview.as_ref()) else {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No project selected", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Create a project with :add-project <name>",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(theme::panel("Cost Sharing"));
        f.render_widget(msg, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(5)])
        .split(area);

    let total = alloc::to_f64(overview.total_expenses);
    let allocated = alloc::sum_allocated_percentage(&app.allocations);
    let remaining = alloc::remaining_percentage(&app.allocations);
    let color = theme::allocation_color(allocated);

    let mode_hint = match app.link_mode {
        LinkMode::Percent => ":link <customer> <percent>",
        LinkMode::Amount => ":link <customer> <kr amount>",
    };
    let summary = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Total expenses  ", theme::dim_style()),
            Span::styled(
                format_amount(overview.total_expenses),
                Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({}M)", alloc::format_millions(total, alloc::SUMMARY_DECIMALS)),
                theme::dim_style(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Allocated       ", theme::dim_style()),
            Span::styled(
                format!("{} {allocated:.2}%", progress_bar(allocated / 100.0, BAR_WIDTH)),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {remaining:.2}% left"), theme::dim_style()),
        ]),
        Line::from(vec![
            Span::styled("Unallocated     ", theme::dim_style()),
            Span::styled(format_amount(overview.unallocated_cost()), theme::normal_style()),
        ]),
        Line::from(vec![
            Span::styled("Mode            ", theme::dim_style()),
            Span::styled(
                app.link_mode.to_string(),
                Style::default().fg(theme::MAUVE).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {mode_hint}"), theme::dim_style()),
        ]),
    ])
    .block(theme::panel(format!(
        "{} ({}/{})",
        project.name,
        app.project_index + 1,
        app.projects.len()
    )));
    f.render_widget(summary, chunks[0]);

    render_allocations(f, chunks[1], app, total);
}

fn render_allocations(f: &mut Frame, area: Rect, app: &App, total: f64) {
    let title = format!("Customers ({})", app.allocations.len());
    if app.allocations.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No customers share this project yet",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(theme::panel(title));
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        ["Customer", "Share", "", "Allocated", "Amount"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );

    let rows: Vec<Row> = app
        .allocations
        .iter()
        .enumerate()
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, allocation)| {
            let from_overview = app
                .overview
                .as_ref()
                .and_then(|o| o.allocated_cost_for(allocation.customer_id))
                .map(alloc::to_f64);
            let pct = alloc::resolve_percentage(allocation, total);
            let cost = alloc::resolve_allocated_cost(allocation, total, from_overview);

            Row::new(vec![
                Cell::from(truncate(&allocation.customer_name, 26)),
                Cell::from(format!("{pct:>6.2}%")),
                Cell::from(progress_bar(pct / 100.0, BAR_WIDTH)),
                Cell::from(format!(
                    "{}M",
                    alloc::format_millions(cost, alloc::DETAIL_DECIMALS)
                )),
                Cell::from(format_amount(alloc::from_f64(cost))),
            ])
            .style(theme::row_style(i, Some(app.allocation_index)))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(8),
            Constraint::Length(BAR_WIDTH as u16 + 2),
            Constraint::Length(10),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(theme::panel(title));

    f.render_widget(table, area);
}
