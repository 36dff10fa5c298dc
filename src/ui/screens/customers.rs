use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate, window_start};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let title = format!("Customers ({})", app.customers.len());

    if app.customers.is_empty() {
        let msg = if app.search_input.is_empty() {
            vec![
                Line::from(""),
                Line::from(Span::styled("No customers", theme::dim_style())),
                Line::from(""),
                Line::from(Span::styled(
                    "Add one with :add-customer <name>",
                    theme::dim_style(),
                )),
            ]
        } else {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("No customers matching '{}'", app.search_input),
                    theme::dim_style(),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press Esc to clear the search",
                    theme::dim_style(),
                )),
            ]
        };
        f.render_widget(
            Paragraph::new(msg).centered().block(theme::panel(title)),
            area,
        );
        return;
    }

    let header = Row::new(
        ["ID", "Name", "Description", "Projects", "Allocated"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );

    let page = area.height.saturating_sub(3) as usize;
    let start = window_start(app.customer_index, app.customer_scroll, page);

    let rows: Vec<Row> = app
        .customers
        .iter()
        .enumerate()
        .skip(start)
        .take(page)
        .map(|(i, customer)| {
            let id = customer.id.unwrap_or_default();
            let (projects, allocated) = app
                .report
                .customer(id)
                .map(|row| (row.project_count, format_amount(row.allocated_cost)))
                .unwrap_or((0, "-".to_string()));

            Row::new(vec![
                Cell::from(id.to_string()),
                Cell::from(truncate(&customer.name, 28)),
                Cell::from(truncate(customer.description.as_deref().unwrap_or(""), 40)),
                Cell::from(projects.to_string()),
                Cell::from(allocated),
            ])
            .style(theme::row_style(i, Some(app.customer_index)))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(30),
            Constraint::Min(20),
            Constraint::Length(9),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .block(theme::panel(title));

    f.render_widget(table, area);
}
