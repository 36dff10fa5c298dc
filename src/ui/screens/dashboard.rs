use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;

use crate::alloc;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_m, truncate};

const MAX_BARS: usize = 12;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary cards
            Constraint::Min(8),    // Cost per project
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);
    render_cost_chart(f, lower[0], app);
    render_needs_allocation(f, lower[1], app);
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let report = &app.report;
    render_card(
        f,
        cards[0],
        "Customers",
        report.customer_count.to_string(),
        theme::ACCENT,
        String::new(),
    );
    render_card(
        f,
        cards[1],
        "Projects",
        report.project_count.to_string(),
        theme::MAUVE,
        format!("{} expenses", report.expense_count),
    );
    render_card(
        f,
        cards[2],
        "Total Cost",
        format_m(report.total_cost, alloc::SUMMARY_DECIMALS),
        theme::YELLOW,
        format_amount(report.total_cost),
    );

    let ratio = if report.project_count == 0 {
        0.0
    } else {
        report.fully_allocated as f64 / report.project_count as f64 * 100.0
    };
    render_card(
        f,
        cards[3],
        "Fully Allocated",
        format!("{}/{}", report.fully_allocated, report.project_count),
        theme::allocation_color(ratio),
        "projects at 100%".to_string(),
    );
}

fn render_card(f: &mut Frame, area: Rect, title: &str, value: String, color: Color, sub: String) {
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(sub, theme::dim_style())),
    ])
    .centered()
    .block(theme::panel(title));

    f.render_widget(text, area);
}

fn render_cost_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = theme::panel("Cost by Project (kr thousands)");
    if app.report.projects.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No projects yet", theme::dim_style())),
            Line::from(Span::styled(
                "Create one with :add-project or :import a CSV",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = app
        .report
        .projects
        .iter()
        .take(MAX_BARS)
        .map(|row| {
            let thousands = (row.total_cost / rust_decimal::Decimal::ONE_THOUSAND)
                .round()
                .to_u64()
                .unwrap_or(0);
            let color = theme::allocation_color(alloc::to_f64(row.allocated_percentage));
            Bar::default()
                .value(thousands)
                .label(Line::from(truncate(&row.name, 10)))
                .style(Style::default().fg(color))
                .value_style(
                    Style::default()
                        .fg(theme::HEADER_BG)
                        .bg(color)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1);

    f.render_widget(chart, area);
}

fn render_needs_allocation(f: &mut Frame, area: Rect, app: &App) {
    let incomplete: Vec<ListItem> = app
        .report
        .incomplete_projects()
        .map(|row| {
            let pct = alloc::to_f64(row.allocated_percentage);
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<18}", truncate(&row.name, 17)),
                    theme::normal_style(),
                ),
                Span::styled(
                    format!("{pct:>6.2}%"),
                    Style::default().fg(theme::allocation_color(pct)),
                ),
            ]))
        })
        .collect();

    if incomplete.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Every project is fully allocated",
                Style::default().fg(theme::GREEN),
            )),
        ])
        .centered()
        .block(theme::panel("Needs Allocation"));
        f.render_widget(msg, area);
        return;
    }

    let title = format!("Needs Allocation ({})", incomplete.len());
    f.render_widget(List::new(incomplete).block(theme::panel(title)), area);
}
