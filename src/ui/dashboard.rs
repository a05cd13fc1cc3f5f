//! Dashboard screen rendering
//!
//! Two stacked panels: the current-weather panel on top and the grid of day
//! cards below it, wrapped into bands of `columns` cards. A footer carries the
//! key hints, the status line and data freshness.

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, StatusLevel};
use crate::format::{with_unit, CELSIUS, MISSING};
use crate::presentation::{CurrentSlot, Dashboard, DailySlot};

/// Current panel height: heading plus five values, inside a border
const CURRENT_PANEL_HEIGHT: u16 = 8;
/// Day card height: date plus four values, inside a border
const DAY_CARD_HEIGHT: u16 = 7;
/// Label column width inside the current panel
const CURRENT_LABEL_WIDTH: usize = 16;
/// Label column width inside a day card
const CARD_LABEL_WIDTH: usize = 10;

/// Renders the dashboard screen
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),                    // Header
            Constraint::Length(CURRENT_PANEL_HEIGHT), // Current weather
            Constraint::Min(DAY_CARD_HEIGHT),         // Day cards
            Constraint::Length(1),                    // Footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_current(frame, app.dashboard.current(), chunks[1]);
    render_daily(frame, &app.dashboard, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let separator = "─".repeat(usize::from(area.width.saturating_sub(2)));
    let lines = vec![
        Line::from(vec![
            Span::styled(
                "WXPANEL",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(app.location_label.clone(), Style::default().fg(Color::White)),
        ]),
        Line::from(Span::styled(
            separator,
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_current(frame: &mut Frame, slot: &CurrentSlot, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        CurrentSlot::HEADING,
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(
        slot.rows()
            .into_iter()
            .map(|(label, value)| value_line(label, value.to_string(), CURRENT_LABEL_WIDTH)),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_daily(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let bands = dashboard.bands();
    if bands.is_empty() {
        let paragraph = Paragraph::new("No forecast days requested")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    // Bands that do not fit are clipped
    let mut constraints: Vec<Constraint> = bands
        .iter()
        .map(|_| Constraint::Length(DAY_CARD_HEIGHT))
        .collect();
    constraints.push(Constraint::Min(0));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let columns = dashboard.config().layout.columns;
    let column_count = u32::try_from(columns).unwrap_or(u32::MAX);

    for (band, row_area) in bands.iter().zip(rows.iter()) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..columns).map(|_| Constraint::Ratio(1, column_count)))
            .split(*row_area);

        for slot in band {
            if let Some(cell) = cells.get(slot.position().column) {
                render_day_card(frame, slot, *cell);
            }
        }
    }
}

fn render_day_card(frame: &mut Frame, slot: &DailySlot, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        slot.date_label(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];
    lines.extend(
        slot.rows()
            .into_iter()
            .map(|(label, value)| value_line(label, temperature(value), CARD_LABEL_WIDTH)),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled("[q]", Style::default().fg(Color::Yellow)),
        Span::raw(" Close  "),
        Span::styled("[r]", Style::default().fg(Color::Yellow)),
        Span::raw(" Refresh  "),
        Span::styled("[?]", Style::default().fg(Color::Yellow)),
        Span::raw(" Help"),
    ];

    if let Some(ref status) = app.status {
        let color = match status.level {
            StatusLevel::Info => Color::DarkGray,
            StatusLevel::Warning => Color::Yellow,
            StatusLevel::Error => Color::Red,
        };
        spans.push(Span::styled(
            format!(" │ {}", status.text),
            Style::default().fg(color),
        ));
    } else if let Some(fetched_at) = app.dashboard.updated_at() {
        let now = Utc::now();
        let (suffix, color) = if app.is_stale(now) {
            (" (stale)", Color::Yellow)
        } else {
            ("", Color::DarkGray)
        };
        spans.push(Span::styled(
            format!(" │ Data: {}{}", freshness(now - fetched_at), suffix),
            Style::default().fg(color),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

/// "just now", "12m ago" or "3h ago"
fn freshness(elapsed: chrono::Duration) -> String {
    let mins_ago = elapsed.num_minutes();
    if mins_ago < 1 {
        "just now".to_string()
    } else if mins_ago < 60 {
        format!("{}m ago", mins_ago)
    } else {
        format!("{}h ago", elapsed.num_hours())
    }
}

fn value_line(label: &str, value: String, label_width: usize) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:<width$}", label, width = label_width),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

/// Daily values are bare numbers; the unit is added for display only
fn temperature(value: &str) -> String {
    if value == MISSING {
        MISSING.to_string()
    } else {
        with_unit(value, CELSIUS)
    }
}

/// Renders the dashboard as plain text, used by `--once`
///
/// The current panel comes first, then one block per band with the day cards
/// side by side.
pub fn to_plain_text(dashboard: &Dashboard, location_label: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("wxpanel  {}\n\n", location_label));

    out.push_str(CurrentSlot::HEADING);
    out.push('\n');
    for (label, value) in dashboard.current().rows() {
        out.push_str(&format!(
            "  {:<width$}{}\n",
            label,
            value,
            width = CURRENT_LABEL_WIDTH
        ));
    }

    for band in dashboard.bands() {
        let cards: Vec<Vec<String>> = band.iter().map(|slot| plain_card(slot)).collect();
        let card_width = cards
            .iter()
            .flatten()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            + 3;

        out.push('\n');
        let line_count = cards.first().map_or(0, Vec::len);
        for i in 0..line_count {
            let line: String = cards
                .iter()
                .map(|card| format!("{:<width$}", card[i], width = card_width))
                .collect();
            out.push_str("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    out
}

fn plain_card(slot: &DailySlot) -> Vec<String> {
    let mut lines = vec![slot.date_label()];
    lines.extend(slot.rows().into_iter().map(|(label, value)| {
        format!(
            "{:<width$}{}",
            label,
            temperature(value),
            width = CARD_LABEL_WIDTH
        )
    }));
    lines
}
