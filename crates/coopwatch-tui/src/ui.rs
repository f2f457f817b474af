//! Dashboard rendering.
//!
//! Pure drawing over the [`App`] state: a header, six metric cards colored
//! by threshold status, a trend chart over the sensor history, the gas table
//! with percent-of-limit bars, and the equipment and alert panels. The
//! settings overlay renders as a centered popup on top of everything.

use ratatui::{
    prelude::*,
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, GraphType, List, ListItem, ListState,
        Paragraph, Row, Table,
    },
};
use time::OffsetDateTime;

use coopwatch_core::{AlertThresholds, GasStatus, GasThreshold, MetricStatus};
use coopwatch_types::{AlertSeverity, EquipmentStatus};

use crate::app::{App, Focus, ROW_LABELS, RowValue, SettingsOverlay};

/// Draw one frame of the dashboard.
pub fn draw(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, app, rows[0]);
    draw_metric_cards(frame, app, rows[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[2]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(middle[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(middle[1]);

    draw_chart(frame, app, left[0]);
    draw_gas_table(frame, app, left[1]);
    draw_equipment(frame, app, right[0]);
    draw_alerts(frame, app, right[1]);
    draw_footer(frame, app, rows[3]);

    if let Some(overlay) = &app.overlay {
        draw_settings_popup(frame, overlay, frame.area());
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " coopwatch ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{} birds", app.sensor.bird_count)),
        Span::raw("  |  updated "),
        Span::raw(clock(app.sensor.timestamp)),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_metric_cards(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 6); 6])
        .split(area);

    let t = &app.settings.thresholds;
    let cards = [
        (
            "Temperature",
            format!("{:.1} C", app.sensor.temperature),
            metric_color(t.temperature.evaluate(app.sensor.temperature)),
        ),
        (
            "Humidity",
            format!("{:.0} %", app.sensor.humidity),
            metric_color(t.humidity.evaluate(app.sensor.humidity)),
        ),
        (
            "Air quality",
            format!("{:.0}", app.sensor.air_quality),
            metric_color(t.air_quality.evaluate(app.sensor.air_quality)),
        ),
        (
            "Light",
            format!("{:.0} %", app.sensor.light_level),
            metric_color(t.light_level.evaluate(app.sensor.light_level)),
        ),
        (
            "Activity",
            format!("{:.0} %", app.sensor.activity_level),
            Color::White,
        ),
        ("Birds", format!("{}", app.sensor.bird_count), Color::White),
    ];

    for ((title, value, color), column) in cards.into_iter().zip(columns.iter()) {
        let card = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(card, *column);
    }
}

fn draw_chart(frame: &mut Frame, app: &App, area: Rect) {
    let temperature: Vec<(f64, f64)> = series(app, |s| s.temperature);
    let humidity: Vec<(f64, f64)> = series(app, |s| s.humidity);
    let activity: Vec<(f64, f64)> = series(app, |s| s.activity_level);
    let span = app.history.len().max(2) as f64;

    let datasets = vec![
        Dataset::default()
            .name("temp C")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&temperature),
        Dataset::default()
            .name("humidity %")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&humidity),
        Dataset::default()
            .name("activity %")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&activity),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Trends"))
        .x_axis(Axis::default().bounds([0.0, span - 1.0]))
        .y_axis(
            Axis::default()
                .bounds([0.0, 100.0])
                .labels(["0", "50", "100"]),
        );
    frame.render_widget(chart, area);
}

fn draw_gas_table(frame: &mut Frame, app: &App, area: Rect) {
    let t = &app.settings.thresholds;
    let gases = [
        ("CO", app.gas.co, t.co),
        ("CO2", app.gas.co2, t.co2),
        ("NH3", app.gas.nh3, t.nh3),
        ("H2S", app.gas.h2s, t.h2s),
    ];

    let rows: Vec<Row> = gases
        .into_iter()
        .map(|(name, value, threshold)| gas_row(name, value, threshold))
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(9),
        ],
    )
    .header(
        Row::new(["Gas", "Level", "Of limit", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Gas levels"));
    frame.render_widget(table, area);
}

fn gas_row(name: &str, value: f32, threshold: GasThreshold) -> Row<'_> {
    let status = threshold.evaluate(value);
    let percent = threshold.percent_of_limit(value);
    Row::new(vec![
        Span::raw(name.to_string()),
        Span::raw(format!("{:.1} ppm", value)),
        Span::raw(percent_bar(percent)),
        Span::styled(status.label(), Style::default().fg(gas_color(status))),
    ])
}

/// Ten-cell bar showing the fraction of the limit used.
fn percent_bar(percent: u16) -> String {
    let filled = usize::from(percent / 10).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn draw_equipment(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .equipment
        .iter()
        .map(|unit| {
            let line = Line::from(vec![
                Span::raw(format!("{:<20}", unit.name)),
                Span::styled(
                    format!("{:<9}", unit.status.to_string()),
                    Style::default().fg(status_color(unit.status)),
                ),
                Span::raw(percent_bar(u16::from(unit.power))),
                Span::raw(format!("{:>4} %", unit.power)),
            ]);
            ListItem::new(line)
        })
        .collect();

    let focused = app.focus == Focus::Equipment && app.overlay.is_none();
    let list = List::new(items)
        .block(panel_block("Equipment", focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.equipment_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_alerts(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .visible_alerts()
        .into_iter()
        .map(|alert| {
            let line = Line::from(vec![
                Span::styled(
                    format!("[{}] ", alert.severity),
                    Style::default().fg(severity_color(alert.severity)),
                ),
                Span::raw(&alert.message),
                Span::styled(
                    format!("  {} {}", alert.building, clock(alert.timestamp)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let focused = app.focus == Focus::Alerts && app.overlay.is_none();
    let list = List::new(items)
        .block(panel_block("Alerts", focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.alert_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let hints = if app.overlay.is_some() {
        "up/down select field | left/right adjust | Enter save | Esc cancel"
    } else {
        "q quit | Tab focus | t toggle | a auto | d day | n night | x dismiss | s settings"
    };
    let footer = Paragraph::new(hints)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn draw_settings_popup(frame: &mut Frame, overlay: &SettingsOverlay, area: Rect) {
    let popup = centered_rect(50, (ROW_LABELS.len() + 2) as u16, area);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = ROW_LABELS
        .iter()
        .enumerate()
        .map(|(row, label)| {
            let value = match overlay.value(row) {
                RowValue::Number(n) => format!("{:>9.1}", n),
                RowValue::Flag(true) => format!("{:>9}", "on"),
                RowValue::Flag(false) => format!("{:>9}", "off"),
            };
            ListItem::new(Line::from(format!("{:<22}{}", label, value)))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Settings "),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(overlay.cursor));
    frame.render_stateful_widget(list, popup, &mut state);
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title.to_string())
}

/// Chart series over the history ring, indexed by sample position.
fn series(app: &App, field: impl Fn(&coopwatch_types::SensorSample) -> f32) -> Vec<(f64, f64)> {
    app.history
        .iter()
        .enumerate()
        .map(|(i, sample)| (i as f64, f64::from(field(sample))))
        .collect()
}

fn clock(timestamp: OffsetDateTime) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second()
    )
}

fn metric_color(status: MetricStatus) -> Color {
    match status {
        MetricStatus::Good => Color::Green,
        MetricStatus::Warning => Color::Yellow,
    }
}

fn gas_color(status: GasStatus) -> Color {
    match status {
        GasStatus::Normal => Color::Green,
        GasStatus::Attention => Color::Yellow,
        GasStatus::Critical => Color::Red,
    }
}

fn status_color(status: EquipmentStatus) -> Color {
    match status {
        EquipmentStatus::Active => Color::Green,
        EquipmentStatus::Inactive => Color::DarkGray,
        EquipmentStatus::Auto => Color::Cyan,
    }
}

fn severity_color(severity: AlertSeverity) -> Color {
    match severity {
        AlertSeverity::Info => Color::Blue,
        AlertSeverity::Warning => Color::Yellow,
        AlertSeverity::Error => Color::Red,
    }
}

/// Centered popup rect with a fixed height and percentage width.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
