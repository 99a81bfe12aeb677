use chrono::{Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs},
    Frame,
};

use crate::models::{Metric, RankedEntry, RankingView};
use crate::tui::app::{App, Status};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(frame.size());

    let title = Paragraph::new(format!(
        "🪨 {} LEADERBOARD",
        app.metric.display_name().to_uppercase()
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    draw_tabs(frame, app, chunks[1]);
    draw_stats(frame, app.view.as_ref(), chunks[2]);

    match (&app.status, &app.view) {
        (Status::Loading, _) => draw_message(frame, chunks[3], "Loading leaderboard...", Color::Cyan),
        (Status::Empty, _) => draw_message(
            frame,
            chunks[3],
            "No explorers yet. Be the first to collect a sample!",
            Color::Gray,
        ),
        (Status::Error(message), None) => draw_message(
            frame,
            chunks[3],
            &format!("⚠️ {}. Please check your connection and try again.", message),
            Color::Red,
        ),
        (_, Some(view)) => draw_table(frame, app, view, chunks[3]),
        (Status::Ready, None) => draw_message(frame, chunks[3], "Loading leaderboard...", Color::Cyan),
    }

    draw_footer(frame, app, chunks[4]);
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let metrics = Metric::all();
    let titles: Vec<Line> = metrics
        .iter()
        .enumerate()
        .map(|(i, m)| Line::from(format!("{} {}", i + 1, m.display_name())))
        .collect();
    let selected = metrics.iter().position(|m| *m == app.metric).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title("Metric (←/→ or 1-7)"))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn draw_stats(frame: &mut Frame, view: Option<&RankingView>, area: Rect) {
    let (count, top, avg) = view
        .map(|v| (v.count, v.top_value, v.average_value))
        .unwrap_or((0, 0.0, 0.0));

    let stats = Paragraph::new(Line::from(vec![
        Span::raw("Explorers: "),
        Span::styled(count.to_string(), Style::default().fg(Color::Cyan)),
        Span::raw("   Top score: "),
        Span::styled(format!("{:.1}", top), Style::default().fg(Color::Yellow)),
        Span::raw("   Average: "),
        Span::styled(format!("{:.1}", avg), Style::default().fg(Color::Green)),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(stats, area);
}

fn draw_table(frame: &mut Frame, app: &App, view: &RankingView, area: Rect) {
    let now = Utc::now();
    let rows: Vec<Row> = view.entries().map(|entry| row_for(&entry, now)).collect();

    let header = Row::new(vec![
        Cell::from("Rank"),
        Cell::from("Explorer"),
        Cell::from(view.metric.score_header()),
        Cell::from("Samples"),
        Cell::from("Joined"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Min(24),
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Explorers"))
    .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn row_for<'a>(entry: &RankedEntry<'a>, now: chrono::DateTime<Utc>) -> Row<'a> {
    let joined = match entry.days_since_joined(now) {
        Some(0) => "today".to_string(),
        Some(days) => format!("{}d ago", days),
        None => "-".to_string(),
    };
    let explorer = format!(
        "[{}] {} <{}>",
        entry.record.avatar_initial(),
        entry.record.display_name,
        entry.record.email
    );

    let style = match entry.rank {
        1 => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        2 => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        3 => Style::default().fg(Color::Rgb(205, 127, 50)).add_modifier(Modifier::BOLD),
        _ => Style::default(),
    };

    Row::new(vec![
        Cell::from(entry.rank.to_string()),
        Cell::from(explorer),
        Cell::from(format!("{:.1}", entry.score)),
        Cell::from(entry.samples_label()),
        Cell::from(joined),
    ])
    .style(style)
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let updated = app
        .last_updated
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());

    let mut spans = vec![
        Span::raw("Last updated: "),
        Span::styled(updated, Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled("r", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(if app.refreshing { " refreshing..." } else { " refresh" }),
        Span::raw(" | "),
        Span::styled("q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" quit"),
    ];
    if let Status::Error(message) = &app.status {
        if app.view.is_some() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(message.clone(), Style::default().fg(Color::Red)));
        }
    }

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn draw_message(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let inner = centered_rect(80, 40, area);
    let message = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(Clear, inner);
    frame.render_widget(message, inner);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
