use crate::app::App;
use crate::messaging::WindowRole;
use crate::ui::widgets::popup::centered_rect;
use crate::ui::widgets::radar::{radar_layout, radar_square, render_radar, RadarStyle};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, WhichUse, BRAILLE_SIX};

pub fn render_main(app: &App, f: &mut Frame<'_>) {
    let main_layout = build_main_layout(app, f);

    render_title_section(app, f, main_layout[0]);
    if let Some(error) = app.view.error.as_deref() {
        render_error_banner(error, f, main_layout[1]);
    }
    render_content_section(app, f, main_layout[2]);
    render_status_section(app, f, main_layout[3]);
    render_shortcuts(f, main_layout[4]);

    if app.show_help {
        render_help_popup(f, f.area());
    }
}

fn build_main_layout(app: &App, f: &Frame<'_>) -> Vec<Rect> {
    let banner_height = if app.view.error.is_some() { 3 } else { 0 };

    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Title area
            Constraint::Length(banner_height), // Error banner
            Constraint::Min(8),                // Radar
            Constraint::Length(3),             // Status area
            Constraint::Length(1),             // Shortcuts hint
        ])
        .split(f.area().inner(Margin::new(1, 0)))
        .to_vec()
}

fn render_title_section(app: &App, f: &mut Frame<'_>, area: Rect) {
    let title_block = Block::default()
        .title("== Lidar Gate ==")
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let role = match app.role {
        WindowRole::Primary => "primary",
        WindowRole::Secondary => "secondary",
    };
    let (state_label, state_color) = if app.is_active() {
        ("LIVE", Color::Green)
    } else {
        ("PAUSED", Color::Yellow)
    };
    let (gate_label, gate_color) = if app.view.in_zone > 0 {
        ("GATE TRIGGERED", Color::Red)
    } else {
        ("GATE CLEAR", Color::Green)
    };

    let line = TextLine::from(vec![
        Span::styled(
            state_label,
            Style::default().fg(state_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            gate_label,
            Style::default().fg(gate_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "{} ({role}, every {} ms)",
                app.config.scan_url(),
                app.poll_interval().as_millis()
            ),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(title_block);
    f.render_widget(paragraph, area);
}

fn render_error_banner(error: &str, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let paragraph = Paragraph::new(Span::styled(
        error.to_string(),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ))
    .block(block)
    .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_content_section(app: &App, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .title(" Radar ")
        .title_style(Style::default().fg(Color::Green))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let style = RadarStyle::new(app.config.scale);
    render_radar(f, inner, app.view.snapshot.as_ref(), &style);

    if app.is_active() && app.view.is_waiting() {
        let canvas = radar_square(radar_layout(inner).0);
        let spinner_area = Rect {
            x: canvas.x + 1,
            y: canvas.y,
            width: canvas.width.saturating_sub(2),
            height: canvas.height.min(1),
        };
        let throbber = Throbber::default()
            .label("Waiting for scan data...")
            .style(Style::default().fg(Color::Cyan))
            .throbber_set(BRAILLE_SIX)
            .use_type(WhichUse::Spin);
        let mut state = app.throbber.clone();
        f.render_stateful_widget(throbber, spinner_area, &mut state);
    }
}

fn render_status_section(app: &App, f: &mut Frame<'_>, area: Rect) {
    let status_block = Block::default()
        .title(" Status ")
        .title_style(Style::default().fg(Color::Yellow))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White);

    let received = app.view.snapshot.as_ref().map_or_else(
        || "-".to_string(),
        |snapshot| snapshot.received_at.format("%H:%M:%S%.3f").to_string(),
    );
    let detection = app.view.last_detection.map_or_else(
        || "never".to_string(),
        |at| at.format("%H:%M:%S%.3f").to_string(),
    );

    let mut spans = vec![
        Span::styled("Points ", label),
        Span::styled(app.view.points().to_string(), value),
        Span::styled("  In zone ", label),
        Span::styled(app.view.in_zone.to_string(), value),
        Span::styled("  Scan ", label),
        Span::styled(received, value),
        Span::styled("  Last detection ", label),
        Span::styled(detection, value),
    ];
    if !app.status_message.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            app.status_message.as_str(),
            Style::default().fg(Color::Green),
        ));
    }

    let status_paragraph = Paragraph::new(TextLine::from(spans))
        .block(status_block)
        .wrap(Wrap { trim: true });
    f.render_widget(status_paragraph, area);
}

fn render_shortcuts(f: &mut Frame<'_>, area: Rect) {
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let shortcuts = TextLine::from(vec![
        Span::styled("q", key),
        Span::raw(" quit  "),
        Span::styled("p", key),
        Span::raw(" pause/resume  "),
        Span::styled("?", key),
        Span::raw(" help"),
    ]);
    let shortcuts_paragraph = Paragraph::new(shortcuts).alignment(Alignment::Center);
    f.render_widget(shortcuts_paragraph, area);
}

fn render_help_popup(f: &mut Frame<'_>, area: Rect) {
    let popup_area = centered_rect(80, 80, area);
    f.render_widget(Clear, popup_area);

    let help_block = Block::default()
        .title("== Help & Keyboard Shortcuts ==")
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let help_paragraph = Paragraph::new(Text::from(build_help_lines()))
        .block(help_block)
        .wrap(Wrap { trim: true });

    f.render_widget(help_paragraph, popup_area);
}

fn build_help_lines() -> Vec<TextLine<'static>> {
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        TextLine::from(vec![Span::styled(
            "Lidar Gate Viewer",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]),
        TextLine::from(""),
        TextLine::from(
            "Points inside the gate radius and within 10° of straight ahead are drawn in red.",
        ),
        TextLine::from(""),
        TextLine::from(vec![Span::styled(
            "Keyboard Shortcuts:",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        TextLine::from(vec![Span::styled("  ? / F1", key), Span::raw(" - Toggle this help popup")]),
        TextLine::from(vec![Span::styled("  p", key), Span::raw(" - Pause or resume polling")]),
        TextLine::from(vec![Span::styled("  q / Esc", key), Span::raw(" - Quit")]),
        TextLine::from(""),
    ];

    let help_text = crate::cli::CliArgs::help_text();
    for line in help_text.lines() {
        lines.push(TextLine::from(line.to_string()));
    }

    lines
}
