use crate::domain::ScanSnapshot;
use crate::geometry::{suggest_threshold, CONE_HALF_ANGLE_DEG};
use crate::ui::widgets::radar::{RadarStyle, REFERENCE_RADII};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub const LEGEND_WIDTH: u16 = 24;

pub fn legend_lines(snapshot: Option<&ScanSnapshot>, style: &RadarStyle) -> Vec<TextLine<'static>> {
    let dim = Style::default().fg(Color::White).add_modifier(Modifier::DIM);
    let unit = &style.unit_label;

    let mut lines = vec![TextLine::from(Span::styled("Rings", Style::default().fg(Color::Gray)))];
    for radius in REFERENCE_RADII {
        lines.push(TextLine::from(vec![
            Span::styled("○ ", Style::default().fg(style.grid)),
            Span::styled(format!("{radius:.0} {unit}"), dim),
        ]));
    }

    lines.push(TextLine::from(""));
    lines.push(TextLine::from(vec![
        Span::styled("● ", Style::default().fg(style.in_zone)),
        Span::styled("In gate zone", dim),
    ]));
    lines.push(TextLine::from(vec![
        Span::styled("● ", Style::default().fg(style.out_of_zone)),
        Span::styled("Outside", dim),
    ]));
    lines.push(TextLine::from(vec![
        Span::styled("◠ ", Style::default().fg(style.gate)),
        Span::styled(format!("Cone ±{CONE_HALF_ANGLE_DEG:.0}°"), dim),
    ]));

    lines.push(TextLine::from(""));
    if let Some(snapshot) = snapshot {
        lines.push(TextLine::from(Span::styled(
            format!("Gate {:.1} {unit}", snapshot.gate_threshold),
            Style::default().fg(style.gate),
        )));
        if let Some(suggested) = suggest_threshold(&snapshot.points) {
            lines.push(TextLine::from(Span::styled(
                format!("Calibrate {suggested:.1} {unit}"),
                dim,
            )));
        }
    }
    lines.push(TextLine::from(Span::styled(
        format!("Scale ×{:.1}", style.scale),
        dim,
    )));

    lines
}

pub fn render_legend(
    f: &mut Frame<'_>,
    area: Rect,
    snapshot: Option<&ScanSnapshot>,
    style: &RadarStyle,
) {
    let block = Block::default()
        .title("Legend")
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(Text::from(legend_lines(snapshot, style)))
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
