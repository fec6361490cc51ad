use crate::config::DEFAULT_SCALE;
use crate::domain::ScanSnapshot;
use crate::geometry::{
    arc_points, classify, gate_arcs, PlottedPoint, CONE_HALF_ANGLE_DEG, GATE_ARC_CENTERS_DEG,
};
use crate::ui::widgets::legend::{render_legend, LEGEND_WIDTH};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine, Points};
use ratatui::widgets::Clear;
use ratatui::Frame;

/// Reference rings, in canonical distance units.
pub const REFERENCE_RADII: [f64; 4] = [50.0, 100.0, 150.0, 200.0];

const ARC_STEPS: usize = 20;
const VIEW_MARGIN: f64 = 1.1;

/// Colours and magnification for the radar. The only knobs the render loop has.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarStyle {
    pub scale: f64,
    /// Half-width of the visible canvas in render units.
    pub view_extent: f64,
    pub unit_label: String,
    pub background: Color,
    pub grid: Color,
    pub label: Color,
    pub gate: Color,
    pub in_zone: Color,
    pub out_of_zone: Color,
}

impl RadarStyle {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            view_extent: REFERENCE_RADII[REFERENCE_RADII.len() - 1] * DEFAULT_SCALE * VIEW_MARGIN,
            unit_label: "cm".to_string(),
            background: Color::Black,
            grid: Color::DarkGray,
            label: Color::Gray,
            gate: Color::Yellow,
            in_zone: Color::Red,
            out_of_zone: Color::Green,
        }
    }
}

impl Default for RadarStyle {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}

/// Largest area inside `area` that looks square on a terminal with 2:1 cells.
pub fn radar_square(area: Rect) -> Rect {
    let width = area.width.min(area.height.saturating_mul(2));
    let height = (width / 2).min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Splits the radar panel into the canvas area and, when there is room, the legend.
pub fn radar_layout(area: Rect) -> (Rect, Option<Rect>) {
    if area.width < LEGEND_WIDTH * 2 {
        return (area, None);
    }
    let split = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(LEGEND_WIDTH)])
        .split(area);
    (split[0], Some(split[1]))
}

/// Clears `area` and redraws the whole radar from `snapshot`.
///
/// Output depends only on the arguments. Without a snapshot only the background
/// and reference grid are drawn; an area too small to hold the canvas is left
/// blank.
pub fn render_radar(
    f: &mut Frame<'_>,
    area: Rect,
    snapshot: Option<&ScanSnapshot>,
    style: &RadarStyle,
) {
    f.render_widget(Clear, area);
    if area.width < 8 || area.height < 4 {
        return;
    }

    let (canvas_area, legend_area) = radar_layout(area);
    render_canvas(f, radar_square(canvas_area), snapshot, style);
    if let Some(legend_area) = legend_area {
        render_legend(f, legend_area, snapshot, style);
    }
}

/// Canvas coordinates of the plotted points, split into (in zone, outside).
pub fn split_by_zone(plotted: &[PlottedPoint]) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let mut inside = Vec::new();
    let mut outside = Vec::new();
    for point in plotted {
        let coords = (point.position.x, point.position.y);
        if point.in_zone {
            inside.push(coords);
        } else {
            outside.push(coords);
        }
    }
    (inside, outside)
}

fn render_canvas(
    f: &mut Frame<'_>,
    square: Rect,
    snapshot: Option<&ScanSnapshot>,
    style: &RadarStyle,
) {
    let plotted = snapshot.map(|s| classify(s, style.scale)).unwrap_or_default();
    let (inside, outside) = split_by_zone(&plotted);
    let gate_radius = snapshot.map(|s| s.gate_threshold * style.scale);
    let extent = style.view_extent;

    f.render_widget(
        Canvas::default()
            .background_color(style.background)
            .marker(Marker::Braille)
            .paint(|ctx| {
                for radius in REFERENCE_RADII {
                    ctx.draw(&Circle {
                        x: 0.0,
                        y: 0.0,
                        radius: radius * style.scale,
                        color: style.grid,
                    });
                }

                let outer = REFERENCE_RADII[REFERENCE_RADII.len() - 1] * style.scale;
                ctx.draw(&CanvasLine {
                    x1: -outer,
                    y1: 0.0,
                    x2: outer,
                    y2: 0.0,
                    color: style.grid,
                });
                ctx.draw(&CanvasLine {
                    x1: 0.0,
                    y1: -outer,
                    x2: 0.0,
                    y2: outer,
                    color: style.grid,
                });

                if let Some(gate_radius) = gate_radius {
                    for arc in gate_arcs(gate_radius, ARC_STEPS) {
                        for pair in arc.windows(2) {
                            ctx.draw(&CanvasLine {
                                x1: pair[0].x,
                                y1: pair[0].y,
                                x2: pair[1].x,
                                y2: pair[1].y,
                                color: style.gate,
                            });
                        }
                    }

                    // cone edges
                    for center in GATE_ARC_CENTERS_DEG {
                        let edges = arc_points(center, CONE_HALF_ANGLE_DEG, gate_radius, 1);
                        for edge in edges {
                            ctx.draw(&CanvasLine {
                                x1: 0.0,
                                y1: 0.0,
                                x2: edge.x,
                                y2: edge.y,
                                color: style.gate,
                            });
                        }
                    }
                }

                ctx.layer();
                ctx.draw(&Points {
                    coords: &outside,
                    color: style.out_of_zone,
                });
                ctx.draw(&Points {
                    coords: &inside,
                    color: style.in_zone,
                });

                for radius in REFERENCE_RADII {
                    ctx.print(
                        2.0,
                        -(radius * style.scale),
                        Span::styled(format!("{radius:.0}"), Style::default().fg(style.label)),
                    );
                }
            })
            .x_bounds([-extent, extent])
            .y_bounds([-extent, extent]),
        square,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScanPoint, UnitScale};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;

    fn draw(snapshot: Option<&ScanSnapshot>, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| render_radar(f, f.area(), snapshot, &RadarStyle::default()))
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn scenario() -> ScanSnapshot {
        ScanSnapshot::new(
            vec![ScanPoint::polar(0.0, 50.0), ScanPoint::polar(180.0, 50.0)],
            UnitScale::default().threshold(800.0),
        )
    }

    fn columns_with_color(buffer: &Buffer, area: Rect, color: Color) -> Vec<u16> {
        let mut columns = Vec::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if buffer[(x, y)].fg == color && buffer[(x, y)].symbol() != " " {
                    columns.push(x);
                }
            }
        }
        columns
    }

    #[test]
    fn identical_inputs_give_identical_buffers() {
        let snapshot = scenario();
        assert_eq!(draw(Some(&snapshot), 80, 30), draw(Some(&snapshot), 80, 30));
    }

    #[test]
    fn redraw_leaves_no_artifacts() {
        let snapshot = scenario();
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let style = RadarStyle::default();
        terminal
            .draw(|f| render_radar(f, f.area(), Some(&snapshot), &style))
            .unwrap();
        terminal
            .draw(|f| render_radar(f, f.area(), None, &style))
            .unwrap();

        assert_eq!(terminal.backend().buffer(), &draw(None, 80, 30));
    }

    #[test]
    fn scenario_colors_points_by_zone() {
        let buffer = draw(Some(&scenario()), 80, 30);
        let style = RadarStyle::default();
        let (canvas_area, _) = radar_layout(Rect::new(0, 0, 80, 30));
        let square = radar_square(canvas_area);
        let center = square.x + square.width / 2;

        let red = columns_with_color(&buffer, square, style.in_zone);
        let green = columns_with_color(&buffer, square, style.out_of_zone);

        assert!(!red.is_empty(), "in-zone point missing");
        assert!(!green.is_empty(), "out-of-zone point missing");
        assert!(red.iter().all(|&x| x > center));
        assert!(green.iter().all(|&x| x < center));
    }

    #[test]
    fn empty_radar_draws_grid_only() {
        let buffer = draw(None, 80, 30);
        let style = RadarStyle::default();
        let square = radar_square(radar_layout(Rect::new(0, 0, 80, 30)).0);

        assert!(!columns_with_color(&buffer, square, style.grid).is_empty());
        assert!(columns_with_color(&buffer, square, style.gate).is_empty());
        assert!(columns_with_color(&buffer, square, style.in_zone).is_empty());
    }

    #[test]
    fn gate_arc_is_drawn_with_snapshot() {
        let buffer = draw(Some(&scenario()), 80, 30);
        let style = RadarStyle::default();
        let square = radar_square(radar_layout(Rect::new(0, 0, 80, 30)).0);
        assert!(!columns_with_color(&buffer, square, style.gate).is_empty());
    }

    #[test]
    fn split_keeps_canvas_coordinates_per_zone() {
        let plotted = classify(&scenario(), 2.0);
        let (inside, outside) = split_by_zone(&plotted);

        assert_eq!(inside.len(), 1);
        assert_eq!(outside.len(), 1);
        assert!((inside[0].0 - 100.0).abs() < 1e-9);
        assert!((outside[0].0 + 100.0).abs() < 1e-9);
        assert!(inside[0].1.abs() < 1e-9);
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let snapshot = scenario();
        let _ = draw(Some(&snapshot), 4, 2);
        let _ = draw(None, 1, 1);
    }

    #[test]
    fn square_keeps_terminal_aspect() {
        let square = radar_square(Rect::new(0, 0, 100, 20));
        assert_eq!(square, Rect::new(30, 0, 40, 20));
    }
}
