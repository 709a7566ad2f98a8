use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};

use crate::tree::model::NodePath;
use crate::tui::anim::{Point, SampledEdge, SampledNode};
use crate::tui::layout::{HEIGHT, MARGIN_LEFT, MARGIN_TOP, WIDTH};

/// Node marker radius in world units.
const NODE_RADIUS: f64 = 8.0;

/// Segments per edge diagonal.
const CURVE_STEPS: usize = 16;

/// Fill color of nodes that hide a subtree.
const COLLAPSED_FILL: Color = Color::Rgb(176, 196, 222);

/// Screen region of a drawn node, for mouse hit-testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitBox {
    pub area: Rect,
    pub path: NodePath,
}

impl HitBox {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && column < self.area.x + self.area.width
            && row >= self.area.y
            && row < self.area.y + self.area.height
    }
}

#[derive(Debug)]
pub struct RenderData<'a> {
    pub nodes: &'a [SampledNode],
    pub edges: &'a [SampledEdge],
    pub board: &'a str,
    /// Moves deep the user has drilled into the tree.
    pub depth: usize,
    pub ply: u32,
    pub max_ply: u32,
    pub focused: Option<&'a [usize]>,
    pub show_labels: bool,
    pub show_board: bool,
    pub status: Option<&'a str>,
    pub loading: bool,
    pub show_help: bool,
}

/// Draw one frame. Returns the hit boxes of every drawn node so the caller
/// can resolve mouse clicks against this exact frame.
pub fn draw(frame: &mut Frame, data: &RenderData<'_>) -> Vec<HitBox> {
    let area = frame.area().inner(Margin {
        horizontal: 1,
        vertical: 0,
    });

    let title = Line::from(vec![
        Span::styled("plyview", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            format!("ply {}/{}", data.ply, data.max_ply),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled("[?] help", Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled("[q] quit", Style::default().fg(Color::DarkGray)),
    ]);
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let [panes_area, status_area] =
        Layout::vertical([Constraint::Min(6), Constraint::Length(2)]).areas(inner);

    let (tree_area, board_area) = if data.show_board {
        let [tree, board] =
            Layout::horizontal([Constraint::Min(30), Constraint::Percentage(32)]).areas(panes_area);
        (tree, Some(board))
    } else {
        (panes_area, None)
    };

    let hit_boxes = draw_tree(frame, tree_area, data);
    if let Some(board_area) = board_area {
        draw_board(frame, board_area, data.board, data.depth);
    }
    draw_status(frame, status_area, data);

    if data.show_help {
        draw_help(frame, frame.area());
    }

    hit_boxes
}

fn draw_tree(frame: &mut Frame, area: Rect, data: &RenderData<'_>) -> Vec<HitBox> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" tree ");
    let canvas_area = block.inner(area);

    let char_world = if canvas_area.width > 0 {
        WIDTH / canvas_area.width as f64
    } else {
        WIDTH
    };

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, WIDTH])
        .y_bounds([0.0, HEIGHT])
        .paint(|ctx| {
            for edge in data.edges {
                draw_diagonal(ctx, edge.geom.0, edge.geom.1, diverging_color(edge.score));
            }
            ctx.layer();
            for node in data.nodes {
                let (cx, cy) = to_canvas(node.pos);
                let focused = data.focused.is_some_and(|f| f == node.path.as_slice());
                let color = if focused {
                    Color::Yellow
                } else if node.has_hidden {
                    COLLAPSED_FILL
                } else if node.exiting {
                    Color::DarkGray
                } else {
                    Color::White
                };
                ctx.draw(&Circle {
                    x: cx,
                    y: cy,
                    radius: NODE_RADIUS * node.radius_factor,
                    color,
                });
                if data.show_labels && node.label_visible {
                    let style = if focused {
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    // Leaves label to the right of the marker, inner nodes
                    // to the left, clear of their subtree.
                    let (lx, ly) = if node.is_leaf || node.has_hidden {
                        (cx + NODE_RADIUS + char_world, cy)
                    } else {
                        let width = node.label.chars().count() as f64 * char_world;
                        (cx - NODE_RADIUS - char_world - width, cy)
                    };
                    ctx.print(lx, ly, Line::styled(node.label.clone(), style));
                }
            }
        });
    frame.render_widget(canvas, area);

    data.nodes
        .iter()
        .filter(|n| !n.exiting)
        .filter_map(|n| {
            let cell = cell_for(n.pos, canvas_area)?;
            Some(HitBox {
                area: Rect {
                    x: cell.0.saturating_sub(1).max(canvas_area.x),
                    y: cell.1,
                    width: 3,
                    height: 1,
                },
                path: n.path.clone(),
            })
        })
        .collect()
}

fn draw_board(frame: &mut Frame, area: Rect, board: &str, depth: usize) {
    let title = if depth == 0 {
        " position ".to_string()
    } else {
        format!(" position · {depth} deep ")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
        .padding(Padding::new(1, 1, 0, 0));
    let paragraph = Paragraph::new(board.to_string())
        .block(block)
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, area: Rect, data: &RenderData<'_>) {
    let hints =
        "[click/Enter] toggle  [j/k/Tab] focus  [p/n] ply  [e] expand all  [s] setup  [q] quit";
    let mut lines = vec![Line::from(Span::styled(
        hints,
        Style::default().fg(Color::DarkGray),
    ))];
    if data.loading {
        lines.push(Line::from(Span::styled(
            format!("loading ply {}...", data.ply),
            Style::default().fg(Color::Cyan),
        )));
    } else if let Some(message) = data.status {
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(Color::Yellow),
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 60, 60);
    frame.render_widget(Clear, popup);
    let rows = [
        ("click / Enter / Space", "expand or collapse the node"),
        ("arrows / hjkl", "move focus between visible nodes"),
        ("Tab", "cycle focus in tree order"),
        ("n / ]", "next ply"),
        ("p / [", "previous ply"),
        ("e", "expand the whole tree"),
        ("s", "settings"),
        ("?", "toggle this help"),
        ("q", "quit"),
    ];
    let mut lines = vec![
        Line::from(Span::styled(
            "Keys",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (key, what) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{key:<22}"), Style::default().fg(Color::Cyan)),
            Span::styled(what, Style::default().fg(Color::Gray)),
        ]));
    }
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" help ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Yellow))
                .padding(Padding::new(2, 2, 1, 1)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}

/// Cubic diagonal between two nodes, drawn as short segments.
fn draw_diagonal(ctx: &mut Context<'_>, s: Point, t: Point, color: Color) {
    let mid = (s.1 + t.1) / 2.0;
    let p0 = s;
    let p1 = (s.0, mid);
    let p2 = (t.0, mid);
    let p3 = t;

    let mut prev = to_canvas(p0);
    for step in 1..=CURVE_STEPS {
        let u = step as f64 / CURVE_STEPS as f64;
        let point = to_canvas(bezier(p0, p1, p2, p3, u));
        ctx.draw(&CanvasLine {
            x1: prev.0,
            y1: prev.1,
            x2: point.0,
            y2: point.1,
            color,
        });
        prev = point;
    }
}

fn bezier(p0: Point, p1: Point, p2: Point, p3: Point, u: f64) -> Point {
    let v = 1.0 - u;
    let blend = |a: f64, b: f64, c: f64, d: f64| {
        v * v * v * a + 3.0 * v * v * u * b + 3.0 * v * u * u * c + u * u * u * d
    };
    (
        blend(p0.0, p1.0, p2.0, p3.0),
        blend(p0.1, p1.1, p2.1, p3.1),
    )
}

/// World position to canvas coordinates: depth runs rightward, the vertical
/// axis is flipped because the canvas y axis points up.
fn to_canvas(p: Point) -> (f64, f64) {
    (MARGIN_LEFT + p.1, HEIGHT - MARGIN_TOP - p.0)
}

/// Terminal cell of a world position inside `area`, if it falls within.
fn cell_for(p: Point, area: Rect) -> Option<(u16, u16)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    let (cx, cy) = to_canvas(p);
    let col_f = cx / WIDTH * area.width as f64;
    let row_f = (HEIGHT - cy) / HEIGHT * area.height as f64;
    if !(0.0..area.width as f64).contains(&col_f) || !(0.0..area.height as f64).contains(&row_f) {
        return None;
    }
    Some((area.x + col_f as u16, area.y + row_f as u16))
}

/// Diverging red-to-blue scale over [0, 1], centered on a neutral midpoint.
pub fn diverging_color(score: f64) -> Color {
    const LOW: (f64, f64, f64) = (178.0, 24.0, 43.0);
    const MID: (f64, f64, f64) = (247.0, 247.0, 247.0);
    const HIGH: (f64, f64, f64) = (33.0, 102.0, 172.0);

    let t = score.clamp(0.0, 1.0);
    let (a, b, u) = if t < 0.5 {
        (LOW, MID, t * 2.0)
    } else {
        (MID, HIGH, (t - 0.5) * 2.0)
    };
    let channel = |x: f64, y: f64| (x + (y - x) * u).round() as u8;
    Color::Rgb(channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2))
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverging_scale_is_red_white_blue() {
        let Color::Rgb(r, _, b) = diverging_color(0.0) else {
            panic!("expected rgb");
        };
        assert!(r > b, "low scores should lean red");

        let Color::Rgb(r, g, b) = diverging_color(0.5) else {
            panic!("expected rgb");
        };
        assert_eq!((r, g, b), (247, 247, 247));

        let Color::Rgb(r, _, b) = diverging_color(1.0) else {
            panic!("expected rgb");
        };
        assert!(b > r, "high scores should lean blue");
    }

    #[test]
    fn diverging_scale_clamps_out_of_range_scores() {
        assert_eq!(diverging_color(-3.0), diverging_color(0.0));
        assert_eq!(diverging_color(42.0), diverging_color(1.0));
    }

    #[test]
    fn bezier_endpoints_are_exact() {
        let p0 = (0.0, 0.0);
        let p3 = (100.0, 50.0);
        assert_eq!(bezier(p0, (0.0, 25.0), (100.0, 25.0), p3, 0.0), p0);
        assert_eq!(bezier(p0, (0.0, 25.0), (100.0, 25.0), p3, 1.0), p3);
    }

    #[test]
    fn cell_for_maps_the_world_into_the_area() {
        let area = Rect {
            x: 2,
            y: 1,
            width: 90,
            height: 30,
        };
        let (col, row) = cell_for((0.0, 0.0), area).unwrap();
        assert!(col >= area.x && col < area.x + area.width);
        assert!(row >= area.y && row < area.y + area.height);

        let top = cell_for((0.0, 0.0), area).unwrap();
        let bottom = cell_for((800.0, 0.0), area).unwrap();
        assert!(top.1 < bottom.1, "larger x should land further down");

        let left = cell_for((0.0, 0.0), area).unwrap();
        let right = cell_for((0.0, 700.0), area).unwrap();
        assert!(left.0 < right.0, "larger y should land further right");
    }

    #[test]
    fn cell_for_degenerate_area_is_none() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
        assert!(cell_for((0.0, 0.0), area).is_none());
    }

    #[test]
    fn hitbox_contains_its_own_cells() {
        let hit = HitBox {
            area: Rect {
                x: 4,
                y: 2,
                width: 3,
                height: 1,
            },
            path: vec![0],
        };
        assert!(hit.contains(4, 2));
        assert!(hit.contains(6, 2));
        assert!(!hit.contains(7, 2));
        assert!(!hit.contains(5, 3));
    }
}
