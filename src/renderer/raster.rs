//! Scene → draw ops.
//!
//! Maps the scene viewport onto the terminal grid and turns every visible
//! item outline into character `DrawOp`s. Terminal cells are twice as tall
//! as they are wide, so one scene unit spans twice as many columns as rows.

use kurbo::{BezPath, ParamCurve, Point, Rect, Shape};

use crate::graph::{Graph, ItemId};
use crate::items::{ItemStyle, Outline};
use crate::scene::CanvasScene;
use crate::types::{DrawOp, ResolvedScene, Style, TerminalContract};

/// Height of a cell in units of its width.
const CELL_ASPECT: f64 = 2.0;

/// Scene → cell coordinates for one viewport and grid.
#[derive(Debug, Clone, Copy)]
pub struct ViewMap {
    origin: Point,
    /// Cell columns per scene unit.
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl ViewMap {
    /// Fit `viewport` into a `width × height` grid, centred, keeping the
    /// aspect ratio.
    pub fn new(viewport: Rect, width: u16, height: u16) -> Self {
        let (w, h) = (f64::from(width), f64::from(height) * CELL_ASPECT);
        let (vw, vh) = (viewport.width().max(1e-9), viewport.height().max(1e-9));
        let scale = (w / vw).min(h / vh);
        ViewMap {
            origin: viewport.origin(),
            scale,
            offset_x: (w - vw * scale) / 2.0,
            offset_y: (h - vh * scale) / 2.0,
        }
    }

    /// Fractional cell position of a scene point.
    pub fn to_cell(&self, p: Point) -> Point {
        let d = p - self.origin;
        Point::new(
            d.x * self.scale + self.offset_x,
            (d.y * self.scale + self.offset_y) / CELL_ASPECT,
        )
    }

    /// Cell columns per scene unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

pub struct Rasterizer;

impl Rasterizer {
    /// Draw every visible scene item, plus the titles on the top row.
    pub fn resolve(
        graph: &mut Graph,
        scene: &CanvasScene,
        contract: &TerminalContract,
    ) -> ResolvedScene {
        let map = ViewMap::new(scene.viewport(), contract.width, contract.height);
        let mut canvas = Canvas {
            ops: Vec::new(),
            width: contract.width,
            height: contract.height,
        };

        for id in scene.paint_order(graph) {
            let Some(style) = graph.item_style(id).cloned() else {
                continue;
            };
            if !style.visible || style.opacity <= 0.0 {
                continue;
            }
            draw_item(graph, id, &style, &map, &mut canvas);
        }

        let titles = scene.titles();
        let header = [titles.main.as_str(), titles.shot.as_str()]
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");
        let title_style = Style {
            bold: true,
            ..Style::default()
        };
        canvas.text(0, 0, &header, &title_style, i32::MAX);

        ResolvedScene {
            width: contract.width,
            height: contract.height,
            ops: canvas.ops,
        }
    }
}

struct Canvas {
    ops: Vec<DrawOp>,
    width: u16,
    height: u16,
}

impl Canvas {
    fn put(&mut self, x: f64, y: f64, ch: char, style: &Style, z_order: i32) {
        let (x, y) = (x.floor(), y.floor());
        if x < 0.0 || y < 0.0 || x >= f64::from(self.width) || y >= f64::from(self.height) {
            return;
        }
        self.ops.push(DrawOp {
            x: x as u16,
            y: y as u16,
            ch,
            style: style.clone(),
            z_order,
        });
    }

    fn text(&mut self, x: i64, y: i64, text: &str, style: &Style, z_order: i32) {
        for (i, ch) in text.chars().enumerate() {
            self.put((x + i as i64) as f64, y as f64, ch, style, z_order);
        }
    }

    /// DDA line between two cell positions.
    fn line(&mut self, a: Point, b: Point, style: &Style, z_order: i32) {
        let d = b - a;
        let ch = line_char(d.x, d.y * CELL_ASPECT);
        let steps = d.x.abs().max(d.y.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let p = a.lerp(b, i as f64 / steps as f64);
            self.put(p.x, p.y, ch, style, z_order);
        }
    }

    /// Fill every cell whose centre `inside` accepts, within `bounds` (cells).
    fn fill(&mut self, bounds: Rect, inside: impl Fn(Point) -> bool, style: &Style, z_order: i32) {
        let bounds = bounds.intersect(Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }
        for y in bounds.y0.floor() as i64..bounds.y1.ceil() as i64 {
            for x in bounds.x0.floor() as i64..bounds.x1.ceil() as i64 {
                let centre = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if inside(centre) {
                    self.put(x as f64, y as f64, ' ', style, z_order);
                }
            }
        }
    }
}

/// Character for a stroke going `(dx, dy)` in square units, y down.
fn line_char(dx: f64, dy: f64) -> char {
    let angle = dy.atan2(dx).to_degrees().rem_euclid(180.0);
    match angle {
        a if !(22.5..157.5).contains(&a) => '-',
        a if a < 67.5 => '\\',
        a if a < 112.5 => '|',
        _ => '/',
    }
}

fn head_char(dx: f64, dy: f64) -> char {
    if dx.abs() >= dy.abs() * CELL_ASPECT {
        if dx >= 0.0 { '>' } else { '<' }
    } else if dy >= 0.0 {
        'v'
    } else {
        '^'
    }
}

fn draw_item(graph: &mut Graph, id: ItemId, style: &ItemStyle, map: &ViewMap, canvas: &mut Canvas) {
    let Some(outline) = graph.outline(id).cloned() else {
        return;
    };
    let stroke = Style::from_color(style.outline, style.opacity);
    let fill = style.fill.map(|c| {
        let (r, g, b) = c.to_rgb8(style.opacity);
        Style {
            bg: Some(crate::types::TermColor::Rgb { r, g, b }),
            ..Style::default()
        }
    });
    let z_fill = style.z_order.saturating_mul(2);
    let z_stroke = z_fill.saturating_add(1);

    match outline {
        Outline::Empty | Outline::Composite(_) => {}
        Outline::Segment(line) => {
            canvas.line(map.to_cell(line.p0), map.to_cell(line.p1), &stroke, z_stroke);
        }
        Outline::Circle(circle) => {
            let centre = map.to_cell(circle.center);
            let rx = circle.radius * map.scale();
            let ry = rx / CELL_ASPECT;
            if let Some(fill) = &fill {
                let bounds = Rect::new(centre.x - rx, centre.y - ry, centre.x + rx, centre.y + ry);
                let inside = |p: Point| {
                    let (u, v) = ((p.x - centre.x) / rx, (p.y - centre.y) / ry);
                    u * u + v * v <= 1.0
                };
                canvas.fill(bounds, inside, fill, z_fill);
            }
            let samples = ((rx * 8.0).ceil() as usize).clamp(16, 720);
            for i in 0..samples {
                let a = i as f64 / samples as f64 * std::f64::consts::TAU;
                canvas.put(centre.x + rx * a.cos(), centre.y + ry * a.sin(), '*', &stroke, z_stroke);
            }
        }
        Outline::Rect(rect) => {
            let corners = [
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ];
            draw_polygon(canvas, map, &corners, &stroke, fill.as_ref(), z_stroke);
            for c in corners {
                let p = map.to_cell(c);
                canvas.put(p.x, p.y, '+', &stroke, z_stroke);
            }
        }
        Outline::Polygon(points) => {
            draw_polygon(canvas, map, &points, &stroke, fill.as_ref(), z_stroke);
        }
        Outline::Path { curve, .. } => {
            let samples = 24;
            let mut prev = map.to_cell(curve.eval(0.0));
            for i in 1..=samples {
                let next = map.to_cell(curve.eval(i as f64 / samples as f64));
                canvas.line(prev, next, &stroke, z_stroke);
                prev = next;
            }
            let tip = map.to_cell(curve.p3);
            let back = map.to_cell(curve.eval(0.9));
            let d = tip - back;
            canvas.put(tip.x, tip.y, head_char(d.x, d.y), &stroke, z_stroke);
        }
        Outline::Text { bounds, text } => {
            let top_left = map.to_cell(Point::new(bounds.x0, bounds.y0));
            let bottom = map.to_cell(Point::new(bounds.x0, bounds.y1));
            let row = ((top_left.y + bottom.y) / 2.0).floor() as i64;
            let text_style = Style {
                bold: true,
                ..stroke
            };
            canvas.text(top_left.x.round() as i64, row, &text, &text_style, z_stroke);
        }
    }
}

fn draw_polygon(
    canvas: &mut Canvas,
    map: &ViewMap,
    points: &[Point],
    stroke: &Style,
    fill: Option<&Style>,
    z_stroke: i32,
) {
    if points.is_empty() {
        return;
    }
    let cells: Vec<Point> = points.iter().map(|p| map.to_cell(*p)).collect();
    if let Some(fill) = fill {
        let mut path = BezPath::new();
        path.move_to(cells[0]);
        for p in &cells[1..] {
            path.line_to(*p);
        }
        path.close_path();
        canvas.fill(path.bounding_box(), |p| path.contains(p), fill, z_stroke - 1);
    }
    for (i, a) in cells.iter().enumerate() {
        let b = cells[(i + 1) % cells.len()];
        canvas.line(*a, b, stroke, z_stroke);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use crate::types::Color;

    fn setup() -> (Graph, CanvasScene, TerminalContract) {
        let contract = TerminalContract {
            width: 20,
            height: 10,
        };
        let scene = CanvasScene::new(Rect::new(0.0, 0.0, 20.0, 20.0), 20.0);
        (Graph::new(), scene, contract)
    }

    #[test]
    fn viewport_maps_with_tall_cells() {
        let map = ViewMap::new(Rect::new(0.0, 0.0, 20.0, 20.0), 20, 10);
        assert_eq!(map.scale(), 1.0);
        assert_eq!(map.to_cell(Point::new(10.0, 10.0)), Point::new(10.0, 5.0));
    }

    #[test]
    fn horizontal_line_is_dashes() {
        let (mut g, mut scene, contract) = setup();
        let a = g.add_point(2.0, 10.0);
        let b = g.add_point(8.0, 10.0);
        let line = g.add_line(a, b);
        scene.add_item(line);
        let resolved = Rasterizer::resolve(&mut g, &scene, &contract);
        let strokes: Vec<_> = resolved.ops.iter().filter(|op| op.y == 5).collect();
        assert!(strokes.len() >= 6);
        assert!(strokes.iter().all(|op| op.ch == '-'));
    }

    #[test]
    fn hidden_items_draw_nothing() {
        let (mut g, mut scene, contract) = setup();
        let c = g.add_point(10.0, 10.0);
        let circle = g.add_circle(c, 3.0);
        g.set_visible(circle, false).unwrap();
        scene.add_item(circle);
        let resolved = Rasterizer::resolve(&mut g, &scene, &contract);
        assert!(resolved.ops.is_empty());
    }

    #[test]
    fn opacity_dims_the_color() {
        let (mut g, mut scene, contract) = setup();
        let a = g.add_point(2.0, 10.0);
        let b = g.add_point(8.0, 10.0);
        let line = g.add_line(a, b);
        g.set_outline_color(line, Color::WHITE).unwrap();
        g.set_opacity(line, 0.5).unwrap();
        scene.add_item(line);
        let resolved = Rasterizer::resolve(&mut g, &scene, &contract);
        let op = &resolved.ops[0];
        assert_eq!(
            op.style.fg,
            Some(crate::types::TermColor::Rgb {
                r: 128,
                g: 128,
                b: 128
            })
        );
    }

    #[test]
    fn titles_go_on_the_top_row() {
        let (mut g, mut scene, contract) = setup();
        scene.set_main_title("Radial");
        scene.set_shot_title("Spin");
        let resolved = Rasterizer::resolve(&mut g, &scene, &contract);
        let row: String = resolved
            .ops
            .iter()
            .filter(|op| op.y == 0)
            .map(|op| op.ch)
            .collect();
        assert_eq!(row, "Radial | Spin");
    }

    #[test]
    fn stroke_characters_follow_direction() {
        assert_eq!(line_char(1.0, 0.0), '-');
        assert_eq!(line_char(0.0, 1.0), '|');
        assert_eq!(line_char(1.0, 1.0), '\\');
        assert_eq!(line_char(1.0, -1.0), '/');
        assert_eq!(line_char(-1.0, 0.0), '-');
    }
}
