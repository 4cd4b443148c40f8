use kurbo::{Point, Rect, Vec2};

use crate::error::{AnimationError, Result};
use crate::graph::{Graph, ItemId, PointId};

use super::{ItemKind, Outline, Resolve};

/// Letter metrics supplied by the rendering back end.
pub trait FontMetrics {
    fn letter_width(&self, font: &str, size: f64, bold: bool) -> f64;
    fn letter_height(&self, font: &str, size: f64, bold: bool) -> f64;
}

/// Fixed-pitch estimate used when no back end provides real metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonospaceMetrics;

impl FontMetrics for MonospaceMetrics {
    fn letter_width(&self, _font: &str, size: f64, bold: bool) -> f64 {
        if bold { size * 0.65 } else { size * 0.6 }
    }

    fn letter_height(&self, _font: &str, size: f64, _bold: bool) -> f64 {
        size * 1.2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub anchor: PointId,
    pub text: String,
    pub font: String,
    pub size: f64,
    pub bold: bool,
    /// Fraction of the text's width and height that sits left of and above
    /// the anchor. `(0, 0)` puts the anchor at the top-left corner.
    pub align: Vec2,
    /// Keep the same on-screen size regardless of the view zoom.
    pub fixed_size: bool,
}

impl Text {
    fn bounds(&self, graph: &Graph) -> Option<Rect> {
        let anchor = graph.position(self.anchor)?;
        let metrics = graph.metrics();
        let columns = self
            .text
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let rows = self.text.lines().count().max(1);
        let mut w = columns as f64 * metrics.letter_width(&self.font, self.size, self.bold);
        let mut h = rows as f64 * metrics.letter_height(&self.font, self.size, self.bold);
        if self.fixed_size {
            w /= graph.view_scale();
            h /= graph.view_scale();
        }
        let top_left = anchor - Vec2::new(self.align.x * w, self.align.y * h);
        Some(Rect::from_origin_size(top_left, (w, h)))
    }
}

impl Resolve for Text {
    fn parameters(&self) -> Vec<PointId> {
        vec![self.anchor]
    }

    fn resolve(&self, graph: &Graph) -> Option<Outline> {
        Some(Outline::Text {
            bounds: self.bounds(graph)?,
            text: self.text.clone(),
        })
    }
}

/// Where a placement helper puts its point relative to the text bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Above,
    Around,
    Exponent,
    Subscript,
    MiddleLeft,
    MiddleRight,
}

impl Graph {
    pub fn add_text(&mut self, anchor: PointId, text: impl Into<String>, size: f64) -> ItemId {
        self.add_item(ItemKind::Text(Text {
            anchor,
            text: text.into(),
            font: "monospace".to_string(),
            size,
            bold: false,
            align: Vec2::new(0.5, 0.5),
            fixed_size: false,
        }))
    }

    /// Text that ignores the view zoom.
    pub fn add_fixed_text(&mut self, anchor: PointId, text: impl Into<String>, size: f64) -> ItemId {
        let id = self.add_text(anchor, text, size);
        if let Ok(t) = self.text_mut(id) {
            t.fixed_size = true;
        }
        id
    }

    fn text_mut(&mut self, id: ItemId) -> Result<&mut Text> {
        match self.item_kind_mut(id)? {
            ItemKind::Text(t) => Ok(t),
            other => Err(AnimationError::WrongKind {
                expected: "text",
                actual: other.name(),
            }),
        }
    }

    pub fn set_text(&mut self, id: ItemId, text: impl Into<String>) -> Result<()> {
        self.text_mut(id)?.text = text.into();
        Ok(())
    }

    pub fn set_font(&mut self, id: ItemId, font: impl Into<String>, size: f64, bold: bool) -> Result<()> {
        let t = self.text_mut(id)?;
        t.font = font.into();
        t.size = size;
        t.bold = bold;
        Ok(())
    }

    /// Alignment fractions are clamped into `[0, 1]`.
    pub fn set_text_align(&mut self, id: ItemId, x: f64, y: f64) -> Result<()> {
        self.text_mut(id)?.align = Vec2::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
        Ok(())
    }

    pub fn text_bounds(&self, id: ItemId) -> Option<Rect> {
        match &self.item(id)?.kind {
            ItemKind::Text(t) => t.bounds(self),
            _ => None,
        }
    }

    /// Top center, `gap` above the text.
    pub fn text_above(&mut self, id: ItemId, gap: f64) -> Result<PointId> {
        self.place_near_text(id, Placement::Above, gap)
    }

    /// Center of the text, e.g. to draw a circle around it.
    pub fn text_around(&mut self, id: ItemId) -> Result<PointId> {
        self.place_near_text(id, Placement::Around, 0.0)
    }

    /// Top right, where an exponent starts.
    pub fn text_exponent(&mut self, id: ItemId, gap: f64) -> Result<PointId> {
        self.place_near_text(id, Placement::Exponent, gap)
    }

    /// Bottom right, where a subscript starts.
    pub fn text_subscript(&mut self, id: ItemId, gap: f64) -> Result<PointId> {
        self.place_near_text(id, Placement::Subscript, gap)
    }

    pub fn text_middle_left(&mut self, id: ItemId, gap: f64) -> Result<PointId> {
        self.place_near_text(id, Placement::MiddleLeft, gap)
    }

    pub fn text_middle_right(&mut self, id: ItemId, gap: f64) -> Result<PointId> {
        self.place_near_text(id, Placement::MiddleRight, gap)
    }

    fn place_near_text(&mut self, id: ItemId, placement: Placement, gap: f64) -> Result<PointId> {
        let anchor = match self.item(id).map(|i| &i.kind) {
            Some(ItemKind::Text(t)) => t.anchor,
            Some(other) => {
                return Err(AnimationError::WrongKind {
                    expected: "text",
                    actual: other.name(),
                });
            }
            None => {
                return Err(AnimationError::ItemNotFound {
                    id: format!("{id:?}"),
                });
            }
        };
        let (Some(b), Some(origin)) = (self.text_bounds(id), self.position(anchor)) else {
            return Err(AnimationError::PointNotFound {
                id: format!("{anchor:?}"),
            });
        };
        let c = b.center();
        let target = match placement {
            Placement::Above => Point::new(c.x, b.y0 - gap),
            Placement::Around => c,
            Placement::Exponent => Point::new(b.x1 + gap, b.y0),
            Placement::Subscript => Point::new(b.x1 + gap, b.y1),
            Placement::MiddleLeft => Point::new(b.x0 - gap, c.y),
            Placement::MiddleRight => Point::new(b.x1 + gap, c.y),
        };
        let d = target - origin;
        self.add_relative(anchor, d.x, d.y)
    }
}
