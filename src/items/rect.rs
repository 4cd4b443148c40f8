use kurbo::{Rect, Size};

use crate::error::{AnimationError, Result};
use crate::graph::{Graph, ItemId, PointId};

use super::{ItemKind, Outline, Resolve};

#[derive(Debug, Clone, PartialEq)]
pub enum Rectangle {
    /// Two opposite corners.
    Corners { a: PointId, b: PointId },
    /// A center point and a fixed size.
    Centered {
        center: PointId,
        width: f64,
        height: f64,
    },
}

impl Resolve for Rectangle {
    fn parameters(&self) -> Vec<PointId> {
        match self {
            Rectangle::Corners { a, b } => vec![*a, *b],
            Rectangle::Centered { center, .. } => vec![*center],
        }
    }

    fn resolve(&self, graph: &Graph) -> Option<Outline> {
        let rect = match self {
            Rectangle::Corners { a, b } => {
                Rect::from_points(graph.position(*a)?, graph.position(*b)?)
            }
            Rectangle::Centered {
                center,
                width,
                height,
            } => Rect::from_center_size(graph.position(*center)?, Size::new(*width, *height)),
        };
        Some(Outline::Rect(rect))
    }
}

impl Graph {
    pub fn add_rect(&mut self, a: PointId, b: PointId) -> ItemId {
        self.add_item(ItemKind::Rectangle(Rectangle::Corners { a, b }))
    }

    pub fn add_centered_rect(&mut self, center: PointId, width: f64, height: f64) -> ItemId {
        self.add_item(ItemKind::Rectangle(Rectangle::Centered {
            center,
            width,
            height,
        }))
    }

    /// Resize a centered rectangle.
    pub fn set_rect_size(&mut self, id: ItemId, w: f64, h: f64) -> Result<()> {
        match self.item_kind_mut(id)? {
            ItemKind::Rectangle(Rectangle::Centered { width, height, .. }) => {
                *width = w.max(0.0);
                *height = h.max(0.0);
                Ok(())
            }
            other => Err(AnimationError::WrongKind {
                expected: "centered rectangle",
                actual: other.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_in_any_order_give_same_rect() {
        let mut g = Graph::new();
        let a = g.add_point(4.0, 1.0);
        let b = g.add_point(0.0, 3.0);
        let rect = g.add_rect(a, b);
        assert_eq!(g.scene_rect(rect), Some(Rect::new(0.0, 1.0, 4.0, 3.0)));
    }

    #[test]
    fn centered_rect_moves_and_resizes() {
        let mut g = Graph::new();
        let c = g.add_point(0.0, 0.0);
        let rect = g.add_centered_rect(c, 2.0, 4.0);
        g.set(c, 1.0, 1.0).unwrap();
        assert_eq!(g.scene_rect(rect), Some(Rect::new(0.0, -1.0, 2.0, 3.0)));
        g.set_rect_size(rect, 4.0, 4.0).unwrap();
        assert_eq!(g.scene_rect(rect), Some(Rect::new(-1.0, -1.0, 3.0, 3.0)));
    }
}
