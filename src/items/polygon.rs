use kurbo::{Point, Rect, Vec2};

use crate::error::{AnimationError, Result};
use crate::graph::{Graph, ItemId, PointId};

use super::{ItemKind, Outline, Resolve, bounds_of};

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<PointId>,
}

impl Polygon {
    fn positions(&self, graph: &Graph) -> Option<Vec<Point>> {
        self.vertices.iter().map(|v| graph.position(*v)).collect()
    }
}

impl Resolve for Polygon {
    fn parameters(&self) -> Vec<PointId> {
        self.vertices.clone()
    }

    fn resolve(&self, graph: &Graph) -> Option<Outline> {
        Some(Outline::Polygon(self.positions(graph)?))
    }
}

impl Graph {
    pub fn add_polygon(&mut self, vertices: Vec<PointId>) -> ItemId {
        self.add_item(ItemKind::Polygon(Polygon { vertices }))
    }

    /// Geometric center (vertex average) of a polygon item.
    pub fn polygon_centroid(&self, id: ItemId) -> Option<Point> {
        let points = self.polygon_positions(id)?;
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
        Some((sum / points.len() as f64).to_point())
    }

    pub fn polygon_bounds(&self, id: ItemId) -> Option<Rect> {
        bounds_of(&self.polygon_positions(id)?)
    }

    /// A point that tracks the polygon's center, anchored to its first vertex.
    pub fn polygon_center(&mut self, id: ItemId) -> Result<PointId> {
        let target = self.polygon_centroid(id);
        self.anchor_on_first_vertex(id, target)
    }

    /// A point that tracks the polygon's top-left corner, anchored to its
    /// first vertex.
    pub fn polygon_top_left(&mut self, id: ItemId) -> Result<PointId> {
        let target = self.polygon_bounds(id).map(|r| r.origin());
        self.anchor_on_first_vertex(id, target)
    }

    fn polygon_positions(&self, id: ItemId) -> Option<Vec<Point>> {
        match &self.item(id)?.kind {
            ItemKind::Polygon(poly) => poly.positions(self),
            _ => None,
        }
    }

    fn anchor_on_first_vertex(&mut self, id: ItemId, target: Option<Point>) -> Result<PointId> {
        let first = match self.item(id).map(|i| &i.kind) {
            Some(ItemKind::Polygon(poly)) => poly.vertices.first().copied(),
            Some(other) => {
                return Err(AnimationError::WrongKind {
                    expected: "polygon",
                    actual: other.name(),
                });
            }
            None => None,
        };
        let (Some(first), Some(target)) = (first, target) else {
            return Err(AnimationError::ItemNotFound {
                id: format!("{id:?}"),
            });
        };
        let base = self.position(first).unwrap_or(target);
        let d = target - base;
        self.add_relative(first, d.x, d.y)
    }
}
