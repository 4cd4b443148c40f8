use kurbo::{Point, Vec2};

use crate::error::{AnimationError, Result};
use crate::graph::{Graph, ItemId, PointId};

use super::{ItemKind, Outline, Resolve};

#[derive(Debug, Clone, PartialEq)]
pub enum Circle {
    /// Fixed radius around a center point.
    Centered { center: PointId, radius: f64 },
    /// The two points are opposite ends of a diameter.
    Diameter { a: PointId, b: PointId },
    /// Radius is the distance from the center to `end`.
    Endpoint { center: PointId, end: PointId },
}

impl Circle {
    fn center_and_radius(&self, graph: &Graph) -> Option<(Point, f64)> {
        match self {
            Circle::Centered { center, radius } => Some((graph.position(*center)?, *radius)),
            Circle::Diameter { a, b } => {
                let a = graph.position(*a)?;
                let b = graph.position(*b)?;
                Some((a.midpoint(b), a.distance(b) / 2.0))
            }
            Circle::Endpoint { center, end } => {
                let c = graph.position(*center)?;
                Some((c, c.distance(graph.position(*end)?)))
            }
        }
    }
}

impl Resolve for Circle {
    fn parameters(&self) -> Vec<PointId> {
        match self {
            Circle::Centered { center, .. } => vec![*center],
            Circle::Diameter { a, b } => vec![*a, *b],
            Circle::Endpoint { center, end } => vec![*center, *end],
        }
    }

    fn resolve(&self, graph: &Graph) -> Option<Outline> {
        let (center, radius) = self.center_and_radius(graph)?;
        Some(Outline::Circle(kurbo::Circle::new(center, radius)))
    }
}

impl Graph {
    pub fn add_circle(&mut self, center: PointId, radius: f64) -> ItemId {
        self.add_item(ItemKind::Circle(Circle::Centered { center, radius }))
    }

    pub fn add_circle_on_diameter(&mut self, a: PointId, b: PointId) -> ItemId {
        self.add_item(ItemKind::Circle(Circle::Diameter { a, b }))
    }

    pub fn add_circle_through(&mut self, center: PointId, end: PointId) -> ItemId {
        self.add_item(ItemKind::Circle(Circle::Endpoint { center, end }))
    }

    pub fn circle_radius(&self, id: ItemId) -> Option<f64> {
        match &self.item(id)?.kind {
            ItemKind::Circle(c) => c.center_and_radius(self).map(|(_, r)| r),
            _ => None,
        }
    }

    pub fn circle_center(&self, id: ItemId) -> Option<Point> {
        match &self.item(id)?.kind {
            ItemKind::Circle(c) => c.center_and_radius(self).map(|(p, _)| p),
            _ => None,
        }
    }

    /// Change the radius of a fixed-radius circle.
    pub fn set_circle_radius(&mut self, id: ItemId, radius: f64) -> Result<()> {
        match self.item_kind_mut(id)? {
            ItemKind::Circle(Circle::Centered { radius: r, .. }) => {
                *r = radius.max(0.0);
                Ok(())
            }
            other => Err(AnimationError::WrongKind {
                expected: "centered circle",
                actual: other.name(),
            }),
        }
    }

    /// Point on the circle at `angle`, as a radial point on the center.
    /// Only centered and endpoint circles have a center point to hang it on.
    pub fn circle_point_at(&mut self, id: ItemId, angle: f64) -> Result<PointId> {
        let (center, radius) = match self.item(id).map(|i| &i.kind) {
            Some(ItemKind::Circle(Circle::Centered { center, radius })) => (*center, *radius),
            Some(ItemKind::Circle(Circle::Endpoint { center, end })) => {
                let c = self.position(*center).unwrap_or_default();
                let e = self.position(*end).unwrap_or_default();
                (*center, (e - c).hypot())
            }
            Some(other) => {
                return Err(AnimationError::WrongKind {
                    expected: "circle with center",
                    actual: other.name(),
                });
            }
            None => {
                return Err(AnimationError::ItemNotFound {
                    id: format!("{id:?}"),
                });
            }
        };
        self.add_relative_radial(center, Vec2::ZERO, radius, angle)
    }
}
