use kurbo::{CubicBez, Vec2};

use crate::error::{AnimationError, Result};
use crate::graph::{Graph, ItemId, PointId, User};

use super::{ItemKind, Outline, Resolve};

/// A curved arrow from `tail` to `head`.
///
/// The path is a cubic whose control points sit at one and two thirds of
/// the way along the chord, pushed sideways by `bend` times the chord length.
#[derive(Debug, Clone, PartialEq)]
pub struct PointingArrow {
    pub tail: PointId,
    pub head: PointId,
    pub bend: f64,
    pub head_size: f64,
}

impl Resolve for PointingArrow {
    fn parameters(&self) -> Vec<PointId> {
        vec![self.tail, self.head]
    }

    fn resolve(&self, graph: &Graph) -> Option<Outline> {
        let tail = graph.position(self.tail)?;
        let head = graph.position(self.head)?;
        let chord = head - tail;
        let side = Vec2::new(-chord.y, chord.x) * self.bend;
        let curve = CubicBez::new(
            tail,
            tail + chord / 3.0 + side,
            tail + chord * (2.0 / 3.0) + side,
            head,
        );
        Some(Outline::Path {
            curve,
            head_size: self.head_size,
        })
    }
}

impl Graph {
    pub fn add_pointing_arrow(&mut self, tail: PointId, head: PointId) -> ItemId {
        self.add_item(ItemKind::Arrow(PointingArrow {
            tail,
            head,
            bend: 0.25,
            head_size: 0.3,
        }))
    }

    pub fn arrow_head(&self, id: ItemId) -> Option<PointId> {
        match &self.item(id)?.kind {
            ItemKind::Arrow(a) => Some(a.head),
            _ => None,
        }
    }

    /// Point the arrow at a different point, moving the item's user
    /// registration from the old head to the new one.
    pub fn set_arrow_head(&mut self, id: ItemId, head: PointId) -> Result<()> {
        if !self.contains_point(head) {
            return Err(AnimationError::PointNotFound {
                id: format!("{head:?}"),
            });
        }
        let (old, tail) = match self.item_kind_mut(id)? {
            ItemKind::Arrow(a) => {
                let old = std::mem::replace(&mut a.head, head);
                (old, a.tail)
            }
            other => {
                return Err(AnimationError::WrongKind {
                    expected: "pointing arrow",
                    actual: other.name(),
                });
            }
        };
        if old != tail {
            self.remove_user(old, User::Item(id));
        }
        self.add_user(head, User::Item(id))
    }

    pub fn set_arrow_bend(&mut self, id: ItemId, bend: f64) -> Result<()> {
        match self.item_kind_mut(id)? {
            ItemKind::Arrow(a) => {
                a.bend = bend;
                Ok(())
            }
            other => Err(AnimationError::WrongKind {
                expected: "pointing arrow",
                actual: other.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    #[test]
    fn curve_follows_both_ends() {
        let mut g = Graph::new();
        let tail = g.add_point(0.0, 0.0);
        let head = g.add_point(3.0, 0.0);
        let arrow = g.add_pointing_arrow(tail, head);
        let Some(Outline::Path { curve, .. }) = g.outline(arrow).cloned() else {
            panic!("arrow resolves to a path");
        };
        assert_eq!(curve.p0, Point::new(0.0, 0.0));
        assert_eq!(curve.p3, Point::new(3.0, 0.0));
        assert_eq!(curve.p1, Point::new(1.0, 0.75));

        g.set(head, 6.0, 0.0).unwrap();
        assert!(g.item(arrow).unwrap().is_dirty());
    }

    #[test]
    fn retargeting_swaps_user_registration() {
        let mut g = Graph::new();
        let tail = g.add_point(0.0, 0.0);
        let first = g.add_point(1.0, 0.0);
        let second = g.add_point(0.0, 1.0);
        let arrow = g.add_pointing_arrow(tail, first);

        g.set_arrow_head(arrow, second).unwrap();
        assert!(g.users(first).is_empty());
        assert_eq!(g.users(second), &[User::Item(arrow)]);
        assert_eq!(g.arrow_head(arrow), Some(second));

        let before = g.item(arrow).unwrap().change_count();
        g.set(first, 9.0, 9.0).unwrap();
        assert_eq!(g.item(arrow).unwrap().change_count(), before);
    }
}
