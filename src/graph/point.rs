//! Root and derived points.
//!
//! A root point stores its position directly. Derived points store an origin
//! and an offset, either cartesian (relative), polar (radial) or both
//! (relative-radial), and recompute whenever their origin moves.

use kurbo::{Point, Vec2};

use crate::error::{AnimationError, Result};

use super::{Graph, PointId, User};

#[derive(Debug, Clone, PartialEq)]
pub enum PointKind {
    Root {
        start: Point,
    },
    Relative {
        origin: PointId,
        delta: Vec2,
        start_delta: Vec2,
    },
    Radial {
        origin: PointId,
        radius: f64,
        angle: f64,
        start: (f64, f64),
    },
    /// `origin + delta + (r cos θ, r sin θ)`.
    RelativeRadial {
        origin: PointId,
        delta: Vec2,
        start_delta: Vec2,
        radius: f64,
        angle: f64,
        start: (f64, f64),
    },
}

impl PointKind {
    pub fn origin(&self) -> Option<PointId> {
        match self {
            PointKind::Root { .. } => None,
            PointKind::Relative { origin, .. }
            | PointKind::Radial { origin, .. }
            | PointKind::RelativeRadial { origin, .. } => Some(*origin),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PointKind::Root { .. } => "root",
            PointKind::Relative { .. } => "relative",
            PointKind::Radial { .. } => "radial",
            PointKind::RelativeRadial { .. } => "relative-radial",
        }
    }

    /// Offset from the origin. Zero for root points.
    fn offset(&self) -> Vec2 {
        match self {
            PointKind::Root { .. } => Vec2::ZERO,
            PointKind::Relative { delta, .. } => *delta,
            PointKind::Radial { radius, angle, .. } => polar(*radius, *angle),
            PointKind::RelativeRadial {
                delta,
                radius,
                angle,
                ..
            } => *delta + polar(*radius, *angle),
        }
    }

    fn start_offset(&self) -> Vec2 {
        match self {
            PointKind::Root { .. } => Vec2::ZERO,
            PointKind::Relative { start_delta, .. } => *start_delta,
            PointKind::Radial { start, .. } => polar(start.0, start.1),
            PointKind::RelativeRadial {
                start_delta, start, ..
            } => *start_delta + polar(start.0, start.1),
        }
    }
}

fn polar(radius: f64, angle: f64) -> Vec2 {
    Vec2::from_angle(angle) * radius
}

#[derive(Debug, Clone)]
pub struct PointNode {
    pub(crate) position: Point,
    pub(crate) kind: PointKind,
    pub(crate) users: Vec<User>,
    pub(crate) change_count: u64,
}

impl PointNode {
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn kind(&self) -> &PointKind {
        &self.kind
    }
}

fn not_found(id: PointId) -> AnimationError {
    AnimationError::PointNotFound {
        id: format!("{id:?}"),
    }
}

impl Graph {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    pub fn add_point(&mut self, x: f64, y: f64) -> PointId {
        let start = Point::new(x, y);
        let id = self.points.insert(PointNode {
            position: start,
            kind: PointKind::Root { start },
            users: Vec::new(),
            change_count: 0,
        });
        self.track_point(id);
        id
    }

    /// A point that sits at `origin + (dx, dy)`.
    pub fn add_relative(&mut self, origin: PointId, dx: f64, dy: f64) -> Result<PointId> {
        let delta = Vec2::new(dx, dy);
        self.add_derived(PointKind::Relative {
            origin,
            delta,
            start_delta: delta,
        })
    }

    /// A point at distance `radius` from `origin` in direction `angle` (radians).
    pub fn add_radial(&mut self, origin: PointId, radius: f64, angle: f64) -> Result<PointId> {
        self.add_derived(PointKind::Radial {
            origin,
            radius,
            angle,
            start: (radius, angle),
        })
    }

    pub fn add_relative_radial(
        &mut self,
        origin: PointId,
        delta: Vec2,
        radius: f64,
        angle: f64,
    ) -> Result<PointId> {
        self.add_derived(PointKind::RelativeRadial {
            origin,
            delta,
            start_delta: delta,
            radius,
            angle,
            start: (radius, angle),
        })
    }

    fn add_derived(&mut self, kind: PointKind) -> Result<PointId> {
        let origin = kind.origin().ok_or(AnimationError::WrongKind {
            expected: "derived",
            actual: "root",
        })?;
        let base = self.position_or_none(origin).ok_or_else(|| not_found(origin))?;
        let id = self.points.insert(PointNode {
            position: base + kind.offset(),
            kind,
            users: Vec::new(),
            change_count: 0,
        });
        self.points[origin].users.push(User::Point(id));
        self.track_point(id);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn point(&self, id: PointId) -> Option<&PointNode> {
        self.points.get(id)
    }

    pub fn position(&self, id: PointId) -> Option<Point> {
        self.position_or_none(id)
    }

    /// The remembered starting position. For derived points this is the
    /// origin's current position plus the starting offset.
    pub fn original_point(&self, id: PointId) -> Option<Point> {
        let node = self.points.get(id)?;
        match &node.kind {
            PointKind::Root { start } => Some(*start),
            kind => {
                let origin = kind.origin()?;
                Some(self.position_or_none(origin)? + kind.start_offset())
            }
        }
    }

    /// Number of origin hops down to a root point.
    pub(crate) fn point_depth(&self, id: PointId) -> usize {
        let mut depth = 0;
        let mut next = self.points.get(id).and_then(|n| n.kind.origin());
        while let Some(p) = next {
            depth += 1;
            next = self.points.get(p).and_then(|n| n.kind.origin());
        }
        depth
    }

    /// How many times this point was told that its origin moved.
    pub fn point_change_count(&self, id: PointId) -> u64 {
        self.points.get(id).map_or(0, |n| n.change_count)
    }

    pub fn radius(&self, id: PointId) -> Option<f64> {
        match self.points.get(id)?.kind {
            PointKind::Radial { radius, .. } | PointKind::RelativeRadial { radius, .. } => {
                Some(radius)
            }
            _ => None,
        }
    }

    pub fn angle(&self, id: PointId) -> Option<f64> {
        match self.points.get(id)?.kind {
            PointKind::Radial { angle, .. } | PointKind::RelativeRadial { angle, .. } => {
                Some(angle)
            }
            _ => None,
        }
    }

    pub fn delta(&self, id: PointId) -> Option<Vec2> {
        match self.points.get(id)?.kind {
            PointKind::Relative { delta, .. } | PointKind::RelativeRadial { delta, .. } => {
                Some(delta)
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Move a root point, or set the offset of a derived point: the cartesian
    /// delta for relative kinds, `(x, y)` converted to polar for radial ones.
    pub fn set(&mut self, id: PointId, x: f64, y: f64) -> Result<()> {
        let node = self.points.get_mut(id).ok_or_else(|| not_found(id))?;
        if node.kind.origin().is_none() {
            return self.move_to(id, Point::new(x, y));
        }
        let v = Vec2::new(x, y);
        match &mut node.kind {
            PointKind::Root { .. } => {}
            PointKind::Relative { delta, .. } | PointKind::RelativeRadial { delta, .. } => {
                *delta = v;
            }
            PointKind::Radial { radius, angle, .. } => {
                *radius = v.hypot();
                *angle = v.atan2();
            }
        }
        self.refresh(id);
        Ok(())
    }

    /// Place the point at an absolute position, adjusting the stored offset
    /// of derived points.
    pub fn set_absolute(&mut self, id: PointId, x: f64, y: f64) -> Result<()> {
        let target = Point::new(x, y);
        let node = self.points.get(id).ok_or_else(|| not_found(id))?;
        let (origin, current) = (node.kind.origin(), node.position);
        let Some(origin) = origin else {
            return self.move_to(id, target);
        };
        let base = self.position_or_none(origin).unwrap_or(current);
        let v = target - base;
        let node = &mut self.points[id];
        match &mut node.kind {
            PointKind::Root { .. } => {}
            PointKind::Relative { delta, .. } => *delta = v,
            PointKind::Radial { radius, angle, .. } => {
                *radius = v.hypot();
                *angle = v.atan2();
            }
            PointKind::RelativeRadial {
                delta,
                radius,
                angle,
                ..
            } => {
                let polar = v - *delta;
                *radius = polar.hypot();
                *angle = polar.atan2();
            }
        }
        self.refresh(id);
        Ok(())
    }

    pub fn set_angle(&mut self, id: PointId, new_angle: f64) -> Result<()> {
        let node = self.points.get_mut(id).ok_or_else(|| not_found(id))?;
        match &mut node.kind {
            PointKind::Radial { angle, .. } | PointKind::RelativeRadial { angle, .. } => {
                *angle = new_angle;
            }
            other => {
                return Err(AnimationError::WrongKind {
                    expected: "radial",
                    actual: other.name(),
                });
            }
        }
        self.refresh(id);
        Ok(())
    }

    pub fn set_radius(&mut self, id: PointId, new_radius: f64) -> Result<()> {
        let node = self.points.get_mut(id).ok_or_else(|| not_found(id))?;
        match &mut node.kind {
            PointKind::Radial { radius, .. } | PointKind::RelativeRadial { radius, .. } => {
                *radius = new_radius;
            }
            other => {
                return Err(AnimationError::WrongKind {
                    expected: "radial",
                    actual: other.name(),
                });
            }
        }
        self.refresh(id);
        Ok(())
    }

    /// Restore the starting position (or offset) and notify every user.
    pub fn reset_point(&mut self, id: PointId) -> Result<()> {
        let node = self.points.get_mut(id).ok_or_else(|| not_found(id))?;
        match &mut node.kind {
            PointKind::Root { start } => node.position = *start,
            PointKind::Relative {
                delta, start_delta, ..
            } => *delta = *start_delta,
            PointKind::Radial {
                radius,
                angle,
                start,
                ..
            } => {
                *radius = start.0;
                *angle = start.1;
            }
            PointKind::RelativeRadial {
                delta,
                start_delta,
                radius,
                angle,
                start,
                ..
            } => {
                *delta = *start_delta;
                *radius = start.0;
                *angle = start.1;
            }
        }
        if let Some(target) = self.derived_target(id) {
            self.points[id].position = target;
        }
        self.notify(id);
        Ok(())
    }

    fn move_to(&mut self, id: PointId, target: Point) -> Result<()> {
        let node = self.points.get_mut(id).ok_or_else(|| not_found(id))?;
        if node.position == target {
            return Ok(());
        }
        node.position = target;
        self.notify(id);
        Ok(())
    }

    fn derived_target(&self, id: PointId) -> Option<Point> {
        let node = self.points.get(id)?;
        let origin = node.kind.origin()?;
        Some(self.position_or_none(origin)? + node.kind.offset())
    }

    /// Recompute a derived point after its own offset changed.
    fn refresh(&mut self, id: PointId) {
        if let Some(target) = self.derived_target(id) {
            let node = &mut self.points[id];
            if node.position != target {
                node.position = target;
                self.notify(id);
            }
        }
    }

    /// `geometry_changed` for a derived point: its origin moved.
    pub(crate) fn recompute(&mut self, id: PointId) {
        let Some(target) = self.derived_target(id) else {
            return;
        };
        let node = &mut self.points[id];
        node.change_count += 1;
        if node.position != target {
            node.position = target;
            self.notify(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn relative_point_follows_origin() {
        let mut g = Graph::new();
        let p = g.add_point(0.0, 0.0);
        let q = g.add_relative(p, 3.0, 4.0).unwrap();
        assert_eq!(g.position(q), Some(Point::new(3.0, 4.0)));

        g.set(p, 10.0, 10.0).unwrap();
        assert_eq!(g.position(q), Some(Point::new(13.0, 14.0)));
        assert_eq!(g.point_change_count(q), 1);
    }

    #[test]
    fn setting_same_position_does_not_notify() {
        let mut g = Graph::new();
        let p = g.add_point(1.0, 2.0);
        let q = g.add_relative(p, 1.0, 1.0).unwrap();
        g.set(p, 1.0, 2.0).unwrap();
        assert_eq!(g.point_change_count(q), 0);
    }

    #[test]
    fn radial_point_rotates_and_resolves_absolute_targets() {
        let mut g = Graph::new();
        let c = g.add_point(0.0, 0.0);
        let r = g.add_radial(c, 2.0, 0.0).unwrap();

        g.set_angle(r, FRAC_PI_2).unwrap();
        let pos = g.position(r).unwrap();
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pos.y, 2.0, epsilon = 1e-12);

        g.set_absolute(r, -2.0, 0.0).unwrap();
        assert_relative_eq!(g.radius(r).unwrap(), 2.0);
        assert_relative_eq!(g.angle(r).unwrap(), PI);
    }

    #[test]
    fn set_on_relative_point_updates_delta() {
        let mut g = Graph::new();
        let p = g.add_point(5.0, 5.0);
        let q = g.add_relative(p, 1.0, 0.0).unwrap();
        g.set(q, 0.0, 2.0).unwrap();
        assert_eq!(g.delta(q), Some(Vec2::new(0.0, 2.0)));
        assert_eq!(g.position(q), Some(Point::new(5.0, 7.0)));
    }

    #[test]
    fn set_absolute_is_idempotent() {
        let mut g = Graph::new();
        let p = g.add_point(1.0, 1.0);
        let q = g.add_relative(p, 0.0, 0.0).unwrap();
        let watcher = g.add_relative(q, 0.0, 0.0).unwrap();

        g.set_absolute(q, 4.0, -2.0).unwrap();
        let first = (g.position(q), g.delta(q), g.point_change_count(watcher));
        g.set_absolute(q, 4.0, -2.0).unwrap();
        let second = (g.position(q), g.delta(q), g.point_change_count(watcher));
        assert_eq!(first, second);
        assert_eq!(g.position(q), Some(Point::new(4.0, -2.0)));
    }

    #[test]
    fn relative_radial_combines_offsets() {
        let mut g = Graph::new();
        let o = g.add_point(10.0, 0.0);
        let rr = g.add_relative_radial(o, Vec2::new(0.0, 5.0), 1.0, 0.0).unwrap();
        assert_eq!(g.position(rr), Some(Point::new(11.0, 5.0)));

        g.set_absolute(rr, 10.0, 8.0).unwrap();
        assert_relative_eq!(g.radius(rr).unwrap(), 3.0);
        assert_relative_eq!(g.angle(rr).unwrap(), FRAC_PI_2);
        assert_eq!(g.delta(rr), Some(Vec2::new(0.0, 5.0)));
    }

    #[test]
    fn reset_restores_original_point() {
        let mut g = Graph::new();
        let p = g.add_point(1.0, 1.0);
        let r = g.add_radial(p, 1.0, 0.0).unwrap();
        g.set(p, 3.0, 3.0).unwrap();
        g.set_angle(r, PI).unwrap();

        g.reset_point(r).unwrap();
        assert_eq!(g.position(r), g.original_point(r));
        g.reset_point(p).unwrap();
        assert_eq!(g.position(p), Some(Point::new(1.0, 1.0)));
        assert_eq!(g.position(r), Some(Point::new(2.0, 1.0)));
    }

    #[test]
    fn relative_radial_reset_restores_delta() {
        let mut g = Graph::new();
        let o = g.add_point(0.0, 0.0);
        let rr = g.add_relative_radial(o, Vec2::new(1.0, 0.0), 1.0, 0.0).unwrap();
        assert_eq!(g.position(rr), Some(Point::new(2.0, 0.0)));

        g.set(rr, 5.0, 5.0).unwrap();
        g.set_angle(rr, PI).unwrap();
        assert_eq!(g.original_point(rr), Some(Point::new(2.0, 0.0)));

        g.reset_point(rr).unwrap();
        assert_eq!(g.delta(rr), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(g.position(rr), Some(Point::new(2.0, 0.0)));
    }

    #[test]
    fn transitive_users_are_updated() {
        let mut g = Graph::new();
        let a = g.add_point(0.0, 0.0);
        let b = g.add_relative(a, 1.0, 0.0).unwrap();
        let c = g.add_radial(b, 1.0, 0.0).unwrap();
        g.set(a, 0.0, 5.0).unwrap();
        assert_eq!(g.position(c), Some(Point::new(2.0, 5.0)));
        assert_eq!(g.point_change_count(c), 1);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut g = Graph::new();
        let a = g.add_point(0.0, 0.0);
        let b = g.add_relative(a, 1.0, 0.0).unwrap();
        let err = g.add_user(b, User::Point(a)).unwrap_err();
        assert!(matches!(err, AnimationError::CyclicOrigin { .. }));
        assert!(g.add_user(a, User::Point(a)).is_err());
    }

    #[test]
    fn removing_unknown_user_is_ignored() {
        let mut g = Graph::new();
        let a = g.add_point(0.0, 0.0);
        let b = g.add_point(1.0, 1.0);
        g.remove_user(a, User::Point(b));
        assert!(g.users(a).is_empty());
    }

    #[test]
    fn radius_on_root_point_is_wrong_kind() {
        let mut g = Graph::new();
        let a = g.add_point(0.0, 0.0);
        assert!(matches!(
            g.set_radius(a, 2.0),
            Err(AnimationError::WrongKind { .. })
        ));
    }

    #[test]
    fn scope_release_unhooks_from_survivors() {
        let mut g = Graph::new();
        let keep = g.add_point(0.0, 0.0);
        g.open_scope();
        let child = g.add_relative(keep, 1.0, 1.0).unwrap();
        let scope = g.close_scope();
        assert_eq!(scope.points(), &[child]);

        g.release(scope);
        assert!(!g.contains_point(child));
        assert!(g.users(keep).is_empty());
    }
}
