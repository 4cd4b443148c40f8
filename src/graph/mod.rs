//! Reactive geometry graph.
//!
//! Points and items live in two arenas and refer to each other through typed
//! handles. A point keeps the list of its *users*: derived points computed
//! from it and items drawn through it. Moving a point notifies every user
//! before the mutating call returns; derived users recompute and pass the
//! change on, item users mark their outline dirty.

pub mod point;

use kurbo::Point;
use slotmap::{SlotMap, new_key_type};
use tracing::debug;

use crate::error::{AnimationError, Result};
use crate::items::{FontMetrics, Item, MonospaceMetrics};

pub use point::{PointKind, PointNode};

new_key_type! {
    /// Handle to a reactive point.
    pub struct PointId;
    /// Handle to a geometric item.
    pub struct ItemId;
}

/// Something that must hear about a point moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum User {
    Point(PointId),
    Item(ItemId),
}

/// Points and items created between `open_scope` and `close_scope`.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    points: Vec<PointId>,
    items: Vec<ItemId>,
}

impl Scope {
    pub fn points(&self) -> &[PointId] {
        &self.points
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.items.is_empty()
    }

    /// Take over everything `other` recorded.
    pub fn merge(&mut self, other: Scope) {
        self.points.extend(other.points);
        self.items.extend(other.items);
    }
}

pub struct Graph {
    pub(crate) points: SlotMap<PointId, PointNode>,
    pub(crate) items: SlotMap<ItemId, Item>,
    metrics: Box<dyn FontMetrics>,
    view_scale: f64,
    scopes: Vec<Scope>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("points", &self.points.len())
            .field("items", &self.items.len())
            .field("view_scale", &self.view_scale)
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_metrics(MonospaceMetrics)
    }

    pub fn with_metrics(metrics: impl FontMetrics + 'static) -> Self {
        Self {
            points: SlotMap::with_key(),
            items: SlotMap::with_key(),
            metrics: Box::new(metrics),
            view_scale: 1.0,
            scopes: Vec::new(),
        }
    }

    pub fn metrics(&self) -> &dyn FontMetrics {
        self.metrics.as_ref()
    }

    pub fn set_metrics(&mut self, metrics: impl FontMetrics + 'static) {
        self.metrics = Box::new(metrics);
        self.mark_text_dirty();
    }

    /// Device units per scene unit (the view zoom). Fixed-size text divides
    /// its metrics by this so it keeps its on-screen size when the view zooms.
    pub fn view_scale(&self) -> f64 {
        self.view_scale
    }

    pub fn set_view_scale(&mut self, scale: f64) {
        if scale > 0.0 && scale != self.view_scale {
            self.view_scale = scale;
            self.mark_text_dirty();
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn contains_point(&self, id: PointId) -> bool {
        self.points.contains_key(id)
    }

    pub fn contains_item(&self, id: ItemId) -> bool {
        self.items.contains_key(id)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Register `user` on `point`. Adding an existing user is a no-op.
    pub fn add_user(&mut self, point: PointId, user: User) -> Result<()> {
        if !self.points.contains_key(point) {
            return Err(AnimationError::PointNotFound {
                id: format!("{point:?}"),
            });
        }
        if let User::Point(p) = user {
            if p == point || self.reaches(p, point) {
                return Err(AnimationError::CyclicOrigin {
                    point: format!("{point:?}"),
                    user: format!("{p:?}"),
                });
            }
        }
        let node = &mut self.points[point];
        if !node.users.contains(&user) {
            node.users.push(user);
        }
        Ok(())
    }

    /// Unregister `user` from `point`. Unknown points or users are ignored.
    pub fn remove_user(&mut self, point: PointId, user: User) {
        if let Some(node) = self.points.get_mut(point) {
            node.users.retain(|u| *u != user);
        }
    }

    pub fn users(&self, point: PointId) -> &[User] {
        self.points.get(point).map(|n| n.users.as_slice()).unwrap_or(&[])
    }

    /// Whether a change to `from` propagates (transitively) to point `to`.
    fn reaches(&self, from: PointId, to: PointId) -> bool {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(p) = stack.pop() {
            if p == to {
                return true;
            }
            if seen.contains(&p) {
                continue;
            }
            seen.push(p);
            for user in self.users(p) {
                if let User::Point(next) = user {
                    stack.push(*next);
                }
            }
        }
        false
    }

    /// Tell every user of `point` that it moved.
    pub(crate) fn notify(&mut self, point: PointId) {
        let users = match self.points.get(point) {
            Some(node) => node.users.clone(),
            None => return,
        };
        for user in users {
            match user {
                User::Point(p) => self.recompute(p),
                User::Item(i) => {
                    if let Some(item) = self.items.get_mut(i) {
                        item.geometry_changed();
                    }
                }
            }
        }
    }

    fn mark_text_dirty(&mut self) {
        for (_, item) in self.items.iter_mut() {
            if item.is_text() {
                item.geometry_changed();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------------

    /// Start recording created points and items. Scopes nest.
    pub fn open_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn close_scope(&mut self) -> Scope {
        self.scopes.pop().unwrap_or_default()
    }

    /// Run `f` with scope recording suspended, for objects that must outlive
    /// whatever scope is open.
    pub fn without_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::take(&mut self.scopes);
        let out = f(self);
        self.scopes = saved;
        out
    }

    pub(crate) fn track_point(&mut self, id: PointId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.points.push(id);
        }
    }

    pub(crate) fn track_item(&mut self, id: ItemId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.items.push(id);
        }
    }

    /// Remove everything a scope recorded.
    pub fn release(&mut self, scope: Scope) {
        debug!(
            points = scope.points.len(),
            items = scope.items.len(),
            "releasing graph scope"
        );
        for item in scope.items {
            self.remove_item(item);
        }
        for point in scope.points {
            self.remove_point(point);
        }
    }

    /// Remove a point. Items still drawn through it resolve to nothing;
    /// derived points that used it keep their last position.
    pub fn remove_point(&mut self, id: PointId) {
        let Some(node) = self.points.remove(id) else {
            return;
        };
        if let Some(origin) = node.kind.origin() {
            self.remove_user(origin, User::Point(id));
        }
        for user in node.users {
            if let User::Item(i) = user {
                if let Some(item) = self.items.get_mut(i) {
                    item.geometry_changed();
                }
            }
        }
    }

    /// Remove an item and unregister it from its points and parent group.
    pub fn remove_item(&mut self, id: ItemId) {
        let Some(item) = self.items.remove(id) else {
            return;
        };
        for p in item.parameters() {
            self.remove_user(p, User::Item(id));
        }
        for (_, other) in self.items.iter_mut() {
            other.forget_child(id);
        }
    }

    pub(crate) fn position_or_none(&self, id: PointId) -> Option<Point> {
        self.points.get(id).map(|n| n.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_objects_survive_release() {
        let mut g = Graph::new();
        g.open_scope();
        let scoped = g.add_point(0.0, 0.0);
        let kept = g.without_scope(|g| g.add_point(1.0, 1.0));
        let scope = g.close_scope();
        assert_eq!(scope.points(), [scoped]);

        g.release(scope);
        assert!(!g.contains_point(scoped));
        assert!(g.contains_point(kept));
    }

    #[test]
    fn merged_scopes_release_together() {
        let mut g = Graph::new();
        g.open_scope();
        let a = g.add_point(0.0, 0.0);
        let mut first = g.close_scope();
        g.open_scope();
        let b = g.add_relative(a, 1.0, 0.0).unwrap();
        first.merge(g.close_scope());

        g.release(first);
        assert_eq!(g.point_count(), 0);
        assert!(!g.contains_point(b));
    }
}
