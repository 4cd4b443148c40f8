//! Scene — what the controller draws into.
//!
//! The `Scene` trait is everything the animation controller needs from a
//! host: an item list, titles, viewport framing and one pointing arrow that
//! outlives every animation reset. `CanvasScene` is the in-memory version
//! the terminal renderer reads from.

use kurbo::Rect;
use tracing::{debug, warn};

use crate::animation::Actor;
use crate::error::{AnimationError, Result};
use crate::graph::{Graph, ItemId, PointId};
use crate::types::Color;

/// Scene units added around the contents by `ensure_all_contents_fit`.
pub const DEFAULT_MARGIN: f64 = 1.0;

/// Name of the shared pointing arrow actor.
pub const POINTING_ARROW: &str = "pointing_arrow";

/// A missing item means there is nothing left to update.
fn skip_missing(result: Result<()>, action: &str) {
    match result {
        Ok(()) | Err(AnimationError::ItemNotFound { .. }) => {}
        Err(err) => warn!(action, "{err}"),
    }
}

pub trait Scene {
    fn add_item(&mut self, item: ItemId);
    fn remove_item(&mut self, item: ItemId);
    fn remove_all_items(&mut self);
    fn items(&self) -> &[ItemId];

    fn add_actor(&mut self, actor: &Actor) {
        self.add_item(actor.item());
    }

    fn remove_actor(&mut self, actor: &Actor) {
        self.remove_item(actor.item());
    }

    fn set_main_title(&mut self, title: &str);
    fn set_subtitle(&mut self, subtitle: &str);
    fn set_shot_title(&mut self, title: &str);
    fn set_shot_description(&mut self, description: &str);

    /// The shared pointing arrow, created on first use and kept in the
    /// scene from then on.
    fn pointing_arrow(&mut self, graph: &mut Graph) -> Actor;

    /// Hide the pointing arrow and point it back at its own resting point.
    fn park_pointing_arrow(&mut self, graph: &mut Graph);

    /// Frame the union of every visible item plus `margin` (scene units).
    fn ensure_all_contents_fit(&mut self, graph: &mut Graph, margin: Option<f64>);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Titles {
    pub main: String,
    pub subtitle: String,
    pub shot: String,
    pub shot_description: String,
}

#[derive(Debug, Clone)]
struct Arrow {
    actor: Actor,
    rest: PointId,
}

#[derive(Debug, Clone)]
pub struct CanvasScene {
    items: Vec<ItemId>,
    titles: Titles,
    viewport: Rect,
    /// Device units across the viewport width, used to keep the graph's
    /// view scale in step with framing.
    device_width: f64,
    arrow: Option<Arrow>,
}

impl CanvasScene {
    pub fn new(viewport: Rect, device_width: f64) -> Self {
        CanvasScene {
            items: Vec::new(),
            titles: Titles::default(),
            viewport,
            device_width: device_width.max(1.0),
            arrow: None,
        }
    }

    pub fn titles(&self) -> &Titles {
        &self.titles
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, graph: &mut Graph, viewport: Rect) {
        if viewport.width() > 0.0 && viewport.height() > 0.0 {
            self.viewport = viewport;
            graph.set_view_scale(self.device_width / viewport.width());
        }
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    /// Items in paint order: ascending z-order, insertion order among equals.
    /// Items the graph no longer holds are skipped.
    pub fn paint_order(&self, graph: &Graph) -> Vec<ItemId> {
        let mut out: Vec<(i32, ItemId)> = Vec::new();
        for root in &self.items {
            for id in graph.subtree(*root) {
                if let Some(style) = graph.item_style(id) {
                    if !out.iter().any(|(_, seen)| *seen == id) {
                        out.push((style.z_order, id));
                    }
                }
            }
        }
        out.sort_by_key(|(z, _)| *z);
        out.into_iter().map(|(_, id)| id).collect()
    }
}

impl Scene for CanvasScene {
    fn add_item(&mut self, item: ItemId) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    fn remove_item(&mut self, item: ItemId) {
        self.items.retain(|i| *i != item);
    }

    fn remove_all_items(&mut self) {
        self.items.clear();
    }

    fn items(&self) -> &[ItemId] {
        &self.items
    }

    fn set_main_title(&mut self, title: &str) {
        self.titles.main = title.to_string();
    }

    fn set_subtitle(&mut self, subtitle: &str) {
        self.titles.subtitle = subtitle.to_string();
    }

    fn set_shot_title(&mut self, title: &str) {
        self.titles.shot = title.to_string();
    }

    fn set_shot_description(&mut self, description: &str) {
        self.titles.shot_description = description.to_string();
    }

    fn pointing_arrow(&mut self, graph: &mut Graph) -> Actor {
        let alive = self
            .arrow
            .as_ref()
            .is_some_and(|a| graph.contains_item(a.actor.item()) && graph.contains_point(a.rest));
        if let Some(arrow) = self.arrow.as_ref().filter(|_| alive) {
            let actor = arrow.actor.clone();
            self.add_actor(&actor);
            return actor;
        }
        let viewport = self.viewport;
        let arrow = graph.without_scope(|g| {
            let tail = g.add_point(viewport.x1 - 1.0, viewport.y0 + 1.0);
            let rest = g.add_point(viewport.x1 - 2.0, viewport.y0 + 2.0);
            let item = g.add_pointing_arrow(tail, rest);
            // the arrow only exists in the scene once a shot points it somewhere
            let styled = g
                .set_visible(item, false)
                .and_then(|()| g.set_outline_color(item, Color::YELLOW))
                .and_then(|()| g.set_z_order(item, i32::MAX / 2));
            skip_missing(styled, "style pointing arrow");
            g.store_item_defaults(item);
            Arrow {
                actor: Actor::new(POINTING_ARROW, "Points at what the shot is about", item),
                rest,
            }
        });
        debug!(item = ?arrow.actor.item(), "pointing arrow created");
        let actor = arrow.actor.clone();
        self.arrow = Some(arrow);
        self.add_actor(&actor);
        actor
    }

    fn park_pointing_arrow(&mut self, graph: &mut Graph) {
        let Some(arrow) = &self.arrow else {
            return;
        };
        let item = arrow.actor.item();
        let parked = graph
            .set_arrow_head(item, arrow.rest)
            .and_then(|()| graph.set_visible(item, false));
        skip_missing(parked, "park pointing arrow");
    }

    fn ensure_all_contents_fit(&mut self, graph: &mut Graph, margin: Option<f64>) {
        let margin = margin.unwrap_or(DEFAULT_MARGIN).max(0.0);
        let visible: Vec<ItemId> = self
            .items
            .iter()
            .copied()
            .filter(|id| graph.item_style(*id).is_some_and(|s| s.visible))
            .collect();
        let bounds = visible
            .into_iter()
            .filter_map(|id| graph.scene_rect(id))
            .reduce(|a, b| a.union(b));
        let Some(bounds) = bounds else {
            return;
        };
        let framed = bounds.inflate(margin, margin);
        if framed.width() > 0.0 && framed.height() > 0.0 {
            debug!(?framed, "framing scene contents");
            self.set_viewport(graph, framed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> CanvasScene {
        CanvasScene::new(Rect::new(0.0, 0.0, 10.0, 10.0), 100.0)
    }

    #[test]
    fn fit_frames_visible_items_with_margin() {
        let mut g = Graph::new();
        let mut s = scene();
        let a = g.add_point(2.0, 3.0);
        let b = g.add_point(6.0, 5.0);
        let line = g.add_line(a, b);
        let far = g.add_point(50.0, 50.0);
        let hidden = g.add_circle(far, 1.0);
        g.set_visible(hidden, false).unwrap();
        s.add_item(line);
        s.add_item(hidden);

        s.ensure_all_contents_fit(&mut g, Some(1.0));
        assert_eq!(s.viewport(), Rect::new(1.0, 2.0, 7.0, 6.0));
        assert_eq!(g.view_scale(), 100.0 / 6.0);
    }

    #[test]
    fn fit_without_contents_keeps_viewport() {
        let mut g = Graph::new();
        let mut s = scene();
        s.ensure_all_contents_fit(&mut g, None);
        assert_eq!(s.viewport(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn pointing_arrow_is_shared_and_survives_scopes() {
        let mut g = Graph::new();
        let mut s = scene();
        g.open_scope();
        let first = s.pointing_arrow(&mut g);
        let scope = g.close_scope();
        assert!(scope.is_empty());
        g.release(scope);

        let second = s.pointing_arrow(&mut g);
        assert_eq!(first, second);
        assert_eq!(first.name(), POINTING_ARROW);
        assert!(s.contains(first.item()));
        assert!(!first.is_shown(&g));
    }

    #[test]
    fn parking_retargets_to_rest_point() {
        let mut g = Graph::new();
        let mut s = scene();
        let arrow = s.pointing_arrow(&mut g);
        let target = g.add_point(4.0, 4.0);
        g.set_arrow_head(arrow.item(), target).unwrap();
        g.set_visible(arrow.item(), true).unwrap();

        s.park_pointing_arrow(&mut g);
        assert_ne!(g.arrow_head(arrow.item()), Some(target));
        assert!(g.users(target).is_empty());
        assert!(!arrow.is_shown(&g));
    }

    #[test]
    fn paint_order_follows_z() {
        let mut g = Graph::new();
        let mut s = scene();
        let a = g.add_point(0.0, 0.0);
        let front = g.add_circle(a, 1.0);
        let back = g.add_circle(a, 2.0);
        g.set_z_order(back, -1).unwrap();
        s.add_item(front);
        s.add_item(back);
        assert_eq!(s.paint_order(&g), vec![back, front]);
    }
}
