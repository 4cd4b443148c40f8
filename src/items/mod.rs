//! Geometric items and their renderable outlines.
//!
//! Each item kind lives in its own module with its struct definition,
//! constructors and `Resolve` implementation side by side. Items are users of
//! the points they are drawn through: a moving point marks the item dirty and
//! the outline is recomputed the next time someone asks for it.

mod arrow;
mod circle;
mod cube;
mod group;
mod line;
mod polygon;
mod rect;
mod text;

pub use arrow::PointingArrow;
pub use circle::Circle;
pub use cube::{Axis, Cube, CubeGrid, cube_axes};
pub use group::Group;
pub use line::Line;
pub use polygon::Polygon;
pub use rect::Rectangle;
pub use text::{FontMetrics, MonospaceMetrics, Text};

use kurbo::{CubicBez, ParamCurveExtrema, Point, Rect, Shape};

use crate::graph::{Graph, ItemId, PointId, User};
use crate::types::Color;

/// Compute the renderable form of an item from the current point positions.
pub trait Resolve {
    /// Points the item is drawn through. The item is registered as a user of
    /// each of them.
    fn parameters(&self) -> Vec<PointId>;

    /// Sub-items drawn as part of this one.
    fn children(&self) -> &[ItemId] {
        &[]
    }

    /// `None` when a parameter point no longer exists.
    fn resolve(&self, graph: &Graph) -> Option<Outline>;
}

/// The renderable form of an item in scene coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Empty,
    Segment(kurbo::Line),
    Circle(kurbo::Circle),
    Rect(Rect),
    Polygon(Vec<Point>),
    Path { curve: CubicBez, head_size: f64 },
    Text { bounds: Rect, text: String },
    Composite(Vec<ItemId>),
}

impl Outline {
    /// Bounding box of a leaf outline. Composites are measured by the graph.
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Outline::Empty | Outline::Composite(_) => None,
            Outline::Segment(line) => Some(Shape::bounding_box(line)),
            Outline::Circle(circle) => Some(Shape::bounding_box(circle)),
            Outline::Rect(rect) => Some(*rect),
            Outline::Polygon(points) => bounds_of(points),
            Outline::Path { curve, .. } => Some(ParamCurveExtrema::bounding_box(curve)),
            Outline::Text { bounds, .. } => Some(*bounds),
        }
    }
}

pub(crate) fn bounds_of(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Line(Line),
    Circle(Circle),
    Rectangle(Rectangle),
    Polygon(Polygon),
    Text(Text),
    Arrow(PointingArrow),
    Group(Group),
    Cube(Cube),
    CubeGrid(CubeGrid),
}

impl ItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Line(_) => "line",
            ItemKind::Circle(_) => "circle",
            ItemKind::Rectangle(_) => "rectangle",
            ItemKind::Polygon(_) => "polygon",
            ItemKind::Text(_) => "text",
            ItemKind::Arrow(_) => "pointing arrow",
            ItemKind::Group(_) => "group",
            ItemKind::Cube(_) => "cube",
            ItemKind::CubeGrid(_) => "cube grid",
        }
    }

    fn as_resolve(&self) -> &dyn Resolve {
        match self {
            ItemKind::Line(o) => o,
            ItemKind::Circle(o) => o,
            ItemKind::Rectangle(o) => o,
            ItemKind::Polygon(o) => o,
            ItemKind::Text(o) => o,
            ItemKind::Arrow(o) => o,
            ItemKind::Group(o) => o,
            ItemKind::Cube(o) => o,
            ItemKind::CubeGrid(o) => o,
        }
    }
}

impl Resolve for ItemKind {
    fn parameters(&self) -> Vec<PointId> {
        self.as_resolve().parameters()
    }

    fn children(&self) -> &[ItemId] {
        self.as_resolve().children()
    }

    fn resolve(&self, graph: &Graph) -> Option<Outline> {
        self.as_resolve().resolve(graph)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemStyle {
    pub outline: Color,
    pub fill: Option<Color>,
    pub thickness: f64,
    pub opacity: f64,
    pub visible: bool,
    pub z_order: i32,
}

impl Default for ItemStyle {
    fn default() -> Self {
        ItemStyle {
            outline: Color::WHITE,
            fill: None,
            thickness: 1.0,
            opacity: 1.0,
            visible: true,
            z_order: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub(crate) kind: ItemKind,
    pub(crate) style: ItemStyle,
    default_visible: bool,
    default_opacity: f64,
    dirty: bool,
    outline: Outline,
    change_count: u64,
}

impl Item {
    fn new(kind: ItemKind) -> Self {
        let style = ItemStyle::default();
        Item {
            kind,
            default_visible: style.visible,
            default_opacity: style.opacity,
            style,
            dirty: true,
            outline: Outline::Empty,
            change_count: 0,
        }
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn style(&self) -> &ItemStyle {
        &self.style
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// How many times one of the item's points told it about a move.
    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    pub(crate) fn is_text(&self) -> bool {
        matches!(self.kind, ItemKind::Text(_))
    }

    pub(crate) fn parameters(&self) -> Vec<PointId> {
        self.kind.parameters()
    }

    pub(crate) fn geometry_changed(&mut self) {
        self.dirty = true;
        self.change_count += 1;
    }

    pub(crate) fn forget_child(&mut self, child: ItemId) {
        if let ItemKind::Group(group) = &mut self.kind {
            group.children.retain(|c| *c != child);
            self.dirty = true;
        }
    }
}

fn item_not_found(id: ItemId) -> crate::error::AnimationError {
    crate::error::AnimationError::ItemNotFound {
        id: format!("{id:?}"),
    }
}

impl Graph {
    /// Insert an item and register it as a user of its points.
    pub fn add_item(&mut self, kind: ItemKind) -> ItemId {
        let params = kind.parameters();
        let id = self.items.insert(Item::new(kind));
        for p in params {
            // Item users never close a cycle; a missing point just leaves the
            // item unresolvable.
            let _ = self.add_user(p, User::Item(id));
        }
        self.track_item(id);
        id
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn item_style(&self, id: ItemId) -> Option<&ItemStyle> {
        self.items.get(id).map(|i| &i.style)
    }

    /// The item's current outline, recomputed first if it is dirty.
    pub fn outline(&mut self, id: ItemId) -> Option<&Outline> {
        let item = self.items.get(id)?;
        if item.dirty {
            let fresh = item.kind.resolve(self).unwrap_or(Outline::Empty);
            let item = &mut self.items[id];
            item.outline = fresh;
            item.dirty = false;
        }
        Some(&self.items[id].outline)
    }

    /// Every point the item and its sub-items are drawn through.
    pub fn all_points(&self, id: ItemId) -> Vec<PointId> {
        let mut out = Vec::new();
        for item_id in self.subtree(id) {
            for p in self.items[item_id].kind.parameters() {
                if !out.contains(&p) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Bounding rectangle in scene coordinates; the union of the children for
    /// composite items.
    pub fn scene_rect(&mut self, id: ItemId) -> Option<Rect> {
        match self.outline(id)?.clone() {
            Outline::Composite(children) => children
                .into_iter()
                .filter_map(|c| self.scene_rect(c))
                .reduce(|a, b| a.union(b)),
            other => other.bounding_box(),
        }
    }

    /// The item followed by all of its descendants, depth first.
    pub fn subtree(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(item) = self.items.get(next) else {
                continue;
            };
            if out.contains(&next) {
                continue;
            }
            out.push(next);
            stack.extend(item.kind.children().iter().rev());
        }
        out
    }

    fn style_tree(&mut self, id: ItemId, mut f: impl FnMut(&mut ItemStyle)) -> crate::error::Result<()> {
        if !self.items.contains_key(id) {
            return Err(item_not_found(id));
        }
        for item in self.subtree(id) {
            f(&mut self.items[item].style);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Common style operations. Composite items fan out to their sub-items.
    // -----------------------------------------------------------------------

    pub fn set_outline_color(&mut self, id: ItemId, color: Color) -> crate::error::Result<()> {
        self.style_tree(id, |s| s.outline = color)
    }

    pub fn set_fill_color(&mut self, id: ItemId, color: Option<Color>) -> crate::error::Result<()> {
        self.style_tree(id, |s| s.fill = color)
    }

    pub fn set_thickness(&mut self, id: ItemId, thickness: f64) -> crate::error::Result<()> {
        self.style_tree(id, |s| s.thickness = thickness.max(0.0))
    }

    pub fn set_opacity(&mut self, id: ItemId, opacity: f64) -> crate::error::Result<()> {
        let opacity = opacity.clamp(0.0, 1.0);
        self.style_tree(id, |s| s.opacity = opacity)
    }

    pub fn set_visible(&mut self, id: ItemId, visible: bool) -> crate::error::Result<()> {
        self.style_tree(id, |s| s.visible = visible)
    }

    /// Shift the item to `z`; sub-items keep their z-order relative to it.
    pub fn set_z_order(&mut self, id: ItemId, z: i32) -> crate::error::Result<()> {
        let current = self
            .items
            .get(id)
            .map(|i| i.style.z_order)
            .ok_or_else(|| item_not_found(id))?;
        let shift = z - current;
        self.style_tree(id, |s| s.z_order += shift)
    }

    /// Restore default visibility and opacity on the item and its sub-items.
    pub fn reset_item(&mut self, id: ItemId) -> crate::error::Result<()> {
        if !self.items.contains_key(id) {
            return Err(item_not_found(id));
        }
        for item in self.subtree(id) {
            let item = &mut self.items[item];
            item.style.visible = item.default_visible;
            item.style.opacity = item.default_opacity;
        }
        Ok(())
    }

    /// Return the item to how it started: the points it is drawn through and
    /// the origins they hang from go back to their starting positions, roots
    /// first, then `reset_item` restores visibility and opacity.
    pub fn restore_item(&mut self, id: ItemId) -> crate::error::Result<()> {
        if !self.items.contains_key(id) {
            return Err(item_not_found(id));
        }
        let mut points = Vec::new();
        for p in self.all_points(id) {
            let mut next = Some(p);
            while let Some(q) = next {
                if points.contains(&q) {
                    break;
                }
                points.push(q);
                next = self.points.get(q).and_then(|n| n.kind.origin());
            }
        }
        points.sort_by_key(|p| self.point_depth(*p));
        for p in points {
            self.reset_point(p)?;
        }
        self.reset_item(id)
    }

    /// Make the current visibility and opacity the ones `reset_item` restores.
    pub fn store_item_defaults(&mut self, id: ItemId) {
        for item in self.subtree(id) {
            let item = &mut self.items[item];
            item.default_visible = item.style.visible;
            item.default_opacity = item.style.opacity;
        }
    }

    pub(crate) fn item_kind_mut(&mut self, id: ItemId) -> crate::error::Result<&mut ItemKind> {
        let item = self.items.get_mut(id).ok_or_else(|| item_not_found(id))?;
        item.dirty = true;
        Ok(&mut item.kind)
    }
}
