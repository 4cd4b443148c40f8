use crate::error::{AnimationError, Result};
use crate::graph::{Graph, ItemId, PointId};

use super::{ItemKind, Outline, Resolve};

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub children: Vec<ItemId>,
}

impl Resolve for Group {
    fn parameters(&self) -> Vec<PointId> {
        Vec::new()
    }

    fn children(&self) -> &[ItemId] {
        &self.children
    }

    fn resolve(&self, _graph: &Graph) -> Option<Outline> {
        // Groups draw nothing themselves; members render through them.
        Some(Outline::Composite(self.children.clone()))
    }
}

impl Graph {
    pub fn add_group(&mut self, children: Vec<ItemId>) -> ItemId {
        self.add_item(ItemKind::Group(Group { children }))
    }

    pub fn group_push(&mut self, group: ItemId, child: ItemId) -> Result<()> {
        match self.item_kind_mut(group)? {
            ItemKind::Group(g) => {
                if !g.children.contains(&child) {
                    g.children.push(child);
                }
                Ok(())
            }
            other => Err(AnimationError::WrongKind {
                expected: "group",
                actual: other.name(),
            }),
        }
    }

    pub fn group_remove(&mut self, group: ItemId, child: ItemId) {
        if let Some(item) = self.items.get_mut(group) {
            item.forget_child(child);
        }
    }
}
