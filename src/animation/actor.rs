//! Named wrappers around items, for showing and hiding by name.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::AnimationError;
use crate::graph::{Graph, ItemId};

use super::flat::IntoFlat;

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    name: String,
    description: String,
    item: ItemId,
}

impl Actor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, item: ItemId) -> Self {
        Actor {
            name: name.into(),
            description: description.into(),
            item,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    /// Shown means the wrapped item is visible.
    pub fn is_shown(&self, graph: &Graph) -> bool {
        graph.item_style(self.item).is_some_and(|s| s.visible)
    }
}

impl IntoFlat<Actor> for Actor {
    fn flatten_into(self, out: &mut Vec<Actor>) {
        out.push(self);
    }
}

/// Which actor names are shown, keyed by name.
pub type ActorSnapshot = BTreeMap<String, bool>;

#[derive(Debug, Clone, Default)]
pub struct ActorSet {
    actors: Vec<Actor>,
}

impl ActorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add actors, flattening nested collections. Returns what was added.
    pub fn add(&mut self, actors: impl IntoFlat<Actor>) -> Vec<Actor> {
        let mut added = Vec::new();
        actors.flatten_into(&mut added);
        self.actors.extend(added.iter().cloned());
        added
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn clear(&mut self) {
        self.actors.clear();
    }

    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Actor> {
        self.actors.iter().filter(move |a| a.name == name)
    }

    /// Distinct names in first-seen order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for actor in &self.actors {
            if !names.contains(&actor.name.as_str()) {
                names.push(&actor.name);
            }
        }
        names
    }

    /// Show or hide every actor with this name. Unknown names do nothing.
    pub fn show(&self, graph: &mut Graph, name: &str, shown: bool) {
        for actor in self.named(name) {
            match graph.set_visible(actor.item, shown) {
                // actors whose item is gone are skipped
                Ok(()) | Err(AnimationError::ItemNotFound { .. }) => {}
                Err(err) => warn!(actor = %actor.name, "cannot change visibility: {err}"),
            }
        }
    }

    pub fn snapshot(&self, graph: &Graph) -> ActorSnapshot {
        let mut map = ActorSnapshot::new();
        for actor in &self.actors {
            map.entry(actor.name.clone())
                .or_insert_with(|| actor.is_shown(graph));
        }
        map
    }

    pub fn apply_snapshot(&self, graph: &mut Graph, snapshot: &ActorSnapshot) {
        for (name, shown) in snapshot {
            self.show(graph, name, *shown);
        }
    }
}
