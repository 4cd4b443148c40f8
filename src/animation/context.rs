//! What author callbacks get to touch.

use crate::engine::Engine;
use crate::error::Result;
use crate::graph::{Graph, PointId};
use crate::scene::Scene;

use super::actor::{Actor, ActorSet};
use super::flat::IntoFlat;
use super::options::OptionSet;
use super::shot::Shot;

/// The collaborators an animation is driven with.
pub struct Runtime<'a> {
    pub graph: &'a mut Graph,
    pub scene: &'a mut dyn Scene,
    pub engine: &'a mut Engine,
}

impl<'a> Runtime<'a> {
    pub fn new(graph: &'a mut Graph, scene: &'a mut dyn Scene, engine: &'a mut Engine) -> Self {
        Runtime {
            graph,
            scene,
            engine,
        }
    }
}

/// Passed to every shot callback and hook.
pub struct ShotContext<'a, S> {
    pub state: &'a mut S,
    pub graph: &'a mut Graph,
    pub scene: &'a mut dyn Scene,
    pub engine: &'a mut Engine,
    pub options: &'a OptionSet,
    pub actors: &'a mut ActorSet,
    pub(crate) next_shots: &'a mut Vec<Shot<S>>,
}

impl<S> ShotContext<'_, S> {
    /// Add actors to the animation and the scene.
    pub fn add_actors(&mut self, actors: impl IntoFlat<Actor>) {
        for actor in self.actors.add(actors) {
            self.scene.add_actor(&actor);
        }
    }

    /// Queue shots to play right after the current one. They are dropped
    /// again when playback next restarts from the first shot.
    pub fn add_next_shots(&mut self, shots: impl IntoFlat<Shot<S>>) {
        shots.flatten_into(self.next_shots);
    }

    /// Show the scene's pointing arrow with its head on `point`.
    pub fn point_arrow_at(&mut self, point: PointId) -> Result<()> {
        let arrow = self.scene.pointing_arrow(self.graph);
        self.graph.set_arrow_head(arrow.item(), point)?;
        self.graph.set_visible(arrow.item(), true)
    }

    pub fn hide_arrow(&mut self) {
        self.scene.park_pointing_arrow(self.graph);
    }
}
