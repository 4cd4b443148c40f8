//! Animation controller.
//!
//! An `Animation` owns the actors, options and shots an author declared and
//! sequences the shots through the interpolation engine: prepare a shot,
//! wait (across ticks) for its tweens to finish, clean up, then repeat it,
//! advance, loop back or stop. Editing an option resets the animation and,
//! if it was playing, restarts it from the first shot.
//!
//! The controller never blocks. The host calls `tick` from its timer; shot
//! completion is detected there.

pub mod actor;
pub mod builder;
pub mod context;
pub mod flat;
pub mod options;
pub mod shot;

use std::mem;

use tracing::{debug, info, warn};

use crate::engine::TickOutcome;
use crate::error::OptionError;
use crate::graph::{Graph, Scope};
use crate::signal::Signal;

pub use actor::{Actor, ActorSet, ActorSnapshot};
pub use builder::{AnimationBuilder, HookFn, Hooks, OptionHookFn, OptionResponse, ShotsFn};
pub use context::{Runtime, ShotContext};
pub use flat::{IntoFlat, flatten};
pub use options::{AnimOption, OptionKind, OptionSet, OptionValue};
pub use shot::{Shot, ShotFn, ShotStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFlags {
    /// Go back to the first shot after the last one.
    pub looping: bool,
    /// Editing an option resets the animation.
    pub reset_on_change: bool,
    /// Frame the scene contents after every reset.
    pub auto_framing: bool,
    /// Frame the scene contents as every shot starts.
    pub frame_on_start: bool,
    /// Create the scene's pointing arrow before the first shot.
    pub has_pointing_arrow: bool,
}

impl Default for AnimationFlags {
    fn default() -> Self {
        AnimationFlags {
            looping: false,
            reset_on_change: true,
            auto_framing: true,
            frame_on_start: false,
            has_pointing_arrow: false,
        }
    }
}

/// Payload of the current-shot-changed signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotChanged {
    pub index: usize,
    pub name: String,
    pub description: String,
}

pub struct Animation<S> {
    name: String,
    description: String,
    flags: AnimationFlags,
    declared_shots: Vec<Shot<S>>,
    shots: Vec<Shot<S>>,
    static_actors_fn: Option<HookFn<S>>,
    static_actors: Option<Vec<Actor>>,
    actors: ActorSet,
    options: OptionSet,
    hooks: Hooks<S>,
    state: S,
    /// Everything author callbacks created since the last reset.
    scope: Scope,
    playing: bool,
    single_shot: bool,
    current_shot_index: Option<usize>,
    /// The current shot registered no tween; it ends on the next tick.
    pending_finish: bool,
    shot_changed: Signal<ShotChanged>,
}

impl<S> std::fmt::Debug for Animation<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("name", &self.name)
            .field("shots", &self.shots)
            .field("actors", &self.actors.len())
            .field("playing", &self.playing)
            .field("single_shot", &self.single_shot)
            .field("current_shot_index", &self.current_shot_index)
            .finish()
    }
}

impl<S: Default> Animation<S> {
    pub(crate) fn from_parts(
        name: String,
        description: String,
        flags: AnimationFlags,
        shots: Vec<Shot<S>>,
        static_actors_fn: Option<HookFn<S>>,
        options: OptionSet,
        hooks: Hooks<S>,
    ) -> Self {
        Animation {
            name,
            description,
            flags,
            declared_shots: shots,
            shots: Vec::new(),
            static_actors_fn,
            static_actors: None,
            actors: ActorSet::new(),
            options,
            hooks,
            state: S::default(),
            scope: Scope::default(),
            playing: false,
            single_shot: false,
            current_shot_index: None,
            pending_finish: false,
            shot_changed: Signal::new(),
        }
    }
}

impl<S> Animation<S> {
    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn flags(&self) -> &AnimationFlags {
        &self.flags
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.flags.looping = looping;
    }

    /// The shots of the current run, generated ones included.
    pub fn shots(&self) -> &[Shot<S>] {
        &self.shots
    }

    pub fn declared_shots(&self) -> &[Shot<S>] {
        &self.declared_shots
    }

    pub fn current_shot_index(&self) -> Option<usize> {
        self.current_shot_index
    }

    pub fn current_shot(&self) -> Option<&Shot<S>> {
        self.shots.get(self.current_shot_index?)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_single_shot(&self) -> bool {
        self.single_shot
    }

    pub fn actors(&self) -> &ActorSet {
        &self.actors
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn on_shot_changed(&mut self) -> &mut Signal<ShotChanged> {
        &mut self.shot_changed
    }

    /// Show or hide every actor with this name.
    pub fn show_actors(&self, graph: &mut Graph, name: &str, shown: bool) {
        self.actors.show(graph, name, shown);
    }

    pub fn actor_snapshot(&self, graph: &Graph) -> ActorSnapshot {
        self.actors.snapshot(graph)
    }
}

impl<S: Default> Animation<S> {

    // -----------------------------------------------------------------------
    // Callback plumbing
    // -----------------------------------------------------------------------

    /// Run `f` with a context over this animation and `rt`. Objects created
    /// inside are recorded for release at the next reset unless `keep` is
    /// set; shots queued with `add_next_shots` are inserted afterwards.
    fn with_context<R>(
        &mut self,
        rt: &mut Runtime<'_>,
        keep: bool,
        f: impl FnOnce(&mut ShotContext<'_, S>) -> R,
    ) -> R {
        let mut next_shots = Vec::new();
        if !keep {
            rt.graph.open_scope();
        }
        let out = {
            let mut ctx = ShotContext {
                state: &mut self.state,
                graph: &mut *rt.graph,
                scene: &mut *rt.scene,
                engine: &mut *rt.engine,
                options: &self.options,
                actors: &mut self.actors,
                next_shots: &mut next_shots,
            };
            f(&mut ctx)
        };
        if !keep {
            self.scope.merge(rt.graph.close_scope());
        }
        self.insert_next_shots(next_shots);
        out
    }

    fn call_hook(&mut self, rt: &mut Runtime<'_>, hook: &str, f: HookFn<S>) {
        if let Err(err) = self.with_context(rt, false, |ctx| f(ctx)) {
            warn!(animation = %self.name, hook, "hook failed: {err:#}");
        }
    }

    fn run_steps(&mut self, rt: &mut Runtime<'_>, shot: &Shot<S>, phase: &str) {
        let steps = match phase {
            "prepare" => shot.prepare_steps(),
            _ => shot.cleanup_steps(),
        };
        let failed: usize = self.with_context(rt, false, |ctx| {
            steps.iter().map(|s| s.run(ctx, shot.name(), phase)).sum()
        });
        if failed > 0 {
            debug!(shot = shot.name(), phase, failed, "shot callbacks skipped");
        }
    }

    fn insert_next_shots(&mut self, mut shots: Vec<Shot<S>>) {
        if shots.is_empty() {
            return;
        }
        for shot in &mut shots {
            shot.mark_generated();
        }
        let at = self
            .current_shot_index
            .map_or(0, |i| i + 1)
            .min(self.shots.len());
        debug!(count = shots.len(), at, "inserting generated shots");
        self.shots.splice(at..at, shots);
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Drop and regenerate actors and shots, keeping which actor names were
    /// shown. Stops playback. If the last shot was current it stays current;
    /// otherwise no shot is.
    pub fn reset(&mut self, rt: &mut Runtime<'_>) {
        info!(animation = %self.name, "resetting animation");
        rt.engine.stop();
        self.playing = false;
        self.single_shot = false;
        self.pending_finish = false;
        let was_last = matches!(self.current_shot_index, Some(i) if i + 1 == self.shots.len());
        let snapshot = self.actors.snapshot(rt.graph);

        rt.scene.park_pointing_arrow(rt.graph);
        for actor in self.actors.iter() {
            rt.scene.remove_actor(actor);
        }
        let scope = mem::take(&mut self.scope);
        for item in scope.items() {
            rt.scene.remove_item(*item);
        }
        rt.graph.release(scope);
        self.actors.clear();
        self.shots.clear();
        self.current_shot_index = None;
        self.state = S::default();

        if let Some(statics) = self.static_actors.clone() {
            for actor in self.actors.add(statics) {
                if let Err(err) = rt.graph.restore_item(actor.item()) {
                    warn!(animation = %self.name, actor = actor.name(), "cannot restore actor: {err}");
                }
                rt.scene.add_actor(&actor);
            }
        } else if let Some(f) = self.static_actors_fn.clone() {
            if let Err(err) = self.with_context(rt, true, |ctx| f(ctx)) {
                warn!(animation = %self.name, "actor setup failed: {err:#}");
            }
            self.static_actors = Some(self.actors.iter().cloned().collect());
        }
        if let Some(f) = self.hooks.generate_actors.clone() {
            self.call_hook(rt, "generate_actors", f);
        }
        self.actors.apply_snapshot(rt.graph, &snapshot);

        self.shots = self.declared_shots.clone();
        if let Some(f) = self.hooks.generate_shots.clone() {
            match self.with_context(rt, false, |ctx| f(ctx)) {
                Ok(shots) => self.shots.extend(shots),
                Err(err) => warn!(animation = %self.name, "shot generation failed: {err:#}"),
            }
        }
        if let Some(f) = self.hooks.reset.clone() {
            self.call_hook(rt, "reset", f);
        }
        if self.flags.auto_framing {
            rt.scene.ensure_all_contents_fit(rt.graph, None);
        }
        if was_last && !self.shots.is_empty() {
            self.current_shot_index = Some(self.shots.len() - 1);
        }
    }

    /// Start playing, from shot `start_at` if given, else after the current
    /// shot. Does nothing while already playing.
    pub fn play(&mut self, rt: &mut Runtime<'_>, start_at: Option<usize>) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.single_shot = false;
        if let Some(start) = start_at {
            self.current_shot_index = start.checked_sub(1).filter(|i| *i < self.shots.len());
        }
        self.play_next_shot(rt);
    }

    /// Play the current shot. When not already playing, only this shot
    /// plays.
    pub fn play_current_shot(&mut self, rt: &mut Runtime<'_>) {
        if !self.playing {
            self.playing = true;
            self.single_shot = true;
        }
        self.resume_play(rt);
    }

    /// Move to the next shot (the same one when it repeats during
    /// continuous play) and play it.
    pub fn play_next_shot(&mut self, rt: &mut Runtime<'_>) {
        let len = self.shots.len();
        let repeating = matches!(
            self.current_shot_index,
            Some(i) if i < len && self.playing && !self.single_shot && self.shots[i].is_repeat()
        );
        let next = match self.current_shot_index {
            Some(i) if repeating => i,
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        if next == 0 && !repeating {
            self.prepare_playing(rt);
        }
        if self.shots.is_empty() {
            warn!(animation = %self.name, "nothing to play");
            self.stop(rt);
            return;
        }
        self.current_shot_index = Some(next);
        self.play_current_shot(rt);
    }

    /// Bring the state in line, show titles and hand the current shot to the
    /// engine.
    pub fn resume_play(&mut self, rt: &mut Runtime<'_>) {
        let index = match self.current_shot_index {
            Some(i) if i < self.shots.len() => i,
            Some(_) if !self.shots.is_empty() => self.shots.len() - 1,
            _ => {
                self.prepare_playing(rt);
                0
            }
        };
        let Some(shot) = self.shots.get(index).cloned() else {
            warn!(animation = %self.name, "nothing to play");
            self.stop(rt);
            return;
        };
        self.current_shot_index = Some(index);
        rt.engine.stop();
        self.pending_finish = false;

        rt.scene.set_main_title(&self.name);
        rt.scene.set_subtitle(&self.description);
        rt.scene.set_shot_title(shot.name());
        rt.scene.set_shot_description(shot.description());
        if self.flags.has_pointing_arrow {
            rt.scene.pointing_arrow(rt.graph);
        }
        if self.flags.frame_on_start {
            rt.scene.ensure_all_contents_fit(rt.graph, None);
        }

        debug!(animation = %self.name, shot = shot.name(), index, "shot started");
        self.run_steps(rt, &shot, "prepare");
        if !rt.engine.is_active() {
            self.pending_finish = true;
        }
        self.shot_changed.emit(&ShotChanged {
            index,
            name: shot.name().to_string(),
            description: shot.description().to_string(),
        });
    }

    /// Stop playing and cancel every running tween.
    pub fn stop(&mut self, rt: &mut Runtime<'_>) {
        if self.playing {
            debug!(animation = %self.name, "stopped");
            self.playing = false;
            self.single_shot = false;
            rt.engine.stop();
        }
        self.pending_finish = false;
    }

    /// Advance the engine to `now` and react to the current shot finishing.
    pub fn tick(&mut self, rt: &mut Runtime<'_>, now: f64) -> TickOutcome {
        if self.pending_finish {
            self.pending_finish = false;
            if self.playing {
                self.shot_finished(rt);
            }
            return TickOutcome {
                all_done: true,
                ..TickOutcome::default()
            };
        }
        let outcome = rt.engine.tick(rt.graph, now);
        if outcome.all_done && self.playing {
            self.shot_finished(rt);
        }
        outcome
    }

    /// Clean up the current shot, then repeat it, move on, or stop.
    pub fn shot_finished(&mut self, rt: &mut Runtime<'_>) {
        let Some(shot) = self.current_shot().cloned() else {
            self.stop(rt);
            return;
        };
        debug!(animation = %self.name, shot = shot.name(), "shot finished");
        self.run_steps(rt, &shot, "cleanup");
        if let Some(f) = self.hooks.shot_ended.clone() {
            self.call_hook(rt, "shot_ended", f);
        }

        let is_last = self
            .current_shot_index
            .is_none_or(|i| i + 1 >= self.shots.len());
        let keep = self.playing
            && !self.single_shot
            && (self.flags.looping || shot.is_repeat() || !is_last);
        if !keep {
            self.stop(rt);
        } else if shot.is_repeat() {
            self.play_current_shot(rt);
        } else {
            self.play_next_shot(rt);
        }
    }

    /// Drop the shots inserted during the previous run.
    pub fn prepare_playing(&mut self, rt: &mut Runtime<'_>) {
        let before = self.shots.len();
        self.shots.retain(|s| !s.is_generated());
        if self.shots.len() != before {
            debug!(pruned = before - self.shots.len(), "generated shots pruned");
        }
        if self
            .current_shot_index
            .is_some_and(|i| i >= self.shots.len())
        {
            self.current_shot_index = None;
        }
        if let Some(f) = self.hooks.prepare_playing.clone() {
            self.call_hook(rt, "prepare_playing", f);
        }
    }

    // -----------------------------------------------------------------------
    // Options and actors
    // -----------------------------------------------------------------------

    /// React to an edited option: by default reset, then restart from the
    /// first shot if the animation was playing.
    pub fn option_changed(&mut self, rt: &mut Runtime<'_>, name: &str) {
        let Some(option) = self.options.get(name).cloned() else {
            return;
        };
        let response = match self.hooks.option_changed.clone() {
            Some(f) => self
                .with_context(rt, false, |ctx| f(ctx, &option))
                .unwrap_or_else(|err| {
                    warn!(option = name, "option hook failed: {err:#}");
                    OptionResponse::Default
                }),
            None => OptionResponse::Default,
        };
        let reset = match response {
            OptionResponse::Ignore => false,
            OptionResponse::Reset => true,
            OptionResponse::Default => self.flags.reset_on_change,
        };
        if reset {
            let was_playing = self.playing;
            self.stop(rt);
            self.reset(rt);
            if was_playing {
                self.play(rt, Some(0));
            }
        }
    }

    /// Set an option from text and run the option-changed path. Unknown
    /// names give `Ok(false)`; bad text leaves the option as it was.
    pub fn set_option(
        &mut self,
        rt: &mut Runtime<'_>,
        name: &str,
        text: &str,
    ) -> Result<bool, OptionError> {
        let Some(option) = self.options.get_mut(name) else {
            return Ok(false);
        };
        option.set_text(text)?;
        self.option_changed(rt, name);
        Ok(true)
    }
}
