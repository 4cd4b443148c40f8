//! Declaring an animation.

use std::rc::Rc;

use crate::error::ValidationError;

use super::context::ShotContext;
use super::flat::IntoFlat;
use super::options::{AnimOption, OptionSet};
use super::shot::Shot;
use super::{Animation, AnimationFlags};

pub type HookFn<S> = Rc<dyn Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()>>;
pub type ShotsFn<S> = Rc<dyn Fn(&mut ShotContext<'_, S>) -> anyhow::Result<Vec<Shot<S>>>>;
pub type OptionHookFn<S> =
    Rc<dyn Fn(&mut ShotContext<'_, S>, &AnimOption) -> anyhow::Result<OptionResponse>>;

/// What to do after an option changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionResponse {
    /// Reset (and resume) only when the animation resets on change.
    #[default]
    Default,
    /// Leave everything as it is.
    Ignore,
    /// Reset, and resume if the animation was playing.
    Reset,
}

/// Optional author callbacks that replace or extend the controller's steps.
pub struct Hooks<S> {
    /// Builds the actors. Runs at every reset; what it creates is released
    /// at the next one.
    pub generate_actors: Option<HookFn<S>>,
    /// Shots appended after the declared ones at every reset.
    pub generate_shots: Option<ShotsFn<S>>,
    /// Runs last in every reset.
    pub reset: Option<HookFn<S>>,
    pub option_changed: Option<OptionHookFn<S>>,
    /// Runs before playback starts again from the first shot, after
    /// generated shots were pruned.
    pub prepare_playing: Option<HookFn<S>>,
    /// Runs after a shot's cleanups.
    pub shot_ended: Option<HookFn<S>>,
}

impl<S> Default for Hooks<S> {
    fn default() -> Self {
        Hooks {
            generate_actors: None,
            generate_shots: None,
            reset: None,
            option_changed: None,
            prepare_playing: None,
            shot_ended: None,
        }
    }
}

impl<S> Hooks<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_actors(
        mut self,
        f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.generate_actors = Some(Rc::new(f));
        self
    }

    pub fn generate_shots(
        mut self,
        f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<Vec<Shot<S>>> + 'static,
    ) -> Self {
        self.generate_shots = Some(Rc::new(f));
        self
    }

    pub fn reset(mut self, f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static) -> Self {
        self.reset = Some(Rc::new(f));
        self
    }

    pub fn option_changed(
        mut self,
        f: impl Fn(&mut ShotContext<'_, S>, &AnimOption) -> anyhow::Result<OptionResponse> + 'static,
    ) -> Self {
        self.option_changed = Some(Rc::new(f));
        self
    }

    pub fn prepare_playing(
        mut self,
        f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.prepare_playing = Some(Rc::new(f));
        self
    }

    pub fn shot_ended(
        mut self,
        f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.shot_ended = Some(Rc::new(f));
        self
    }
}

pub struct AnimationBuilder<S> {
    name: String,
    description: String,
    flags: AnimationFlags,
    shots: Vec<Shot<S>>,
    actors: Option<HookFn<S>>,
    options: OptionSet,
    hooks: Hooks<S>,
}

impl<S: Default> AnimationBuilder<S> {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        AnimationBuilder {
            name: name.into(),
            description: description.into(),
            flags: AnimationFlags::default(),
            shots: Vec::new(),
            actors: None,
            options: OptionSet::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn looping(mut self, on: bool) -> Self {
        self.flags.looping = on;
        self
    }

    pub fn reset_on_change(mut self, on: bool) -> Self {
        self.flags.reset_on_change = on;
        self
    }

    pub fn auto_framing(mut self, on: bool) -> Self {
        self.flags.auto_framing = on;
        self
    }

    pub fn frame_on_start(mut self, on: bool) -> Self {
        self.flags.frame_on_start = on;
        self
    }

    pub fn has_pointing_arrow(mut self, on: bool) -> Self {
        self.flags.has_pointing_arrow = on;
        self
    }

    pub fn with_shots(mut self, shots: impl IntoFlat<Shot<S>>) -> Self {
        shots.flatten_into(&mut self.shots);
        self
    }

    /// Declare a shot from a doc string: the first line names it, the rest
    /// describes it, and `f` prepares it.
    pub fn shot_fn(
        self,
        doc: &str,
        f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.with_shots(Shot::from_doc(doc, f))
    }

    /// Actors created once, at the first reset, and kept for the life of
    /// the animation.
    pub fn with_actors(
        mut self,
        f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.actors = Some(Rc::new(f));
        self
    }

    pub fn with_options(mut self, options: impl IntoFlat<AnimOption>) -> Self {
        self.options.add(options);
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks<S>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Result<Animation<S>, ValidationError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.shots.is_empty() && self.hooks.generate_shots.is_none() {
            missing.push("shots or generate_shots");
        }
        if !missing.is_empty() {
            return Err(ValidationError {
                name: self.name,
                missing,
            });
        }
        Ok(Animation::from_parts(
            self.name,
            self.description,
            self.flags,
            self.shots,
            self.actors,
            self.options,
            self.hooks,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_lists_every_missing_part() {
        let err = AnimationBuilder::<()>::new("", " ").build().unwrap_err();
        assert_eq!(
            err.missing,
            ["name", "description", "shots or generate_shots"]
        );
    }

    #[test]
    fn generate_shots_hook_stands_in_for_shots() {
        let anim = AnimationBuilder::<()>::new("Dynamic", "Shots made at reset")
            .with_hooks(Hooks::new().generate_shots(|_| Ok(vec![Shot::new("only", "")])))
            .build()
            .unwrap();
        assert!(anim.shots().is_empty());
    }

    #[test]
    fn shot_fn_keeps_declaration_order() {
        let anim = AnimationBuilder::<()>::new("Ordered", "Two shots")
            .shot_fn("First\nopens", |_| Ok(()))
            .shot_fn("Second", |_| Ok(()))
            .looping(true)
            .build()
            .unwrap();
        let names: Vec<_> = anim.declared_shots().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["First", "Second"]);
        assert!(anim.flags().looping);
    }
}
