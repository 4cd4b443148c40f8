//! Shots: named lists of prepare and cleanup callbacks.

use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::context::ShotContext;
use super::flat::IntoFlat;

pub type ShotFn<S> = Rc<dyn Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()>>;

/// A callback, or a nested sequence of them run in order.
pub enum ShotStep<S> {
    Call(ShotFn<S>),
    Seq(Vec<ShotStep<S>>),
}

impl<S> Clone for ShotStep<S> {
    fn clone(&self) -> Self {
        match self {
            ShotStep::Call(f) => ShotStep::Call(f.clone()),
            ShotStep::Seq(steps) => ShotStep::Seq(steps.clone()),
        }
    }
}

impl<S> fmt::Debug for ShotStep<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShotStep::Call(_) => f.write_str("Call"),
            ShotStep::Seq(steps) => f.debug_tuple("Seq").field(steps).finish(),
        }
    }
}

impl<S> ShotStep<S> {
    pub fn call(f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static) -> Self {
        ShotStep::Call(Rc::new(f))
    }

    /// Run every callback depth first. Failures are logged and skipped;
    /// returns how many failed.
    pub(crate) fn run(&self, ctx: &mut ShotContext<'_, S>, shot: &str, phase: &str) -> usize {
        match self {
            ShotStep::Call(f) => match f(ctx) {
                Ok(()) => 0,
                Err(err) => {
                    warn!(shot, phase, "shot callback failed: {err:#}");
                    1
                }
            },
            ShotStep::Seq(steps) => steps.iter().map(|s| s.run(ctx, shot, phase)).sum(),
        }
    }
}

pub struct Shot<S> {
    name: String,
    description: String,
    repeat: bool,
    generated: bool,
    prepare: Vec<ShotStep<S>>,
    cleanup: Vec<ShotStep<S>>,
}

impl<S> Clone for Shot<S> {
    fn clone(&self) -> Self {
        Shot {
            name: self.name.clone(),
            description: self.description.clone(),
            repeat: self.repeat,
            generated: self.generated,
            prepare: self.prepare.clone(),
            cleanup: self.cleanup.clone(),
        }
    }
}

impl<S> fmt::Debug for Shot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shot")
            .field("name", &self.name)
            .field("repeat", &self.repeat)
            .field("generated", &self.generated)
            .field("prepare", &self.prepare.len())
            .field("cleanup", &self.cleanup.len())
            .finish()
    }
}

impl<S> Shot<S> {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Shot {
            name: name.into(),
            description: description.into(),
            repeat: false,
            generated: false,
            prepare: Vec::new(),
            cleanup: Vec::new(),
        }
    }

    /// Name from the first line of `doc`, description from the rest.
    pub fn from_doc(
        doc: &str,
        prepare: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        let doc = doc.trim();
        let (name, rest) = doc.split_once('\n').unwrap_or((doc, ""));
        let description = rest
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
        Shot::new(name.trim(), description).prepare(prepare)
    }

    pub fn prepare(
        mut self,
        f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.prepare.push(ShotStep::call(f));
        self
    }

    pub fn prepare_step(mut self, step: ShotStep<S>) -> Self {
        self.prepare.push(step);
        self
    }

    pub fn cleanup(
        mut self,
        f: impl Fn(&mut ShotContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.cleanup.push(ShotStep::call(f));
        self
    }

    pub fn cleanup_step(mut self, step: ShotStep<S>) -> Self {
        self.cleanup.push(step);
        self
    }

    /// Replay this shot instead of advancing while the animation plays.
    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    /// Inserted during playback by `add_next_shots`.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub(crate) fn mark_generated(&mut self) {
        self.generated = true;
    }

    pub(crate) fn prepare_steps(&self) -> &[ShotStep<S>] {
        &self.prepare
    }

    pub(crate) fn cleanup_steps(&self) -> &[ShotStep<S>] {
        &self.cleanup
    }
}

impl<S> IntoFlat<Shot<S>> for Shot<S> {
    fn flatten_into(self, out: &mut Vec<Shot<S>>) {
        out.push(self);
    }
}
