//! Engine — the interpolation driver.
//!
//! Holds the set of active tweens and advances them on every tick of an
//! external clock. Each tick samples every tween at its normalized time and
//! hands the value to the tween's apply callback, which usually moves a
//! point. When the active set goes from non-empty to empty the engine
//! reports *all done*, once.
//!
//! The engine never sleeps or spins; the caller owns the clock.

pub mod tween;
pub mod values;

use std::mem;

use tracing::{debug, warn};

use crate::error::{AnimationError, Result};
use crate::graph::Graph;
use crate::signal::Signal;

pub use tween::{ApplyFn, FinishedFn, Tween};
pub use values::{Interpolate, sample};

use tween::Running;

/// Durations at or below this complete on their first tick.
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

/// What a call to `Engine::tick` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Apply callbacks that ran.
    pub applied: usize,
    /// Tweens that reached their end.
    pub finished: Vec<TweenId>,
    /// Tweens dropped because a callback failed.
    pub failed: Vec<TweenId>,
    /// The active set emptied during this tick.
    pub all_done: bool,
}

struct Active {
    id: TweenId,
    duration: f64,
    started: Option<f64>,
    tween: Box<dyn Running>,
}

impl Active {
    fn progress(&mut self, now: f64) -> f64 {
        let start = *self.started.get_or_insert(now);
        if self.duration <= EPSILON {
            1.0
        } else {
            ((now - start) / self.duration).clamp(0.0, 1.0)
        }
    }
}

pub struct Engine {
    active: Vec<Active>,
    next_id: u64,
    speedup: f64,
    anim_duration: f64,
    generation: u64,
    on_all_done: Signal<()>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("active", &self.active.len())
            .field("speedup", &self.speedup)
            .field("anim_duration", &self.anim_duration)
            .finish()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            active: Vec::new(),
            next_id: 0,
            speedup: 1.0,
            anim_duration: 1.0,
            generation: 0,
            on_all_done: Signal::new(),
        }
    }

    /// Register a tween. Its clock starts at the next tick.
    pub fn animate<V: Interpolate + 'static>(&mut self, tween: Tween<V>) -> Result<TweenId> {
        if tween.keys().is_empty() {
            return Err(AnimationError::EmptyKeys);
        }
        let id = TweenId(self.next_id);
        self.next_id += 1;
        let duration = (tween.nominal_duration() * self.speedup).max(EPSILON);
        debug!(?id, duration, keys = tween.keys().len(), "tween registered");
        self.active.push(Active {
            id,
            duration,
            started: None,
            tween: Box::new(tween),
        });
        Ok(id)
    }

    pub fn animate_value<V: Interpolate + 'static>(
        &mut self,
        keys: impl Into<Vec<V>>,
        duration: f64,
        apply: impl FnMut(&mut Graph, V) -> anyhow::Result<()> + 'static,
    ) -> Result<TweenId> {
        self.animate(Tween::new(keys, duration, apply))
    }

    /// Advance every active tween to time `now` (seconds, any epoch).
    pub fn tick(&mut self, graph: &mut Graph, now: f64) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.active.is_empty() {
            return outcome;
        }
        let generation = self.generation;
        let mut running = mem::take(&mut self.active);
        let mut done = Vec::new();

        running.retain_mut(|active| {
            let t = active.progress(now);
            outcome.applied += 1;
            if let Err(err) = active.tween.apply_at(graph, t) {
                warn!(id = ?active.id, "tween apply failed, dropping it: {err:#}");
                outcome.failed.push(active.id);
                return false;
            }
            if t >= 1.0 {
                done.push((active.id, active.tween.take_finished()));
                return false;
            }
            true
        });

        for (id, finished) in done {
            outcome.finished.push(id);
            debug!(?id, "tween finished");
            if let Some(finished) = finished {
                if let Err(err) = finished(graph, self) {
                    warn!(?id, "tween completion callback failed: {err:#}");
                    outcome.failed.push(id);
                }
            }
            if self.generation != generation {
                // stopped from inside a callback: the rest of this tick is cancelled
                return outcome;
            }
        }

        running.append(&mut self.active);
        self.active = running;
        if self.active.is_empty() {
            outcome.all_done = true;
            self.on_all_done.emit(&());
        }
        outcome
    }

    /// Cancel every active tween without running completion callbacks.
    pub fn stop(&mut self) {
        if !self.active.is_empty() {
            debug!(cancelled = self.active.len(), "engine stopped");
        }
        self.active.clear();
        self.generation += 1;
    }

    /// `stop`, and forget the all-done listeners.
    pub fn reset(&mut self) {
        self.stop();
        self.on_all_done.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Factor applied to the duration of every newly registered tween.
    pub fn speedup(&self) -> f64 {
        self.speedup
    }

    pub fn set_speedup(&mut self, speedup: f64) {
        if speedup.is_finite() && speedup > 0.0 {
            self.speedup = speedup;
        }
    }

    /// Default duration for authors that do not pick one.
    pub fn anim_duration(&self) -> f64 {
        self.anim_duration
    }

    pub fn set_anim_duration(&mut self, seconds: f64) {
        self.anim_duration = seconds.max(0.0);
    }

    pub fn on_all_done(&mut self) -> &mut Signal<()> {
        &mut self.on_all_done
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<f64>>>, impl FnMut(&mut Graph, f64) -> anyhow::Result<()>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |_: &mut Graph, v: f64| {
            sink.borrow_mut().push(v);
            Ok(())
        })
    }

    #[test]
    fn single_tween_runs_to_completion() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        let (seen, apply) = recorder();
        let finished = Rc::new(RefCell::new(0));
        let f = finished.clone();
        e.animate(Tween::new([0.0, 10.0], 1.0, apply).on_finished(move |_, _| {
            *f.borrow_mut() += 1;
            Ok(())
        }))
        .unwrap();

        assert!(!e.tick(&mut g, 0.0).all_done);
        assert!(!e.tick(&mut g, 0.5).all_done);
        let last = e.tick(&mut g, 1.0);
        assert!(last.all_done);
        assert_eq!(*seen.borrow(), [0.0, 5.0, 10.0]);
        assert_eq!(*finished.borrow(), 1);
        assert!(!e.is_active());
        assert_eq!(e.tick(&mut g, 2.0), TickOutcome::default());
    }

    #[test]
    fn staggered_tweens_report_all_done_once() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        let fired = Rc::new(RefCell::new(0));
        let f = fired.clone();
        e.on_all_done().connect(move |_| *f.borrow_mut() += 1);
        let a = e.animate_value([0.0, 1.0], 1.0, |_, _| Ok(())).unwrap();
        let b = e.animate_value([0.0, 1.0], 2.0, |_, _| Ok(())).unwrap();

        e.tick(&mut g, 0.0);
        let at_one = e.tick(&mut g, 1.0);
        assert_eq!(at_one.finished, [a]);
        assert!(!at_one.all_done);
        let at_two = e.tick(&mut g, 2.0);
        assert_eq!(at_two.finished, [b]);
        assert!(at_two.all_done);
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        let (seen, apply) = recorder();
        e.animate(Tween::new([1.0, 2.0], 0.0, apply)).unwrap();
        assert!(e.tick(&mut g, 5.0).all_done);
        assert_eq!(*seen.borrow(), [2.0]);
    }

    #[test]
    fn single_key_is_held_for_the_duration() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        let (seen, apply) = recorder();
        e.animate(Tween::new([4.0], 1.0, apply)).unwrap();
        e.tick(&mut g, 0.0);
        e.tick(&mut g, 0.5);
        assert!(e.tick(&mut g, 1.0).all_done);
        assert_eq!(*seen.borrow(), [4.0, 4.0, 4.0]);
    }

    #[test]
    fn empty_keys_are_rejected() {
        let mut e = Engine::new();
        let err = e.animate_value(Vec::<f64>::new(), 1.0, |_, _| Ok(()));
        assert_eq!(err, Err(AnimationError::EmptyKeys));
    }

    #[test]
    fn stop_suppresses_completion() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        let fired = Rc::new(RefCell::new(false));
        let f = fired.clone();
        e.on_all_done().connect(move |_| *f.borrow_mut() = true);
        let f = fired.clone();
        e.animate(Tween::new([0.0, 1.0], 1.0, |_, _| Ok(())).on_finished(move |_, _| {
            *f.borrow_mut() = true;
            Ok(())
        }))
        .unwrap();
        e.tick(&mut g, 0.0);
        e.stop();
        assert!(!e.is_active());
        assert_eq!(e.tick(&mut g, 2.0), TickOutcome::default());
        assert!(!*fired.borrow());
    }

    #[test]
    fn failing_apply_drops_only_that_tween() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        let bad = e
            .animate_value([0.0, 1.0], 1.0, |_, _| anyhow::bail!("boom"))
            .unwrap();
        let (seen, apply) = recorder();
        e.animate(Tween::new([0.0, 1.0], 1.0, apply)).unwrap();

        let first = e.tick(&mut g, 0.0);
        assert_eq!(first.failed, [bad]);
        assert_eq!(e.active_count(), 1);
        assert!(e.tick(&mut g, 1.0).all_done);
        assert_eq!(*seen.borrow(), [0.0, 1.0]);
    }

    #[test]
    fn on_finished_can_chain_a_tween() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        let (seen, apply) = recorder();
        e.animate(
            Tween::new([0.0, 1.0], 1.0, |_, _| Ok(())).on_finished(move |_, engine| {
                engine.animate(Tween::new([5.0, 6.0], 1.0, apply))?;
                Ok(())
            }),
        )
        .unwrap();
        e.tick(&mut g, 0.0);
        let handoff = e.tick(&mut g, 1.0);
        assert!(!handoff.all_done);
        assert_eq!(e.active_count(), 1);
        e.tick(&mut g, 1.5);
        assert!(e.tick(&mut g, 2.5).all_done);
        assert_eq!(*seen.borrow(), [5.0, 6.0]);
    }

    #[test]
    fn stop_inside_on_finished_cancels_the_tick() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        let fired = Rc::new(RefCell::new(false));
        let f = fired.clone();
        e.on_all_done().connect(move |_| *f.borrow_mut() = true);
        e.animate(Tween::new([0.0], 0.0, |_, _| Ok(())).on_finished(|_, engine| {
            engine.stop();
            Ok(())
        }))
        .unwrap();
        e.animate_value([0.0, 1.0], 3.0, |_, _| Ok(())).unwrap();
        let outcome = e.tick(&mut g, 0.0);
        assert!(!outcome.all_done);
        assert!(!e.is_active());
        assert!(!*fired.borrow());
    }

    #[test]
    fn speedup_scales_new_durations() {
        let mut g = Graph::new();
        let mut e = Engine::new();
        e.set_speedup(0.5);
        e.set_speedup(-1.0);
        assert_eq!(e.speedup(), 0.5);
        let (seen, apply) = recorder();
        e.animate(Tween::new([0.0, 1.0], 2.0, apply).duration_fraction(0.5))
            .unwrap();
        e.tick(&mut g, 0.0);
        assert!(e.tick(&mut g, 0.5).all_done);
        assert_eq!(*seen.borrow(), [0.0, 1.0]);
    }

    #[test]
    fn reset_forgets_all_done_listeners() {
        let mut e = Engine::new();
        e.on_all_done().connect(|_| {});
        e.reset();
        assert!(e.on_all_done().is_empty());
    }
}
