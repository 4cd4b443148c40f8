//! A single registered interpolation.

use kurbo::Point;

use crate::graph::{Graph, ItemId, PointId};
use crate::types::Color;

use super::Engine;
use super::values::{Interpolate, sample};

pub type ApplyFn<V> = Box<dyn FnMut(&mut Graph, V) -> anyhow::Result<()>>;
pub type FinishedFn = Box<dyn FnOnce(&mut Graph, &mut Engine) -> anyhow::Result<()>>;

/// Key values, a duration and the callback that receives each interpolated
/// value. Built with `Tween::new` and handed to `Engine::animate`.
pub struct Tween<V> {
    keys: Vec<V>,
    duration: f64,
    fraction: f64,
    apply: ApplyFn<V>,
    on_finished: Option<FinishedFn>,
}

impl<V> std::fmt::Debug for Tween<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("keys", &self.keys.len())
            .field("duration", &self.duration)
            .field("fraction", &self.fraction)
            .field("on_finished", &self.on_finished.is_some())
            .finish()
    }
}

impl<V: Interpolate + 'static> Tween<V> {
    pub fn new(
        keys: impl Into<Vec<V>>,
        duration: f64,
        apply: impl FnMut(&mut Graph, V) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Tween {
            keys: keys.into(),
            duration,
            fraction: 1.0,
            apply: Box::new(apply),
            on_finished: None,
        }
    }

    /// Run once after the final value is applied. The engine is passed in so
    /// the callback can chain further tweens.
    pub fn on_finished(
        mut self,
        f: impl FnOnce(&mut Graph, &mut Engine) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.on_finished = Some(Box::new(f));
        self
    }

    /// Scale the duration, e.g. 0.5 to run in half the nominal time.
    pub fn duration_fraction(mut self, fraction: f64) -> Self {
        self.fraction = fraction;
        self
    }

    pub fn keys(&self) -> &[V] {
        &self.keys
    }

    pub fn value_at(&self, t: f64) -> Option<V> {
        sample(&self.keys, t)
    }

    pub(crate) fn nominal_duration(&self) -> f64 {
        self.duration * self.fraction
    }
}

impl Tween<Point> {
    /// Move a point through the key positions.
    pub fn move_point(point: PointId, keys: impl Into<Vec<Point>>, duration: f64) -> Self {
        Tween::new(keys, duration, move |graph, p| {
            graph.set(point, p.x, p.y)?;
            Ok(())
        })
    }
}

impl Tween<f64> {
    pub fn opacity(item: ItemId, keys: impl Into<Vec<f64>>, duration: f64) -> Self {
        Tween::new(keys, duration, move |graph, v| {
            graph.set_opacity(item, v)?;
            Ok(())
        })
    }

    pub fn angle(point: PointId, keys: impl Into<Vec<f64>>, duration: f64) -> Self {
        Tween::new(keys, duration, move |graph, v| {
            graph.set_angle(point, v)?;
            Ok(())
        })
    }

    pub fn radius(point: PointId, keys: impl Into<Vec<f64>>, duration: f64) -> Self {
        Tween::new(keys, duration, move |graph, v| {
            graph.set_radius(point, v)?;
            Ok(())
        })
    }
}

impl Tween<Color> {
    pub fn outline_color(item: ItemId, keys: impl Into<Vec<Color>>, duration: f64) -> Self {
        Tween::new(keys, duration, move |graph, c| {
            graph.set_outline_color(item, c)?;
            Ok(())
        })
    }
}

/// A tween with its value type erased, as the engine stores it.
pub(crate) trait Running {
    fn apply_at(&mut self, graph: &mut Graph, t: f64) -> anyhow::Result<()>;
    fn take_finished(&mut self) -> Option<FinishedFn>;
}

impl<V: Interpolate + 'static> Running for Tween<V> {
    fn apply_at(&mut self, graph: &mut Graph, t: f64) -> anyhow::Result<()> {
        match sample(&self.keys, t) {
            Some(value) => (self.apply)(graph, value),
            None => Ok(()),
        }
    }

    fn take_finished(&mut self) -> Option<FinishedFn> {
        self.on_finished.take()
    }
}
