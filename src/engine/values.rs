//! Interpolatable value types
//!
//! Scalars, points, vectors and colors interpolate componentwise. A key
//! sequence is sampled piecewise-linearly over normalized time.

use kurbo::{Point, Vec2};

use crate::types::Color;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

// ============================================================================
// Scalar
// ============================================================================

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

// ============================================================================
// Geometry
// ============================================================================

impl Interpolate for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::lerp(*self, *other, t)
    }
}

impl Interpolate for Vec2 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Vec2::lerp(*self, *other, t)
    }
}

// ============================================================================
// Color
// ============================================================================

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Color {
            r: Interpolate::lerp(&self.r, &other.r, t),
            g: Interpolate::lerp(&self.g, &other.g, t),
            b: Interpolate::lerp(&self.b, &other.b, t),
            a: Interpolate::lerp(&self.a, &other.a, t),
        }
    }
}

// ============================================================================
// Key sequences
// ============================================================================

/// Value of a key sequence at normalized time `t`. One key is a constant.
/// Segment ends return the key itself so non-finite keys pass through
/// untouched.
pub fn sample<V: Interpolate>(keys: &[V], t: f64) -> Option<V> {
    match keys {
        [] => None,
        [only] => Some(only.clone()),
        _ => {
            let t = t.clamp(0.0, 1.0);
            let pos = t * (keys.len() - 1) as f64;
            let index = (pos.floor() as usize).min(keys.len() - 2);
            let local = pos - index as f64;
            let (a, b) = (&keys[index], &keys[index + 1]);
            Some(if local <= 0.0 {
                a.clone()
            } else if local >= 1.0 {
                b.clone()
            } else {
                a.lerp(b, local)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn samples_across_segments() {
        let keys = [0.0, 10.0, 0.0];
        assert_eq!(sample(&keys, 0.0), Some(0.0));
        assert_eq!(sample(&keys, 0.25), Some(5.0));
        assert_eq!(sample(&keys, 0.5), Some(10.0));
        assert_eq!(sample(&keys, 1.0), Some(0.0));
        assert_eq!(sample(&keys, 7.0), Some(0.0));
    }

    #[test]
    fn single_key_is_constant() {
        assert_eq!(sample(&[3.5], 0.0), Some(3.5));
        assert_eq!(sample(&[3.5], 0.9), Some(3.5));
        assert_eq!(sample::<f64>(&[], 0.5), None);
    }

    #[test]
    fn points_interpolate_per_component() {
        let keys = [Point::new(0.0, 0.0), Point::new(4.0, -2.0)];
        assert_eq!(sample(&keys, 0.5), Some(Point::new(2.0, -1.0)));
    }

    #[test]
    fn colors_interpolate_rgba() {
        let c = Interpolate::lerp(&Color::BLACK, &Color::rgba(1.0, 0.5, 0.0, 0.0), 0.5);
        assert_relative_eq!(c.r, 0.5);
        assert_relative_eq!(c.g, 0.25);
        assert_relative_eq!(c.b, 0.0);
        assert_relative_eq!(c.a, 0.5);
    }

    #[test]
    fn infinite_end_key_is_reached_exactly() {
        let keys = [0.0, f64::INFINITY];
        assert_eq!(sample(&keys, 1.0), Some(f64::INFINITY));
    }
}
