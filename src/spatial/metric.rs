//! Minkowski-family distances.
//!
//! Every metric here has the form `d(a, b) = (Σ |aᵢ - bᵢ|^p)^(1/p)`. The hot
//! paths (leaf scans, pruning) never take the root: they work on the
//! *reduced* distance `Σ |aᵢ - bᵢ|^p` and compare it against the reduced
//! radius `r^p`. For the default Euclidean metric that is the familiar
//! "squared distance vs ε²" comparison.

use crate::error::{Error, Result};

/// Distance metric used by the index.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    /// L2 distance (p = 2).
    #[default]
    Euclidean,
    /// L1 / taxicab distance (p = 1).
    Manhattan,
    /// General Minkowski distance with exponent `p >= 1`.
    Minkowski(f64),
}

impl Metric {
    /// Metric name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Minkowski(_) => "minkowski",
        }
    }

    /// The Minkowski exponent.
    pub fn p(&self) -> f64 {
        match *self {
            Metric::Euclidean => 2.0,
            Metric::Manhattan => 1.0,
            Metric::Minkowski(p) => p,
        }
    }

    /// Check that the exponent yields a true metric (`p >= 1`, finite).
    pub fn validate(&self) -> Result<()> {
        let p = self.p();
        if !(p >= 1.0) || !p.is_finite() {
            return Err(Error::InvalidParameter {
                name: "metric",
                message: "minkowski exponent must be finite and at least 1",
            });
        }
        Ok(())
    }

    /// Contribution of a single coordinate difference to the reduced distance.
    #[inline]
    pub fn axis_term(&self, delta: f64) -> f64 {
        match *self {
            Metric::Euclidean => delta * delta,
            Metric::Manhattan => delta.abs(),
            Metric::Minkowski(p) => delta.abs().powf(p),
        }
    }

    /// Reduced distance `Σ |aᵢ - bᵢ|^p`.
    #[inline]
    pub fn reduced_distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match *self {
            Metric::Euclidean => squared_euclidean(a, b),
            _ => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| self.axis_term(x - y))
                .sum(),
        }
    }

    /// Convert a radius into reduced space (`r^p`).
    #[inline]
    pub fn reduce(&self, radius: f64) -> f64 {
        match *self {
            Metric::Euclidean => radius * radius,
            Metric::Manhattan => radius,
            Metric::Minkowski(p) => radius.powf(p),
        }
    }

    /// Convert a reduced distance back into a true distance.
    #[inline]
    pub fn unreduce(&self, reduced: f64) -> f64 {
        match *self {
            Metric::Euclidean => reduced.sqrt(),
            Metric::Manhattan => reduced,
            Metric::Minkowski(p) => reduced.powf(p.recip()),
        }
    }

    /// True distance between two points.
    #[inline]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        self.unreduce(self.reduced_distance(a, b))
    }
}

/// Squared Euclidean distance.
#[inline]
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_is_euclidean() {
        assert_eq!(Metric::default(), Metric::Euclidean);
        assert_eq!(Metric::default().name(), "euclidean");
    }

    #[test]
    fn euclidean_reduced_is_squared() {
        let m = Metric::Euclidean;
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert_eq!(m.reduced_distance(&a, &b), 25.0);
        assert_eq!(m.distance(&a, &b), 5.0);
        assert_eq!(m.reduce(5.0), 25.0);
    }

    #[test]
    fn manhattan_and_minkowski() {
        let a = [1.0, -2.0, 3.0];
        let b = [-1.0, 2.0, 2.0];
        assert_relative_eq!(Metric::Manhattan.distance(&a, &b), 7.0);
        // p = 2 must agree with Euclidean.
        assert_relative_eq!(
            Metric::Minkowski(2.0).distance(&a, &b),
            Metric::Euclidean.distance(&a, &b),
            epsilon = 1e-12
        );
        // p = 3: (8 + 64 + 1)^(1/3)
        assert_relative_eq!(
            Metric::Minkowski(3.0).distance(&a, &b),
            73.0f64.cbrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn metric_axioms_on_samples() {
        let pts = [[0.0, 0.0], [1.5, -2.0], [-3.0, 0.25], [1.5, -2.0]];
        for m in [Metric::Euclidean, Metric::Manhattan, Metric::Minkowski(3.5)] {
            for a in &pts {
                assert_eq!(m.distance(a, a), 0.0);
                for b in &pts {
                    let ab = m.distance(a, b);
                    assert!(ab >= 0.0);
                    assert_eq!(ab, m.distance(b, a));
                    if a != b {
                        assert!(ab > 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn reduce_unreduce_inverse() {
        for m in [Metric::Euclidean, Metric::Manhattan, Metric::Minkowski(1.7)] {
            assert_relative_eq!(m.unreduce(m.reduce(2.5)), 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn invalid_exponents() {
        assert!(Metric::Minkowski(0.5).validate().is_err());
        assert!(Metric::Minkowski(f64::NAN).validate().is_err());
        assert!(Metric::Minkowski(f64::INFINITY).validate().is_err());
        assert!(Metric::Minkowski(1.0).validate().is_ok());
        assert!(Metric::Euclidean.validate().is_ok());
    }
}
