//! Linear-scan neighbour search.

use super::metric::Metric;
use super::points::PointSet;
use super::{check_query, Neighbor, RadiusSearch};
use crate::error::Result;

/// Exhaustive O(N) search over a borrowed [`PointSet`].
#[derive(Debug, Clone, Copy)]
pub struct BruteForce<'a> {
    points: &'a PointSet,
    metric: Metric,
}

impl<'a> BruteForce<'a> {
    /// Wrap `points` for linear-scan queries under `metric`.
    pub fn new(points: &'a PointSet, metric: Metric) -> Result<Self> {
        metric.validate()?;
        Ok(Self { points, metric })
    }

    /// The `k` nearest points, by ascending distance then ascending index.
    pub fn nearest_k(&self, point: &[f64], k: usize) -> Result<Vec<Neighbor>> {
        if self.points.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        self.points.check_query(point)?;

        let mut all: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (self.metric.reduced_distance(point, p), i))
            .collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        all.truncate(k);

        Ok(all
            .into_iter()
            .map(|(reduced, index)| Neighbor {
                index,
                distance: self.metric.unreduce(reduced),
            })
            .collect())
    }
}

impl RadiusSearch for BruteForce<'_> {
    fn points(&self) -> &PointSet {
        self.points
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn range_query_into(&self, point: &[f64], epsilon: f64, out: &mut Vec<usize>) -> Result<()> {
        out.clear();
        if !check_query(self.points, point, epsilon)? {
            return Ok(());
        }
        let radius = self.metric.reduce(epsilon);
        out.extend(
            self.points
                .iter()
                .enumerate()
                .filter(|(_, p)| self.metric.reduced_distance(point, p) <= radius)
                .map(|(i, _)| i),
        );
        Ok(())
    }
}
