//! Point storage and radius search.
//!
//! The clustering engine only ever asks one question of its index: "which
//! points lie within ε of this point?". That question is the [`RadiusSearch`]
//! trait. Two implementations are provided:
//!
//! - [`KdTree`]: an arena-backed k-d tree, the default. Sublinear on
//!   well-spread data; degrades toward a linear scan on heavily skewed or
//!   degenerate coordinate distributions.
//! - [`BruteForce`]: a linear scan. Useful as a reference, and competitive
//!   for very small sets or very high dimensionality.
//!
//! Both answer with exactly the same index set for the same metric; pruning in
//! the tree is an optimization, never an approximation.
//!
//! ## Usage
//!
//! ```rust
//! use kdscan::spatial::{KdTree, KdTreeParams, PointSet, RadiusSearch};
//!
//! let points = PointSet::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![5.0, 5.0],
//! ]).unwrap();
//! let tree = KdTree::build(&points, KdTreeParams::default()).unwrap();
//!
//! let mut near = tree.range_query(&[0.0, 0.0], 1.0).unwrap();
//! near.sort_unstable();
//! assert_eq!(near, vec![0, 1]);
//! ```

mod brute;
mod kdtree;
mod metric;
mod points;

pub use brute::BruteForce;
pub use kdtree::{KdTree, KdTreeParams, SplitRule};
pub use metric::{squared_euclidean, Metric};
pub use points::PointSet;

use crate::error::{check_epsilon, Result};

/// A point found by a nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the indexed [`PointSet`].
    pub index: usize,
    /// True (not reduced) distance to the query point.
    pub distance: f64,
}

/// Fixed-radius neighbour search over an indexed [`PointSet`].
pub trait RadiusSearch {
    /// The point set this index was built over.
    fn points(&self) -> &PointSet;

    /// The metric used to compare distances against the radius.
    fn metric(&self) -> Metric;

    /// Replace the contents of `out` with the indices of every point whose
    /// distance to `point` is at most `epsilon` (the point itself included, if
    /// indexed). Order is unspecified.
    fn range_query_into(&self, point: &[f64], epsilon: f64, out: &mut Vec<usize>) -> Result<()>;

    /// Indices of every point within `epsilon` of `point`, in unspecified order.
    fn range_query(&self, point: &[f64], epsilon: f64) -> Result<Vec<usize>> {
        let mut out = Vec::new();
        self.range_query_into(point, epsilon, &mut out)?;
        Ok(out)
    }
}

/// Shared argument checks for queries.
///
/// Returns `Ok(false)` when the index is empty: every well-formed query then
/// has an empty answer, whatever its dimensionality.
pub(crate) fn check_query(points: &PointSet, point: &[f64], epsilon: f64) -> Result<bool> {
    check_epsilon(epsilon)?;
    if points.is_empty() {
        return Ok(false);
    }
    points.check_query(point)?;
    Ok(true)
}
