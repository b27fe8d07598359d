//! k-distance profile for choosing ε.
//!
//! Plot the sorted distances from every point to its k-th nearest neighbour
//! (with `k = min_pts`, the point itself counting as the first). The curve
//! is flat inside clusters and rises sharply for outliers; ε is usually read
//! off at the "knee".

use crate::error::{Error, Result};
use crate::spatial::KdTree;

/// Distance from every indexed point to its `k`-th nearest neighbour (itself
/// included), sorted in descending order.
///
/// `k` larger than the tree is clamped to the tree size.
pub fn k_distances(index: &KdTree<'_>, k: usize) -> Result<Vec<f64>> {
    if k == 0 {
        return Err(Error::InvalidParameter {
            name: "k",
            message: "must be at least 1",
        });
    }

    let mut out = Vec::with_capacity(index.len());
    for point in index.points().iter() {
        if let Some(kth) = index.nearest_k(point, k)?.last() {
            out.push(kth.distance);
        }
    }
    out.sort_by(|a, b| b.total_cmp(a));
    Ok(out)
}
