//! Density-based clustering over a k-d tree.
//!
//! `kdscan` clusters points in D-dimensional space with DBSCAN, answering the
//! algorithm's radius queries from an arena-backed k-d tree instead of a
//! linear scan.
//!
//! - [`spatial`]: [`PointSet`] storage, the [`KdTree`] index, a brute-force
//!   reference index and Minkowski metrics.
//! - [`cluster`](mod@cluster): the [`Dbscan`] engine and the k-distance helper for
//!   picking ε.
//!
//! The crate root also exposes the three plain operations most callers need:
//! [`build_index`], [`range_query`] and [`cluster`](fn@cluster).
//!
//! ```rust
//! let points = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![10.0, 10.0]];
//! let labels = kdscan::cluster(&points, 1.5, 2).unwrap();
//! assert_eq!(labels, vec![0, 0, 0, -1]);
//! ```
//!
//! Nothing here installs a `tracing` subscriber; index builds and clustering
//! runs emit `debug`/`trace` events for whichever one the caller sets up.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod signal;
pub mod spatial;

pub use cluster::{k_distances, Clustering, Dbscan, DbscanFit, Label, NOISE};
pub use error::{Error, Result};
pub use signal::StopSignal;
pub use spatial::{
    BruteForce, KdTree, KdTreeParams, Metric, Neighbor, PointSet, RadiusSearch, SplitRule,
};

/// Build a Euclidean k-d tree over `points`.
///
/// `leaf_size` defaults to [`KdTreeParams::default`]'s when `None`.
pub fn build_index(points: &PointSet, leaf_size: Option<usize>) -> Result<KdTree<'_>> {
    let mut params = KdTreeParams::default();
    if let Some(leaf_size) = leaf_size {
        params.leaf_size = leaf_size;
    }
    KdTree::build(points, params)
}

/// Indices of every indexed point within `epsilon` of `point`, ascending.
pub fn range_query(index: &KdTree<'_>, point: &[f64], epsilon: f64) -> Result<Vec<usize>> {
    let mut found = index.range_query(point, epsilon)?;
    found.sort_unstable();
    Ok(found)
}

/// Cluster `points` with DBSCAN.
///
/// Returns one label per point: `-1` for noise, `0..k` for the `k` clusters.
pub fn cluster(points: &[Vec<f64>], epsilon: f64, min_pts: usize) -> Result<Vec<i64>> {
    Ok(Dbscan::new(epsilon, min_pts).fit(points)?.raw_labels())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_operations() {
        let points = PointSet::from_rows(&[vec![0.0, 0.0], vec![2.0, 0.0], vec![0.5, 0.0]]).unwrap();
        let index = build_index(&points, Some(1)).unwrap();
        assert_eq!(index.params().leaf_size, 1);
        assert_eq!(range_query(&index, &[0.0, 0.0], 0.6).unwrap(), vec![0, 2]);

        assert!(build_index(&points, Some(0)).is_err());
        assert_eq!(build_index(&points, None).unwrap().params().leaf_size, 16);
    }
}
