//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN groups points by neighbourhood density. Unlike k-means, it:
//!
//! - Discovers clusters of arbitrary shape
//! - Determines the number of clusters itself
//! - Identifies noise points (outliers)
//!
//! ## Core Concepts
//!
//! - **Epsilon (ε)**: Maximum distance between two points to be neighbours.
//! - **MinPts**: Minimum neighbourhood size, *counting the point itself*, for
//!   a point to be "core".
//! - **Core point**: `|N_ε(p)| >= MinPts`.
//! - **Border point**: Within ε of a core point but not core itself.
//! - **Noise point**: Neither core nor border.
//!
//! ## Algorithm Steps
//!
//! 1. For each unvisited point P, in ascending index order:
//!    - Query `N_ε(P)` from the index.
//!    - If `|N_ε(P)| < MinPts`, leave P as noise (it may be claimed later).
//!    - Else P is core: open a new cluster and expand it breadth-first.
//!
//! 2. Expansion: pop a point Q from the queue.
//!    - If Q has not been visited, query `N_ε(Q)`; if Q is core, queue every
//!      neighbour that is unvisited or still noise.
//!    - If Q is still noise, it joins the current cluster.
//!
//! ## Determinism
//!
//! A border point within ε of core points from two different clusters joins
//! whichever cluster reaches it first. Since seeds are taken in ascending
//! index order, the output is a pure function of the inputs and their order.
//! Cluster ids are numbered in order of their lowest-index core point.
//!
//! ## Complexity
//!
//! - **Time**: one radius query per point. O(n log n) on well-spread data with
//!   the [`KdTree`]; O(n²) with [`BruteForce`](crate::spatial::BruteForce).
//! - **Space**: O(n) for labels, visit state and the expansion queue; each
//!   point is queued at most once per run.
//!
//! ## Limitations
//!
//! - Struggles with varying densities (consider OPTICS / HDBSCAN*).
//! - ε is sensitive and dataset-dependent; see
//!   [`k_distances`](super::k_distances).
//!
//! ## References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::traits::Clustering;
use crate::error::{check_epsilon, Error, Result};
use crate::signal::{self, StopSignal};
use crate::spatial::{KdTree, KdTreeParams, PointSet, RadiusSearch};

/// Raw label value for noise points.
pub const NOISE: i64 = -1;

/// The cluster assignment of one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Label {
    /// Not density-reachable from any core point.
    Noise,
    /// Member of cluster `k`, with `k` in `0..n_clusters`.
    Cluster(usize),
}

impl Label {
    /// Whether this is [`Label::Noise`].
    pub fn is_noise(&self) -> bool {
        matches!(self, Label::Noise)
    }

    /// The cluster id, or `None` for noise.
    pub fn cluster_id(&self) -> Option<usize> {
        match *self {
            Label::Noise => None,
            Label::Cluster(k) => Some(k),
        }
    }

    /// Integer form: [`NOISE`] (`-1`) or the cluster id.
    pub fn as_i64(&self) -> i64 {
        match *self {
            Label::Noise => NOISE,
            Label::Cluster(k) => k as i64,
        }
    }
}

impl From<Label> for i64 {
    fn from(label: Label) -> Self {
        label.as_i64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Visited,
}

/// Points awaiting expansion, in FIFO order. A point enters at most once per
/// run; once popped it carries a cluster label and is never queued again.
#[derive(Debug)]
struct Frontier {
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    peak: usize,
}

impl Frontier {
    fn new(n: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: vec![false; n],
            peak: 0,
        }
    }

    fn push(&mut self, i: usize) {
        if !self.queued[i] {
            self.queued[i] = true;
            self.queue.push_back(i);
            self.peak = self.peak.max(self.queue.len());
        }
    }

    fn pop(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }
}

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Epsilon: maximum distance for neighbourhood.
    epsilon: f64,
    /// Minimum neighbourhood size (self included) for a core point.
    min_pts: usize,
    /// Index used by [`Dbscan::fit`].
    index_params: KdTreeParams,
    stop: Option<StopSignal>,
}

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Maximum distance between two points to be neighbours.
    /// * `min_pts` - Minimum neighbourhood size, the point itself included.
    ///
    /// # Typical Values
    ///
    /// - `epsilon`: Often read off a k-distance plot with `k = min_pts`.
    /// - `min_pts`: 2 * dimension is a common heuristic.
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self {
            epsilon,
            min_pts,
            index_params: KdTreeParams::default(),
            stop: None,
        }
    }

    /// Set epsilon (neighbourhood radius).
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set minimum points for core classification.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Set the k-d tree parameters used by [`Dbscan::fit`] and [`Dbscan::fit_points`].
    pub fn with_index_params(mut self, params: KdTreeParams) -> Self {
        self.index_params = params;
        self
    }

    /// Poll `signal` between units of work; a triggered signal aborts the run
    /// with [`Error::Cancelled`].
    pub fn with_stop_signal(mut self, signal: StopSignal) -> Self {
        self.stop = Some(signal);
        self
    }

    /// Neighbourhood radius.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Minimum neighbourhood size for a core point.
    pub fn min_pts(&self) -> usize {
        self.min_pts
    }

    fn validate(&self) -> Result<()> {
        check_epsilon(self.epsilon)?;
        if self.min_pts == 0 {
            return Err(Error::InvalidParameter {
                name: "min_pts",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Cluster raw rows: builds a [`PointSet`] and a [`KdTree`], then runs.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<DbscanFit> {
        self.validate()?;
        let points = PointSet::from_rows(data)?;
        self.fit_points(&points)
    }

    /// Cluster a [`PointSet`] with a freshly built [`KdTree`].
    pub fn fit_points(&self, points: &PointSet) -> Result<DbscanFit> {
        self.validate()?;
        let tree = match &self.stop {
            Some(signal) => KdTree::build_cancellable(points, self.index_params.clone(), signal)?,
            None => KdTree::build(points, self.index_params.clone())?,
        };
        self.run(points, &tree)
    }

    /// Cluster `points` using a prebuilt `index` over the same point set.
    ///
    /// `index` must have been built over `points` itself or an equal copy;
    /// anything else fails with [`Error::InvalidParameter`] (or
    /// [`Error::InvalidDimension`] when only the dimension differs).
    pub fn run<I>(&self, points: &PointSet, index: &I) -> Result<DbscanFit>
    where
        I: RadiusSearch + ?Sized,
    {
        self.validate()?;

        let indexed = index.points();
        if indexed.len() != points.len() {
            return Err(Error::InvalidParameter {
                name: "index",
                message: "index was built over a different point set",
            });
        }
        if !points.is_empty() && indexed.dim() != points.dim() {
            return Err(Error::InvalidDimension {
                expected: indexed.dim(),
                found: points.dim(),
            });
        }
        if !std::ptr::eq(indexed, points) && indexed != points {
            return Err(Error::InvalidParameter {
                name: "index",
                message: "index was built over a different point set",
            });
        }

        let mut frontier = Frontier::new(points.len());
        self.label_points(points, index, &mut frontier)
    }

    fn label_points<I>(
        &self,
        points: &PointSet,
        index: &I,
        frontier: &mut Frontier,
    ) -> Result<DbscanFit>
    where
        I: RadiusSearch + ?Sized,
    {
        let n = points.len();
        let stop = self.stop.as_ref();
        let mut labels = vec![Label::Noise; n];
        let mut visit = vec![VisitState::Unvisited; n];
        let mut core = vec![false; n];
        let mut n_clusters = 0usize;

        let mut neighbors = Vec::new();

        for p in 0..n {
            signal::poll(stop)?;
            if visit[p] == VisitState::Visited {
                continue;
            }
            visit[p] = VisitState::Visited;

            index.range_query_into(points.point(p), self.epsilon, &mut neighbors)?;
            if neighbors.len() < self.min_pts {
                // Noise for now; a later core point may still claim it.
                continue;
            }

            let cluster = n_clusters;
            core[p] = true;
            labels[p] = Label::Cluster(cluster);
            for &r in &neighbors {
                if visit[r] == VisitState::Unvisited || labels[r] == Label::Noise {
                    frontier.push(r);
                }
            }
            let mut size = 1usize;

            while let Some(q) = frontier.pop() {
                signal::poll(stop)?;

                if labels[q] == Label::Noise {
                    labels[q] = Label::Cluster(cluster);
                    size += 1;
                }
                if visit[q] == VisitState::Visited {
                    continue;
                }
                visit[q] = VisitState::Visited;

                index.range_query_into(points.point(q), self.epsilon, &mut neighbors)?;
                if neighbors.len() >= self.min_pts {
                    core[q] = true;
                    // Already-visited noise points are border points of this
                    // cluster and must be queued too.
                    for &r in &neighbors {
                        if visit[r] == VisitState::Unvisited || labels[r] == Label::Noise {
                            frontier.push(r);
                        }
                    }
                }
            }

            trace!(cluster, size, seed = p, "expanded cluster");
            n_clusters += 1;
        }

        let fit = DbscanFit {
            labels,
            core,
            n_clusters,
        };
        debug!(
            points = n,
            epsilon = self.epsilon,
            min_pts = self.min_pts,
            clusters = fit.n_clusters,
            noise = fit.noise_count(),
            peak_frontier = frontier.peak,
            "dbscan finished"
        );
        Ok(fit)
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 5)
    }
}

impl Clustering for Dbscan {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<Label>> {
        Ok(self.fit(data)?.into_labels())
    }
}

/// Result of a DBSCAN run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbscanFit {
    labels: Vec<Label>,
    core: Vec<bool>,
    n_clusters: usize,
}

impl DbscanFit {
    /// One label per input point.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Consume the fit, keeping only the labels.
    pub fn into_labels(self) -> Vec<Label> {
        self.labels
    }

    /// Labels as integers: `-1` for noise, `0..k` for clusters.
    pub fn raw_labels(&self) -> Vec<i64> {
        self.labels.iter().map(Label::as_i64).collect()
    }

    /// Number of clusters found.
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Number of labelled points.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the input was empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether point `i` is a core point.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn is_core(&self, i: usize) -> bool {
        self.core[i]
    }

    /// Number of core points.
    pub fn core_count(&self) -> usize {
        self.core.iter().filter(|&&c| c).count()
    }

    /// Members of each cluster, indexed by cluster id, in ascending point order.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.n_clusters];
        for (i, label) in self.labels.iter().enumerate() {
            if let Label::Cluster(k) = *label {
                out[k].push(i);
            }
        }
        out
    }

    /// Noise points in ascending order.
    pub fn noise(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_noise())
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of noise points.
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_noise()).count()
    }
}
