//! Arena-backed k-d tree.
//!
//! # Layout
//!
//! Nodes live in one `Vec<Node>` and refer to their children by position in
//! that vector. Leaves do not own their points: each leaf is a range into a
//! permutation of `0..N`, so the tree only ever stores point *indices* and the
//! [`PointSet`] stays the single source of coordinates.
//!
//! # Splitting
//!
//! A subset larger than [`KdTreeParams::leaf_size`] is split at the median of
//! the chosen dimension (found with a linear-time selection). Coordinates
//! `<= value` go left and coordinates `> value` go right, so points equal to
//! the split value always land on the left. When the median is also the
//! maximum, the split value is lowered to the largest coordinate below it so
//! that both children are non-empty. A subset whose points are all identical
//! cannot be split and becomes an oversized leaf.
//!
//! The split dimension is picked by [`SplitRule`]. It changes the tree shape,
//! never the query results.
//!
//! # Queries
//!
//! Build and traversal are iterative (explicit work stacks), so skewed inputs
//! that produce very deep trees cannot overflow the call stack.
//!
//! Pruning keeps one offset per dimension: the distance, along that axis, from
//! the query to the cell being visited. A far child is entered only if the
//! reduced distance assembled from those offsets is within the current limit.
//! No bounding boxes are stored.

use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use tracing::debug;

use super::metric::Metric;
use super::points::PointSet;
use super::{check_query, Neighbor, RadiusSearch};
use crate::error::{Error, Result};
use crate::signal::{self, StopSignal};

/// How a node picks the dimension it splits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SplitRule {
    /// Dimension with the largest coordinate spread among the node's points
    /// (lowest dimension wins ties).
    #[default]
    MaxSpread,
    /// `depth mod D`, skipping forward past dimensions with zero spread.
    Cycle,
}

/// Tree construction parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KdTreeParams {
    /// Maximum number of points in a leaf bucket.
    ///
    /// Larger buckets make the tree shallower at the cost of longer leaf
    /// scans. Must be at least 1. Only a set of identical points may exceed it.
    pub leaf_size: usize,

    /// Split dimension strategy.
    pub split_rule: SplitRule,

    /// Distance metric used by every query against the tree.
    pub metric: Metric,
}

impl Default for KdTreeParams {
    fn default() -> Self {
        Self {
            leaf_size: 16,
            split_rule: SplitRule::default(),
            metric: Metric::default(),
        }
    }
}

impl KdTreeParams {
    /// Default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the leaf bucket size.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Set the split dimension strategy.
    pub fn with_split_rule(mut self, split_rule: SplitRule) -> Self {
        self.split_rule = split_rule;
        self
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.leaf_size == 0 {
            return Err(Error::InvalidParameter {
                name: "leaf_size",
                message: "must be at least 1",
            });
        }
        self.metric.validate()
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        dim: usize,
        value: f64,
        left: usize,
        right: usize,
    },
    /// `indices[start..end]`.
    Leaf { start: usize, end: usize },
}

const PLACEHOLDER: Node = Node::Leaf { start: 0, end: 0 };

#[derive(Debug, Clone, Copy)]
struct BuildTask {
    node: usize,
    start: usize,
    end: usize,
    depth: usize,
}

/// A k-d tree over a borrowed [`PointSet`].
///
/// Immutable once built, so a shared reference can be queried from many
/// threads at once.
#[derive(Debug, Clone)]
pub struct KdTree<'a> {
    points: &'a PointSet,
    params: KdTreeParams,
    nodes: Vec<Node>,
    indices: Vec<usize>,
    depth: usize,
}

impl<'a> KdTree<'a> {
    /// Build a tree over every point in `points`.
    pub fn build(points: &'a PointSet, params: KdTreeParams) -> Result<Self> {
        Self::build_inner(points, params, None)
    }

    /// Like [`KdTree::build`], polling `signal` once per node.
    pub fn build_cancellable(
        points: &'a PointSet,
        params: KdTreeParams,
        signal: &StopSignal,
    ) -> Result<Self> {
        Self::build_inner(points, params, Some(signal))
    }

    fn build_inner(
        points: &'a PointSet,
        params: KdTreeParams,
        signal: Option<&StopSignal>,
    ) -> Result<Self> {
        params.validate()?;

        let n = points.len();
        let mut tree = KdTree {
            points,
            params,
            nodes: Vec::new(),
            indices: (0..n).collect(),
            depth: 0,
        };

        if n > 0 {
            tree.nodes.reserve(2 * n / tree.params.leaf_size + 1);
            tree.nodes.push(PLACEHOLDER);

            let mut work = vec![BuildTask {
                node: 0,
                start: 0,
                end: n,
                depth: 0,
            }];
            while let Some(task) = work.pop() {
                signal::poll(signal)?;
                tree.depth = tree.depth.max(task.depth);

                match tree.split(&task) {
                    Some((dim, value, mid)) => {
                        let left = tree.nodes.len();
                        let right = left + 1;
                        tree.nodes.push(PLACEHOLDER);
                        tree.nodes.push(PLACEHOLDER);
                        tree.nodes[task.node] = Node::Split {
                            dim,
                            value,
                            left,
                            right,
                        };
                        work.push(BuildTask {
                            node: right,
                            start: mid,
                            end: task.end,
                            depth: task.depth + 1,
                        });
                        work.push(BuildTask {
                            node: left,
                            start: task.start,
                            end: mid,
                            depth: task.depth + 1,
                        });
                    }
                    None => {
                        tree.nodes[task.node] = Node::Leaf {
                            start: task.start,
                            end: task.end,
                        };
                    }
                }
            }
        }

        debug!(
            points = n,
            dim = points.dim(),
            nodes = tree.nodes.len(),
            leaves = tree.leaf_count(),
            depth = tree.depth,
            leaf_size = tree.params.leaf_size,
            split_rule = ?tree.params.split_rule,
            metric = tree.params.metric.name(),
            "built k-d tree"
        );
        Ok(tree)
    }

    /// Partition `indices[task.start..task.end]` for a split node.
    ///
    /// Returns `(dim, value, mid)` with `indices[start..mid]` holding the
    /// points `<= value`, or `None` if the task should become a leaf.
    fn split(&mut self, task: &BuildTask) -> Option<(usize, f64, usize)> {
        let count = task.end - task.start;
        if count <= self.params.leaf_size {
            return None;
        }
        let dim = self.choose_dim(task)?;

        let points = self.points;
        let members = &mut self.indices[task.start..task.end];
        let (_, median, _) = members.select_nth_unstable_by(count / 2, |&a, &b| {
            points.coord(a, dim).total_cmp(&points.coord(b, dim))
        });
        let mut value = points.coord(*median, dim);
        let mut mid = partition(members, |i| points.coord(i, dim) <= value);

        if mid == count {
            // The median is the maximum. `dim` has positive spread, so a
            // strictly smaller coordinate exists.
            value = members
                .iter()
                .map(|&i| points.coord(i, dim))
                .filter(|&c| c < value)
                .fold(f64::NEG_INFINITY, f64::max);
            mid = partition(members, |i| points.coord(i, dim) <= value);
        }

        debug_assert!(mid > 0 && mid < count);
        Some((dim, value, task.start + mid))
    }

    fn choose_dim(&self, task: &BuildTask) -> Option<usize> {
        let members = &self.indices[task.start..task.end];
        let d = self.points.dim();
        match self.params.split_rule {
            SplitRule::MaxSpread => {
                let (dim, spread) = (0..d)
                    .map(|k| (k, self.spread(members, k)))
                    .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
                (spread > 0.0).then_some(dim)
            }
            SplitRule::Cycle => (0..d)
                .map(|off| (task.depth + off) % d)
                .find(|&k| self.spread(members, k) > 0.0),
        }
    }

    fn spread(&self, members: &[usize], dim: usize) -> f64 {
        let (lo, hi) = members.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), &i| {
                let c = self.points.coord(i, dim);
                (lo.min(c), hi.max(c))
            },
        );
        hi - lo
    }

    /// Number of points in the tree whose distance to `point` is at most
    /// `epsilon`, without collecting them.
    pub fn range_count(&self, point: &[f64], epsilon: f64) -> Result<usize> {
        if !check_query(self.points, point, epsilon)? {
            return Ok(0);
        }
        let mut collector = Count {
            radius: self.params.metric.reduce(epsilon),
            count: 0,
        };
        self.walk(point, &mut collector);
        Ok(collector.count)
    }

    /// The nearest indexed point, or `None` if the tree is empty.
    pub fn nearest(&self, point: &[f64]) -> Result<Option<Neighbor>> {
        Ok(self.nearest_k(point, 1)?.into_iter().next())
    }

    /// The `k` nearest indexed points, by ascending distance (ties broken by
    /// ascending index). Returns fewer than `k` if the tree is smaller.
    pub fn nearest_k(&self, point: &[f64], k: usize) -> Result<Vec<Neighbor>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        self.points.check_query(point)?;

        let mut collector = Nearest {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        };
        self.walk(point, &mut collector);

        let metric = self.params.metric;
        Ok(collector
            .heap
            .into_sorted_vec()
            .into_iter()
            .map(|(reduced, index)| Neighbor {
                index,
                distance: metric.unreduce(reduced.into_inner()),
            })
            .collect())
    }

    /// Depth-first traversal, near child first.
    fn walk<C: Collector>(&self, point: &[f64], collector: &mut C) {
        if self.nodes.is_empty() {
            return;
        }
        let metric = self.params.metric;
        let mut offsets = vec![0.0; self.points.dim()];
        let mut stack = vec![Step::Visit {
            node: 0,
            bound: 0.0,
            axis: None,
        }];

        while let Some(step) = stack.pop() {
            let (node, bound) = match step {
                Step::Restore { dim, offset } => {
                    offsets[dim] = offset;
                    continue;
                }
                Step::Visit { node, bound, axis } => {
                    // The limit may have shrunk while the near sibling was searched.
                    if bound > collector.limit() {
                        continue;
                    }
                    if let Some((dim, offset)) = axis {
                        stack.push(Step::Restore {
                            dim,
                            offset: offsets[dim],
                        });
                        offsets[dim] = offset;
                    }
                    (node, bound)
                }
            };

            match self.nodes[node] {
                Node::Leaf { start, end } => {
                    for &i in &self.indices[start..end] {
                        collector.offer(i, metric.reduced_distance(point, self.points.point(i)));
                    }
                }
                Node::Split {
                    dim,
                    value,
                    left,
                    right,
                } => {
                    let delta = point[dim] - value;
                    let (near, far) = if delta <= 0.0 {
                        (left, right)
                    } else {
                        (right, left)
                    };

                    // Summed in axis order, like `reduced_distance`, so rounding
                    // can never push the bound above a real point's distance.
                    let far_bound: f64 = offsets
                        .iter()
                        .enumerate()
                        .map(|(k, &o)| metric.axis_term(if k == dim { delta } else { o }))
                        .sum();
                    if far_bound <= collector.limit() {
                        stack.push(Step::Visit {
                            node: far,
                            bound: far_bound,
                            axis: Some((dim, delta)),
                        });
                    }
                    stack.push(Step::Visit {
                        node: near,
                        bound,
                        axis: None,
                    });
                }
            }
        }
    }

    /// The point set the tree indexes.
    pub fn points(&self) -> &'a PointSet {
        self.points
    }

    /// Construction parameters.
    pub fn params(&self) -> &KdTreeParams {
        &self.params
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the tree indexes no points.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Dimensionality of the indexed points.
    pub fn dim(&self) -> usize {
        self.points.dim()
    }

    /// Total number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf buckets.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path (0 for a single leaf).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Point indices held by each leaf, in arena order.
    pub fn leaf_buckets(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.nodes.iter().filter_map(|n| match *n {
            Node::Leaf { start, end } => Some(&self.indices[start..end]),
            Node::Split { .. } => None,
        })
    }
}

impl RadiusSearch for KdTree<'_> {
    fn points(&self) -> &PointSet {
        self.points
    }

    fn metric(&self) -> Metric {
        self.params.metric
    }

    fn range_query_into(&self, point: &[f64], epsilon: f64, out: &mut Vec<usize>) -> Result<()> {
        out.clear();
        if !check_query(self.points, point, epsilon)? {
            return Ok(());
        }
        let mut collector = Within {
            radius: self.params.metric.reduce(epsilon),
            out,
        };
        self.walk(point, &mut collector);
        Ok(())
    }
}

enum Step {
    Visit {
        node: usize,
        bound: f64,
        /// Offset to install for this subtree (far children only).
        axis: Option<(usize, f64)>,
    },
    Restore {
        dim: usize,
        offset: f64,
    },
}

/// Receives candidate points during a traversal.
trait Collector {
    /// Subtrees whose reduced bound exceeds this are skipped.
    fn limit(&self) -> f64;
    fn offer(&mut self, index: usize, reduced: f64);
}

struct Within<'o> {
    radius: f64,
    out: &'o mut Vec<usize>,
}

impl Collector for Within<'_> {
    fn limit(&self) -> f64 {
        self.radius
    }

    #[inline]
    fn offer(&mut self, index: usize, reduced: f64) {
        if reduced <= self.radius {
            self.out.push(index);
        }
    }
}

struct Count {
    radius: f64,
    count: usize,
}

impl Collector for Count {
    fn limit(&self) -> f64 {
        self.radius
    }

    #[inline]
    fn offer(&mut self, _index: usize, reduced: f64) {
        if reduced <= self.radius {
            self.count += 1;
        }
    }
}

/// Bounded max-heap of the best `k` `(reduced distance, index)` pairs.
struct Nearest {
    k: usize,
    heap: BinaryHeap<(OrderedFloat<f64>, usize)>,
}

impl Collector for Nearest {
    fn limit(&self) -> f64 {
        match self.heap.peek() {
            Some(&(worst, _)) if self.heap.len() >= self.k => worst.into_inner(),
            _ => f64::INFINITY,
        }
    }

    fn offer(&mut self, index: usize, reduced: f64) {
        let candidate = (OrderedFloat(reduced), index);
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }
}

/// Move every element satisfying `pred` to the front; returns how many did.
fn partition(slice: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut store = 0;
    for i in 0..slice.len() {
        if pred(slice[i]) {
            slice.swap(i, store);
            store += 1;
        }
    }
    store
}
