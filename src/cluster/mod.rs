//! Density-based clustering.
//!
//! ## DBSCAN
//!
//! Density-based clustering that can discover non-convex clusters and identify
//! outliers (noise points). DBSCAN does not require specifying the number of
//! clusters in advance. Each point gets exactly one [`Label`]: a cluster id or
//! noise.
//!
//! **Assumptions**:
//! - Clusters have roughly similar density
//! - A single radius ε separates "near" from "far" across the whole dataset
//!
//! **When to use**: Unknown cluster count, arbitrary cluster shapes, data
//! with outliers.
//!
//! ## Choosing ε
//!
//! [`k_distances`] returns the sorted k-nearest-neighbour distance profile;
//! the knee of that curve is the usual starting point for ε with
//! `min_pts = k`.
//!
//! ## Usage
//!
//! ```rust
//! use kdscan::cluster::{Clustering, Dbscan, Label};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//!     vec![50.0, 50.0],
//! ];
//!
//! let labels = Dbscan::new(0.5, 2).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//! assert_eq!(labels[4], Label::Noise);
//! ```

mod dbscan;
mod kdistance;
mod traits;

pub use dbscan::{Dbscan, DbscanFit, Label, NOISE};
pub use kdistance::k_distances;
pub use traits::Clustering;
