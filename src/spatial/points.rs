//! Immutable point storage.

use crate::error::{Error, Result};

/// An ordered set of `N` points in `D` dimensions.
///
/// Coordinates are stored row-major in one contiguous buffer. Indices handed
/// out by the index and the clustering engine are positions in this set.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    dim: usize,
    coords: Vec<f64>,
}

impl PointSet {
    /// Build from a flat, row-major coordinate buffer.
    ///
    /// `coords.len()` must be a multiple of `dim`, and every coordinate must be
    /// finite.
    pub fn new(dim: usize, coords: Vec<f64>) -> Result<Self> {
        if dim == 0 {
            if !coords.is_empty() {
                return Err(Error::InvalidParameter {
                    name: "dim",
                    message: "must be at least 1 for a non-empty point set",
                });
            }
        } else if coords.len() % dim != 0 {
            return Err(Error::InvalidParameter {
                name: "coords",
                message: "length must be a multiple of dim",
            });
        }
        check_finite(&coords)?;
        Ok(Self { dim, coords })
    }

    /// Build from one `Vec` per point. All rows must share one length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::empty(0));
        };
        let dim = first.len();
        if dim == 0 {
            return Err(Error::InvalidParameter {
                name: "dim",
                message: "must be at least 1 for a non-empty point set",
            });
        }
        let mut coords = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            if row.len() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    found: row.len(),
                });
            }
            coords.extend_from_slice(row);
        }
        Self::new(dim, coords)
    }

    /// An empty point set of the given dimensionality.
    pub fn empty(dim: usize) -> Self {
        Self {
            dim,
            coords: Vec::new(),
        }
    }

    /// Dimensionality `D`.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of points `N`.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.coords.len() / self.dim
        }
    }

    /// Whether the set holds no points.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates of point `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn point(&self, i: usize) -> &[f64] {
        let start = i * self.dim;
        &self.coords[start..start + self.dim]
    }

    /// Coordinate `d` of point `i`.
    #[inline]
    pub(crate) fn coord(&self, i: usize, d: usize) -> f64 {
        self.coords[i * self.dim + d]
    }

    /// Iterate over points in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        // `chunks_exact(0)` panics, and an empty set has nothing to yield anyway.
        self.coords.chunks_exact(self.dim.max(1))
    }

    /// The raw row-major buffer.
    pub fn as_flat(&self) -> &[f64] {
        &self.coords
    }

    /// Fail with [`Error::InvalidDimension`] unless `point` has this set's dimensionality.
    pub fn check_query(&self, point: &[f64]) -> Result<()> {
        if point.len() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                found: point.len(),
            });
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<f64>>> for PointSet {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

fn check_finite(coords: &[f64]) -> Result<()> {
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "points",
            message: "coordinates must be finite",
        });
    }
    Ok(())
}
