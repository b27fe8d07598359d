use thiserror::Error;

/// Errors returned by the index and the clustering engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A point (or query) does not have the dimensionality of its point set.
    #[error("invalid dimension: expected {expected}, found {found}")]
    InvalidDimension {
        /// Dimensionality of the point set or index.
        expected: usize,
        /// Dimensionality that was supplied.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A [`StopSignal`](crate::StopSignal) was triggered while work was in progress.
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Reject non-positive or NaN radii.
pub(crate) fn check_epsilon(epsilon: f64) -> Result<()> {
    // `!(x > 0.0)` also catches NaN.
    if !(epsilon > 0.0) {
        return Err(Error::InvalidParameter {
            name: "epsilon",
            message: "must be positive",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_validation() {
        assert!(check_epsilon(0.5).is_ok());
        assert!(check_epsilon(f64::INFINITY).is_ok());
        assert!(check_epsilon(0.0).is_err());
        assert!(check_epsilon(-1.0).is_err());
        assert!(check_epsilon(f64::NAN).is_err());
    }

    #[test]
    fn display_messages() {
        let err = Error::InvalidDimension {
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "invalid dimension: expected 3, found 2");

        let err = Error::InvalidParameter {
            name: "min_pts",
            message: "must be at least 1",
        };
        assert_eq!(err.to_string(), "invalid parameter min_pts: must be at least 1");
    }
}
