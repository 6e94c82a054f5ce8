use core::fmt::{Display, Formatter, Result};

/// Error type for windowed regression updates.
///
/// Numeric degeneracies such as an empty window or zero variance in x are not
/// errors; they surface as NaN or infinity in the fitted values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegressionError {
    /// Points must be added in non-decreasing x order.
    ///
    /// The rejected add leaves the regression exactly as it was.
    InvalidOrder {
        /// The rejected x value.
        x: f64,
        /// The x value of the most recent accepted point.
        last_x: f64,
    },
}

impl Display for RegressionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::InvalidOrder { x, last_x } => {
                write!(
                    f,
                    "Invalid order: x value {x} is less than the last added x value {last_x}"
                )
            }
        }
    }
}

impl core::error::Error for RegressionError {}
