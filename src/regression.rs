//! Ordinary least-squares regression of `y` on a single predictor `x`.
//!
//! The fit solves the normal equations `beta = (X^T X)^-1 X^T y` with the [`Matrix`] engine,
//! where `X` is the `(n, 2)` design matrix `[1, x]`.

use std::fmt;

use log::{debug, warn};

use crate::{Error, Matrix, Result};

/// A fitted line `y = slope * x + intercept` with its coefficient of determination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionResult {
    slope: f64,
    intercept: f64,
    r_squared: f64,
}

impl RegressionResult {
    #[inline]
    pub fn slope(&self) -> f64 {
        self.slope
    }

    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[inline]
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Evaluate the fitted line at `x`.
    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }
}

impl fmt::Display for RegressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "f(x) = {:.3}x + {:.3}, R^2 = {:.3}",
            self.slope, self.intercept, self.r_squared
        )
    }
}

/// Fit `y = slope * x + intercept` by least squares.
///
/// Errors:
/// - [`Error::DimensionMismatch`] if `x` and `y` differ in length
/// - [`Error::RegressionFailed`] for fewer than two points, all `x` equal, all `y` equal, a
///   singular normal matrix, or a non-finite result. Matrix errors are kept as the source.
///
/// Constant inputs are rejected by comparing values directly: rounding in the normal equations
/// and in the mean can leave a tiny nonzero pivot or TSS for values like `0.1`.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<RegressionResult> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch(format!(
            "x has {} values but y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        warn!("regression needs at least 2 points, got {}", x.len());
        return Err(Error::regression(format!(
            "at least 2 points are required, got {}",
            x.len()
        )));
    }

    if !has_spread(x) {
        warn!("regression predictor has no spread");
        return Err(Error::regression("all x values are equal (x has no variance)"));
    }
    if !has_spread(y) {
        warn!("regression target has zero variance");
        return Err(Error::regression(
            "all y values are equal (y has no variance)",
        ));
    }

    let beta = solve_normal_equations(x, y).map_err(|e| {
        warn!("normal equations could not be solved: {e}");
        Error::regression_from("normal equations could not be solved", e)
    })?;
    let intercept = beta[0];
    let slope = beta[1];
    if !(intercept.is_finite() && slope.is_finite()) {
        return Err(Error::regression("coefficients are not finite"));
    }

    let n = y.len() as f64;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut rss = 0.0_f64;
    let mut tss = 0.0_f64;
    for (&xi, &yi) in x.iter().zip(y) {
        let residual = yi - slope.mul_add(xi, intercept);
        rss = residual.mul_add(residual, rss);
        let dev = yi - mean_y;
        tss = dev.mul_add(dev, tss);
    }

    if tss == 0.0 {
        warn!("regression target has zero variance");
        return Err(Error::regression(
            "total sum of squares is zero (y has no variance)",
        ));
    }

    let r_squared = 1.0 - rss / tss;
    if !r_squared.is_finite() {
        return Err(Error::regression("R^2 is not finite"));
    }

    let result = RegressionResult {
        slope,
        intercept,
        r_squared,
    };
    debug!("fitted {result} on {} points (rss={rss}, tss={tss})", x.len());
    Ok(result)
}

fn has_spread(values: &[f64]) -> bool {
    values.iter().any(|&v| v != values[0])
}

/// Returns `[intercept, slope]`.
fn solve_normal_equations(x: &[f64], y: &[f64]) -> Result<[f64; 2]> {
    let design = Matrix::design(x)?;
    let target = Matrix::column(y)?;

    let design_t = design.transpose()?;
    let gram = design_t.multiply(&design)?;
    let gram_inv = gram.square_inverse()?;
    let moment = design_t.multiply(&target)?;
    let beta = gram_inv.multiply(&moment)?;

    Ok([beta.get(0, 0)?, beta.get(1, 0)?])
}
