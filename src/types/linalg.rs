//! Linear algebra type aliases for the local heading regression
//!
//! The weighted least-squares problem solved per way vertex always has two
//! unknowns (slope and intercept), so the normal equations are fixed-size.

use nalgebra::{SMatrix, SVector};

// ===== Regression Dimensions =====
pub const REGRESSION_DIM: usize = 2; // (slope, intercept)

// Index of the slope coefficient in a solved `RegressionVec`
pub const SLOPE: usize = 0;
pub const INTERCEPT: usize = 1;

// ===== Weighted Normal Equations =====
/// `XᵀWX` for the design matrix `[x - mean(x), 1]`
pub type NormalMatrix = SMatrix<f64, REGRESSION_DIM, REGRESSION_DIM>;

/// `XᵀWY`, and the solved coefficient vector `[beta1, beta0]`
pub type RegressionVec = SVector<f64, REGRESSION_DIM>;

/// Relative singular value cutoff for the pseudo-inverse.
/// Matches the default `rcond` used by NumPy's `pinv`.
pub const PINV_RCOND: f64 = 1e-15;
