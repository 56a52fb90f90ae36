//! Module containing miscellaneous array helper functions.

use crate::imports::*;

/// Centered finite difference over a unit step, zero at both boundary
/// values: `out[i] = (x[i+1] - x[i-1]) / 2` for interior `i`.
pub fn centered_diff(x: &Array1<f64>) -> Array1<f64> {
    let mut out = Array1::zeros(x.len());
    for i in 1..x.len().saturating_sub(1) {
        out[i] = (x[i + 1] - x[i - 1]) / 2.0;
    }
    out
}

/// Elementwise degrees to radians
pub fn deg_to_rad(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(f64::to_radians)
}
