// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.

pub mod quat;

pub use quat::Quat;

use nalgebra::Vector3;

/// The index of the first element of the sorted slice `xp` that is not less
/// than `x`, i.e. where `x` would be inserted to keep `xp` sorted ("left"
/// insertion).
#[inline]
pub fn search_sorted(xp: &[f64], x: f64) -> usize {
    xp.partition_point(|&v| v < x)
}

/// One-dimensional piecewise-linear interpolation of the monotonically
/// increasing sample points `xp` with values `fp`. Values outside of `xp` are
/// clamped to the end values.
///
/// # Examples
///
/// `assert_abs_diff_eq!(interp(0.5, &[0.0, 1.0], &[2.0, 4.0]), 3.0);`
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    debug_assert!(!xp.is_empty());

    let n = xp.len();
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    // The index of the first point strictly greater than x.
    let right = xp.partition_point(|&v| v <= x);
    let left = right - 1;
    let (x0, x1) = (xp[left], xp[right]);
    if x == x0 {
        return fp[left];
    }
    let frac = (x - x0) / (x1 - x0);
    fp[left] + frac * (fp[right] - fp[left])
}

/// Wrap an angle into [0, 2π).
#[inline]
pub fn wrap_tau(angle: f64) -> f64 {
    let w = angle.rem_euclid(std::f64::consts::TAU);
    // rem_euclid can return TAU itself for tiny negative inputs.
    if w >= std::f64::consts::TAU {
        0.0
    } else {
        w
    }
}

/// The unit vector pointing at the spherical coordinates (`theta`, `phi`),
/// where `theta` is the colatitude and `phi` the longitude.
#[inline]
pub fn ang2vec(theta: f64, phi: f64) -> Vector3<f64> {
    let (s_theta, c_theta) = theta.sin_cos();
    let (s_phi, c_phi) = phi.sin_cos();
    Vector3::new(s_theta * c_phi, s_theta * s_phi, c_theta)
}
