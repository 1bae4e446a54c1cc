// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Rotation quaternions.

Rotations are [`nalgebra::UnitQuaternion`]s. Dense streams of them are kept in
`(n, 4)` arrays with the scalar part *last* (`[x, y, z, w]`), which is also the
storage order of [`nalgebra::Quaternion::coords`]; the functions here convert
between the two.
 */

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Matrix3, Quaternion, Rotation3, Unit, UnitQuaternion, Vector3, Vector4};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

/// A rotation quaternion.
pub type Quat = UnitQuaternion<f64>;

/// The rotation that takes the Z axis to the spherical coordinates
/// (`theta`, `phi`) with position angle `pa`. `theta` is the colatitude. With
/// `iau`, the position angle is measured in the IAU sense (the opposite
/// direction).
///
/// This is the product `R_z(phi + π/2) R_x(theta) R_z(pa)`.
pub fn from_angles(theta: f64, phi: f64, pa: f64, iau: bool) -> Quat {
    let pa = if iau { -pa } else { pa };
    let q_r = Quat::from_axis_angle(&Vector3::z_axis(), phi + FRAC_PI_2);
    let q_d = Quat::from_axis_angle(&Vector3::x_axis(), theta);
    let q_p = Quat::from_axis_angle(&Vector3::z_axis(), pa);
    compose(&(q_r * q_d), &q_p)
}

/// The inverse of [`from_angles`]: returns (`theta`, `phi`, `pa`). `phi` and
/// `pa` are in (-π, π]. Undefined at the poles (`theta` of 0 or π).
pub fn to_angles(q: &Quat, iau: bool) -> (f64, f64, f64) {
    let dir = q * Vector3::z();
    let theta = dir.z.clamp(-1.0, 1.0).acos();
    let phi = dir.y.atan2(dir.x);

    // Strip the sky-position part; what remains is a rotation about Z.
    let q_r = Quat::from_axis_angle(&Vector3::z_axis(), phi + FRAC_PI_2);
    let q_d = Quat::from_axis_angle(&Vector3::x_axis(), theta);
    let q_p = (q_r * q_d).inverse() * q;
    let pa = 2.0 * q_p.coords[2].atan2(q_p.coords[3]);
    let pa = if iau { -pa } else { pa };
    let pa = (pa + PI).rem_euclid(TAU) - PI;
    (theta, phi, pa)
}

/// The rotation taking the X, Y and Z axes to `x`, `y` and `z`. The triad is
/// orthonormalised first (Gram-Schmidt, keeping the direction of `x`).
pub fn from_axes(x: &Vector3<f64>, y: &Vector3<f64>, z: &Vector3<f64>) -> Quat {
    let x = x.normalize();
    let y = (y - x * x.dot(y)).normalize();
    let z = (z - x * x.dot(z) - y * y.dot(z)).normalize();
    let rot = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
    Quat::from_rotation_matrix(&rot)
}

/// The shortest rotation taking the direction `from` to the direction `to`.
pub fn from_vectors(from: &Vector3<f64>, to: &Vector3<f64>) -> Quat {
    Quat::rotation_between(from, to).unwrap_or_else(|| {
        // Antiparallel; any perpendicular axis will do.
        let a = from.normalize();
        let axis = if a.x.abs() < 0.9 {
            Vector3::new(0.0, a.z, -a.y)
        } else {
            Vector3::new(-a.z, 0.0, a.x)
        };
        Quat::from_axis_angle(&Unit::new_normalize(axis), PI)
    })
}

/// The product `a b`, renormalised.
#[inline]
pub fn compose(a: &Quat, b: &Quat) -> Quat {
    let mut q = a * b;
    q.renormalize();
    q
}

/// The same rotation on the other sign branch (`-q`).
#[inline]
pub fn flip(q: &Quat) -> Quat {
    Unit::new_unchecked(-q.into_inner())
}

/// The unit quaternion with scalar-last components `xyzw`. `None` if the norm
/// is zero or not finite.
pub fn from_xyzw(xyzw: [f64; 4]) -> Option<Quat> {
    let q = Quaternion::from(Vector4::from(xyzw));
    let norm = q.norm();
    if norm.is_finite() && norm > 0.0 {
        Some(Unit::new_normalize(q))
    } else {
        None
    }
}

/// The scalar-last components of `q`.
#[inline]
pub fn to_xyzw(q: &Quat) -> [f64; 4] {
    let c = &q.coords;
    [c[0], c[1], c[2], c[3]]
}

/// The quaternion in a row of an `(n, 4)` array.
#[inline]
pub fn from_row(row: ArrayView1<f64>) -> Quat {
    Unit::new_normalize(Quaternion::new(row[3], row[0], row[1], row[2]))
}

/// Interpolate a table of quaternions, sampled at the increasing `times`, to
/// each of `targets`. Targets outside of the table are extrapolated along the
/// nearest segment.
///
/// `times` must have at least two elements.
pub fn slerp_times(targets: &[f64], times: &[f64], quats: &[Quat]) -> Vec<Quat> {
    debug_assert_eq!(times.len(), quats.len());
    debug_assert!(times.len() >= 2);

    let last_segment = times.len() - 2;
    targets
        .par_iter()
        .map(|&t| {
            let i = times
                .partition_point(|&v| v <= t)
                .saturating_sub(1)
                .min(last_segment);
            let frac = (t - times[i]) / (times[i + 1] - times[i]);
            let (a, b) = (&quats[i], &quats[i + 1]);
            let mut q = a
                .try_slerp(b, frac, 1e-12)
                .unwrap_or_else(|| a.nlerp(b, frac));
            q.renormalize();
            q
        })
        .collect()
}

/// Pack quaternions into an `(n, 4)` array.
pub fn quats_to_array(quats: &[Quat]) -> Array2<f64> {
    let mut out = Array2::zeros((quats.len(), 4));
    for (mut row, q) in out.outer_iter_mut().zip(quats.iter()) {
        row.assign(&ArrayView1::from(q.coords.as_slice()));
    }
    out
}

/// Unpack an `(n, 4)` array into quaternions.
pub fn array_to_quats(a: ArrayView2<f64>) -> Vec<Quat> {
    a.outer_iter().map(from_row).collect()
}
