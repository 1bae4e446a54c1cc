// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rotations between the horizontal frame and the sky frames.

use marlu::{precession::precess_time, AzEl, LatLngHeight, RADec};
use nalgebra::{Matrix3, Rotation3};

use crate::{
    constants::FRAC_PI_2,
    math::{
        ang2vec,
        quat::{compose, from_angles, from_axes},
        Quat,
    },
    scan::CoordSystem,
    time::{dut1, unix_to_epoch},
};

/// The rotation matrix from J2000 equatorial to galactic coordinates.
#[rustfmt::skip]
pub fn equ2gal() -> Matrix3<f64> {
    Matrix3::new(
        -0.054875539726, -0.873437108010, -0.483834985808,
        0.494109453312, -0.444829589425, 0.746982251810,
        -0.867666135858, -0.198076386122, 0.455983795705,
    )
}

/// The rotation matrix from J2000 equatorial to ecliptic coordinates.
#[rustfmt::skip]
pub fn equ2ecl() -> Matrix3<f64> {
    Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, 0.917482062069182, 0.397777155931914,
        0.0, -0.397777155931914, 0.917482062069182,
    )
}

/// The rotation from equatorial coordinates to `coord`.
pub fn coord_rotation(coord: CoordSystem) -> Quat {
    let m = match coord {
        CoordSystem::Equatorial => return Quat::identity(),
        CoordSystem::Ecliptic => equ2ecl(),
        CoordSystem::Galactic => equ2gal(),
    };
    Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m))
}

/// The orientation of a detector looking at (`ra`, `dec`) with position angle
/// `pa` \[radians\], expressed in `coord`.
pub fn radec_to_quat(ra: f64, dec: f64, pa: f64, coord: CoordSystem) -> Quat {
    let q = from_angles(FRAC_PI_2 - dec, ra, pa, false);
    match coord {
        CoordSystem::Equatorial => q,
        _ => compose(&coord_rotation(coord), &q),
    }
}

/// The orientation of the boresight at azimuth `az` and elevation `el` in the
/// horizontal frame. Azimuth is measured clockwise, longitude
/// counter-clockwise, hence the sign flip.
#[inline]
pub fn azel_quat(az: f64, el: f64) -> Quat {
    from_angles(FRAC_PI_2 - el, -az, 0.0, false)
}

/// The rotation from the horizontal frame at `site` to J2000 equatorial
/// coordinates at UNIX time `t`. No refraction is applied.
///
/// The horizontal frame has X towards the north horizon, Y towards the west
/// horizon and Z at the zenith. The images of the three axes are found
/// separately, orthonormalised, and the quaternion is solved from the
/// resulting rotation matrix.
pub fn horizontal_to_equatorial(t: f64, site: &LatLngHeight) -> Quat {
    let precession_info = precess_time(
        site.longitude_rad,
        site.latitude_rad,
        RADec::from_radians(0.0, 0.0),
        unix_to_epoch(t),
        dut1(),
    );
    let lat = precession_info.array_latitude_j2000;
    let lst = precession_info.lmst_j2000;

    let axis = |az: f64, el: f64| {
        let radec = RADec::from_hadec(AzEl::from_radians(az, el).to_hadec(lat), lst);
        ang2vec(FRAC_PI_2 - radec.dec, radec.ra)
    };
    from_axes(
        &axis(0.0, 0.0),
        &axis(-FRAC_PI_2, 0.0),
        &axis(0.0, FRAC_PI_2),
    )
}
