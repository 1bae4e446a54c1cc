// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Flag samples taken with the Sun up or close to the boresight.

use log::debug;
use marlu::{precession::get_lmst, AzEl, LatLngHeight, RADec};
use ndarray::{ArrayView1, ArrayViewMut1, Zip};

use super::{
    common_flags::{SUN_CLOSE, SUN_UP},
    CesSpec, ScanError,
};
use crate::{
    constants::{J2000_JD, SUN_EPHEMERIS_STEP},
    math::wrap_tau,
    time::{dut1, unix_to_epoch, unix_to_jd},
};

/// The equatorial coordinates of the Sun at the Julian date `jd`. This uses
/// the low-precision formulae of the Astronomical Almanac, good to about 0.01
/// degrees between 1950 and 2050.
pub fn sun_radec(jd: f64) -> RADec {
    let n = jd - J2000_JD;
    let mean_lon = (280.460 + 0.9856474 * n).to_radians();
    let mean_anomaly = (357.528 + 0.9856003 * n).to_radians();
    let ecliptic_lon = mean_lon
        + 1.915_f64.to_radians() * mean_anomaly.sin()
        + 0.020_f64.to_radians() * (2.0 * mean_anomaly).sin();
    let obliquity = (23.439 - 4e-7 * n).to_radians();

    let (s_lon, c_lon) = ecliptic_lon.sin_cos();
    let ra = (obliquity.cos() * s_lon).atan2(c_lon);
    let dec = (obliquity.sin() * s_lon).asin();
    RADec::from_radians(wrap_tau(ra), dec)
}

/// The horizontal coordinates of the Sun at UNIX time `t`, as seen from
/// `site`.
pub fn sun_azel(t: f64, site: &LatLngHeight) -> AzEl {
    let lst = get_lmst(site.longitude_rad, unix_to_epoch(t), dut1());
    sun_radec(unix_to_jd(t))
        .to_hadec(lst)
        .to_azel(site.latitude_rad)
}

/// The angular distance between two horizontal positions.
fn separation(az1: f64, el1: f64, az2: f64, el2: f64) -> f64 {
    let cos_sep = el1.sin() * el2.sin() + el1.cos() * el2.cos() * (az1 - az2).cos();
    cos_sep.clamp(-1.0, 1.0).acos()
}

/// Set [`SUN_UP`] on samples taken while the Sun is above the horizon and
/// [`SUN_CLOSE`] on samples closer than `angle_min` to it. The Sun is
/// evaluated on a coarse time grid and each sample uses the nearest point.
///
/// Fails if every sample ends up close to the Sun.
pub(crate) fn flag_sun(
    spec: &CesSpec,
    site: &LatLngHeight,
    angle_min: f64,
    az: ArrayView1<f64>,
    mut flags: ArrayViewMut1<u8>,
) -> Result<(), ScanError> {
    let first_time = spec.first_time();
    let span = (spec.num_samples() - 1) as f64 / spec.rate();
    let num_grid = (span / SUN_EPHEMERIS_STEP).ceil() as usize + 1;
    let sun: Vec<AzEl> = (0..num_grid)
        .map(|k| sun_azel(first_time + k as f64 * SUN_EPHEMERIS_STEP, site))
        .collect();

    let el = spec.el();
    Zip::indexed(&mut flags).and(&az).par_for_each(|i, flag, &az| {
        let k = ((i as f64 / spec.rate()) / SUN_EPHEMERIS_STEP).round() as usize;
        let s = &sun[k.min(num_grid - 1)];
        if s.el > 0.0 {
            *flag |= SUN_UP;
        }
        if separation(az, el, s.az, s.el) < angle_min {
            *flag |= SUN_CLOSE;
        }
    });

    let num_close = flags.iter().filter(|&&f| f & SUN_CLOSE != 0).count();
    debug!(
        "{num_close} of {} samples are within {:.2} deg of the Sun",
        flags.len(),
        angle_min.to_degrees()
    );
    if num_close == flags.len() {
        return Err(ScanError::AllSunClose {
            angle_deg: angle_min.to_degrees(),
        });
    }
    Ok(())
}
