// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. Angles are in radians unless the name
says otherwise.
 */

pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// The number of seconds in a day.
pub const DAYSEC: f64 = 86400.0;

/// The Julian Date of the UNIX epoch (1970-01-01T00:00:00 UTC).
pub const UNIX_EPOCH_JD: f64 = 2440587.5;

/// The Julian Date of J2000.0.
pub const J2000_JD: f64 = 2451545.0;

/// The lowest elevation a constant-elevation scan may have \[degrees\]. The
/// bound itself is not allowed.
pub const MIN_ELEVATION_DEG: f64 = 1.0;

/// The highest elevation a constant-elevation scan may have \[degrees\]. The
/// bound itself is not allowed.
pub const MAX_ELEVATION_DEG: f64 = 89.0;

/// Stable (non-turnaround) runs shorter than this many samples are folded into
/// the turnarounds.
pub const MIN_SUBSCAN_LENGTH: usize = 10;

/// The number of points used to describe one sinc-modulated sweep or one
/// turnaround of the canonical scan cycle.
pub const CANONICAL_SWEEP_STEPS: usize = 10_000;

/// The largest allowed time between two Az/El -> sky control quaternions
/// \[seconds\].
pub const CONTROL_POINT_SPACING: f64 = 600.0;

/// The time between two evaluations of the solar ephemeris when flagging
/// samples close to the Sun \[seconds\].
pub const SUN_EPHEMERIS_STEP: f64 = 60.0;

/// The astronomical unit \[km\].
pub const AU_KM: f64 = 149597870.7;

/// The mean angular speed of the Earth around the Sun \[radians / day\].
pub const EARTH_RAD_PER_DAY: f64 = 0.01720209895;

/// The number of points on the absorption-coefficient frequency grid.
pub const DEFAULT_NUM_ABSORPTION_FREQS: usize = 1001;

/// The number of points used to average the absorption coefficient across a
/// detector bandpass.
pub const DEFAULT_NUM_BANDPASS_STEPS: usize = 101;

/// The bandwidth of a detector without a declared bandpass, as a fraction of
/// the observing frequency.
pub const DEFAULT_FRACTIONAL_BANDWIDTH: f64 = 0.2;
