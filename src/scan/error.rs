// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::intervals::IntervalError;

/// Errors from setting up or simulating a constant-elevation scan.
#[derive(Error, Debug, PartialEq)]
pub enum ScanError {
    #[error("Impossible CES at {el_deg:.2} degrees; the elevation must be between {min} and {max} degrees (exclusive)")]
    ElevationOutOfRange { el_deg: f64, min: f64, max: f64 },

    #[error("A scan must have a positive number of samples")]
    NoSamples,

    #[error("The sample rate must be a positive number, not {0}")]
    InvalidSampleRate(f64),

    #[error("The scan rate must be a positive number, not {0} rad/s")]
    InvalidScanRate(f64),

    #[error("The scan acceleration must be a positive number, not {0} rad/s^2")]
    InvalidScanAccel(f64),

    #[error("The azimuth range ({azmin}, {azmax}) isn't finite")]
    InvalidAzimuth { azmin: f64, azmax: f64 },

    #[error("{name} must be a finite UNIX time, not {value}")]
    NonFiniteTime { name: &'static str, value: f64 },

    #[error("The first sample time is earlier than the CES start: {first_time} < {ces_start}")]
    StartsBeforeCes { first_time: f64, ces_start: f64 },

    #[error("The last sample time is later than the CES stop: {last_time} > {ces_stop}")]
    StopsAfterCes { last_time: f64, ces_stop: f64 },

    #[error("Cannot scan across the zero meridian with a sinc-modulated scan (azimuths {azmin} to {azmax} rad, modulo pi)")]
    SincAcrossMeridian { azmin: f64, azmax: f64 },

    #[error("A sinc-modulated scan can't turn around where sin(az) is zero (azimuths {azmin} to {azmax} rad, modulo pi)")]
    SincDegenerate { azmin: f64, azmax: f64 },

    #[error("Unknown coordinate system '{0}'; expected one of C, E or G")]
    UnknownCoordSystem(String),

    #[error("Every sample is within {angle_deg:.2} degrees of the Sun")]
    AllSunClose { angle_deg: f64 },

    #[error("The entire TOD is flagged as turnaround. Sample rate too low ({rate} Hz) or scan rate too high ({scanrate_deg} deg/s)?")]
    AllTurnaround { rate: f64, scanrate_deg: f64 },

    #[error("The subscans cover {got} samples, but the scan has {expected}")]
    SubscanMismatch { got: usize, expected: usize },

    #[error(transparent)]
    Interval(#[from] IntervalError),
}
