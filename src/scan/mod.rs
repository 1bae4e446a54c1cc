// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Constant-elevation scans (CES).

A CES sweeps the boresight back and forth in azimuth at a fixed elevation. One
canonical cycle (left-to-right sweep, turnaround, right-to-left sweep,
turnaround) is simulated once and then evaluated periodically at every sample
time, which makes the whole trajectory a cheap, deterministic function of the
scan parameters. Every worker computes it in full.
 */

mod error;
pub mod subscans;
pub mod sun;

pub use error::ScanError;
pub use subscans::{stable_intervals, sweep_starts};

use std::str::FromStr;

use log::{debug, trace};
use marlu::LatLngHeight;
use ndarray::prelude::*;
use rayon::prelude::*;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::*,
    math::{interp, search_sorted, wrap_tau},
};

/// The common-flag bits shared by every detector.
pub mod common_flags {
    pub const TURNAROUND: u8 = 1;
    pub const LEFTRIGHT_SCAN: u8 = 2;
    pub const RIGHTLEFT_SCAN: u8 = 4;
    pub const LEFTRIGHT_TURNAROUND: u8 = LEFTRIGHT_SCAN | TURNAROUND;
    pub const RIGHTLEFT_TURNAROUND: u8 = RIGHTLEFT_SCAN | TURNAROUND;
    pub const SUN_UP: u8 = 8;
    pub const SUN_CLOSE: u8 = 16;
}

use common_flags::*;

/// The sky coordinate system that boresight quaternions are expressed in.
#[derive(Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordSystem {
    #[default]
    #[strum(serialize = "C")]
    Equatorial,

    #[strum(serialize = "E")]
    Ecliptic,

    #[strum(serialize = "G")]
    Galactic,
}

impl CoordSystem {
    /// Parse one of the letters "C", "E" or "G".
    pub fn parse(s: &str) -> Result<CoordSystem, ScanError> {
        CoordSystem::from_str(s.trim()).map_err(|_| ScanError::UnknownCoordSystem(s.to_string()))
    }
}

/// Unchecked CES parameters. Angles are in radians, rates in radians per
/// second, times in UNIX seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CesParams {
    pub azmin: f64,
    pub azmax: f64,
    pub el: f64,
    pub scanrate: f64,
    pub scan_accel: f64,
    pub first_time: f64,
    /// Defaults to `first_time`.
    pub ces_start: Option<f64>,
    /// Defaults to the end of the last sample.
    pub ces_stop: Option<f64>,
    /// \[Hz\]
    pub rate: f64,
    pub num_samples: usize,
    pub sinc_modulation: bool,
    /// Flag samples closer to the Sun than this.
    pub sun_angle_min: Option<f64>,
    pub coord: CoordSystem,
}

impl CesParams {
    /// Check the parameters and turn them into a [`CesSpec`].
    pub fn validate(self) -> Result<CesSpec, ScanError> {
        if self.num_samples == 0 {
            return Err(ScanError::NoSamples);
        }
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(ScanError::InvalidSampleRate(self.rate));
        }
        let el_deg = self.el.to_degrees();
        if !(el_deg > MIN_ELEVATION_DEG && el_deg < MAX_ELEVATION_DEG) {
            return Err(ScanError::ElevationOutOfRange {
                el_deg,
                min: MIN_ELEVATION_DEG,
                max: MAX_ELEVATION_DEG,
            });
        }
        if !(self.scanrate.is_finite() && self.scanrate > 0.0) {
            return Err(ScanError::InvalidScanRate(self.scanrate));
        }
        if !(self.scan_accel.is_finite() && self.scan_accel > 0.0) {
            return Err(ScanError::InvalidScanAccel(self.scan_accel));
        }
        if !(self.azmin.is_finite() && self.azmax.is_finite()) {
            return Err(ScanError::InvalidAzimuth {
                azmin: self.azmin,
                azmax: self.azmax,
            });
        }

        for (name, value) in [
            ("first_time", Some(self.first_time)),
            ("ces_start", self.ces_start),
            ("ces_stop", self.ces_stop),
        ] {
            if let Some(value) = value.filter(|v| !v.is_finite()) {
                return Err(ScanError::NonFiniteTime { name, value });
            }
        }

        let ces_start = self.ces_start.unwrap_or(self.first_time);
        if self.first_time < ces_start {
            return Err(ScanError::StartsBeforeCes {
                first_time: self.first_time,
                ces_start,
            });
        }
        let last_time = self.first_time + self.num_samples as f64 / self.rate;
        let ces_stop = self.ces_stop.unwrap_or(last_time);
        if last_time > ces_stop {
            return Err(ScanError::StopsAfterCes {
                last_time,
                ces_stop,
            });
        }

        Ok(CesSpec {
            ces_start,
            ces_stop,
            last_time,
            params: self,
        })
    }
}

/// Validated CES parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CesSpec {
    params: CesParams,
    ces_start: f64,
    ces_stop: f64,
    last_time: f64,
}

impl CesSpec {
    pub fn params(&self) -> &CesParams {
        &self.params
    }

    pub fn el(&self) -> f64 {
        self.params.el
    }

    pub fn rate(&self) -> f64 {
        self.params.rate
    }

    pub fn num_samples(&self) -> usize {
        self.params.num_samples
    }

    pub fn coord(&self) -> CoordSystem {
        self.params.coord
    }

    pub fn first_time(&self) -> f64 {
        self.params.first_time
    }

    /// The end of the last sample, i.e. `first_time + num_samples / rate`.
    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    pub fn ces_start(&self) -> f64 {
        self.ces_start
    }

    pub fn ces_stop(&self) -> f64 {
        self.ces_stop
    }

    /// The time stamp of global sample `i`.
    #[inline]
    pub fn sample_time(&self, i: usize) -> f64 {
        self.params.first_time + i as f64 / self.params.rate
    }

    /// The time stamps of the global samples `[offset, offset + count)`.
    pub fn sample_times(&self, offset: usize, count: usize) -> Array1<f64> {
        Array1::from_iter((offset..offset + count).map(|i| self.sample_time(i)))
    }
}

/// The extent of the boresight pointing, turnarounds included \[radians\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRange {
    pub min_az: f64,
    pub max_az: f64,
    pub min_el: f64,
    pub max_el: f64,
}

/// The boresight azimuth and common flags of every sample of a CES.
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Wrapped to [0, 2π).
    pub az: Array1<f64>,
    pub flags: Array1<u8>,
    /// The lengths of the sweeps, split where the azimuth turns from
    /// decreasing to increasing. These always sum to the number of samples.
    pub subscan_sizes: Vec<usize>,
    pub subscan_starts: Vec<usize>,
    pub scan_range: ScanRange,
}

/// One period of the scan, with times relative to its start.
struct SweepCycle {
    times: Vec<f64>,
    az: Vec<f64>,
    flags: Vec<u8>,
}

impl SweepCycle {
    fn push_leg(&mut self, t0: f64, times: &[f64], az: &[f64], flag: u8) {
        self.times.extend(times.iter().map(|t| t - t0));
        self.az.extend_from_slice(az);
        self.flags.extend(std::iter::repeat(flag).take(times.len()));
    }

    fn period(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

/// The azimuth limits the scan actually uses, and whether a sinc-modulated
/// scan has to be mirrored by π.
fn effective_az_range(spec: &CesSpec) -> Result<(f64, f64, bool), ScanError> {
    let p = &spec.params;
    let (mut azmin, mut azmax) = (p.azmin, p.azmax);
    // An empty range means a full circle.
    if azmin == azmax {
        azmin = 0.0;
        azmax = TAU;
    }
    let mirror = p.sinc_modulation && azmin > PI;

    if p.sinc_modulation {
        // Always simulate a rising sinc scan; it is mirrored afterwards if
        // needed.
        azmin = azmin.rem_euclid(PI);
        azmax = azmax.rem_euclid(PI);
        if azmin > azmax {
            return Err(ScanError::SincAcrossMeridian { azmin, azmax });
        }
        if azmin == azmax || azmin.sin().abs() < 1e-9 || azmax.sin().abs() < 1e-9 {
            return Err(ScanError::SincDegenerate { azmin, azmax });
        }
    } else if azmax < azmin {
        azmax += TAU;
    }
    Ok((azmin, azmax, mirror))
}

/// Simulate one full scan cycle with turnarounds.
fn simulate_cycle(spec: &CesSpec, azmin: f64, azmax: f64) -> SweepCycle {
    let p = &spec.params;
    let nstep = CANONICAL_SWEEP_STEPS;
    // Translate the scan rate from sky to mount coordinates. The acceleration
    // is already in mount coordinates.
    let base_rate = p.scanrate / p.el.cos();
    let accel = p.scan_accel;

    let mut cycle = SweepCycle {
        times: Vec::with_capacity(4 * nstep),
        az: Vec::with_capacity(4 * nstep),
        flags: Vec::with_capacity(4 * nstep),
    };
    let start = spec.ces_start;

    // Left to right.
    let t0 = start;
    let t1 = if p.sinc_modulation {
        let t1 = t0 + (azmin.cos() - azmax.cos()) / base_rate;
        let tvec = Array1::linspace(t0, t1, nstep).to_vec();
        let azvec: Vec<f64> = tvec
            .iter()
            .map(|t| (azmin.cos() - base_rate * (t - t0)).clamp(-1.0, 1.0).acos())
            .collect();
        cycle.push_leg(start, &tvec, &azvec, LEFTRIGHT_SCAN);
        t1
    } else {
        let t1 = t0 + (azmax - azmin) / base_rate;
        cycle.push_leg(start, &[t0, t1], &[azmin, azmax], LEFTRIGHT_SCAN);
        t1
    };

    // Turnaround at the right edge. The last point is where the next sweep
    // starts, so it's left out.
    let t0 = t1;
    let dazdt = if p.sinc_modulation {
        base_rate / azmax.sin().abs()
    } else {
        base_rate
    };
    let t1 = t0 + 2.0 * dazdt / accel;
    let tvec = Array1::linspace(t0, t1, nstep).to_vec();
    let tvec = &tvec[1..nstep - 1];
    let azvec: Vec<f64> = tvec
        .iter()
        .map(|t| {
            let dt = t - t0;
            azmax + dt * dazdt - 0.5 * accel * dt * dt
        })
        .collect();
    cycle.push_leg(start, tvec, &azvec, LEFTRIGHT_TURNAROUND);

    // Right to left.
    let t0 = t1;
    let t1 = if p.sinc_modulation {
        let t1 = t0 + (azmin.cos() - azmax.cos()) / base_rate;
        let tvec = Array1::linspace(t0, t1, nstep).to_vec();
        let azvec: Vec<f64> = tvec
            .iter()
            .map(|t| (azmax.cos() + base_rate * (t - t0)).clamp(-1.0, 1.0).acos())
            .collect();
        cycle.push_leg(start, &tvec, &azvec, RIGHTLEFT_SCAN);
        t1
    } else {
        let t1 = t0 + (azmax - azmin) / base_rate;
        cycle.push_leg(start, &[t0, t1], &[azmax, azmin], RIGHTLEFT_SCAN);
        t1
    };

    // Turnaround at the left edge; this one closes the period.
    let t0 = t1;
    let dazdt = if p.sinc_modulation {
        base_rate / azmin.sin().abs()
    } else {
        base_rate
    };
    let t1 = t0 + 2.0 * dazdt / accel;
    let tvec = Array1::linspace(t0, t1, nstep).to_vec();
    let tvec = &tvec[1..];
    let azvec: Vec<f64> = tvec
        .iter()
        .map(|t| {
            let dt = t - t0;
            azmin - dt * dazdt + 0.5 * accel * dt * dt
        })
        .collect();
    cycle.push_leg(start, tvec, &azvec, RIGHTLEFT_TURNAROUND);

    cycle
}

/// Simulate the boresight azimuth and common flags of every sample of the
/// CES. Sun flags are added when `spec` has a Sun-avoidance angle; `site`
/// is only used for those.
pub fn simulate_scan(spec: &CesSpec, site: &LatLngHeight) -> Result<Trajectory, ScanError> {
    let (azmin, azmax, mirror) = effective_az_range(spec)?;
    let cycle = simulate_cycle(spec, azmin, azmax);
    let period = cycle.period();
    trace!(
        "Canonical scan cycle: {} points, period {period:.3} s",
        cycle.times.len()
    );

    // Evaluate the cycle periodically at every sample time. The phase is tied
    // to the CES start, not to the first sample.
    let num_samples = spec.num_samples();
    let last = cycle.times.len() - 1;
    let (az, flags): (Vec<f64>, Vec<u8>) = (0..num_samples)
        .into_par_iter()
        .map(|i| {
            let phase = (spec.sample_time(i) - spec.ces_start).rem_euclid(period);
            let mut az = interp(phase, &cycle.times, &cycle.az);
            if mirror {
                az += PI;
            }
            let flag = cycle.flags[search_sorted(&cycle.times, phase).min(last)];
            (az, flag)
        })
        .unzip();

    let starts = sweep_starts(&az);
    let subscan_sizes: Vec<usize> = starts.windows(2).map(|w| w[1] - w[0]).collect();
    let total: usize = subscan_sizes.iter().sum();
    if total != num_samples {
        return Err(ScanError::SubscanMismatch {
            got: total,
            expected: num_samples,
        });
    }
    let subscan_starts = starts[..starts.len() - 1].to_vec();

    let az = Array1::from_iter(az.into_iter().map(wrap_tau));
    let mut flags = Array1::from(flags);
    let scan_range = ScanRange {
        min_az: az.iter().copied().fold(f64::INFINITY, f64::min),
        max_az: az.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_el: spec.el(),
        max_el: spec.el(),
    };
    debug!(
        "Scan range: az {:.3} to {:.3} deg, el {:.3} deg, {} subscans",
        scan_range.min_az.to_degrees(),
        scan_range.max_az.to_degrees(),
        spec.el().to_degrees(),
        subscan_sizes.len()
    );

    if let Some(angle_min) = spec.params.sun_angle_min {
        sun::flag_sun(spec, site, angle_min, az.view(), flags.view_mut())?;
    }

    Ok(Trajectory {
        az,
        flags,
        subscan_sizes,
        subscan_starts,
        scan_range,
    })
}
