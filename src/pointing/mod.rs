// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Boresight pointing.

A full spherical-astronomy computation per sample is expensive, so the rotation
from the horizontal frame to the sky is only evaluated on a coarse
[`ControlGrid`] spanning the whole observation (no more than 10 minutes
between points). The grid depends only on the scan, never on how samples are
split between workers, so every worker builds the same one. It is then
interpolated to each local sample and combined with the sample's Az/El
orientation.
 */

mod coord;
pub mod detector;
mod error;

pub use coord::{
    azel_quat, coord_rotation, horizontal_to_equatorial, radec_to_quat, equ2ecl, equ2gal,
};
pub use detector::DetectorPointingResolver;
pub use error::PointingError;

use log::{debug, trace};
use marlu::LatLngHeight;
use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{
    comm::Communicator,
    constants::CONTROL_POINT_SPACING,
    dist::SampleRange,
    math::{
        quat::{compose, flip, quats_to_array, slerp_times},
        Quat,
    },
    scan::CesSpec,
};

/// Horizontal-to-sky rotations at a few instants of an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGrid {
    times: Vec<f64>,
    quats: Vec<Quat>,
}

impl ControlGrid {
    /// Build a grid from strictly increasing `times` and their quaternions.
    ///
    /// Each quaternion is replaced by its negative if that is closer to the
    /// previous one, so that interpolation never crosses between the two
    /// covers of a rotation.
    pub fn new(times: Vec<f64>, quats: Vec<Quat>) -> Result<ControlGrid, PointingError> {
        if times.len() != quats.len() {
            return Err(PointingError::ControlLengthMismatch {
                times: times.len(),
                quats: quats.len(),
            });
        }
        if times.len() < 2 {
            return Err(PointingError::TooFewControlPoints(times.len()));
        }
        for (index, w) in times.windows(2).enumerate() {
            // Also catches NaNs.
            if !(w[1] > w[0]) {
                return Err(PointingError::NonIncreasingTimes {
                    index: index + 1,
                    time: w[1],
                    prev: w[0],
                });
            }
        }
        for (index, q) in quats.iter().enumerate() {
            if !q.coords.iter().all(|c| c.is_finite()) {
                return Err(PointingError::InvalidControlQuat { index });
            }
        }

        let mut quats = quats;
        for i in 1..quats.len() {
            let (prev, q) = (quats[i - 1], quats[i]);
            let dist_same = (prev.coords - q.coords).lp_norm(1);
            let dist_flip = (prev.coords + q.coords).lp_norm(1);
            if dist_flip < dist_same {
                quats[i] = flip(&q);
            }
        }

        let first = quats[0];
        if quats[1..]
            .iter()
            .all(|q| (q.coords - first.coords).amax() < 1e-12)
        {
            return Err(PointingError::DegenerateControlGrid);
        }

        Ok(ControlGrid { times, quats })
    }

    /// The grid for a CES: evenly spaced from the first to the last sample
    /// time, with the rotation into the scan's coordinate system included.
    pub fn for_scan(spec: &CesSpec, site: &LatLngHeight) -> Result<ControlGrid, PointingError> {
        let (first, last) = (spec.first_time(), spec.last_time());
        let n = 2.max(1 + ((last - first) / CONTROL_POINT_SPACING).ceil() as usize);
        let times = Array1::linspace(first, last, n).to_vec();
        let rotation = coord_rotation(spec.coord());
        let quats: Vec<Quat> = times
            .par_iter()
            .map(|&t| rotation * horizontal_to_equatorial(t, site))
            .collect();
        trace!("Built {n} control points between {first} and {last}");
        ControlGrid::new(times, quats)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn quats(&self) -> &[Quat] {
        &self.quats
    }

    /// Spherically interpolate the grid to every time of `targets`.
    pub fn interpolate(&self, targets: &[f64]) -> Vec<Quat> {
        slerp_times(targets, &self.times, &self.quats)
    }
}

/// Boresight quaternions for one worker's samples, as `(count, 4)` arrays.
#[derive(Debug, Clone)]
pub struct BoresightPointing {
    pub range: SampleRange,
    /// Horizontal frame.
    pub azel: Array2<f64>,
    /// The scan's sky coordinate system.
    pub sky: Array2<f64>,
}

/// Turns the boresight azimuth of a CES into sky quaternions.
pub struct BoresightPointingTranslator<'a> {
    spec: &'a CesSpec,
    grid: ControlGrid,
}

impl<'a> BoresightPointingTranslator<'a> {
    pub fn new(
        spec: &'a CesSpec,
        site: &LatLngHeight,
    ) -> Result<BoresightPointingTranslator<'a>, PointingError> {
        let grid = ControlGrid::for_scan(spec, site)?;
        debug!("Pointing control grid has {} points", grid.len());
        Ok(BoresightPointingTranslator { spec, grid })
    }

    /// Use an existing control grid.
    pub fn with_grid(spec: &'a CesSpec, grid: ControlGrid) -> BoresightPointingTranslator<'a> {
        BoresightPointingTranslator { spec, grid }
    }

    pub fn control_grid(&self) -> &ControlGrid {
        &self.grid
    }

    /// The boresight quaternions of the samples in `range`. `az` holds the
    /// azimuth of every sample of the scan.
    pub fn translate(
        &self,
        az: ArrayView1<f64>,
        range: SampleRange,
    ) -> Result<BoresightPointing, PointingError> {
        let num_samples = self.spec.num_samples();
        if az.len() != num_samples {
            return Err(PointingError::AzimuthLengthMismatch {
                az: az.len(),
                expected: num_samples,
            });
        }
        if range.end() > num_samples {
            return Err(PointingError::SampleRange {
                start: range.offset,
                end: range.end(),
                available: num_samples,
            });
        }

        let el = self.spec.el();
        let azel: Vec<Quat> = range
            .range()
            .into_par_iter()
            .map(|i| azel_quat(az[i], el))
            .collect();
        let times: Vec<f64> = range.range().map(|i| self.spec.sample_time(i)).collect();
        let to_sky = self.grid.interpolate(&times);
        let sky: Vec<Quat> = to_sky
            .par_iter()
            .zip(azel.par_iter())
            .map(|(c, a)| compose(c, a))
            .collect();

        Ok(BoresightPointing {
            range,
            azel: quats_to_array(&azel),
            sky: quats_to_array(&sky),
        })
    }
}

/// Concatenate every worker's `(n, 4)` quaternions in rank order, on every
/// worker.
pub fn gather_quats<C: Communicator>(
    comm: &C,
    local: ArrayView2<f64>,
) -> Result<Array2<f64>, PointingError> {
    if local.ncols() != 4 {
        return Err(PointingError::NotQuaternions(local.ncols()));
    }
    let rows: Vec<[f64; 4]> = local
        .outer_iter()
        .map(|r| [r[0], r[1], r[2], r[3]])
        .collect();
    let all = comm.all_gather_concat(rows)?;
    Ok(Array2::from(all))
}
