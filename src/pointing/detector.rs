// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-detector pointing, computed on demand.

use ndarray::prelude::*;
use ndarray::Zip;

use super::PointingError;
use crate::{focalplane::Focalplane, math::quat::{compose, from_row}};

/// Composes detector offsets with a boresight quaternion stream. Nothing is
/// cached; every call recomputes the detector's quaternions, so only the
/// detectors being worked on occupy memory.
pub struct DetectorPointingResolver<'a> {
    boresight: ArrayView2<'a, f64>,
    focalplane: &'a Focalplane,
}

impl<'a> DetectorPointingResolver<'a> {
    /// `boresight` is a `(n, 4)` array of quaternions.
    pub fn new(
        boresight: ArrayView2<'a, f64>,
        focalplane: &'a Focalplane,
    ) -> Result<DetectorPointingResolver<'a>, PointingError> {
        if boresight.ncols() != 4 {
            return Err(PointingError::NotQuaternions(boresight.ncols()));
        }
        Ok(DetectorPointingResolver {
            boresight,
            focalplane,
        })
    }

    /// The number of boresight samples available.
    pub fn len(&self) -> usize {
        self.boresight.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.boresight.nrows() == 0
    }

    /// The quaternions of `detector` for the `n` samples from `start`
    /// (relative to the first boresight sample).
    pub fn pointing(
        &self,
        detector: &str,
        start: usize,
        n: usize,
    ) -> Result<Array2<f64>, PointingError> {
        let det = self
            .focalplane
            .get(detector)
            .ok_or_else(|| PointingError::UnknownDetector(detector.to_string()))?;
        if start + n > self.len() {
            return Err(PointingError::SampleRange {
                start,
                end: start + n,
                available: self.len(),
            });
        }

        let det_quat = det.quat;
        let mut out = Array2::zeros((n, 4));
        Zip::from(out.rows_mut())
            .and(self.boresight.slice(s![start..start + n, ..]).rows())
            .par_for_each(|mut out, bore| {
                let q = compose(&from_row(bore), &det_quat);
                out.assign(&ArrayView1::from(q.coords.as_slice()));
            });
        Ok(out)
    }

    /// Lazily yield every detector's pointing for the `n` samples from
    /// `start`, in name order.
    pub fn iter(
        &self,
        start: usize,
        n: usize,
    ) -> impl Iterator<Item = (&'a str, Result<Array2<f64>, PointingError>)> + '_ {
        self.focalplane
            .names()
            .map(move |name| (name, self.pointing(name, start, n)))
    }
}
