// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
A simulated constant-elevation scan, as seen by one worker.

The trajectory and flags of the whole scan are cheap and deterministic, so
every worker computes them in full. Pointing is the expensive part; each
worker only derives (and caches) the boresight quaternions of its own samples.
Detector data are not simulated here. The detector streams read as zeros, and
signals made by other stages live in the cache under `"<prefix>_<detector>"`.
 */

mod error;
mod site;
#[cfg(test)]
mod tests;

pub use error::ObservationError;
pub use site::{name_to_id, Site};

use std::{collections::BTreeMap, time::Instant};

use log::{debug, info};
use ndarray::prelude::*;

use crate::{
    cache::{
        signal_name, Cache, CacheBuffer, CacheError, BORESIGHT_AZEL, BORESIGHT_RADEC, HWP_ANGLE,
    },
    comm::Communicator,
    constants::{AU_KM, DAYSEC, EARTH_RAD_PER_DAY},
    dist::{partition, SampleRange},
    focalplane::Focalplane,
    hwp::HwpConfig,
    intervals::{Interval, IntervalSet},
    pointing::{BoresightPointingTranslator, DetectorPointingResolver, PointingError},
    scan::{simulate_scan, stable_intervals, CesSpec, Trajectory},
};

#[derive(Debug)]
pub struct Observation {
    spec: CesSpec,
    site: Site,
    focalplane: Focalplane,
    hwp: Option<HwpConfig>,
    trajectory: Trajectory,
    intervals: IntervalSet,
    range: SampleRange,
    rank: usize,
    cache: Cache,
    /// Per realization.
    noise_scales: BTreeMap<u64, f64>,
}

impl Observation {
    /// Simulate the scan and this worker's boresight pointing. Every worker
    /// of `comm` must call this with the same arguments.
    pub fn simulate<C: Communicator>(
        comm: &C,
        spec: CesSpec,
        site: Site,
        focalplane: Focalplane,
        hwp: Option<HwpConfig>,
    ) -> Result<Observation, ObservationError> {
        let rank = comm.rank();

        let timer = Instant::now();
        let mut trajectory = simulate_scan(&spec, &site.position)?;
        comm.barrier()?;
        if rank == 0 {
            debug!("Simulate scan: {:.3} s", timer.elapsed().as_secs_f64());
        }

        let timer = Instant::now();
        let intervals = stable_intervals(
            trajectory.flags.view_mut(),
            spec.first_time(),
            spec.rate(),
            spec.params().scanrate,
        )?;
        comm.barrier()?;
        if rank == 0 {
            debug!("List valid intervals: {:.3} s", timer.elapsed().as_secs_f64());
            info!(
                "{} stable intervals covering {} of {} samples",
                intervals.len(),
                intervals.num_samples(),
                spec.num_samples()
            );
        }

        let range = partition(spec.num_samples(), comm.size(), rank);
        let timer = Instant::now();
        let translator = BoresightPointingTranslator::new(&spec, &site.position)?;
        let pointing = translator.translate(trajectory.az.view(), range)?;
        comm.barrier()?;
        if rank == 0 {
            debug!(
                "Translate scan pointing: {:.3} s",
                timer.elapsed().as_secs_f64()
            );
        }

        let mut cache = Cache::new();
        cache.create(BORESIGHT_AZEL, CacheBuffer::Quat(pointing.azel))?;
        cache.create(BORESIGHT_RADEC, CacheBuffer::Quat(pointing.sky))?;
        if let Some(hwp) = &hwp {
            cache.create(HWP_ANGLE, CacheBuffer::F64(hwp.angles(range, spec.rate())))?;
        }

        Ok(Observation {
            spec,
            site,
            focalplane,
            hwp,
            trajectory,
            intervals,
            range,
            rank,
            cache,
            noise_scales: BTreeMap::new(),
        })
    }

    pub fn spec(&self) -> &CesSpec {
        &self.spec
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn focalplane(&self) -> &Focalplane {
        &self.focalplane
    }

    pub fn hwp(&self) -> Option<&HwpConfig> {
        self.hwp.as_ref()
    }

    /// The trajectory of the whole scan.
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// The stable intervals of the whole scan.
    pub fn intervals(&self) -> &IntervalSet {
        &self.intervals
    }

    /// The stable intervals overlapping this worker's samples, clipped to
    /// them. Indices stay global.
    pub fn local_intervals(&self) -> Vec<Interval> {
        self.intervals.clip(self.range.offset, self.range.count)
    }

    /// The global samples owned by this worker.
    pub fn range(&self) -> SampleRange {
        self.range
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }

    pub fn times(&self) -> Array1<f64> {
        self.spec.sample_times(self.range.offset, self.range.count)
    }

    pub fn common_flags(&self) -> ArrayView1<u8> {
        self.trajectory.flags.slice(s![self.range.range()])
    }

    pub fn az(&self) -> ArrayView1<f64> {
        self.trajectory.az.slice(s![self.range.range()])
    }

    pub fn el(&self) -> f64 {
        self.spec.el()
    }

    pub fn boresight_azel(&self) -> Result<ArrayView2<f64>, CacheError> {
        self.cache.quats(BORESIGHT_AZEL)
    }

    pub fn boresight_radec(&self) -> Result<ArrayView2<f64>, CacheError> {
        self.cache.quats(BORESIGHT_RADEC)
    }

    /// Reclaim the memory of the horizontal boresight quaternions.
    pub fn free_azel_quats(&mut self) -> Result<(), CacheError> {
        self.cache.destroy(BORESIGHT_AZEL)
    }

    pub fn free_radec_quats(&mut self) -> Result<(), CacheError> {
        self.cache.destroy(BORESIGHT_RADEC)
    }

    /// `None` when there is no half-wave plate.
    pub fn hwp_angle(&self) -> Result<Option<ArrayView1<f64>>, CacheError> {
        match self.hwp {
            None => Ok(None),
            Some(_) => self.cache.f64(HWP_ANGLE).map(Some),
        }
    }

    /// Composes detector offsets with the sky boresight on demand.
    pub fn pointing_resolver(&self) -> Result<DetectorPointingResolver, ObservationError> {
        let bore = self.boresight_radec()?;
        Ok(DetectorPointingResolver::new(bore, &self.focalplane)?)
    }

    /// The sky quaternions of `detector` for every local sample.
    pub fn detector_pointing(&self, detector: &str) -> Result<Array2<f64>, ObservationError> {
        Ok(self
            .pointing_resolver()?
            .pointing(detector, 0, self.range.count)?)
    }

    /// The simulated data stream of `detector`, which is all zeros.
    pub fn detector_data(&self, detector: &str) -> Result<Array1<f64>, ObservationError> {
        if self.focalplane.get(detector).is_none() {
            return Err(PointingError::UnknownDetector(detector.to_string()).into());
        }
        Ok(Array1::zeros(self.range.count))
    }

    pub fn put_detector_data(
        &mut self,
        detector: &str,
        _data: ArrayView1<f64>,
    ) -> Result<(), CacheError> {
        Err(CacheError::ReadOnly(format!("data of detector '{detector}'")))
    }

    pub fn put_times(&mut self, _times: ArrayView1<f64>) -> Result<(), CacheError> {
        Err(CacheError::ReadOnly("times".to_string()))
    }

    pub fn put_common_flags(&mut self, _flags: ArrayView1<u8>) -> Result<(), CacheError> {
        Err(CacheError::ReadOnly("common flags".to_string()))
    }

    /// The cached `prefix` signal of `detector`.
    pub fn signal(&self, prefix: &str, detector: &str) -> Result<ArrayView1<f64>, CacheError> {
        self.cache.f64(&signal_name(prefix, detector))
    }

    pub fn signal_mut(
        &mut self,
        prefix: &str,
        detector: &str,
    ) -> Result<ArrayViewMut1<f64>, CacheError> {
        self.cache.f64_mut(&signal_name(prefix, detector))
    }

    /// The position of the Earth for every local sample \[km\], on a circular
    /// orbit of 1 AU in the ecliptic plane.
    pub fn earth_position(&self) -> Array2<f64> {
        let rad_per_sec = EARTH_RAD_PER_DAY / DAYSEC;
        let times = self.times();
        let mut out = Array2::zeros((times.len(), 3));
        for (mut row, t) in out.outer_iter_mut().zip(times.iter()) {
            let (s, c) = (t * rad_per_sec).sin_cos();
            row[0] = AU_KM * c;
            row[1] = AU_KM * s;
        }
        out
    }

    /// The velocity of the Earth for every local sample \[km/s\]; see
    /// [`Observation::earth_position`].
    pub fn earth_velocity(&self) -> Array2<f64> {
        let rad_per_sec = EARTH_RAD_PER_DAY / DAYSEC;
        let speed = AU_KM * rad_per_sec;
        let times = self.times();
        let mut out = Array2::zeros((times.len(), 3));
        for (mut row, t) in out.outer_iter_mut().zip(times.iter()) {
            let (s, c) = (t * rad_per_sec).sin_cos();
            row[0] = -speed * s;
            row[1] = speed * c;
        }
        out
    }

    /// The noise scale of `realization`; 1 unless it was set.
    pub fn noise_scale(&self, realization: u64) -> f64 {
        self.noise_scales.get(&realization).copied().unwrap_or(1.0)
    }

    pub fn set_noise_scale(&mut self, realization: u64, scale: f64) {
        self.noise_scales.insert(realization, scale);
    }
}
