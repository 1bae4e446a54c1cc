// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use nalgebra::Vector3;
use ndarray::prelude::*;

use super::{AtmosphereError, WeatherSnapshot};
use crate::{
    cache::{signal_name, CacheBuffer},
    math::quat::from_row,
    observation::Observation,
    pointing::DetectorPointingResolver,
};

/// Something that fills the `"<out_prefix>_<detector>"` buffer of every
/// detector of an observation with atmospheric signal.
pub trait TurbulenceSimulator: Sync {
    fn simulate(
        &self,
        obs: &mut Observation,
        weather: &WeatherSnapshot,
        realization: u64,
        out_prefix: &str,
    ) -> Result<(), AtmosphereError>;
}

/// A static, non-turbulent atmosphere: each sample sees the air temperature
/// times the airmass along the detector's line of sight \[K\]. Needs the
/// horizontal boresight quaternions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AirmassEmission;

impl TurbulenceSimulator for AirmassEmission {
    fn simulate(
        &self,
        obs: &mut Observation,
        weather: &WeatherSnapshot,
        _realization: u64,
        out_prefix: &str,
    ) -> Result<(), AtmosphereError> {
        let mut signals = Vec::with_capacity(obs.focalplane().len());
        {
            let resolver =
                DetectorPointingResolver::new(obs.boresight_azel()?, obs.focalplane())?;
            let n = resolver.len();
            for (name, quats) in resolver.iter(0, n) {
                let quats = quats?;
                let signal: Array1<f64> = quats
                    .outer_iter()
                    .map(|q| {
                        let dir = from_row(q) * Vector3::z();
                        // Stay finite at the horizon.
                        weather.air_temperature / dir.z.max(1e-3)
                    })
                    .collect();
                signals.push((signal_name(out_prefix, name), signal));
            }
        }

        for (name, signal) in signals {
            obs.cache_mut().create(&name, CacheBuffer::F64(signal))?;
        }
        Ok(())
    }
}
