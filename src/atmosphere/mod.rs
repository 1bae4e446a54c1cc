// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Frequency-dependent weighting of simulated atmospheric signal.

The absorption coefficient is evaluated over `[0, 2 f]` with the frequency grid
split across workers and gathered again, so every worker holds the same curve.
Each detector's cached signal is then scaled in place by the mean of the curve
across its bandpass.
 */

mod error;
mod model;
mod turbulence;
mod weather;

pub use error::AtmosphereError;
pub use model::{AbsorptionModel, AnalyticAbsorption};
pub use turbulence::{AirmassEmission, TurbulenceSimulator};
pub use weather::{ConstantWeather, WeatherProvider, WeatherSnapshot};

use std::{collections::BTreeMap, time::Instant};

use log::{debug, trace};
use ndarray::Array1;

use crate::{
    cache::{signal_name, CacheBuffer, CacheError},
    comm::Communicator,
    constants::{
        DEFAULT_FRACTIONAL_BANDWIDTH, DEFAULT_NUM_ABSORPTION_FREQS, DEFAULT_NUM_BANDPASS_STEPS,
    },
    dist::partition,
    focalplane::{Bandpass, Detector},
    math::interp,
    observation::Observation,
};

/// The absorption coefficient on a frequency grid \[GHz\].
#[derive(Debug, Clone, PartialEq)]
pub struct AbsorptionCurve {
    pub freqs: Vec<f64>,
    pub values: Vec<f64>,
}

impl AbsorptionCurve {
    /// The mean absorption across `bandpass`, sampled at `steps` evenly
    /// spaced frequencies with linear interpolation.
    pub fn band_average(&self, bandpass: Bandpass, steps: usize) -> f64 {
        let half = 0.5 * bandpass.width_ghz;
        let freqs = Array1::linspace(
            bandpass.center_ghz - half,
            bandpass.center_ghz + half,
            steps,
        );
        let sum: f64 = freqs
            .iter()
            .map(|&f| interp(f, &self.freqs, &self.values))
            .sum();
        sum / steps as f64
    }
}

/// Scales the cached `"<prefix>_<detector>"` signals of an observation by
/// atmospheric absorption.
pub struct AtmosphereWeighting<'m> {
    freq_ghz: f64,
    prefix: String,
    realization: u64,
    num_freqs: usize,
    num_bandpass_steps: usize,
    model: Option<&'m dyn AbsorptionModel>,
}

impl<'m> AtmosphereWeighting<'m> {
    /// `model` is the absorption-coefficient utility; without it nothing can
    /// be weighted, and [`AtmosphereWeighting::apply`] fails.
    pub fn new(
        freq_ghz: f64,
        prefix: impl Into<String>,
        realization: u64,
        model: Option<&'m dyn AbsorptionModel>,
    ) -> Result<AtmosphereWeighting<'m>, AtmosphereError> {
        if !freq_ghz.is_finite() || freq_ghz <= 0.0 {
            return Err(AtmosphereError::InvalidFrequency(freq_ghz));
        }
        Ok(AtmosphereWeighting {
            freq_ghz,
            prefix: prefix.into(),
            realization,
            num_freqs: DEFAULT_NUM_ABSORPTION_FREQS,
            num_bandpass_steps: DEFAULT_NUM_BANDPASS_STEPS,
            model,
        })
    }

    /// Use a different number of grid frequencies and bandpass steps.
    pub fn with_resolution(
        mut self,
        num_freqs: usize,
        num_bandpass_steps: usize,
    ) -> Result<AtmosphereWeighting<'m>, AtmosphereError> {
        if num_freqs < 2 || num_bandpass_steps < 1 {
            return Err(AtmosphereError::InvalidGrid {
                num_freqs,
                num_bandpass_steps,
            });
        }
        self.num_freqs = num_freqs;
        self.num_bandpass_steps = num_bandpass_steps;
        Ok(self)
    }

    pub fn freq_ghz(&self) -> f64 {
        self.freq_ghz
    }

    pub fn realization(&self) -> u64 {
        self.realization
    }

    fn model(&self) -> Result<&'m dyn AbsorptionModel, AtmosphereError> {
        self.model.ok_or(AtmosphereError::MissingDependency)
    }

    /// The bandpass used for `detector`: its own, or one centred on the
    /// weighting frequency with the default fractional width.
    pub fn detector_band(&self, detector: &Detector) -> Bandpass {
        detector.bandpass.unwrap_or(Bandpass {
            center_ghz: self.freq_ghz,
            width_ghz: DEFAULT_FRACTIONAL_BANDWIDTH * self.freq_ghz,
        })
    }

    /// The absorption curve over `[0, 2 f]`. Each worker evaluates its share
    /// of the frequencies; every worker gets the whole curve.
    pub fn absorption_curve<C: Communicator>(
        &self,
        comm: &C,
        altitude: f64,
        weather: &WeatherSnapshot,
    ) -> Result<AbsorptionCurve, AtmosphereError> {
        let model = self.model()?;
        let freqs = Array1::linspace(0.0, 2.0 * self.freq_ghz, self.num_freqs).to_vec();
        let range = partition(freqs.len(), comm.size(), comm.rank());
        let local = model.absorption_curve(altitude, weather, &freqs[range.range()]);
        let values = comm.all_gather_concat(local)?;
        Ok(AbsorptionCurve { freqs, values })
    }

    /// Scale every detector's signal by its band-averaged absorption and
    /// record the noise scale of this realization. Returns the factor of each
    /// detector.
    ///
    /// Nothing is modified unless the absorption model is available and every
    /// detector's signal is in the cache.
    pub fn apply<C: Communicator>(
        &self,
        comm: &C,
        obs: &mut Observation,
        weather: &WeatherSnapshot,
    ) -> Result<BTreeMap<String, f64>, AtmosphereError> {
        let model = self.model()?;
        for det in obs.focalplane().names() {
            obs.signal(&self.prefix, det)?;
        }

        let timer = Instant::now();
        let altitude = obs.site().position.height_metres;
        let curve = self.absorption_curve(comm, altitude, weather)?;
        let factors: BTreeMap<String, f64> = obs
            .focalplane()
            .iter()
            .map(|det| {
                let band = self.detector_band(det);
                let factor = curve.band_average(band, self.num_bandpass_steps);
                trace!(
                    "{}: band {:.3} +- {:.3} GHz, absorption {factor:.6}",
                    det.name,
                    band.center_ghz,
                    0.5 * band.width_ghz
                );
                (det.name.clone(), factor)
            })
            .collect();

        for (name, &factor) in &factors {
            obs.signal_mut(&self.prefix, name)?
                .map_inplace(|x| *x *= factor);
        }

        let noise_scale = model.absorption(altitude, weather, self.freq_ghz) * weather.air_temperature;
        obs.set_noise_scale(self.realization, noise_scale);

        comm.barrier()?;
        if comm.is_root() {
            debug!(
                "Atmosphere weighting at {} GHz: {:.3} s, noise scale {noise_scale:.4}",
                self.freq_ghz,
                timer.elapsed().as_secs_f64()
            );
        }
        Ok(factors)
    }
}

/// Copy every detector's `"<input>_<detector>"` buffer to
/// `"<output>_<detector>"`. The output buffers must not exist yet.
pub fn copy_signal(obs: &mut Observation, input: &str, output: &str) -> Result<(), CacheError> {
    let names: Vec<String> = obs.focalplane().names().map(str::to_string).collect();
    for det in &names {
        let out = signal_name(output, det);
        if obs.cache().exists(&out) {
            return Err(CacheError::AlreadyExists(out));
        }
        obs.signal(input, det)?;
    }
    for det in &names {
        let data = obs.signal(input, det)?.to_owned();
        obs.cache_mut()
            .create(&signal_name(output, det), CacheBuffer::F64(data))?;
    }
    Ok(())
}
