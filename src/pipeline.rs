// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The stages of a run, in order, for one worker.

use std::collections::BTreeMap;

use log::{debug, info};
use ndarray::Array2;

use crate::{
    atmosphere::{
        copy_signal, AbsorptionModel, AtmosphereError, AtmosphereWeighting, ConstantWeather,
        TurbulenceSimulator, WeatherProvider,
    },
    comm::Communicator,
    config::RunParams,
    dist::SampleRange,
    error::GroundTodError,
    observation::Observation,
    pointing::gather_quats,
};

/// What the signal is called before weighting.
const UNWEIGHTED_SUFFIX: &str = "raw";

/// The external pieces a run may use.
#[derive(Clone, Copy, Default)]
pub struct Collaborators<'a> {
    /// Fills the atmosphere signal buffers. Without it the buffers must
    /// already exist for weighting to work.
    pub turbulence: Option<&'a dyn TurbulenceSimulator>,
    pub absorption: Option<&'a dyn AbsorptionModel>,
}

/// One worker's view of a finished run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub range: SampleRange,
    pub num_intervals: usize,
    pub num_stable_samples: usize,
    /// The absorption factor of each detector, when weighting was done.
    pub factors: BTreeMap<String, f64>,
    pub noise_scale: Option<f64>,
    /// The sky quaternions of every sample, when asked for.
    pub boresight: Option<Array2<f64>>,
}

/// Simulate the scan and pointing, then, if the run asks for it, make and
/// weight the atmospheric signal. With `gather_boresight`, every worker also
/// gets the sky quaternions of the whole scan.
pub fn run_pipeline<C: Communicator>(
    comm: &C,
    params: &RunParams,
    collaborators: Collaborators,
    gather_boresight: bool,
) -> Result<PipelineSummary, GroundTodError> {
    let mut obs = Observation::simulate(
        comm,
        params.spec.clone(),
        params.site.clone(),
        params.focalplane.clone(),
        params.hwp,
    )?;
    debug!(
        "Worker {} owns samples {}..{}",
        comm.rank(),
        obs.range().offset,
        obs.range().end()
    );

    let mut factors = BTreeMap::new();
    let mut noise_scale = None;
    if let Some(atm) = &params.atmosphere {
        let weather = ConstantWeather(atm.weather).snapshot(
            obs.site().id,
            atm.realization,
            obs.spec().first_time(),
        );
        // Check for the absorption model before anything is written.
        let weighting = AtmosphereWeighting::new(
            atm.freq_ghz,
            atm.prefix.as_str(),
            atm.realization,
            collaborators.absorption,
        )?;
        if collaborators.absorption.is_none() {
            return Err(AtmosphereError::MissingDependency.into());
        }

        if let Some(turbulence) = collaborators.turbulence {
            turbulence.simulate(&mut obs, &weather, atm.realization, &atm.prefix)?;
        }
        copy_signal(
            &mut obs,
            &atm.prefix,
            &format!("{}_{UNWEIGHTED_SUFFIX}", atm.prefix),
        )?;
        factors = weighting.apply(comm, &mut obs, &weather)?;
        noise_scale = Some(obs.noise_scale(atm.realization));
    }
    obs.free_azel_quats()?;

    let boresight = if gather_boresight {
        Some(gather_quats(comm, obs.boresight_radec()?)?)
    } else {
        None
    };

    if comm.is_root() {
        info!(
            "{} stable intervals, {} of {} samples usable",
            obs.intervals().len(),
            obs.intervals().num_samples(),
            obs.spec().num_samples()
        );
        if let Some(noise_scale) = noise_scale {
            info!("Atmosphere noise scale: {noise_scale:.4}");
        }
    }

    Ok(PipelineSummary {
        range: obs.range(),
        num_intervals: obs.intervals().len(),
        num_stable_samples: obs.intervals().num_samples(),
        factors,
        noise_scale,
        boresight,
    })
}
