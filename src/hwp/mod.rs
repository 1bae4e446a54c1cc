// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Half-wave plate angles.

The plate either spins continuously or is stepped by a fixed angle at a fixed
cadence. Either way the angle of a sample depends only on its global index, so
every worker produces its part of a continuous stream without talking to the
others.
 */


use log::debug;
use ndarray::prelude::*;
use thiserror::Error;

use crate::{constants::TAU, dist::SampleRange, math::wrap_tau};

#[derive(Error, Debug, PartialEq)]
pub enum HwpError {
    #[error("Half-wave plate parameters are ambiguous: rpm = {rpm:?}, step = {step_deg:?} deg, step time = {step_time_s:?} s. Give either the rate alone, or the step together with the step time")]
    Ambiguous {
        rpm: Option<f64>,
        step_deg: Option<f64>,
        step_time_s: Option<f64>,
    },

    #[error("Half-wave plate rate must be positive and finite, got {0} rpm")]
    InvalidRpm(f64),

    #[error("Half-wave plate step ({step_deg} deg every {step_time_s} s) must be finite with a positive step time")]
    InvalidStep { step_deg: f64, step_time_s: f64 },
}

/// How the half-wave plate moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HwpConfig {
    /// Spinning at a constant rate \[radians / second\].
    Continuous { rate: f64 },

    /// Rotated by `step` \[radians\] every `step_time` \[seconds\].
    Stepped { step: f64, step_time: f64 },
}

impl HwpConfig {
    /// Interpret user parameters. Nothing at all means there is no half-wave
    /// plate. Otherwise exactly one mode must be fully described.
    pub fn from_parts(
        rpm: Option<f64>,
        step_deg: Option<f64>,
        step_time_s: Option<f64>,
    ) -> Result<Option<HwpConfig>, HwpError> {
        match (rpm, step_deg, step_time_s) {
            (None, None, None) => Ok(None),

            (Some(rpm), None, None) => {
                if !rpm.is_finite() || rpm <= 0.0 {
                    return Err(HwpError::InvalidRpm(rpm));
                }
                Ok(Some(HwpConfig::Continuous {
                    rate: rpm * TAU / 60.0,
                }))
            }

            (None, Some(step_deg), Some(step_time_s)) => {
                if !step_deg.is_finite() || !step_time_s.is_finite() || step_time_s <= 0.0 {
                    return Err(HwpError::InvalidStep {
                        step_deg,
                        step_time_s,
                    });
                }
                Ok(Some(HwpConfig::Stepped {
                    step: step_deg.to_radians(),
                    step_time: step_time_s,
                }))
            }

            _ => Err(HwpError::Ambiguous {
                rpm,
                step_deg,
                step_time_s,
            }),
        }
    }

    /// The plate angle of global sample `g` for a stream sampled at `rate`
    /// \[Hz\], in [0, 2π).
    pub fn angle(&self, g: usize, rate: f64) -> f64 {
        match *self {
            HwpConfig::Continuous { rate: hwp_rate } => wrap_tau(g as f64 * hwp_rate / rate),

            HwpConfig::Stepped { step, step_time } => {
                let step_samples = step_time * rate;
                let num_steps = (g as f64 / step_samples).floor();
                wrap_tau(num_steps * step)
            }
        }
    }

    /// The plate angles of the samples in `range`.
    pub fn angles(&self, range: SampleRange, rate: f64) -> Array1<f64> {
        debug!(
            "Simulating half-wave plate angles for samples {}..{}",
            range.offset,
            range.end()
        );
        range.range().map(|g| self.angle(g, rate)).collect()
    }
}
