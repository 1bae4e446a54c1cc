// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::{cache::CacheError, comm::CommError, pointing::PointingError};

#[derive(Error, Debug, PartialEq)]
pub enum AtmosphereError {
    #[error("No absorption-coefficient model is available; atmosphere weighting can't be done")]
    MissingDependency,

    #[error("Atmosphere frequency must be positive and finite, got {0} GHz")]
    InvalidFrequency(f64),

    #[error("The absorption curve needs at least 2 frequencies and the bandpass average at least 1 step (got {num_freqs} and {num_bandpass_steps})")]
    InvalidGrid {
        num_freqs: usize,
        num_bandpass_steps: usize,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Comm(#[from] CommError),

    #[error(transparent)]
    Pointing(#[from] PointingError),
}
