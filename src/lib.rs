// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Simulation of constant-elevation scans of a ground-based telescope.

A scan is turned into a boresight azimuth and flag stream, split into stable
intervals, and converted to sky quaternions through a coarse control grid.
Detector pointing is derived on demand. Atmospheric signal held in an
observation's cache can be weighted by a frequency-dependent absorption
coefficient. Work is shared between the workers of a [`comm::WorkerGroup`].
 */

pub mod atmosphere;
pub mod cache;
mod cli;
pub mod comm;
pub mod config;
pub mod constants;
pub mod dist;
mod error;
pub mod focalplane;
pub mod hwp;
pub mod intervals;
pub mod math;
pub mod observation;
pub mod pipeline;
pub mod pointing;
pub mod scan;
pub mod time;

// Re-exports.
pub use cli::GroundTod;
pub use error::{ErrorKind, GroundTodError};
pub use math::Quat;
pub use observation::{Observation, Site};
pub use scan::{CesParams, CesSpec, CoordSystem};
