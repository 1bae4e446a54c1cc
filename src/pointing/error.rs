// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::comm::CommError;

#[derive(Error, Debug, PartialEq)]
pub enum PointingError {
    #[error("A control grid needs at least 2 points, but {0} were given")]
    TooFewControlPoints(usize),

    #[error("Got {times} control times but {quats} control quaternions")]
    ControlLengthMismatch { times: usize, quats: usize },

    #[error("Control time {index} ({time}) doesn't come after the previous one ({prev})")]
    NonIncreasingTimes { index: usize, time: f64, prev: f64 },

    #[error("Control quaternion {index} isn't finite or has zero norm")]
    InvalidControlQuat { index: usize },

    #[error("Every control quaternion describes the same orientation; the control grid is degenerate")]
    DegenerateControlGrid,

    #[error("Got {az} azimuths for a scan of {expected} samples")]
    AzimuthLengthMismatch { az: usize, expected: usize },

    #[error("Sample range {start}..{end} is outside of the {available} available samples")]
    SampleRange {
        start: usize,
        end: usize,
        available: usize,
    },

    #[error("Unknown detector '{0}'")]
    UnknownDetector(String),

    #[error("Expected quaternion arrays with 4 columns, got {0}")]
    NotQuaternions(usize),

    #[error(transparent)]
    Comm(#[from] CommError),
}
