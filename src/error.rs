// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all ground_tod-related errors. This should be the *only*
//! error enum that callers of the whole pipeline need to handle.

use thiserror::Error;

use crate::{
    atmosphere::AtmosphereError, cache::CacheError, comm::CommError, config::ConfigError,
    focalplane::FocalplaneError, hwp::HwpError, observation::ObservationError,
    pointing::PointingError, scan::ScanError,
};

#[derive(Error, Debug)]
pub enum GroundTodError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Pointing(#[from] PointingError),

    #[error(transparent)]
    Hwp(#[from] HwpError),

    #[error(transparent)]
    Focalplane(#[from] FocalplaneError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Atmosphere(#[from] AtmosphereError),

    #[error(transparent)]
    Observation(#[from] ObservationError),

    #[error(transparent)]
    Comm(#[from] CommError),
}

/// The broad class of a [`GroundTodError`]. None of them are recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or inconsistent input parameters.
    Configuration,

    /// A scan or pointing solution with nothing usable in it.
    DegenerateTrajectory,

    /// An external numerical utility isn't available.
    MissingDependency,

    /// A missing, destroyed or read-only buffer was accessed.
    CacheAccess,

    /// The worker group broke down.
    Communication,
}

impl GroundTodError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GroundTodError::Config(e) => config_kind(e),
            GroundTodError::Scan(e) => scan_kind(e),
            GroundTodError::Pointing(e) => pointing_kind(e),
            GroundTodError::Hwp(_) | GroundTodError::Focalplane(_) => ErrorKind::Configuration,
            GroundTodError::Cache(_) => ErrorKind::CacheAccess,
            GroundTodError::Atmosphere(e) => atmosphere_kind(e),
            GroundTodError::Observation(e) => observation_kind(e),
            GroundTodError::Comm(_) => ErrorKind::Communication,
        }
    }
}

fn config_kind(e: &ConfigError) -> ErrorKind {
    match e {
        ConfigError::Scan(e) => scan_kind(e),
        _ => ErrorKind::Configuration,
    }
}

fn scan_kind(e: &ScanError) -> ErrorKind {
    match e {
        ScanError::AllTurnaround { .. }
        | ScanError::SubscanMismatch { .. }
        | ScanError::Interval(_) => ErrorKind::DegenerateTrajectory,
        _ => ErrorKind::Configuration,
    }
}

fn pointing_kind(e: &PointingError) -> ErrorKind {
    match e {
        PointingError::TooFewControlPoints(_)
        | PointingError::ControlLengthMismatch { .. }
        | PointingError::NonIncreasingTimes { .. }
        | PointingError::InvalidControlQuat { .. }
        | PointingError::DegenerateControlGrid => ErrorKind::DegenerateTrajectory,
        PointingError::Comm(_) => ErrorKind::Communication,
        _ => ErrorKind::Configuration,
    }
}

fn atmosphere_kind(e: &AtmosphereError) -> ErrorKind {
    match e {
        AtmosphereError::MissingDependency => ErrorKind::MissingDependency,
        AtmosphereError::InvalidFrequency(_) | AtmosphereError::InvalidGrid { .. } => {
            ErrorKind::Configuration
        }
        AtmosphereError::Cache(_) => ErrorKind::CacheAccess,
        AtmosphereError::Comm(_) => ErrorKind::Communication,
        AtmosphereError::Pointing(e) => pointing_kind(e),
    }
}

fn observation_kind(e: &ObservationError) -> ErrorKind {
    match e {
        ObservationError::Scan(e) => scan_kind(e),
        ObservationError::Pointing(e) => pointing_kind(e),
        ObservationError::Cache(_) => ErrorKind::CacheAccess,
        ObservationError::Comm(_) => ErrorKind::Communication,
    }
}
