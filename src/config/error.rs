// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use crate::{focalplane::FocalplaneError, hwp::HwpError, scan::ScanError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Couldn't read run file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Couldn't decode the toml structure of the run file:\n{0}")]
    Toml(#[from] toml::de::Error),

    #[error("Site latitude must be within [-90, 90] degrees, got {0}")]
    InvalidLatitude(f64),

    #[error("No detectors were given")]
    NoDetectors,

    #[error("Detector '{0}' must have both a band centre and a bandwidth, or neither")]
    IncompleteBandpass(String),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Hwp(#[from] HwpError),

    #[error(transparent)]
    Focalplane(#[from] FocalplaneError),
}
