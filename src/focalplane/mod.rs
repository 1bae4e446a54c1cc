// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Detectors and their offsets from the boresight.


use std::collections::BTreeMap;

use nalgebra::Vector3;
use thiserror::Error;

use crate::math::{
    quat::{from_vectors, from_xyzw, to_xyzw},
    wrap_tau, Quat,
};

/// A detector's bandpass \[GHz\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bandpass {
    pub center_ghz: f64,
    pub width_ghz: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    pub name: String,
    /// The rotation from the boresight frame to this detector's frame.
    pub quat: Quat,
    pub bandpass: Option<Bandpass>,
}

impl Detector {
    pub fn new(name: impl Into<String>, quat: Quat) -> Detector {
        Detector {
            name: name.into(),
            quat,
            bandpass: None,
        }
    }

    /// A detector with the scalar-last quaternion `xyzw`, which is
    /// normalised.
    pub fn from_xyzw(
        name: impl Into<String>,
        xyzw: [f64; 4],
    ) -> Result<Detector, FocalplaneError> {
        let name = name.into();
        match from_xyzw(xyzw) {
            Some(quat) => Ok(Detector::new(name, quat)),
            None => Err(FocalplaneError::InvalidQuat { name, quat: xyzw }),
        }
    }

    pub fn with_bandpass(mut self, center_ghz: f64, width_ghz: f64) -> Detector {
        self.bandpass = Some(Bandpass {
            center_ghz,
            width_ghz,
        });
        self
    }

    /// A detector looking along `dir` in the boresight frame, with no extra
    /// rotation about its line of sight.
    pub fn from_direction(name: impl Into<String>, dir: Vector3<f64>) -> Detector {
        Detector::new(name, from_vectors(&Vector3::z(), &dir))
    }

    /// The angle between the boresight and this detector's line of sight.
    pub fn offset_angle(&self) -> f64 {
        (self.quat * Vector3::z()).angle(&Vector3::z())
    }

    /// The rotation of this detector about its own line of sight, relative to
    /// the shortest rotation from the boresight, in [0, 2π).
    pub fn pol_angle(&self) -> f64 {
        let to_dir = from_vectors(&Vector3::z(), &(self.quat * Vector3::z()));
        let x = (to_dir.inverse() * self.quat) * Vector3::x();
        wrap_tau(x.y.atan2(x.x))
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum FocalplaneError {
    #[error("Detector '{0}' is listed more than once")]
    Duplicate(String),

    #[error("Detector '{name}' has an invalid quaternion {quat:?}")]
    InvalidQuat { name: String, quat: [f64; 4] },

    #[error("Detector '{name}' has an invalid bandpass (center {center_ghz} GHz, width {width_ghz} GHz)")]
    InvalidBandpass {
        name: String,
        center_ghz: f64,
        width_ghz: f64,
    },
}

/// A set of detectors, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Focalplane {
    detectors: BTreeMap<String, Detector>,
}

impl Focalplane {
    /// Check the detectors' quaternions and bandpasses.
    pub fn new(detectors: Vec<Detector>) -> Result<Focalplane, FocalplaneError> {
        let mut map = BTreeMap::new();
        for det in detectors {
            let quat = to_xyzw(&det.quat);
            if !quat.iter().all(|c| c.is_finite()) {
                return Err(FocalplaneError::InvalidQuat {
                    name: det.name,
                    quat,
                });
            }

            if let Some(bp) = det.bandpass {
                if !(bp.center_ghz > 0.0 && bp.width_ghz > 0.0 && bp.width_ghz < 2.0 * bp.center_ghz)
                {
                    return Err(FocalplaneError::InvalidBandpass {
                        name: det.name,
                        center_ghz: bp.center_ghz,
                        width_ghz: bp.width_ghz,
                    });
                }
            }

            if map.contains_key(&det.name) {
                return Err(FocalplaneError::Duplicate(det.name));
            }
            map.insert(det.name.clone(), det);
        }
        Ok(Focalplane { detectors: map })
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Detector> {
        self.detectors.get(name)
    }

    /// Detector names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.detectors.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.values()
    }

    /// The largest detector offset from the boresight, padded by 0.1% so that
    /// the outermost detector is strictly inside \[radians\].
    pub fn radius(&self) -> f64 {
        self.iter()
            .map(Detector::offset_angle)
            .fold(0.0, f64::max)
            * 1.001
    }
}
