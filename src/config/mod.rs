// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Run files.

A run is described in a toml file. Angles are in degrees and rates in degrees
per second. Everything is checked and converted to radians by
[`RunConfig::parse`], which is the only way to get at the typed parameters.

```toml
[site]
name = "atacama"
longitude_deg = -67.786
latitude_deg = -22.958
altitude_m = 5200.0

[scan]
azmin_deg = 45.0
azmax_deg = 55.0
el_deg = 70.0
scanrate_deg = 1.0
scan_accel_deg = 3.0
first_time = 1600000000.0
rate = 20.0
num_samples = 2000

[[detectors]]
name = "det00"
quat = [0.0, 0.0, 0.0, 1.0]
```
 */

mod error;
#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::path::Path;

use log::debug;
use marlu::LatLngHeight;
use serde::{Deserialize, Serialize};

use crate::{
    atmosphere::WeatherSnapshot,
    focalplane::{Detector, Focalplane},
    hwp::HwpConfig,
    observation::Site,
    scan::{CesParams, CesSpec, CoordSystem},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub site: SiteConfig,
    pub scan: ScanConfig,
    pub hwp: Option<HwpSection>,
    pub atmosphere: Option<AtmosphereSection>,
    #[serde(default)]
    pub detectors: Vec<DetectorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    pub name: String,
    /// Derived from the name if not given.
    pub id: Option<u32>,
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub altitude_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    pub azmin_deg: f64,
    pub azmax_deg: f64,
    pub el_deg: f64,
    pub scanrate_deg: f64,
    pub scan_accel_deg: f64,
    /// UNIX time of the first sample \[s\].
    pub first_time: f64,
    pub ces_start: Option<f64>,
    pub ces_stop: Option<f64>,
    /// \[Hz\]
    pub rate: f64,
    pub num_samples: usize,
    /// "C", "E" or "G". Equatorial if not given.
    pub coord: Option<String>,
    #[serde(default)]
    pub sinc_modulation: bool,
    pub sun_angle_min_deg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HwpSection {
    pub rpm: Option<f64>,
    pub step_deg: Option<f64>,
    pub step_time_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtmosphereSection {
    pub freq_ghz: f64,
    /// The cache prefix of the signal to weight. "atm" if not given.
    pub prefix: Option<String>,
    #[serde(default)]
    pub realization: u64,
    pub weather: WeatherSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    pub name: String,
    /// `[x, y, z, w]`
    pub quat: [f64; 4],
    pub bandcenter_ghz: Option<f64>,
    pub bandwidth_ghz: Option<f64>,
}

/// Atmosphere weighting settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphereParams {
    pub freq_ghz: f64,
    pub prefix: String,
    pub realization: u64,
    pub weather: WeatherSnapshot,
}

/// Everything needed for a run, checked.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub site: Site,
    pub spec: CesSpec,
    pub hwp: Option<HwpConfig>,
    pub focalplane: Focalplane,
    pub atmosphere: Option<AtmosphereParams>,
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<RunConfig, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn read(path: &Path) -> Result<RunConfig, ConfigError> {
        debug!("Reading run file {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        RunConfig::from_toml_str(&contents)
    }

    /// Check everything and convert to typed parameters.
    pub fn parse(self) -> Result<RunParams, ConfigError> {
        let RunConfig {
            site,
            scan,
            hwp,
            atmosphere,
            detectors,
        } = self;

        // The half-wave plate is checked first; nothing else depends on it.
        let hwp = match hwp {
            Some(h) => HwpConfig::from_parts(h.rpm, h.step_deg, h.step_time_s)?,
            None => None,
        };

        if !(-90.0..=90.0).contains(&site.latitude_deg) {
            return Err(ConfigError::InvalidLatitude(site.latitude_deg));
        }
        let position = LatLngHeight {
            longitude_rad: site.longitude_deg.to_radians(),
            latitude_rad: site.latitude_deg.to_radians(),
            height_metres: site.altitude_m,
        };
        let mut site_out = Site::new(site.name, position);
        if let Some(id) = site.id {
            site_out.id = id;
        }

        let coord = match scan.coord.as_deref() {
            Some(c) => CoordSystem::parse(c)?,
            None => CoordSystem::default(),
        };
        let spec = CesParams {
            azmin: scan.azmin_deg.to_radians(),
            azmax: scan.azmax_deg.to_radians(),
            el: scan.el_deg.to_radians(),
            scanrate: scan.scanrate_deg.to_radians(),
            scan_accel: scan.scan_accel_deg.to_radians(),
            first_time: scan.first_time,
            ces_start: scan.ces_start,
            ces_stop: scan.ces_stop,
            rate: scan.rate,
            num_samples: scan.num_samples,
            sinc_modulation: scan.sinc_modulation,
            sun_angle_min: scan.sun_angle_min_deg.map(f64::to_radians),
            coord,
        }
        .validate()?;

        if detectors.is_empty() {
            return Err(ConfigError::NoDetectors);
        }
        let detectors = detectors
            .into_iter()
            .map(|d| {
                let det = Detector::from_xyzw(d.name, d.quat)?;
                match (d.bandcenter_ghz, d.bandwidth_ghz) {
                    (None, None) => Ok(det),
                    (Some(center), Some(width)) => Ok(det.with_bandpass(center, width)),
                    _ => Err(ConfigError::IncompleteBandpass(det.name)),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let focalplane = Focalplane::new(detectors)?;

        let atmosphere = atmosphere.map(|a| AtmosphereParams {
            freq_ghz: a.freq_ghz,
            prefix: a.prefix.unwrap_or_else(|| "atm".to_string()),
            realization: a.realization,
            weather: a.weather,
        });

        Ok(RunParams {
            site: site_out,
            spec,
            hwp,
            focalplane,
            atmosphere,
        })
    }
}
