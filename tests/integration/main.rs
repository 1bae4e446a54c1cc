// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod cli;
mod end_to_end;
mod pipeline;
mod worker_invariance;

use marlu::LatLngHeight;
use nalgebra::Vector3;

use ground_tod::{
    config::{RunConfig, RunParams},
    focalplane::{Detector, Focalplane},
    CesParams, CoordSystem, Quat, Site,
};

const RUN_FILE: &str = r#"
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

[hwp]
rpm = 30.0

[atmosphere]
freq_ghz = 43.0
weather = { air_temperature = 270.0, surface_pressure = 55000.0, pwv = 1.0 }

[[detectors]]
name = "det00"
quat = [0.0, 0.0, 0.0, 1.0]

[[detectors]]
name = "det01"
quat = [0.0, 0.0087, 0.0, 1.0]
bandcenter_ghz = 40.0
bandwidth_ghz = 8.0
"#;

fn site() -> Site {
    Site::new(
        "atacama",
        LatLngHeight {
            longitude_rad: (-67.786_f64).to_radians(),
            latitude_rad: (-22.958_f64).to_radians(),
            height_metres: 5200.0,
        },
    )
}

/// 45 to 55 degrees azimuth at 70 degrees elevation, 1 deg/s, 3 deg/s^2,
/// 2000 samples at 20 Hz.
fn narrow_ces() -> CesParams {
    CesParams {
        azmin: 45_f64.to_radians(),
        azmax: 55_f64.to_radians(),
        el: 70_f64.to_radians(),
        scanrate: 1_f64.to_radians(),
        scan_accel: 3_f64.to_radians(),
        first_time: 1_600_000_000.0,
        ces_start: None,
        ces_stop: None,
        rate: 20.0,
        num_samples: 2000,
        sinc_modulation: false,
        sun_angle_min: None,
        coord: CoordSystem::Equatorial,
    }
}

fn focalplane() -> Focalplane {
    Focalplane::new(vec![
        Detector::new("det00", Quat::identity()),
        Detector::from_direction("det01", Vector3::new(0.01, 0.01, 1.0)),
    ])
    .unwrap()
}

fn run_params() -> RunParams {
    RunConfig::from_toml_str(RUN_FILE).unwrap().parse().unwrap()
}
