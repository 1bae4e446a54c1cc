// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use approx::assert_abs_diff_eq;
use indoc::indoc;

use super::*;
use crate::{hwp::HwpError, scan::ScanError};

const BASIC: &str = indoc! {r#"
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
    coord = "G"

    [atmosphere]
    freq_ghz = 43.0
    realization = 2
    weather = { air_temperature = 270.0, surface_pressure = 55000.0, pwv = 1.0 }

    [[detectors]]
    name = "det00"
    quat = [0.0, 0.0, 0.0, 1.0]

    [[detectors]]
    name = "det01"
    quat = [0.0, 0.01, 0.0, 1.0]
    bandcenter_ghz = 40.0
    bandwidth_ghz = 8.0
"#};

fn with_hwp(hwp: &str) -> String {
    format!("{BASIC}\n[hwp]\n{hwp}\n")
}

#[test]
fn test_parse_basic() {
    let params = RunConfig::from_toml_str(BASIC).unwrap().parse().unwrap();

    assert_eq!(params.site.name, "atacama");
    assert_eq!(params.site.id, crate::observation::name_to_id("atacama"));
    assert_abs_diff_eq!(
        params.site.position.latitude_rad,
        (-22.958_f64).to_radians()
    );

    assert_abs_diff_eq!(params.spec.el(), 70_f64.to_radians());
    assert_abs_diff_eq!(params.spec.params().scanrate, 1_f64.to_radians());
    assert_eq!(params.spec.num_samples(), 2000);
    assert_eq!(params.spec.coord(), CoordSystem::Galactic);
    assert!(params.hwp.is_none());

    assert_eq!(params.focalplane.len(), 2);
    let det01 = params.focalplane.get("det01").unwrap();
    assert_eq!(det01.bandpass.unwrap().center_ghz, 40.0);
    // Quaternions are normalised.
    assert_abs_diff_eq!(det01.quat.norm(), 1.0, epsilon = 1e-12);

    let atm = params.atmosphere.unwrap();
    assert_eq!(atm.prefix, "atm");
    assert_eq!(atm.realization, 2);
    assert_eq!(atm.weather.pwv, 1.0);
}

#[test]
fn test_hwp_sections() {
    let params = RunConfig::from_toml_str(&with_hwp("rpm = 60.0"))
        .unwrap()
        .parse()
        .unwrap();
    assert!(matches!(params.hwp, Some(HwpConfig::Continuous { .. })));

    let params = RunConfig::from_toml_str(&with_hwp("step_deg = 22.5\nstep_time_s = 600.0"))
        .unwrap()
        .parse()
        .unwrap();
    assert!(matches!(params.hwp, Some(HwpConfig::Stepped { .. })));

    // Both a spin rate and a step time.
    let result = RunConfig::from_toml_str(&with_hwp("rpm = 2.0\nstep_time_s = 60.0"))
        .unwrap()
        .parse();
    assert!(matches!(
        result,
        Err(ConfigError::Hwp(HwpError::Ambiguous { .. }))
    ));

    // An empty section means no half-wave plate.
    let params = RunConfig::from_toml_str(&with_hwp(""))
        .unwrap()
        .parse()
        .unwrap();
    assert!(params.hwp.is_none());
}

#[test]
fn test_invalid_scan() {
    let toml = BASIC.replace("el_deg = 70.0", "el_deg = 0.5");
    assert!(matches!(
        RunConfig::from_toml_str(&toml).unwrap().parse(),
        Err(ConfigError::Scan(ScanError::ElevationOutOfRange { .. }))
    ));

    let toml = BASIC.replace("coord = \"G\"", "coord = \"X\"");
    assert!(matches!(
        RunConfig::from_toml_str(&toml).unwrap().parse(),
        Err(ConfigError::Scan(ScanError::UnknownCoordSystem(_)))
    ));
}

#[test]
fn test_invalid_site_and_detectors() {
    let toml = BASIC.replace("latitude_deg = -22.958", "latitude_deg = -122.958");
    assert!(matches!(
        RunConfig::from_toml_str(&toml).unwrap().parse(),
        Err(ConfigError::InvalidLatitude(_))
    ));

    let toml = BASIC.replace("bandwidth_ghz = 8.0\n", "");
    assert!(matches!(
        RunConfig::from_toml_str(&toml).unwrap().parse(),
        Err(ConfigError::IncompleteBandpass(name)) if name == "det01"
    ));

    let toml = BASIC.replace("name = \"det01\"", "name = \"det00\"");
    assert!(matches!(
        RunConfig::from_toml_str(&toml).unwrap().parse(),
        Err(ConfigError::Focalplane(_))
    ));

    let end = BASIC.find("[[detectors]]").unwrap();
    assert!(matches!(
        RunConfig::from_toml_str(&BASIC[..end]).unwrap().parse(),
        Err(ConfigError::NoDetectors)
    ));
}

#[test]
fn test_unknown_fields_are_rejected() {
    let toml = BASIC.replace("rate = 20.0", "rate = 20.0\nspeed = 3.0");
    assert!(matches!(
        RunConfig::from_toml_str(&toml),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
fn test_read_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(BASIC.as_bytes()).unwrap();
    file.flush().unwrap();
    let config = RunConfig::read(file.path()).unwrap();
    assert_eq!(config, RunConfig::from_toml_str(BASIC).unwrap());

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        RunConfig::read(&dir.path().join("missing.toml")),
        Err(ConfigError::Io { .. })
    ));
}
