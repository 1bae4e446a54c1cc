// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use marlu::LatLngHeight;
use nalgebra::Vector3;

use super::*;
use crate::{
    comm::{SerialComm, WorkerGroup},
    focalplane::Detector,
    math::Quat,
    scan::{common_flags::TURNAROUND, CesParams, CoordSystem},
};

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

fn spec() -> CesSpec {
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
    .validate()
    .unwrap()
}

fn focalplane() -> Focalplane {
    Focalplane::new(vec![
        Detector::new("det00", Quat::identity()),
        Detector::from_direction("det01", Vector3::new(0.02, 0.0, 1.0)),
    ])
    .unwrap()
}

fn hwp() -> Option<HwpConfig> {
    HwpConfig::from_parts(Some(2.0), None, None).unwrap()
}

#[test]
fn test_name_to_id() {
    assert_eq!(name_to_id(""), 0);
    assert_eq!(name_to_id("ab"), 97 + 98);
    assert_eq!(name_to_id("\u{FFFF}\u{FFFF}"), 65534);
    assert_eq!(site().id, name_to_id("atacama"));
}

#[test]
fn test_serial_observation() {
    let obs = Observation::simulate(&SerialComm, spec(), site(), focalplane(), hwp()).unwrap();
    assert_eq!(obs.range(), SampleRange { offset: 0, count: 2000 });
    assert_eq!(obs.times().len(), 2000);
    assert_abs_diff_eq!(obs.times()[20], 1_600_000_001.0);
    assert_eq!(obs.common_flags().len(), 2000);
    assert_eq!(obs.az().len(), 2000);
    assert_abs_diff_eq!(obs.el(), 70_f64.to_radians());

    // Interval lengths and turnarounds account for every sample.
    let num_turnaround = obs
        .common_flags()
        .iter()
        .filter(|&&f| f & TURNAROUND != 0)
        .count();
    assert_eq!(obs.intervals().num_samples() + num_turnaround, 2000);
    assert_eq!(obs.local_intervals(), obs.intervals().as_slice());

    for quats in [obs.boresight_azel().unwrap(), obs.boresight_radec().unwrap()] {
        assert_eq!(quats.dim(), (2000, 4));
        for row in quats.outer_iter() {
            let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-6);
        }
    }

    let angles = obs.hwp_angle().unwrap().unwrap();
    assert_eq!(angles.len(), 2000);
}

#[test]
fn test_no_hwp() {
    let obs = Observation::simulate(&SerialComm, spec(), site(), focalplane(), None).unwrap();
    assert_eq!(obs.hwp_angle(), Ok(None));
    assert!(!obs.cache().exists(HWP_ANGLE));
}

#[test]
fn test_free_quats() {
    let mut obs =
        Observation::simulate(&SerialComm, spec(), site(), focalplane(), None).unwrap();
    obs.free_azel_quats().unwrap();
    assert_eq!(
        obs.boresight_azel(),
        Err(CacheError::Destroyed(BORESIGHT_AZEL.to_string()))
    );
    // The sky quaternions are untouched.
    assert!(obs.boresight_radec().is_ok());

    obs.free_radec_quats().unwrap();
    assert!(matches!(
        obs.detector_pointing("det00"),
        Err(ObservationError::Cache(CacheError::Destroyed(_)))
    ));
}

#[test]
fn test_detector_pointing() {
    let obs = Observation::simulate(&SerialComm, spec(), site(), focalplane(), None).unwrap();
    let bore = obs.boresight_radec().unwrap().to_owned();
    let p = obs.detector_pointing("det00").unwrap();
    assert_abs_diff_eq!(p, bore, epsilon = 1e-12);

    let p = obs.detector_pointing("det01").unwrap();
    assert_eq!(p.dim(), (2000, 4));
    assert!(matches!(
        obs.detector_pointing("det99"),
        Err(ObservationError::Pointing(PointingError::UnknownDetector(_)))
    ));
}

#[test]
fn test_simulated_streams() {
    let mut obs =
        Observation::simulate(&SerialComm, spec(), site(), focalplane(), None).unwrap();
    let data = obs.detector_data("det01").unwrap();
    assert_eq!(data.len(), 2000);
    assert!(data.iter().all(|&x| x == 0.0));
    assert!(obs.detector_data("nope").is_err());

    assert!(matches!(
        obs.put_detector_data("det01", data.view()),
        Err(CacheError::ReadOnly(_))
    ));
    let times = obs.times();
    assert!(matches!(
        obs.put_times(times.view()),
        Err(CacheError::ReadOnly(_))
    ));
    let flags = Array1::zeros(2000);
    assert!(matches!(
        obs.put_common_flags(flags.view()),
        Err(CacheError::ReadOnly(_))
    ));
}

#[test]
fn test_signals_and_noise_scale() {
    let mut obs =
        Observation::simulate(&SerialComm, spec(), site(), focalplane(), None).unwrap();
    assert!(matches!(
        obs.signal("atm", "det00"),
        Err(CacheError::Missing(_))
    ));
    obs.cache_mut()
        .create("atm_det00", CacheBuffer::F64(Array1::ones(2000)))
        .unwrap();
    obs.signal_mut("atm", "det00").unwrap()[0] = 5.0;
    assert_eq!(obs.signal("atm", "det00").unwrap()[0], 5.0);

    assert_eq!(obs.noise_scale(0), 1.0);
    obs.set_noise_scale(3, 2.5);
    assert_eq!(obs.noise_scale(3), 2.5);
    assert_eq!(obs.noise_scale(0), 1.0);
}

#[test]
fn test_earth_motion() {
    let obs = Observation::simulate(&SerialComm, spec(), site(), focalplane(), None).unwrap();
    let pos = obs.earth_position();
    let vel = obs.earth_velocity();
    assert_eq!(pos.dim(), (2000, 3));
    for (p, v) in pos.outer_iter().zip(vel.outer_iter()) {
        let r = p.dot(&p).sqrt();
        assert_abs_diff_eq!(r, AU_KM, epsilon = 1e-3);
        // About 29.8 km/s, along the orbit.
        let speed = v.dot(&v).sqrt();
        assert_abs_diff_eq!(speed, 29.8, epsilon = 0.1);
        assert_abs_diff_eq!(p.dot(&v) / (r * speed), 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_workers_own_disjoint_slices() {
    let serial = Observation::simulate(&SerialComm, spec(), site(), focalplane(), hwp()).unwrap();

    let group = WorkerGroup::new(3).unwrap();
    let parts = group
        .run(|comm| {
            let obs = Observation::simulate(comm, spec(), site(), focalplane(), hwp())?;
            Ok::<_, ObservationError>((
                obs.range(),
                obs.times(),
                obs.boresight_radec()?.to_owned(),
                obs.hwp_angle()?.map(|a| a.to_owned()),
            ))
        })
        .unwrap();

    let mut next = 0;
    for (range, times, quats, angles) in parts {
        assert_eq!(range.offset, next);
        next = range.end();
        assert_eq!(times, serial.times().slice(s![range.range()]));
        assert_eq!(
            quats,
            serial.boresight_radec().unwrap().slice(s![range.range(), ..])
        );
        assert_eq!(
            angles.unwrap(),
            serial.hwp_angle().unwrap().unwrap().slice(s![range.range()])
        );
    }
    assert_eq!(next, 2000);
}
