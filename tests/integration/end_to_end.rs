// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end checks of the documented behaviour.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use ground_tod::{
    atmosphere::{AnalyticAbsorption, AtmosphereWeighting, WeatherSnapshot},
    cache::{signal_name, CacheBuffer, CacheError},
    comm::SerialComm,
    config::{ConfigError, RunConfig},
    dist::{partition, partition_all},
    hwp::HwpError,
    observation::Observation,
    scan::{common_flags::*, ScanError},
    ErrorKind, GroundTodError,
};

use crate::{focalplane, narrow_ces, site, RUN_FILE};

#[test]
fn test_narrow_ces_has_stable_intervals() {
    let obs = Observation::simulate(
        &SerialComm,
        narrow_ces().validate().unwrap(),
        site(),
        focalplane(),
        None,
    )
    .unwrap();
    let intervals = obs.intervals();
    assert!(!intervals.is_empty());
    assert!(intervals.iter().all(|i| i.len() >= 10));

    let num_turnaround = obs
        .common_flags()
        .iter()
        .filter(|&&f| f & TURNAROUND != 0)
        .count();
    assert_eq!(intervals.num_samples() + num_turnaround, 2000);

    // No interval contains a turnaround sample.
    for interval in intervals {
        for i in interval.start..interval.stop {
            assert_eq!(obs.common_flags()[i] & TURNAROUND, 0);
        }
    }
}

#[test]
fn test_low_elevation_is_a_configuration_error() {
    let mut params = narrow_ces();
    params.el = 0.5_f64.to_radians();
    let err: GroundTodError = params.validate().unwrap_err().into();
    assert!(matches!(
        err,
        GroundTodError::Scan(ScanError::ElevationOutOfRange { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_weighting_without_bandpass_uses_default_band() {
    let mut obs = Observation::simulate(
        &SerialComm,
        narrow_ces().validate().unwrap(),
        site(),
        focalplane(),
        None,
    )
    .unwrap();
    for det in ["det00", "det01"] {
        obs.cache_mut()
            .create(
                &signal_name("atm", det),
                CacheBuffer::F64(Array1::ones(2000)),
            )
            .unwrap();
    }
    let weather = WeatherSnapshot {
        air_temperature: 273.0,
        surface_pressure: 55000.0,
        pwv: 1.5,
    };
    let weighting = AtmosphereWeighting::new(43.0, "atm", 0, Some(&AnalyticAbsorption)).unwrap();
    let band = weighting.detector_band(obs.focalplane().get("det00").unwrap());
    assert_abs_diff_eq!(band.center_ghz, 43.0);
    assert_abs_diff_eq!(band.width_ghz, 8.6, epsilon = 1e-12);

    let factors = weighting.apply(&SerialComm, &mut obs, &weather).unwrap();
    let factor = factors["det00"];
    assert!(factor > 0.0 && factor.is_finite());
    for &x in obs.signal("atm", "det00").unwrap().iter() {
        assert_abs_diff_eq!(x, factor);
    }
    assert!(obs.noise_scale(0) > 0.0);
}

#[test]
fn test_rpm_with_step_time_is_rejected() {
    let toml = RUN_FILE.replace("rpm = 30.0", "rpm = 30.0\nstep_time_s = 60.0");
    let result = RunConfig::from_toml_str(&toml).unwrap().parse();
    let err = match result {
        Err(e) => GroundTodError::from(e),
        Ok(_) => panic!("an ambiguous half-wave plate was accepted"),
    };
    assert!(matches!(
        err,
        GroundTodError::Config(ConfigError::Hwp(HwpError::Ambiguous { .. }))
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_partition_totality() {
    for total in [1, 2, 7, 100, 12345] {
        for n in 1..=9 {
            let ranges = partition_all(total, n);
            assert_eq!(ranges.iter().map(|r| r.count).sum::<usize>(), total);
            let mut next = 0;
            for (rank, r) in ranges.iter().enumerate() {
                assert_eq!(r.offset, next);
                assert_eq!(*r, partition(total, n, rank));
                next = r.end();
            }
        }
    }
}

#[test]
fn test_flag_exhaustiveness() {
    let mut params = narrow_ces();
    params.num_samples = 6000;
    let obs = Observation::simulate(
        &SerialComm,
        params.validate().unwrap(),
        site(),
        focalplane(),
        None,
    )
    .unwrap();
    for &f in obs.common_flags() {
        let lr = f & LEFTRIGHT_SCAN != 0;
        let rl = f & RIGHTLEFT_SCAN != 0;
        assert!(!(lr && rl));
        if f & TURNAROUND == 0 {
            assert!(lr || rl);
        }
    }
}

#[test]
fn test_quaternion_norms() {
    let obs = Observation::simulate(
        &SerialComm,
        narrow_ces().validate().unwrap(),
        site(),
        focalplane(),
        None,
    )
    .unwrap();
    let mut streams = vec![
        obs.boresight_azel().unwrap().to_owned(),
        obs.boresight_radec().unwrap().to_owned(),
    ];
    streams.push(obs.detector_pointing("det01").unwrap());
    for stream in streams {
        for q in stream.outer_iter() {
            assert_abs_diff_eq!(q.dot(&q).sqrt(), 1.0, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_cache_round_trip() {
    let mut obs = Observation::simulate(
        &SerialComm,
        narrow_ces().validate().unwrap(),
        site(),
        focalplane(),
        None,
    )
    .unwrap();
    let values = Array1::linspace(-1.0, 1.0, 2000);
    obs.cache_mut()
        .create("tot_det00", CacheBuffer::F64(values.clone()))
        .unwrap();
    assert_eq!(obs.signal("tot", "det00").unwrap(), values);

    obs.cache_mut().destroy("tot_det00").unwrap();
    let err: GroundTodError = obs.signal("tot", "det00").unwrap_err().into();
    assert!(matches!(err, GroundTodError::Cache(CacheError::Destroyed(_))));
    assert_eq!(err.kind(), ErrorKind::CacheAccess);
}
