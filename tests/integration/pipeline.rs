// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Whole runs with a worker group.

use approx::assert_relative_eq;

use ground_tod::{
    atmosphere::{AirmassEmission, AnalyticAbsorption},
    comm::{SerialComm, WorkerGroup},
    pipeline::{run_pipeline, Collaborators},
    ErrorKind,
};

use crate::run_params;

fn collaborators() -> Collaborators<'static> {
    Collaborators {
        turbulence: Some(&AirmassEmission),
        absorption: Some(&AnalyticAbsorption),
    }
}

#[test]
fn test_pipeline_serial() {
    let params = run_params();
    let summary = run_pipeline(&SerialComm, &params, collaborators(), true).unwrap();
    assert_eq!(summary.range.count, 2000);
    assert!(summary.num_intervals > 0);
    assert!(summary.num_stable_samples < 2000);
    assert_eq!(summary.factors.len(), 2);
    assert!(summary.factors.values().all(|&f| f > 0.0));
    // det01 has its own, lower band.
    assert!(summary.factors["det01"] != summary.factors["det00"]);
    assert!(summary.noise_scale.unwrap() > 0.0);
    assert_eq!(summary.boresight.unwrap().dim(), (2000, 4));
}

#[test]
fn test_pipeline_workers_agree() {
    let params = run_params();
    let serial = run_pipeline(&SerialComm, &params, collaborators(), true).unwrap();
    let serial_boresight = serial.boresight.unwrap();

    let summaries = WorkerGroup::new(4)
        .unwrap()
        .run(|comm| run_pipeline(comm, &params, collaborators(), true))
        .unwrap();
    let mut next = 0;
    for summary in summaries {
        assert_eq!(summary.range.offset, next);
        next = summary.range.end();
        assert_eq!(summary.num_intervals, serial.num_intervals);
        for (det, factor) in &summary.factors {
            assert_relative_eq!(*factor, serial.factors[det], max_relative = 1e-12);
        }
        assert_relative_eq!(
            summary.boresight.unwrap(),
            serial_boresight,
            max_relative = 1e-7,
            epsilon = 1e-12
        );
    }
    assert_eq!(next, 2000);
}

#[test]
fn test_missing_absorption_model() {
    let params = run_params();
    let collaborators = Collaborators {
        turbulence: Some(&AirmassEmission),
        absorption: None,
    };
    let err = WorkerGroup::new(2)
        .unwrap()
        .run(|comm| run_pipeline(comm, &params, collaborators, false))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingDependency);
}

#[test]
fn test_missing_signal_without_turbulence() {
    let params = run_params();
    let collaborators = Collaborators {
        turbulence: None,
        absorption: Some(&AnalyticAbsorption),
    };
    let err = run_pipeline(&SerialComm, &params, collaborators, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CacheAccess);
}
