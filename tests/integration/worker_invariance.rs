// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The gathered results of N workers match those of one worker.

use approx::assert_relative_eq;
use ndarray::prelude::*;

use ground_tod::{
    comm::{Communicator, SerialComm, WorkerGroup},
    dist::partition,
    pointing::{gather_quats, BoresightPointingTranslator},
    scan::simulate_scan,
    CoordSystem,
};

use crate::{narrow_ces, site};

fn boresight_with_workers(num_workers: usize, coord: CoordSystem) -> Vec<Array2<f64>> {
    let mut params = narrow_ces();
    params.coord = coord;
    params.num_samples = 3001;
    let spec = params.validate().unwrap();
    let site = site();

    WorkerGroup::new(num_workers)
        .unwrap()
        .run(|comm| {
            // Every worker simulates the whole trajectory.
            let traj = simulate_scan(&spec, &site.position).unwrap();
            let translator = BoresightPointingTranslator::new(&spec, &site.position)?;
            let range = partition(spec.num_samples(), comm.size(), comm.rank());
            let local = translator.translate(traj.az.view(), range)?;
            assert_eq!(local.sky.nrows(), range.count);
            gather_quats(comm, local.sky.view())
        })
        .unwrap()
}

#[test]
fn test_boresight_is_worker_count_invariant() {
    for coord in [CoordSystem::Equatorial, CoordSystem::Galactic] {
        let serial = boresight_with_workers(1, coord).remove(0);
        assert_eq!(serial.dim(), (3001, 4));

        for n in [2, 3, 5, 8] {
            let gathered = boresight_with_workers(n, coord);
            assert_eq!(gathered.len(), n);
            for quats in gathered {
                assert_relative_eq!(quats, serial, max_relative = 1e-7, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn test_serial_comm_matches_one_worker_group() {
    let spec = narrow_ces().validate().unwrap();
    let site = site();
    let traj = simulate_scan(&spec, &site.position).unwrap();
    let translator = BoresightPointingTranslator::new(&spec, &site.position).unwrap();
    let local = translator
        .translate(traj.az.view(), partition(2000, 1, 0))
        .unwrap();
    let serial = gather_quats(&SerialComm, local.sky.view()).unwrap();
    assert_eq!(serial, local.sky);
}

#[test]
fn test_trajectory_is_deterministic() {
    let spec = narrow_ces().validate().unwrap();
    let site = site();
    let first = simulate_scan(&spec, &site.position).unwrap();
    for _ in 0..3 {
        let again = simulate_scan(&spec, &site.position).unwrap();
        assert_eq!(again.az, first.az);
        assert_eq!(again.flags, first.flags);
        assert_eq!(again.subscan_sizes, first.subscan_sizes);
    }
}
