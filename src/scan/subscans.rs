// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Split a scan into sweeps and stable (non-turnaround) intervals.

use itertools::Itertools;
use log::debug;
use ndarray::ArrayViewMut1;

use super::{common_flags::TURNAROUND, ScanError};
use crate::{
    constants::MIN_SUBSCAN_LENGTH,
    intervals::{Interval, IntervalSet},
};

/// The first sample of every sweep plus the total number of samples. A new
/// sweep starts one sample after the azimuth stops decreasing and starts
/// increasing.
pub fn sweep_starts(az: &[f64]) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        az.iter()
            .tuple_windows()
            .enumerate()
            .filter(|(_, (a0, a1, a2))| *a1 - *a0 < 0.0 && *a2 - *a1 > 0.0)
            .map(|(i, _)| i + 2),
    );
    starts.push(az.len());
    starts
}

/// Find the stable runs of samples (those without the turnaround flag).
///
/// Runs shorter than [`MIN_SUBSCAN_LENGTH`] are flagged as turnaround, as is
/// anything after the last run. Each interval stops (exclusively) at the
/// first turnaround sample after it, so the lengths of the intervals plus the
/// number of turnaround samples always equals the total number of samples.
///
/// An error is returned if nothing is left that isn't a turnaround.
pub fn stable_intervals(
    mut flags: ArrayViewMut1<u8>,
    first_time: f64,
    rate: f64,
    scanrate: f64,
) -> Result<IntervalSet, ScanError> {
    let n = flags.len();
    let mut intervals = vec![];
    let mut last_stop = 0;

    let mut i = 0;
    while i < n {
        if flags[i] & TURNAROUND != 0 {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && flags[i] & TURNAROUND == 0 {
            i += 1;
        }
        let stop = i;
        last_stop = stop;

        if stop - start < MIN_SUBSCAN_LENGTH {
            flags
                .slice_mut(ndarray::s![start..stop])
                .map_inplace(|f| *f |= TURNAROUND);
            continue;
        }
        intervals.push(Interval {
            start,
            stop,
            start_time: first_time + start as f64 / rate,
            stop_time: first_time + (stop - 1) as f64 / rate,
        });
    }
    flags
        .slice_mut(ndarray::s![last_stop..])
        .map_inplace(|f| *f |= TURNAROUND);

    if flags.iter().all(|f| f & TURNAROUND != 0) {
        return Err(ScanError::AllTurnaround {
            rate,
            scanrate_deg: scanrate.to_degrees(),
        });
    }
    debug!("Found {} stable intervals", intervals.len());

    Ok(IntervalSet::new(intervals, n)?)
}
