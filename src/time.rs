// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions around time.
//!
//! Sample time stamps are UNIX seconds (UTC) kept as `f64`.

use hifitime::{Duration, Epoch};

use crate::constants::{DAYSEC, UNIX_EPOCH_JD};

/// Convert a UNIX time stamp to an [`Epoch`].
pub fn unix_to_epoch(t: f64) -> Epoch {
    Epoch::from_unix_seconds(t)
}

/// Convert a UNIX time stamp to a Julian date.
pub fn unix_to_jd(t: f64) -> f64 {
    t / DAYSEC + UNIX_EPOCH_JD
}

/// The difference between UT1 and UTC used for sidereal time. Nothing here
/// needs better than second-level precision, so this is zero.
pub(crate) fn dut1() -> Duration {
    Duration::from_seconds(0.0)
}
