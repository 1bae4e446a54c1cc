// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::{cache::CacheError, comm::CommError, pointing::PointingError, scan::ScanError};

#[derive(Error, Debug, PartialEq)]
pub enum ObservationError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Pointing(#[from] PointingError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Comm(#[from] CommError),
}
