// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    #[error("A worker group must have at least one worker")]
    NoWorkers,

    #[error("Worker {rank} gave up waiting: another worker in the group failed")]
    Aborted { rank: usize },

    #[error("Worker {rank} lost its connection to the group")]
    Disconnected { rank: usize },

    #[error("Worker {rank} received a message of an unexpected type from worker {src}; collective calls are out of order")]
    TypeMismatch { rank: usize, src: usize },

    #[error("The root worker ({root}) of a broadcast didn't supply a value")]
    NoBroadcastValue { root: usize },

    #[error("Rank {root} is not a member of a group of {size} workers")]
    InvalidRoot { root: usize, size: usize },
}
