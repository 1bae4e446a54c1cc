// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Split samples (or anything else that is indexed) across workers.
//!
//! The split is a pure function of its inputs, so every worker can work out
//! every other worker's share without talking to it.


use std::ops::Range;

/// A contiguous block of global sample indices owned by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SampleRange {
    pub offset: usize,
    pub count: usize,
}

impl SampleRange {
    /// One past the last owned index.
    pub fn end(&self) -> usize {
        self.offset + self.count
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// The block of `total` items owned by worker `rank` of `num_workers`. Blocks
/// are `total / num_workers` long; the last worker also takes the remainder.
///
/// `num_workers` must be non-zero and `rank` less than it.
pub fn partition(total: usize, num_workers: usize, rank: usize) -> SampleRange {
    debug_assert!(num_workers > 0);
    debug_assert!(rank < num_workers);

    let base = total / num_workers;
    let offset = rank * base;
    let count = if rank + 1 == num_workers {
        total - offset
    } else {
        base
    };
    SampleRange { offset, count }
}

/// Every worker's block, in rank order.
pub fn partition_all(total: usize, num_workers: usize) -> Vec<SampleRange> {
    (0..num_workers)
        .map(|rank| partition(total, num_workers, rank))
        .collect()
}
