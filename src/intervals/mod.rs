// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Half-open sample ranges with their corresponding times.


use thiserror::Error;

/// A range of samples `[start, stop)` and the times of the first sample and
/// of the sample just before `stop`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub start: usize,
    /// Exclusive.
    pub stop: usize,
    pub start_time: f64,
    pub stop_time: f64,
}

impl Interval {
    /// The number of samples in this interval.
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    /// Does this interval contain the sample `i`?
    pub fn contains(&self, i: usize) -> bool {
        self.start <= i && i < self.stop
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum IntervalError {
    #[error("Interval {index} is empty (start {start}, stop {stop})")]
    Empty {
        index: usize,
        start: usize,
        stop: usize,
    },

    #[error("Interval {index} (start {start}) overlaps or precedes the previous interval (stop {prev_stop})")]
    NotAscending {
        index: usize,
        start: usize,
        prev_stop: usize,
    },

    #[error("Interval {index} stops at sample {stop}, beyond the {total} samples available")]
    OutOfBounds {
        index: usize,
        stop: usize,
        total: usize,
    },
}

/// An immutable list of non-empty, disjoint and ascending [`Interval`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// Check and wrap the intervals. Every interval must lie within
    /// `total_samples`.
    pub fn new(intervals: Vec<Interval>, total_samples: usize) -> Result<IntervalSet, IntervalError> {
        let mut prev_stop = 0;
        for (index, interval) in intervals.iter().enumerate() {
            if interval.is_empty() {
                return Err(IntervalError::Empty {
                    index,
                    start: interval.start,
                    stop: interval.stop,
                });
            }
            if index > 0 && interval.start < prev_stop {
                return Err(IntervalError::NotAscending {
                    index,
                    start: interval.start,
                    prev_stop,
                });
            }
            if interval.stop > total_samples {
                return Err(IntervalError::OutOfBounds {
                    index,
                    stop: interval.stop,
                    total: total_samples,
                });
            }
            prev_stop = interval.stop;
        }
        Ok(IntervalSet { intervals })
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    /// The total number of samples covered by all intervals.
    pub fn num_samples(&self) -> usize {
        self.intervals.iter().map(Interval::len).sum()
    }

    /// The intervals clipped to the sample range `[offset, offset + count)`,
    /// with indices kept global. Intervals that don't intersect the range are
    /// dropped.
    pub fn clip(&self, offset: usize, count: usize) -> Vec<Interval> {
        let end = offset + count;
        self.intervals
            .iter()
            .filter(|i| i.start < end && i.stop > offset)
            .map(|i| Interval {
                start: i.start.max(offset),
                stop: i.stop.min(end),
                ..*i
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
