// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
A fixed-size group of data-parallel workers.

Each worker gets a [`Communicator`] that provides the only coordination
primitives needed: a barrier, (all-)gathers and broadcasts. Every worker of a
group must make the same collective calls in the same order.

[`SerialComm`] is a group of one. [`WorkerGroup`] runs N workers on scoped
threads, connected with channels. If any worker fails, the others stop waiting
on collective calls and return [`CommError::Aborted`] rather than hang.
 */

mod error;

pub use error::CommError;

use std::{
    any::Any,
    cell::RefCell,
    collections::VecDeque,
    thread,
    time::Duration,
};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use crossbeam_utils::atomic::AtomicCell;
use log::{debug, trace};
use scopeguard::defer_on_unwind;

/// How long a worker blocks on its mailbox before checking whether the group
/// has been aborted.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub trait Communicator {
    /// This worker's index in the group.
    fn rank(&self) -> usize;

    /// The number of workers in the group.
    fn size(&self) -> usize;

    /// Block until every worker has called this.
    fn barrier(&self) -> Result<(), CommError>;

    /// Every worker's value, in rank order, on every worker.
    fn all_gather<T: Clone + Send + 'static>(&self, local: T) -> Result<Vec<T>, CommError>;

    /// Every worker's value, in rank order, on the `root` worker only; other
    /// workers get `None`.
    fn gather<T: Send + 'static>(&self, local: T, root: usize)
        -> Result<Option<Vec<T>>, CommError>;

    /// The `root` worker's value on every worker. Only the root needs to
    /// supply a value.
    fn broadcast<T: Clone + Send + 'static>(
        &self,
        value: Option<T>,
        root: usize,
    ) -> Result<T, CommError>;

    /// Concatenate every worker's contiguous slice, in rank order, on every
    /// worker.
    fn all_gather_concat<T: Clone + Send + 'static>(
        &self,
        local: Vec<T>,
    ) -> Result<Vec<T>, CommError> {
        Ok(self.all_gather(local)?.into_iter().flatten().collect())
    }

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// The communicator of a group with a single worker.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<(), CommError> {
        Ok(())
    }

    fn all_gather<T: Clone + Send + 'static>(&self, local: T) -> Result<Vec<T>, CommError> {
        Ok(vec![local])
    }

    fn gather<T: Send + 'static>(
        &self,
        local: T,
        root: usize,
    ) -> Result<Option<Vec<T>>, CommError> {
        check_root(root, 1)?;
        Ok(Some(vec![local]))
    }

    fn broadcast<T: Clone + Send + 'static>(
        &self,
        value: Option<T>,
        root: usize,
    ) -> Result<T, CommError> {
        check_root(root, 1)?;
        value.ok_or(CommError::NoBroadcastValue { root })
    }
}

fn check_root(root: usize, size: usize) -> Result<(), CommError> {
    if root >= size {
        Err(CommError::InvalidRoot { root, size })
    } else {
        Ok(())
    }
}

type Message = (usize, Box<dyn Any + Send>);

/// One worker's handle on a [`WorkerGroup`].
pub struct ThreadComm<'a> {
    rank: usize,
    /// One sender per worker, indexed by rank (including this worker).
    senders: Vec<Sender<Message>>,
    receiver: Receiver<Message>,
    /// Messages that arrived before they were asked for, per source rank.
    pending: RefCell<Vec<VecDeque<Box<dyn Any + Send>>>>,
    abort: &'a AtomicCell<bool>,
}

impl ThreadComm<'_> {
    fn send<T: Send + 'static>(&self, dest: usize, value: T) -> Result<(), CommError> {
        self.senders[dest]
            .send((self.rank, Box::new(value)))
            .map_err(|_| CommError::Disconnected { rank: self.rank })
    }

    /// Wait for the next message from `src`. Messages from other workers that
    /// arrive in the meantime are kept in order for later.
    fn recv<T: 'static>(&self, src: usize) -> Result<T, CommError> {
        loop {
            if let Some(msg) = self.pending.borrow_mut()[src].pop_front() {
                return msg.downcast::<T>().map(|b| *b).map_err(|_| {
                    CommError::TypeMismatch {
                        rank: self.rank,
                        src,
                    }
                });
            }
            if self.abort.load() {
                return Err(CommError::Aborted { rank: self.rank });
            }
            match self.receiver.recv_timeout(POLL_INTERVAL) {
                Ok((from, msg)) => self.pending.borrow_mut()[from].push_back(msg),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CommError::Disconnected { rank: self.rank })
                }
            }
        }
    }
}

impl Communicator for ThreadComm<'_> {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.all_gather(()).map(|_| ())
    }

    fn all_gather<T: Clone + Send + 'static>(&self, local: T) -> Result<Vec<T>, CommError> {
        for dest in (0..self.size()).filter(|&d| d != self.rank) {
            self.send(dest, local.clone())?;
        }
        let mut local = Some(local);
        let mut out = Vec::with_capacity(self.size());
        for src in 0..self.size() {
            if src == self.rank {
                if let Some(v) = local.take() {
                    out.push(v);
                }
            } else {
                out.push(self.recv(src)?);
            }
        }
        Ok(out)
    }

    fn gather<T: Send + 'static>(
        &self,
        local: T,
        root: usize,
    ) -> Result<Option<Vec<T>>, CommError> {
        check_root(root, self.size())?;
        if self.rank != root {
            self.send(root, local)?;
            return Ok(None);
        }

        let mut local = Some(local);
        let mut out = Vec::with_capacity(self.size());
        for src in 0..self.size() {
            if src == self.rank {
                if let Some(v) = local.take() {
                    out.push(v);
                }
            } else {
                out.push(self.recv(src)?);
            }
        }
        Ok(Some(out))
    }

    fn broadcast<T: Clone + Send + 'static>(
        &self,
        value: Option<T>,
        root: usize,
    ) -> Result<T, CommError> {
        check_root(root, self.size())?;
        if self.rank != root {
            return self.recv(root);
        }

        let value = value.ok_or(CommError::NoBroadcastValue { root })?;
        for dest in (0..self.size()).filter(|&d| d != root) {
            self.send(dest, value.clone())?;
        }
        Ok(value)
    }
}

/// A fixed number of workers, each running on its own thread.
#[derive(Clone, Copy, Debug)]
pub struct WorkerGroup {
    num_workers: usize,
}

impl WorkerGroup {
    pub fn new(num_workers: usize) -> Result<WorkerGroup, CommError> {
        if num_workers == 0 {
            return Err(CommError::NoWorkers);
        }
        Ok(WorkerGroup { num_workers })
    }

    pub fn size(&self) -> usize {
        self.num_workers
    }

    /// Run `work` on every worker and collect the results in rank order.
    ///
    /// If any worker fails, the error of the first worker to fail is
    /// returned; workers blocked in collective calls at that point give up
    /// with [`CommError::Aborted`]. A panicking worker also aborts the group,
    /// and the panic is resumed on the calling thread.
    pub fn run<F, R, E>(&self, work: F) -> Result<Vec<R>, E>
    where
        F: Fn(&ThreadComm) -> Result<R, E> + Sync,
        R: Send,
        E: Send,
    {
        let n = self.num_workers;
        debug!("Starting a group of {n} workers");

        let (senders, receivers): (Vec<_>, Vec<_>) = (0..n).map(|_| unbounded()).unzip();
        let abort = AtomicCell::new(false);
        // The rank of the first worker to fail; usize::MAX while none has.
        let first_failure = AtomicCell::new(usize::MAX);

        let results: Vec<thread::Result<Result<R, E>>> = thread::scope(|scope| {
            let handles: Vec<_> = receivers
                .into_iter()
                .enumerate()
                .map(|(rank, receiver)| {
                    let comm = ThreadComm {
                        rank,
                        senders: senders.clone(),
                        receiver,
                        pending: RefCell::new((0..n).map(|_| VecDeque::new()).collect()),
                        abort: &abort,
                    };
                    let work = &work;
                    let abort = &abort;
                    let first_failure = &first_failure;
                    thread::Builder::new()
                        .name(format!("worker{rank}"))
                        .spawn_scoped(scope, move || {
                            defer_on_unwind! { abort.store(true); }
                            let result = work(&comm);
                            if result.is_err() {
                                let _ = first_failure.compare_exchange(usize::MAX, rank);
                                abort.store(true);
                            }
                            trace!("Worker {rank} finished");
                            result
                        })
                        .expect("OS can create threads")
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect()
        });

        let failed_rank = first_failure.load();
        let mut out = Vec::with_capacity(n);
        let mut first_error = None;
        for (rank, result) in results.into_iter().enumerate() {
            match result {
                Err(panic) => std::panic::resume_unwind(panic),
                Ok(Ok(r)) => out.push(r),
                Ok(Err(e)) => {
                    if rank == failed_rank || first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }
}
