//! Step barrier between the pool coordinator and its workers.
//!
//! ```text
//! coordinator                    worker k (of P)
//!   release(step) ------------->   wait_release() -> Phase::Run(step)
//!                                  ... own lines of step ...
//!   wait_acks(timeout) <--------   ack()
//!   ...
//!   shutdown() ---------------->   wait_release() -> Phase::Shutdown
//! ```
//!
//! Every release bumps a generation counter, and a worker only proceeds
//! once it sees a generation newer than the last one it ran. A worker can
//! therefore never run the same step twice or skip one, and the mutex
//! orders all writes of step `n` before any read of step `n + 1`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::{ComputeError, ComputeResult};

/// What a worker should do after [`StepBarrier::wait_release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Process the given step, then [`StepBarrier::ack`].
    Run(usize),
    /// Exit the worker loop.
    Shutdown,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    step: usize,
    acks: usize,
    shutdown: bool,
    failed: Option<usize>,
}

/// Release/acknowledge barrier for a fixed number of workers.
#[derive(Debug)]
pub struct StepBarrier {
    parties: usize,
    state: Mutex<State>,
    released: Condvar,
    acked: Condvar,
}

impl StepBarrier {
    /// Creates a barrier for `parties` workers.
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(State::default()),
            released: Condvar::new(),
            acked: Condvar::new(),
        }
    }

    /// Number of workers.
    pub fn parties(&self) -> usize {
        self.parties
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // a panicking worker is reported through `fail`, the state stays valid
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens `step` for all workers.
    pub fn release(&self, step: usize) {
        let mut state = self.lock();
        state.generation += 1;
        state.step = step;
        state.acks = 0;
        self.released.notify_all();
    }

    /// Waits until every worker acknowledged the current step.
    ///
    /// # Errors
    ///
    /// [`ComputeError::WorkerFailed`] if a worker reported a failure,
    /// [`ComputeError::WorkerTimeout`] if the acknowledgements did not all
    /// arrive within `timeout`.
    pub fn wait_acks(&self, timeout: Duration) -> ComputeResult<()> {
        let start = Instant::now();
        let mut state = self.lock();
        loop {
            if let Some(worker) = state.failed {
                return Err(ComputeError::WorkerFailed { worker });
            }
            if state.acks >= self.parties {
                return Ok(());
            }
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(ComputeError::WorkerTimeout {
                    step: state.step,
                    acked: state.acks,
                    expected: self.parties,
                    waited,
                });
            }
            state = self
                .acked
                .wait_timeout(state, timeout - waited)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Blocks until a step newer than `seen_generation` is released or the
    /// barrier shuts down.
    pub fn wait_release(&self, seen_generation: &mut u64) -> Phase {
        let mut state = self.lock();
        loop {
            if state.shutdown {
                return Phase::Shutdown;
            }
            if state.generation != *seen_generation {
                *seen_generation = state.generation;
                return Phase::Run(state.step);
            }
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Acknowledges the current step.
    pub fn ack(&self) {
        let mut state = self.lock();
        state.acks += 1;
        if state.acks >= self.parties {
            self.acked.notify_all();
        }
    }

    /// Reports that `worker` cannot continue.
    pub fn fail(&self, worker: usize) {
        let mut state = self.lock();
        state.failed.get_or_insert(worker);
        self.acked.notify_all();
    }

    /// Tells all workers to exit.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.shutdown = true;
        self.released.notify_all();
    }
}
