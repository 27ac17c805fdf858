//! Fixed worker pool driven by a [`StepBarrier`].
//!
//! Worker `k` of `P` owns the lines `l` of each step with `l % P == k`.
//! Lines of one step are independent, so workers never write the same
//! cell within a step; the barrier separates consecutive steps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::barrier::{Phase, StepBarrier};
use super::{Reconstructor, RunStats};
use crate::solver::{SharedCells, Sweep, sweep_line};
use crate::{ComputeError, ComputeResult, GradientField};

/// Steps between two progress events.
const PROGRESS_INTERVAL: usize = 100;

/// Thread pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Worker count; `0` uses the available parallelism.
    pub workers: usize,
    /// How long the coordinator waits for all workers to finish one step.
    pub ack_timeout: Duration,
    /// Checked before every step.
    pub cancel: CancelToken,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            ack_timeout: Duration::from_secs(30),
            cancel: CancelToken::new(),
        }
    }
}

impl PoolConfig {
    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the per-step acknowledgement timeout.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Observes `token` for cancellation requests.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Worker count with `0` resolved to the machine's parallelism.
    pub fn resolved_workers(&self) -> usize {
        match self.workers {
            0 => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        }
    }
}

/// Cooperative cancellation flag, checked before every step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; running reconstructions stop before their
    /// next step.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Tokens are equal when they share the same flag.
impl PartialEq for CancelToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for CancelToken {}

/// Runs each step on a fixed set of worker threads.
#[derive(Debug, Clone, Default)]
pub struct ThreadPoolSolver {
    config: PoolConfig,
}

impl ThreadPoolSolver {
    pub fn new(config: PoolConfig) -> Self {
        Self { config }
    }

    /// Uses `token` to observe cancellation requests.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.config.cancel = token;
        self
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

/// Data shared by the coordinator and the workers of one run.
struct Shared {
    width: usize,
    height: usize,
    workers: usize,
    gx: Vec<f32>,
    gy: Vec<f32>,
    cells: SharedCells,
    barrier: StepBarrier,
}

/// Reports a panicking worker to the barrier while unwinding.
struct FailGuard<'a> {
    barrier: &'a StepBarrier,
    worker: usize,
}

impl Drop for FailGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.barrier.fail(self.worker);
        }
    }
}

fn worker_loop(shared: &Shared, id: usize) {
    let _guard = FailGuard {
        barrier: &shared.barrier,
        worker: id,
    };
    let (w, h) = (shared.width, shared.height);
    let mut seen = 0;
    while let Phase::Run(step) = shared.barrier.wait_release(&mut seen) {
        let sweep = Sweep::for_step(step);
        let mut cells = &shared.cells;
        for line in sweep.lines(w, h).filter(|l| l % shared.workers == id) {
            sweep_line(sweep, line, w, h, &shared.gx, &shared.gy, &mut cells);
        }
        shared.barrier.ack();
    }
}

impl ThreadPoolSolver {
    fn run_steps(&self, shared: &Shared, steps: usize) -> ComputeResult<()> {
        for step in 0..steps {
            if self.config.cancel.is_cancelled() {
                return Err(ComputeError::Cancelled { step });
            }
            shared.barrier.release(step);
            shared.barrier.wait_acks(self.config.ack_timeout)?;
            if (step + 1) % PROGRESS_INTERVAL == 0 {
                debug!(step = step + 1, steps, "reconstruction progress");
            }
        }
        Ok(())
    }
}

impl Reconstructor for ThreadPoolSolver {
    fn name(&self) -> &str {
        "multi-cpu"
    }

    fn reconstruct(&self, field: &mut GradientField, steps: usize) -> ComputeResult<RunStats> {
        let start = Instant::now();
        let workers = self.config.resolved_workers().max(1);
        let (w, h) = (field.width() as usize, field.height() as usize);
        trace!(width = w, height = h, steps, workers, "pool::reconstruct");

        let shared = Arc::new(Shared {
            width: w,
            height: h,
            workers,
            gx: field.gx().to_vec(),
            gy: field.gy().to_vec(),
            cells: SharedCells::from_slice(field.values()),
            barrier: StepBarrier::new(workers),
        });

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);
        for id in 0..workers {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("did-relax-{id}"))
                .spawn(move || worker_loop(&worker_shared, id));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    shared.barrier.shutdown();
                    join_finished(handles);
                    return Err(ComputeError::OperationFailed(format!(
                        "failed to spawn worker {id}: {e}"
                    )));
                }
            }
        }
        let init_time = start.elapsed();

        let outcome = self.run_steps(&shared, steps);
        shared.barrier.shutdown();

        if let Err(e) = outcome {
            warn!(error = %e, "reconstruction aborted");
            // A stuck worker is left detached; it only holds its own Arc.
            join_finished(handles);
            return Err(e);
        }

        for (id, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                return Err(ComputeError::WorkerFailed { worker: id });
            }
        }

        shared.cells.copy_to(field.values_mut());
        let stats = RunStats::new(self.name(), field, steps, init_time, start.elapsed());
        stats.log();
        Ok(stats)
    }
}

fn join_finished(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if handle.is_finished() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{SequentialSolver, Strategy, reconstruct};
    use did_core::Raster;

    fn edited_field(w: u32, h: u32) -> GradientField {
        let r = Raster::from_fn(w, h, |x, y| ((x * 3 + y * 5) % 13) as f32 / 13.0).unwrap();
        let mut f = GradientField::from_raster(&r);
        for (i, g) in f.gx_mut().iter_mut().enumerate() {
            if i % 7 == 0 {
                *g += 0.2;
            }
        }
        f
    }

    #[test]
    fn test_matches_sequential() {
        for workers in [1, 2, 3, 8] {
            let mut seq = edited_field(17, 11);
            let mut par = seq.clone();
            SequentialSolver::new().reconstruct(&mut seq, 37).unwrap();
            let config = PoolConfig::default().with_workers(workers);
            ThreadPoolSolver::new(config).reconstruct(&mut par, 37).unwrap();
            assert_eq!(seq.values(), par.values(), "workers = {workers}");
        }
    }

    #[test]
    fn test_more_workers_than_lines() {
        let mut seq = edited_field(6, 6);
        let mut par = seq.clone();
        SequentialSolver::new().reconstruct(&mut seq, 8).unwrap();
        ThreadPoolSolver::new(PoolConfig::default().with_workers(16))
            .reconstruct(&mut par, 8)
            .unwrap();
        assert_eq!(seq.values(), par.values());
    }

    #[test]
    fn test_cancelled_leaves_field_untouched() {
        let mut f = edited_field(12, 12);
        let before = f.clone();
        let token = CancelToken::new();
        token.cancel();
        let solver = ThreadPoolSolver::new(PoolConfig::default().with_workers(2)).with_cancel(token);
        let err = solver.reconstruct(&mut f, 10).unwrap_err();
        assert!(matches!(err, ComputeError::Cancelled { step: 0 }));
        assert_eq!(f, before);
    }

    #[test]
    fn test_cancel_through_strategy() {
        let mut f = edited_field(12, 12);
        let before = f.clone();
        let token = CancelToken::new();
        let strategy = Strategy::ThreadPool(PoolConfig::default().with_workers(3).with_cancel(token.clone()));
        token.cancel();
        let err = reconstruct(&mut f, 10, &strategy).unwrap_err();
        assert!(matches!(err, ComputeError::Cancelled { step: 0 }));
        assert_eq!(f, before);
    }

    #[test]
    fn test_config_tokens_compare_by_identity() {
        let token = CancelToken::new();
        let a = PoolConfig::default().with_cancel(token.clone());
        assert_eq!(a, a.clone());
        assert_eq!(a, PoolConfig::default().with_cancel(token));
        assert_ne!(a, PoolConfig::default());
    }

    #[test]
    fn test_stats_name() {
        let mut f = edited_field(8, 8);
        let stats = ThreadPoolSolver::new(PoolConfig::default().with_workers(2))
            .reconstruct(&mut f, 4)
            .unwrap();
        assert_eq!(stats.strategy, "multi-cpu");
        assert_eq!(stats.ops, 32);
        assert!(stats.init_time <= stats.compute_time);
    }

    #[test]
    fn test_resolved_workers() {
        assert_eq!(PoolConfig::default().with_workers(3).resolved_workers(), 3);
        assert!(PoolConfig::default().resolved_workers() >= 1);
    }
}
