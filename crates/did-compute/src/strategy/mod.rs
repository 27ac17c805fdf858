//! Execution strategies for the relaxation solver.
//!
//! Three interchangeable drivers run the same sweep kernels:
//!
//! ```text
//! Strategy (tagged variant)
//!     +-- Sequential          -> SequentialSolver
//!     +-- ThreadPool(config)  -> ThreadPoolSolver  (StepBarrier)
//!     +-- Accelerator{device} -> AcceleratorSolver<D: ComputeDevice>
//! ```
//!
//! For equal `(gx, gy, val, steps)` inputs all three produce the same
//! values up to floating-point reassociation.

mod accelerator;
mod barrier;
mod pool;
mod sequential;

pub use accelerator::AcceleratorSolver;
pub use barrier::{Phase, StepBarrier};
pub use pool::{CancelToken, PoolConfig, ThreadPoolSolver};
pub use sequential::SequentialSolver;

use std::time::Duration;

use tracing::info;

use crate::device::{AnyDevice, open_device};
use crate::{ComputeResult, GradientField};

/// Which execution strategy reconstructs a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Single thread, kernel by kernel.
    Sequential,
    /// Fixed worker pool synchronized by a step barrier.
    ThreadPool(PoolConfig),
    /// Offload to the compute device at `device` in [`crate::enumerate_devices`].
    Accelerator {
        /// Device index.
        device: usize,
    },
}

impl Default for Strategy {
    fn default() -> Self {
        Self::ThreadPool(PoolConfig::default())
    }
}

impl Strategy {
    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "single-core",
            Self::ThreadPool(_) => "multi-cpu",
            Self::Accelerator { .. } => "accelerator",
        }
    }
}

/// Timing and size figures of one reconstruction run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    /// Strategy or device name.
    pub strategy: String,
    /// Steps executed.
    pub steps: usize,
    /// Bytes of one value raster.
    pub work_mem: u64,
    /// Bytes touched by one line task (average of a row and a column).
    pub task_mem: u64,
    /// Line operations performed, `steps * width`.
    pub ops: u64,
    /// Set-up time before the first step.
    pub init_time: Duration,
    /// Total wall time including set-up.
    pub compute_time: Duration,
}

impl RunStats {
    pub(crate) fn new(
        strategy: impl Into<String>,
        field: &GradientField,
        steps: usize,
        init_time: Duration,
        compute_time: Duration,
    ) -> Self {
        let (w, h) = (field.width() as u64, field.height() as u64);
        Self {
            strategy: strategy.into(),
            steps,
            work_mem: w * h * 4,
            task_mem: (w + h) / 2 * 4,
            ops: steps as u64 * w,
            init_time,
            compute_time,
        }
    }

    /// Emits the run as an `info` event.
    pub(crate) fn log(&self) {
        info!(
            strategy = %self.strategy,
            steps = self.steps,
            work_mem = self.work_mem,
            task_mem = self.task_mem,
            ops = self.ops,
            init_ms = self.init_time.as_millis() as u64,
            compute_ms = self.compute_time.as_millis() as u64,
            "reconstruction finished"
        );
    }

    /// Semicolon-separated report line:
    /// `result;<strategy>;<work_mem>;<task_mem>;<ops>;<init_ms>;<compute_ms>`.
    pub fn report_line(&self) -> String {
        format!(
            "result;{};{};{};{};{};{}",
            self.strategy,
            self.work_mem,
            self.task_mem,
            self.ops,
            self.init_time.as_millis(),
            self.compute_time.as_millis()
        )
    }
}

/// Reconstructs a gradient field's values in place.
pub trait Reconstructor {
    /// Strategy name.
    fn name(&self) -> &str;

    /// Runs `steps` round-robin sweeps over `field`'s values.
    fn reconstruct(&self, field: &mut GradientField, steps: usize) -> ComputeResult<RunStats>;
}

/// Runs `steps` sweeps on `field` with the selected strategy.
///
/// Returns [`crate::ComputeError::DeviceUnavailable`] for an accelerator
/// index with no device; the field is untouched and a host strategy can be
/// used instead.
pub fn reconstruct(
    field: &mut GradientField,
    steps: usize,
    strategy: &Strategy,
) -> ComputeResult<RunStats> {
    match strategy {
        Strategy::Sequential => SequentialSolver::new().reconstruct(field, steps),
        Strategy::ThreadPool(config) => ThreadPoolSolver::new(config.clone()).reconstruct(field, steps),
        Strategy::Accelerator { device } => match open_device(*device)? {
            AnyDevice::Host(dev) => AcceleratorSolver::new(dev).reconstruct(field, steps),
            #[cfg(feature = "wgpu")]
            AnyDevice::Wgpu(dev) => AcceleratorSolver::new(dev).reconstruct(field, steps),
        },
    }
}
