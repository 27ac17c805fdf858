//! Gradient-domain reconstruction engine.
//!
//! An image channel is represented as a [`GradientField`]: a value raster
//! plus forward-difference gradient rasters along x and y. Degradations
//! are injected by editing the gradients, after which an iterative
//! relaxation pulls the values back toward consistency with the edited
//! gradients.
//!
//! # Architecture
//!
//! ```text
//! reconstruct(field, steps, &Strategy)
//!     └── Reconstructor trait
//!             ├── SequentialSolver       (single thread)
//!             ├── ThreadPoolSolver       (worker pool + StepBarrier)
//!             └── AcceleratorSolver<D>   (ComputeDevice)
//!                     ├── HostDevice     (rayon lanes, in-process)
//!                     └── WgpuDevice     (compute shader, feature "wgpu")
//! ```
//!
//! All strategies run the same sweep kernels from [`solver`], so their
//! results agree up to floating-point reassociation.
//!
//! # Example
//!
//! ```
//! use did_compute::{GradientField, Strategy, reconstruct};
//! use did_core::Raster;
//!
//! let raster = Raster::from_fn(16, 16, |x, y| (x + y) as f32 / 32.0).unwrap();
//! let mut field = GradientField::from_raster(&raster);
//! field.gx_mut()[5 * 16 + 5] += 0.5;
//!
//! let stats = reconstruct(&mut field, 40, &Strategy::Sequential).unwrap();
//! assert_eq!(stats.steps, 40);
//! ```

pub mod device;
pub mod edit;
pub mod field;
mod shaders;
pub mod solver;
pub mod strategy;

pub use device::{
    AnyDevice, BufferAccess, ComputeDevice, DeviceInfo, DeviceKind, HostDevice, KernelArgs,
    describe_devices, enumerate_devices, open_device,
};
#[cfg(feature = "wgpu")]
pub use device::WgpuDevice;
pub use edit::{EDIT_BLACK_LEVEL, PASTE_BLACK_LEVEL};
pub use field::GradientField;
pub use shaders::{RECONSTRUCT, RECONSTRUCT_ENTRY};
pub use solver::{BORDER, Cells, SharedCells, Sweep, relax_backward, relax_forward, sweep_line};
pub use strategy::{
    AcceleratorSolver, CancelToken, PoolConfig, Reconstructor, RunStats, SequentialSolver,
    StepBarrier, Strategy, ThreadPoolSolver, reconstruct,
};

use std::time::Duration;
use thiserror::Error;

/// Reconstruction and device errors.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error(transparent)]
    Core(#[from] did_core::Error),

    #[error("Compute device {index} not available ({available} device(s) found)")]
    DeviceUnavailable { index: usize, available: usize },

    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    #[error("Failed to compile kernel: {0}")]
    ShaderCompilation(String),

    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Step {step}: only {acked} of {expected} workers finished within {waited:?}")]
    WorkerTimeout {
        step: usize,
        acked: usize,
        expected: usize,
        waited: Duration,
    },

    #[error("Reconstruction worker {worker} failed")]
    WorkerFailed { worker: usize },

    #[error("Reconstruction cancelled before step {step}")]
    Cancelled { step: usize },

    #[error("Device operation failed: {0}")]
    OperationFailed(String),
}

impl ComputeError {
    /// Returns `true` if the error comes from the accelerator path only, so
    /// a caller may retry with a host strategy.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable { .. }
                | Self::BackendNotAvailable(_)
                | Self::DeviceCreation(_)
                | Self::ShaderCompilation(_)
                | Self::BufferSizeMismatch { .. }
                | Self::OperationFailed(_)
        )
    }
}

pub type ComputeResult<T> = Result<T, ComputeError>;
