//! Accelerator offload.
//!
//! Gradients are uploaded read-only, values read-write; the kernel is
//! compiled once and dispatched once per step with one lane per line.
//! Values are read back after the last step.

use std::time::Instant;

use tracing::{debug, trace};

use super::{Reconstructor, RunStats};
use crate::device::{BufferAccess, ComputeDevice, KernelArgs};
use crate::shaders::{RECONSTRUCT, RECONSTRUCT_ENTRY};
use crate::solver::Sweep;
use crate::{ComputeResult, GradientField};

/// Steps between two progress events.
const PROGRESS_INTERVAL: usize = 100;

/// Runs the relaxation kernel on a [`ComputeDevice`].
#[derive(Debug)]
pub struct AcceleratorSolver<D: ComputeDevice> {
    device: D,
}

impl<D: ComputeDevice> AcceleratorSolver<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: ComputeDevice> Reconstructor for AcceleratorSolver<D> {
    fn name(&self) -> &str {
        &self.device.info().name
    }

    fn reconstruct(&self, field: &mut GradientField, steps: usize) -> ComputeResult<RunStats> {
        let start = Instant::now();
        let (w, h) = field.dimensions();
        trace!(width = w, height = h, steps, device = %self.name(), "accelerator::reconstruct");

        let gx = self.device.allocate(field.gx(), BufferAccess::ReadOnly)?;
        let gy = self.device.allocate(field.gy(), BufferAccess::ReadOnly)?;
        let val = self.device.allocate(field.values(), BufferAccess::ReadWrite)?;
        let kernel = self.device.compile(RECONSTRUCT, RECONSTRUCT_ENTRY)?;
        let init_time = start.elapsed();

        for step in 0..steps {
            let work_size = Sweep::for_step(step).line_count(w as usize, h as usize) as u32;
            if work_size > 0 {
                let args = KernelArgs {
                    gx: &gx,
                    gy: &gy,
                    val: &val,
                    width: w,
                    height: h,
                    step: (step % 4) as u32,
                };
                self.device.dispatch(&kernel, &args, work_size)?;
            }
            if (step + 1) % PROGRESS_INTERVAL == 0 {
                debug!(step = step + 1, steps, "reconstruction progress");
            }
        }

        let out = self.device.readback(&val)?;
        field.set_values(&out)?;

        let stats = RunStats::new(self.name(), field, steps, init_time, start.elapsed());
        stats.log();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostDevice;
    use crate::strategy::SequentialSolver;
    use did_core::Raster;

    #[test]
    fn test_host_device_matches_sequential() {
        let r = Raster::from_fn(13, 9, |x, y| ((x * x + y) % 7) as f32 * 0.1).unwrap();
        let mut seq = GradientField::from_raster(&r);
        seq.gy_mut()[4 * 13 + 6] -= 0.4;
        let mut acc = seq.clone();

        SequentialSolver::new().reconstruct(&mut seq, 21).unwrap();
        let stats = AcceleratorSolver::new(HostDevice::new(0))
            .reconstruct(&mut acc, 21)
            .unwrap();
        assert_eq!(seq.values(), acc.values());
        assert_eq!(stats.strategy, "host-simulated device");
    }

    #[test]
    fn test_tiny_field_is_unchanged() {
        let r = Raster::from_fn(4, 3, |x, y| (x + y) as f32).unwrap();
        let mut f = GradientField::from_raster(&r);
        f.gx_mut()[0] = 9.0;
        AcceleratorSolver::new(HostDevice::new(0))
            .reconstruct(&mut f, 8)
            .unwrap();
        assert_eq!(f.values(), r.as_slice());
    }
}
