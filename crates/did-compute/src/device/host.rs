//! Host-simulated compute device.
//!
//! Runs the kernel lanes of a dispatch on the rayon pool. Lanes of one
//! dispatch touch disjoint lines, so the value buffer lives in
//! [`SharedCells`] and every lane writes its own line directly.

use rayon::prelude::*;
use tracing::trace;

use super::{BufferAccess, ComputeDevice, DeviceInfo, DeviceKind, KernelArgs};
use crate::solver::{BORDER, SharedCells, Sweep, sweep_line};
use crate::{ComputeError, ComputeResult};

/// Buffer of the host device.
#[derive(Debug)]
pub enum HostBuffer {
    ReadOnly(Vec<f32>),
    ReadWrite(SharedCells),
}

impl HostBuffer {
    pub fn len(&self) -> usize {
        match self {
            Self::ReadOnly(data) => data.len(),
            Self::ReadWrite(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_only(&self, what: &str) -> ComputeResult<&[f32]> {
        match self {
            Self::ReadOnly(data) => Ok(data),
            Self::ReadWrite(_) => Err(ComputeError::OperationFailed(format!(
                "{what} buffer must be read-only"
            ))),
        }
    }

    fn read_write(&self, what: &str) -> ComputeResult<&SharedCells> {
        match self {
            Self::ReadWrite(cells) => Ok(cells),
            Self::ReadOnly(_) => Err(ComputeError::OperationFailed(format!(
                "{what} buffer must be read-write"
            ))),
        }
    }
}

/// Kernel "compiled" for the host device.
#[derive(Debug, Clone)]
pub struct HostKernel {
    entry: String,
}

impl HostKernel {
    pub fn entry(&self) -> &str {
        &self.entry
    }
}

/// In-process device that simulates kernel lanes with rayon.
#[derive(Debug, Clone)]
pub struct HostDevice {
    info: DeviceInfo,
}

impl HostDevice {
    /// Creates the host device listed at `index`.
    pub fn new(index: usize) -> Self {
        Self {
            info: DeviceInfo {
                index,
                name: "host-simulated device".into(),
                kind: DeviceKind::Host,
            },
        }
    }
}

impl ComputeDevice for HostDevice {
    type Buffer = HostBuffer;
    type Kernel = HostKernel;

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn allocate(&self, data: &[f32], access: BufferAccess) -> ComputeResult<HostBuffer> {
        Ok(match access {
            BufferAccess::ReadOnly => HostBuffer::ReadOnly(data.to_vec()),
            BufferAccess::ReadWrite => HostBuffer::ReadWrite(SharedCells::from_slice(data)),
        })
    }

    fn compile(&self, source: &str, entry: &str) -> ComputeResult<HostKernel> {
        if entry.is_empty() || !source.contains(&format!("fn {entry}(")) {
            return Err(ComputeError::ShaderCompilation(format!(
                "entry point '{entry}' not found"
            )));
        }
        Ok(HostKernel { entry: entry.into() })
    }

    fn dispatch(
        &self,
        kernel: &HostKernel,
        args: &KernelArgs<'_, HostBuffer>,
        work_size: u32,
    ) -> ComputeResult<()> {
        let (w, h) = (args.width as usize, args.height as usize);
        let expected = w * h;
        for buf in [args.gx, args.gy, args.val] {
            if buf.len() != expected {
                return Err(ComputeError::BufferSizeMismatch {
                    expected,
                    actual: buf.len(),
                });
            }
        }
        let gx = args.gx.read_only("gx")?;
        let gy = args.gy.read_only("gy")?;
        let val = args.val.read_write("val")?;

        let sweep = Sweep::for_step(args.step as usize);
        let lines = sweep.lines(w, h);
        trace!(entry = kernel.entry(), step = args.step, work_size, "host dispatch");

        (0..work_size as usize).into_par_iter().for_each(|lane| {
            let line = lane + BORDER;
            if lines.contains(&line) {
                let mut cells = val;
                sweep_line(sweep, line, w, h, gx, gy, &mut cells);
            }
        });
        Ok(())
    }

    fn readback(&self, buffer: &HostBuffer) -> ComputeResult<Vec<f32>> {
        Ok(match buffer {
            HostBuffer::ReadOnly(data) => data.clone(),
            HostBuffer::ReadWrite(cells) => cells.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{RECONSTRUCT, RECONSTRUCT_ENTRY};

    #[test]
    fn test_compile_checks_entry_point() {
        let dev = HostDevice::new(0);
        assert!(dev.compile(RECONSTRUCT, RECONSTRUCT_ENTRY).is_ok());
        let err = dev.compile(RECONSTRUCT, "missing").unwrap_err();
        assert!(matches!(err, ComputeError::ShaderCompilation(_)));
    }

    #[test]
    fn test_dispatch_runs_one_sweep() {
        let dev = HostDevice::new(0);
        let (w, h) = (6usize, 5usize);
        let mut val = vec![0.0f32; w * h];
        val[2 * w + 1] = 1.0;
        let gx = dev.allocate(&vec![0.0; w * h], BufferAccess::ReadOnly).unwrap();
        let gy = dev.allocate(&vec![0.0; w * h], BufferAccess::ReadOnly).unwrap();
        let vb = dev.allocate(&val, BufferAccess::ReadWrite).unwrap();
        let kernel = dev.compile(RECONSTRUCT, RECONSTRUCT_ENTRY).unwrap();
        let args = KernelArgs {
            gx: &gx,
            gy: &gy,
            val: &vb,
            width: w as u32,
            height: h as u32,
            step: 0,
        };
        dev.dispatch(&kernel, &args, Sweep::LeftRight.line_count(w, h) as u32).unwrap();
        let out = dev.readback(&vb).unwrap();
        // row 2: x = 2 gets (0 + 1) / 2, x = 3 gets (0 + 0.5) / 2
        assert_eq!(out[2 * w + 2], 0.5);
        assert_eq!(out[2 * w + 3], 0.25);
        assert_eq!(out[2 * w + 1], 1.0);
    }

    #[test]
    fn test_dispatch_rejects_wrong_access() {
        let dev = HostDevice::new(0);
        let buf = dev.allocate(&[0.0; 25], BufferAccess::ReadOnly).unwrap();
        let kernel = dev.compile(RECONSTRUCT, RECONSTRUCT_ENTRY).unwrap();
        let args = KernelArgs {
            gx: &buf,
            gy: &buf,
            val: &buf,
            width: 5,
            height: 5,
            step: 1,
        };
        assert!(dev.dispatch(&kernel, &args, 1).is_err());
    }
}
