//! Compute devices for the accelerator strategy.
//!
//! A device exposes the small lifecycle the accelerator solver needs:
//! allocate buffers, compile the relaxation kernel, dispatch it once per
//! step and read the values back.
//!
//! ```text
//! enumerate_devices()
//!     [0 .. n)  Gpu   wgpu adapters (feature "wgpu")
//!     n         Host  in-process simulation, always present
//! ```

mod host;

#[cfg(feature = "wgpu")]
mod wgpu_device;

pub use host::{HostBuffer, HostDevice, HostKernel};

#[cfg(feature = "wgpu")]
pub use wgpu_device::{WgpuBuffer, WgpuDevice, WgpuKernel};

use std::fmt;

use tracing::debug;

use crate::{ComputeError, ComputeResult};

/// How the kernel accesses a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    ReadOnly,
    ReadWrite,
}

/// Kind of a compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Simulated on the host CPU.
    Host,
    /// Hardware adapter.
    Gpu,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Host => "host",
            Self::Gpu => "gpu",
        })
    }
}

/// Description of an enumerated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Position in [`enumerate_devices`].
    pub index: usize,
    /// Human-readable name.
    pub name: String,
    pub kind: DeviceKind,
}

/// Arguments of one relaxation kernel launch.
#[derive(Debug)]
pub struct KernelArgs<'a, B> {
    pub gx: &'a B,
    pub gy: &'a B,
    /// Values, updated in place.
    pub val: &'a B,
    pub width: u32,
    pub height: u32,
    /// Step number; `step % 4` selects the sweep.
    pub step: u32,
}

/// A device able to run the relaxation kernel.
///
/// Lane `i` of a dispatch processes line `i + BORDER` of the sweep selected
/// by `args.step`; the work size is the sweep's line count.
pub trait ComputeDevice: Send + Sync {
    /// Device-side buffer.
    type Buffer;
    /// Compiled kernel.
    type Kernel;

    /// Device description.
    fn info(&self) -> &DeviceInfo;

    /// Copies `data` into a new device buffer.
    fn allocate(&self, data: &[f32], access: BufferAccess) -> ComputeResult<Self::Buffer>;

    /// Compiles `source` and resolves `entry`.
    fn compile(&self, source: &str, entry: &str) -> ComputeResult<Self::Kernel>;

    /// Runs `work_size` lanes of `kernel` and waits for completion.
    fn dispatch(
        &self,
        kernel: &Self::Kernel,
        args: &KernelArgs<'_, Self::Buffer>,
        work_size: u32,
    ) -> ComputeResult<()>;

    /// Copies a buffer back to host memory.
    fn readback(&self, buffer: &Self::Buffer) -> ComputeResult<Vec<f32>>;
}

/// An opened device of any supported backend.
#[derive(Debug)]
pub enum AnyDevice {
    Host(HostDevice),
    #[cfg(feature = "wgpu")]
    Wgpu(WgpuDevice),
}

impl AnyDevice {
    pub fn info(&self) -> &DeviceInfo {
        match self {
            Self::Host(d) => d.info(),
            #[cfg(feature = "wgpu")]
            Self::Wgpu(d) => d.info(),
        }
    }
}

/// Lists the available devices, hardware adapters first.
pub fn enumerate_devices() -> Vec<DeviceInfo> {
    #[cfg(feature = "wgpu")]
    let mut devices = wgpu_device::adapter_infos();
    #[cfg(not(feature = "wgpu"))]
    let mut devices = Vec::new();

    devices.push(HostDevice::new(devices.len()).info().clone());
    devices
}

/// Opens the device at `index` in [`enumerate_devices`].
///
/// # Errors
///
/// [`ComputeError::DeviceUnavailable`] if there is no such device.
pub fn open_device(index: usize) -> ComputeResult<AnyDevice> {
    #[cfg(feature = "wgpu")]
    let gpus = wgpu_device::adapter_count();
    #[cfg(not(feature = "wgpu"))]
    let gpus = 0usize;

    debug!(index, gpus, "open_device");
    #[cfg(feature = "wgpu")]
    if index < gpus {
        return WgpuDevice::open(index).map(AnyDevice::Wgpu);
    }
    if index == gpus {
        return Ok(AnyDevice::Host(HostDevice::new(index)));
    }
    Err(ComputeError::DeviceUnavailable {
        index,
        available: gpus + 1,
    })
}

/// One line per device, e.g. `[1] host: host-simulated device`.
pub fn describe_devices() -> String {
    let mut desc = String::new();
    for info in enumerate_devices() {
        desc.push_str(&format!("[{}] {}: {}\n", info.index, info.kind, info.name));
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_device_is_last() {
        let devices = enumerate_devices();
        let last = devices.last().unwrap();
        assert_eq!(last.kind, DeviceKind::Host);
        assert_eq!(last.index, devices.len() - 1);
    }

    #[test]
    fn test_open_host_device() {
        let index = enumerate_devices().len() - 1;
        let dev = open_device(index).unwrap();
        assert!(matches!(dev, AnyDevice::Host(_)));
        assert_eq!(dev.info().index, index);
    }

    #[test]
    fn test_open_missing_device() {
        let available = enumerate_devices().len();
        let err = open_device(available + 3).unwrap_err();
        assert!(matches!(err, ComputeError::DeviceUnavailable { index, .. } if index == available + 3));
        assert!(err.is_device_error());
    }

    #[test]
    fn test_describe_devices() {
        assert!(describe_devices().contains("host"));
    }
}
