//! wgpu compute device.
//!
//! Runs the WGSL relaxation kernel on a hardware adapter (Vulkan, Metal,
//! DX12). One compute pass is submitted per step and waited on, which
//! orders step `n` before step `n + 1`.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, trace};
use wgpu::util::DeviceExt;

use super::{BufferAccess, ComputeDevice, DeviceInfo, DeviceKind, KernelArgs};
use crate::{ComputeError, ComputeResult};

/// Lanes per workgroup, must match `@workgroup_size` of the kernel.
const WORKGROUP_SIZE: u32 = 64;

/// Kernel uniform: width, height, step, padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ParamsUniform {
    width: u32,
    height: u32,
    step: u32,
    _pad: u32,
}

fn instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

fn adapters() -> Vec<wgpu::Adapter> {
    instance().enumerate_adapters(wgpu::Backends::all())
}

fn adapter_name(info: &wgpu::AdapterInfo) -> String {
    format!("{} ({:?}, {:?})", info.name, info.backend, info.device_type)
}

pub(super) fn adapter_count() -> usize {
    adapters().len()
}

pub(super) fn adapter_infos() -> Vec<DeviceInfo> {
    adapters()
        .iter()
        .enumerate()
        .map(|(index, adapter)| DeviceInfo {
            index,
            name: adapter_name(&adapter.get_info()),
            kind: DeviceKind::Gpu,
        })
        .collect()
}

/// Storage buffer on a wgpu device.
pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
    len: usize,
    access: BufferAccess,
}

impl WgpuBuffer {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn size_bytes(&self) -> u64 {
        (self.len * std::mem::size_of::<f32>()) as u64
    }
}

/// Compiled relaxation pipeline.
pub struct WgpuKernel {
    pipeline: wgpu::ComputePipeline,
}

/// A hardware adapter opened for compute.
pub struct WgpuDevice {
    info: DeviceInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl fmt::Debug for WgpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgpuDevice").field("info", &self.info).finish()
    }
}

impl WgpuDevice {
    /// Opens adapter `index` of the enumeration.
    pub fn open(index: usize) -> ComputeResult<Self> {
        pollster::block_on(Self::open_async(index))
    }

    /// Opens adapter `index` asynchronously.
    pub async fn open_async(index: usize) -> ComputeResult<Self> {
        let mut all = adapters();
        let available = all.len() + 1;
        if index >= all.len() {
            return Err(ComputeError::DeviceUnavailable { index, available });
        }
        let adapter = all.swap_remove(index);
        let name = adapter_name(&adapter.get_info());
        debug!(index, name = %name, "opening wgpu adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("did_compute_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            info: DeviceInfo {
                index,
                name,
                kind: DeviceKind::Gpu,
            },
            device,
            queue,
        })
    }
}

impl ComputeDevice for WgpuDevice {
    type Buffer = WgpuBuffer;
    type Kernel = WgpuKernel;

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn allocate(&self, data: &[f32], access: BufferAccess) -> ComputeResult<WgpuBuffer> {
        if data.is_empty() {
            return Err(ComputeError::BufferSizeMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(match access {
                    BufferAccess::ReadOnly => "gradient_buffer",
                    BufferAccess::ReadWrite => "value_buffer",
                }),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            });
        Ok(WgpuBuffer {
            buffer,
            len: data.len(),
            access,
        })
    }

    fn compile(&self, source: &str, entry: &str) -> ComputeResult<WgpuKernel> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("reconstruct_shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("reconstruct_pipeline"),
                layout: None,
                module: &module,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                cache: None,
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::ShaderCompilation(err.to_string()));
        }
        Ok(WgpuKernel { pipeline })
    }

    fn dispatch(
        &self,
        kernel: &WgpuKernel,
        args: &KernelArgs<'_, WgpuBuffer>,
        work_size: u32,
    ) -> ComputeResult<()> {
        let expected = args.width as usize * args.height as usize;
        for buf in [args.gx, args.gy, args.val] {
            if buf.len != expected {
                return Err(ComputeError::BufferSizeMismatch {
                    expected,
                    actual: buf.len,
                });
            }
        }
        if args.val.access != BufferAccess::ReadWrite {
            return Err(ComputeError::OperationFailed(
                "val buffer must be read-write".into(),
            ));
        }
        if work_size == 0 {
            return Ok(());
        }
        trace!(step = args.step, work_size, "wgpu dispatch");

        let params = ParamsUniform {
            width: args.width,
            height: args.height,
            step: args.step,
            _pad: 0,
        };
        let params_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("params_uniform"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let layout = kernel.pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("reconstruct_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: args.gx.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: args.gy.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: args.val.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: params_buf.as_entire_binding() },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("reconstruct_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("reconstruct_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(work_size.div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);
        Ok(())
    }

    fn readback(&self, buffer: &WgpuBuffer) -> ComputeResult<Vec<f32>> {
        let size = buffer.size_bytes();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(&buffer.buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("map channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(result)
    }
}
