// gpu/device.rs — wgpu device bootstrap for the compute backend.
//
// Responsibilities:
//   - Enumerate Vulkan adapters and select real hardware over software
//     rasterizers.
//   - Hold the device, queue and the validated 2D workgroup size used for
//     every stage dispatch.
//
// ADAPTER SELECTION:
// wgpu's default `request_adapter` power heuristics may grab llvmpipe or
// softpipe on headless boxes and WSL2, where the software renderer shows
// up as a valid Vulkan device. We enumerate explicitly and prefer real
// hardware, falling back to whatever exists only as a last resort (the
// chosen adapter is logged so a software fallback is visible).
//
// WORKGROUP SIZES:
// naga does not accept `override` expressions inside @workgroup_size(), so
// the workgroup dimensions are baked into the shader source via the
// {{WG_X}}/{{WG_Y}} placeholder tokens at pipeline creation time.

use std::fmt;

use thiserror::Error;

/// A workgroup configuration for 2D compute dispatches.
///
/// 8×8 = 64 invocations fits comfortably under every Vulkan
/// implementation's invocation limit while keeping row-major locality for
/// image reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    /// Total invocations per workgroup (x * y).
    pub fn total(&self) -> u32 {
        self.x * self.y
    }
}

impl Default for WorkgroupSize {
    fn default() -> Self {
        WorkgroupSize { x: 8, y: 8 }
    }
}

impl fmt::Display for WorkgroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{} ({} invocations)", self.x, self.y, self.total())
    }
}

/// Cached adapter information for logging and diagnostics.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

/// The GPU context: device, queue, workgroup configuration.
///
/// Expensive to create (Vulkan instance + device initialization); hold one
/// for the lifetime of the run.
///
/// # Field drop order
/// Rust drops struct fields in declaration order. `_instance` is declared
/// last so the `wgpu::Instance` outlives `device` and `queue`; some
/// Vulkan layers crash if the instance dies while device-level objects
/// still reference it.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    pub workgroup_size: WorkgroupSize,
    /// Keeps the `wgpu::Instance` alive until `device` and `queue` are
    /// dropped. Never accessed directly.
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Create a `GpuDevice` on the best available Vulkan adapter.
    ///
    /// # Errors
    /// Returns `Err` if no adapter is found or the device request fails.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> Result<Self, GpuError> {
        // Vulkan only — no DX12, no Metal, no WebGPU. Non-conformant
        // adapters (e.g. dzn on WSL2) are allowed into the enumeration so
        // they can be preferred over llvmpipe.
        let flags = if cfg!(debug_assertions) {
            wgpu::InstanceFlags::VALIDATION
                | wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
        } else {
            wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::VULKAN,
            flags,
            ..Default::default()
        });

        let all_adapters: Vec<wgpu::Adapter> = instance
            .enumerate_adapters(wgpu::Backends::VULKAN)
            .into_iter()
            .collect();

        if all_adapters.is_empty() {
            return Err(GpuError::NoSuitableAdapter);
        }

        for a in &all_adapters {
            let info = a.get_info();
            log::debug!(
                "vulkan adapter: {} ({:?}, {:?})",
                info.name,
                info.backend,
                info.device_type
            );
        }

        // Tier 1: real hardware (or at least not a software rasterizer).
        // Tier 2: take whatever exists — the adapter name is logged so a
        // software fallback is visible.
        let adapter = all_adapters
            .into_iter()
            .find(|a| {
                matches!(
                    a.get_info().device_type,
                    wgpu::DeviceType::DiscreteGpu
                        | wgpu::DeviceType::IntegratedGpu
                        | wgpu::DeviceType::VirtualGpu
                        | wgpu::DeviceType::Other
                )
            })
            .or_else(|| {
                instance
                    .enumerate_adapters(wgpu::Backends::VULKAN)
                    .into_iter()
                    .next()
            })
            .ok_or(GpuError::NoSuitableAdapter)?;

        let raw_info = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw_info.name.clone(),
            device_type: raw_info.device_type,
            backend: raw_info.backend,
        };
        log::info!("selected adapter: {adapter_info}");

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("edgepipe"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(GpuError::DeviceRequest)?;

        Ok(GpuDevice {
            device,
            queue,
            adapter_info,
            workgroup_size: WorkgroupSize::default(),
            _instance: instance,
        })
    }

    /// Override the default workgroup size, validating the invocation
    /// count against the device limits.
    pub fn set_workgroup_size(&mut self, x: u32, y: u32) -> Result<(), GpuError> {
        let total = x * y;
        let max = self.device.limits().max_compute_invocations_per_workgroup;
        if x == 0 || y == 0 || total > max {
            return Err(GpuError::WorkgroupTooLarge { total, max });
        }
        self.workgroup_size = WorkgroupSize { x, y };
        Ok(())
    }

    /// Number of workgroups needed to cover a `width × height` domain.
    /// Ceiling division: the shader guards against out-of-bounds ids.
    pub fn dispatch_size(&self, width: u32, height: u32) -> (u32, u32) {
        let dx = (width + self.workgroup_size.x - 1) / self.workgroup_size.x;
        let dy = (height + self.workgroup_size.y - 1) / self.workgroup_size.y;
        (dx, dy)
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GpuDevice {{ adapter: {}, workgroup: {} }}",
            self.adapter_info, self.workgroup_size
        )
    }
}

/// Errors from GPU initialization and dispatch.
#[derive(Debug, Error)]
pub enum GpuError {
    /// No Vulkan adapter found at all.
    #[error("no Vulkan adapter found (is a Vulkan driver installed?)")]
    NoSuitableAdapter,

    /// The device request was rejected by the driver.
    #[error("device request failed: {0}")]
    DeviceRequest(#[source] wgpu::RequestDeviceError),

    /// Requested workgroup size exceeds the device's invocation limit.
    #[error("workgroup size {total} exceeds device limit of {max} invocations")]
    WorkgroupTooLarge { total: u32, max: u32 },

    /// A buffer readback failed mid-pipeline; no output was produced.
    #[error("buffer readback failed: {0}")]
    Readback(String),
}
