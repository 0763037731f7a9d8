// gpu/mod.rs — Device-parallel backend: wgpu bootstrap + compute pipeline.

pub mod device;
pub mod edge;

pub use device::{AdapterInfo, GpuDevice, GpuError, WorkgroupSize};
pub use edge::GpuEdgePipeline;
