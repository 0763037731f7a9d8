// gpu/edge.rs — The device-parallel edge pipeline.
//
// Mirrors the CPU stage sequence on storage buffers:
//
//   rgb ─grayscale_image→ gray ─gaussian_blur→ blur ─sobel_filter→ grad
//       ─edge_thinning→ thin ─reduce_max_partial→ partials (readback)
//       ─double_threshold→ classes ─hysteresis→ edges (readback)
//
// Stage barriers come for free: all dispatches are encoded on one queue,
// and wgpu inserts the storage-buffer hazards between passes, so no pass
// reads a partially written buffer.
//
// The global max is a two-step reduction: workgroups tree-reduce 256
// elements each into a partial-max array, the CPU finishes the (tiny)
// partial array and uploads the derived threshold pair as a uniform. The
// max is associative and commutative, so the split does not change the
// result.
//
// PIPELINE LIFETIME: `GpuEdgePipeline` is expensive to create (shader
// compilation); create it once and reuse it across runs. Per-run buffers
// are cheap.

use wgpu::util::DeviceExt;

use crate::buffer::PixelBuffer;
use crate::config::EdgeConfig;
use crate::gaussian::GaussianKernel;
use crate::gpu::device::{GpuDevice, GpuError};
use crate::threshold::ThresholdPair;

/// Elements reduced per workgroup in `reduce_max_partial`. Must match the
/// @workgroup_size of that entry point.
const REDUCE_WORKGROUP: usize = 256;

/// Grid dimensions uniform. Layout matches `GridParams` in edge.wgsl.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GridParams {
    width: u32,
    height: u32,
    _pad: [u32; 2],
}

/// Threshold pair uniform. Layout matches `ThresholdParams` in edge.wgsl.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ThresholdParams {
    low: f32,
    high: f32,
    _pad: [f32; 2],
}

/// Compiled compute pipelines for every stage, plus the bind group
/// layouts they were built against.
pub struct GpuEdgePipeline {
    basic_bgl: wgpu::BindGroupLayout,
    weighted_bgl: wgpu::BindGroupLayout,
    thresh_bgl: wgpu::BindGroupLayout,
    grayscale: wgpu::ComputePipeline,
    gaussian: wgpu::ComputePipeline,
    sobel: wgpu::ComputePipeline,
    thinning: wgpu::ComputePipeline,
    reduce: wgpu::ComputePipeline,
    threshold: wgpu::ComputePipeline,
    hysteresis: wgpu::ComputePipeline,
}

impl GpuEdgePipeline {
    /// Compile `edge.wgsl` and build one compute pipeline per stage.
    ///
    /// Workgroup dimensions are baked into the shader source via the
    /// {{WG_X}}/{{WG_Y}} tokens; the reduce kernel uses its own fixed 1D
    /// workgroup.
    pub fn new(gpu: &GpuDevice) -> Self {
        let shader_template = include_str!("../shaders/edge.wgsl");
        let shader_src = shader_template
            .replace("{{WG_X}}", &gpu.workgroup_size.x.to_string())
            .replace("{{WG_Y}}", &gpu.workgroup_size.y.to_string());

        let shader = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("edge.wgsl"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        // Binding 0: params, 1: input, 2: output — every stage.
        let basic_bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("edge basic BGL"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, false),
            ],
        });
        // + binding 3: Gaussian weight table.
        let weighted_bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("edge weighted BGL"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, false),
                storage_entry(3, true),
            ],
        });
        // + binding 4: derived threshold pair.
        let thresh_bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("edge threshold BGL"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, false),
                uniform_entry(4),
            ],
        });

        let make_pipeline = |bgl: &wgpu::BindGroupLayout, entry: &str| {
            let layout = gpu
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(entry),
                    bind_group_layouts: &[bgl],
                    push_constant_ranges: &[],
                });
            gpu.device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(entry),
                    layout: Some(&layout),
                    module: &shader,
                    entry_point: entry,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    cache: None,
                })
        };

        GpuEdgePipeline {
            grayscale: make_pipeline(&basic_bgl, "grayscale_image"),
            gaussian: make_pipeline(&weighted_bgl, "gaussian_blur"),
            sobel: make_pipeline(&basic_bgl, "sobel_filter"),
            thinning: make_pipeline(&basic_bgl, "edge_thinning"),
            reduce: make_pipeline(&basic_bgl, "reduce_max_partial"),
            threshold: make_pipeline(&thresh_bgl, "double_threshold"),
            hysteresis: make_pipeline(&basic_bgl, "hysteresis"),
            basic_bgl,
            weighted_bgl,
            thresh_bgl,
        }
    }

    /// Run the full pipeline on the device and read the resolved
    /// edge-class plane back.
    ///
    /// # Panics
    /// Panics if `input` is not a 3-channel buffer.
    pub fn run(
        &self,
        gpu: &GpuDevice,
        input: &PixelBuffer,
        config: &EdgeConfig,
    ) -> Result<PixelBuffer, GpuError> {
        assert_eq!(input.channels(), 3, "gpu pipeline expects an RGB input buffer");
        let (w, h) = (input.width(), input.height());
        let n = w * h;

        // --- Per-run buffers ---
        let rgb = storage_init(gpu, "rgb", input.as_slice());
        let gray = storage_empty(gpu, "gray", n, false);
        let blur = storage_empty(gpu, "blur", n, false);
        let grad = storage_empty(gpu, "grad", 2 * n, false);
        let thin = storage_empty(gpu, "thin", n, false);
        let classes = storage_empty(gpu, "classes", n, false);
        let edges = storage_empty(gpu, "edges", n, true);

        let kernel = GaussianKernel::with_sigma(config.gaussian_sigma);
        let weights = storage_init(gpu, "gaussian weights", &kernel.as_flat());

        let grid_params = uniform_init(
            gpu,
            "grid params",
            GridParams { width: w as u32, height: h as u32, _pad: [0; 2] },
        );
        // The reduce pass is 1D: params.width carries the element count.
        let reduce_params = uniform_init(
            gpu,
            "reduce params",
            GridParams { width: n as u32, height: 1, _pad: [0; 2] },
        );

        let partial_count = (n + REDUCE_WORKGROUP - 1) / REDUCE_WORKGROUP;
        let partials = storage_empty(gpu, "max partials", partial_count, true);

        let basic_bg = |label: &str, params: &wgpu::Buffer, src: &wgpu::Buffer, dst: &wgpu::Buffer| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.basic_bgl,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: params.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: src.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: dst.as_entire_binding() },
                ],
            })
        };

        let bg_gray = basic_bg("grayscale", &grid_params, &rgb, &gray);
        let bg_blur = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gaussian"),
            layout: &self.weighted_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: grid_params.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: gray.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: blur.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: weights.as_entire_binding() },
            ],
        });
        let bg_sobel = basic_bg("sobel", &grid_params, &blur, &grad);
        let bg_thin = basic_bg("thinning", &grid_params, &grad, &thin);
        let bg_reduce = basic_bg("reduce", &reduce_params, &thin, &partials);

        // --- First half: everything up to the global-max reduction ---
        let (dx, dy) = gpu.dispatch_size(w as u32, h as u32);
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("edge front") });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("edge stages"),
                timestamp_writes: None,
            });
            for (pipeline, bg) in [
                (&self.grayscale, &bg_gray),
                (&self.gaussian, &bg_blur),
                (&self.sobel, &bg_sobel),
                (&self.thinning, &bg_thin),
            ] {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bg, &[]);
                pass.dispatch_workgroups(dx, dy, 1);
            }
            pass.set_pipeline(&self.reduce);
            pass.set_bind_group(0, &bg_reduce, &[]);
            pass.dispatch_workgroups(partial_count as u32, 1, 1);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));

        // --- CPU finishes the reduction and derives the thresholds ---
        let partial_max = readback_f32(gpu, &partials, partial_count)?;
        let global_max = partial_max.iter().copied().fold(0.0f32, f32::max);
        let pair = ThresholdPair::derive(global_max, config);
        log::debug!(
            "gpu double_threshold: global_max={global_max}, high={}, low={}",
            pair.high,
            pair.low
        );

        let thresh_uniform = uniform_init(
            gpu,
            "thresholds",
            ThresholdParams { low: pair.low, high: pair.high, _pad: [0.0; 2] },
        );
        let bg_thresh = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("threshold"),
            layout: &self.thresh_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: grid_params.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: thin.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: classes.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 4, resource: thresh_uniform.as_entire_binding() },
            ],
        });
        let bg_hyst = basic_bg("hysteresis", &grid_params, &classes, &edges);

        // --- Second half: classification and hysteresis ---
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("edge back") });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("classify"),
                timestamp_writes: None,
            });
            for (pipeline, bg) in [(&self.threshold, &bg_thresh), (&self.hysteresis, &bg_hyst)] {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bg, &[]);
                pass.dispatch_workgroups(dx, dy, 1);
            }
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let resolved = readback_f32(gpu, &edges, n)?;
        Ok(PixelBuffer::from_vec(w, h, 1, resolved))
    }
}

// ---------------------------------------------------------------------------
// Buffer helpers
// ---------------------------------------------------------------------------

fn storage_init(gpu: &GpuDevice, label: &str, data: &[f32]) -> wgpu::Buffer {
    gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::STORAGE,
    })
}

fn storage_empty(gpu: &GpuDevice, label: &str, len: usize, copy_src: bool) -> wgpu::Buffer {
    let usage = if copy_src {
        wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC
    } else {
        wgpu::BufferUsages::STORAGE
    };
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (len * std::mem::size_of::<f32>()) as u64,
        usage,
        mapped_at_creation: false,
    })
}

fn uniform_init<T: bytemuck::Pod>(gpu: &GpuDevice, label: &str, value: T) -> wgpu::Buffer {
    gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(&value),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

/// Copy a storage buffer into a map-readable buffer and block until the
/// contents are on the CPU.
///
/// Synchronous and pipeline-stalling; used once per run for the partial
/// maxima and once for the final edge map.
fn readback_f32(gpu: &GpuDevice, src: &wgpu::Buffer, len: usize) -> Result<Vec<f32>, GpuError> {
    let byte_len = (len * std::mem::size_of::<f32>()) as u64;
    let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: byte_len,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("readback") });
    encoder.copy_buffer_to_buffer(src, 0, &readback, 0, byte_len);
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    gpu.device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|_| GpuError::Readback("map callback never fired".into()))?
        .map_err(|e| GpuError::Readback(e.to_string()))?;

    let mapped = slice.get_mapped_range();
    let out: Vec<f32> = bytemuck::cast_slice(&mapped).to_vec();
    drop(mapped);
    readback.unmap();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
