// pipeline.rs — Stage sequencing and backend selection.
//
// The orchestrator owns exactly one live buffer at a time: each stage
// takes its input by value and returns a fresh output, so the previous
// buffer is dropped at the call boundary and no stage ever observes a
// partially written input. The stage order is fixed:
//
//   grayscale → gaussian_blur → sobel_gradient → thin_edges
//             → double_threshold → hysteresis
//
// The CPU paths are infallible; only the GPU backend can fail (device
// setup or dispatch), which aborts the run with no partial output.

use crate::buffer::PixelBuffer;
use crate::config::EdgeConfig;
use crate::error::Error;
use crate::exec::{Executor, SerialExecutor, ThreadedExecutor};
use crate::gaussian::{gaussian_blur, GaussianKernel};
use crate::gradient::sobel_gradient;
use crate::grayscale::grayscale;
use crate::hysteresis::hysteresis;
use crate::threshold::double_threshold;
use crate::thinning::thin_edges;

/// Which execution strategy runs the stage kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Single-threaded reference loop.
    Serial,
    /// Row-parallel across the rayon thread pool.
    Threaded,
    /// Compute dispatch on a Vulkan device via wgpu.
    Gpu,
}

/// Run the full stage sequence on a CPU executor.
///
/// Takes ownership of the RGB input and returns the resolved edge-class
/// plane (codes 0.0 / 1.0 after hysteresis).
///
/// # Panics
/// Panics if `input` is not a 3-channel buffer.
pub fn run_stages<E: Executor>(exec: &E, input: PixelBuffer, config: &EdgeConfig) -> PixelBuffer {
    let (w, h) = (input.width(), input.height());
    log::debug!("pipeline start: {w}×{h}");

    let gray = grayscale(exec, input);
    log::debug!("grayscale done");

    let kernel = GaussianKernel::with_sigma(config.gaussian_sigma);
    let smoothed = gaussian_blur(exec, gray, &kernel);
    log::debug!("gaussian_blur done (sigma={})", config.gaussian_sigma);

    let grad = sobel_gradient(exec, smoothed);
    log::debug!("sobel_gradient done");

    let thinned = thin_edges(exec, grad);
    log::debug!("thin_edges done");

    let classified = double_threshold(exec, thinned, config);
    log::debug!("double_threshold done");

    let edges = hysteresis(exec, classified);
    log::debug!("hysteresis done");

    edges
}

/// Run the pipeline on the selected backend.
///
/// The GPU backend initializes a device, compiles the kernels, runs the
/// same stage sequence on storage buffers and reads the result back; any
/// failure along that path is returned as [`Error::Gpu`].
pub fn detect_edges(
    input: PixelBuffer,
    config: &EdgeConfig,
    backend: Backend,
) -> Result<PixelBuffer, Error> {
    match backend {
        Backend::Serial => Ok(run_stages(&SerialExecutor, input, config)),
        Backend::Threaded => Ok(run_stages(&ThreadedExecutor, input, config)),
        Backend::Gpu => {
            let gpu = crate::gpu::GpuDevice::new()?;
            log::info!("gpu backend: {}", gpu.adapter_info);
            let pipeline = crate::gpu::GpuEdgePipeline::new(&gpu);
            Ok(pipeline.run(&gpu, &input, config)?)
        }
    }
}
