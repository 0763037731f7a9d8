// edgepipe — Canny edge detection over a toroidal pixel grid.
//
// One set of stage kernels (grayscale → Gaussian smoothing → Sobel
// gradient → non-maximum suppression → double thresholding → single-pass
// hysteresis), three interchangeable ways to run them: a serial loop, a
// rayon thread pool, or Vulkan compute via wgpu.
//
// Every stage reads its neighbors through the same wrap-around rule, so
// border pixels see the opposite edge of the image instead of clamped or
// zero-padded values — identical across all backends.

pub mod buffer;
pub mod config;
pub mod convert;
pub mod error;
pub mod exec;
pub mod gaussian;
pub mod gpu;
pub mod gradient;
pub mod grayscale;
pub mod hysteresis;
pub mod io;
pub mod pipeline;
pub mod threshold;
pub mod thinning;

pub use buffer::{wrap_index, PixelBuffer};
pub use config::EdgeConfig;
pub use error::Error;
pub use exec::{Executor, SerialExecutor, ThreadedExecutor};
pub use pipeline::{detect_edges, run_stages, Backend};
pub use threshold::EdgeClass;
