// error.rs — Crate-level error type.
//
// The per-stage numerics are infallible (bounded float arithmetic, no
// out-of-range indexing thanks to wrap-around); only the I/O boundary and
// GPU backend setup/dispatch can fail. This is a one-shot batch pipeline:
// failures propagate to the caller immediately, nothing is retried, and no
// partial output is emitted.

use crate::gpu::GpuError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The input raster could not be read or decoded. The pipeline never
    /// starts.
    #[error("failed to decode input image: {0}")]
    Decode(#[source] image::ImageError),

    /// The output raster could not be written. The computed result is
    /// discarded.
    #[error("failed to encode output image: {0}")]
    Encode(#[source] image::ImageError),

    /// The GPU backend could not be initialized or could not schedule a
    /// stage. The pipeline aborts with no partial output.
    #[error("gpu backend failure: {0}")]
    Gpu(#[from] GpuError),
}
