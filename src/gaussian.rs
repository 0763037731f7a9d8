// gaussian.rs — 5×5 Gaussian smoothing with toroidal borders.
//
// The kernel is a full (non-separated) 5×5 table so that the CPU stages and
// the GPU kernel consume the identical weight values: the table computed
// here is also what gets bound to the `gaussian_blur` compute shader.
// Accumulation order is row-major over the window in every backend.

use crate::buffer::{wrap_index, PixelBuffer};
use crate::exec::Executor;

/// Kernel radius: 5×5 window.
pub const GAUSSIAN_RADIUS: isize = 2;

/// A normalized 5×5 Gaussian smoothing kernel.
///
/// Weights sum to 1 (within float tolerance), so smoothing a uniform image
/// reproduces it exactly up to rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianKernel {
    weights: [[f32; 5]; 5],
}

impl GaussianKernel {
    /// Build the kernel for the given sigma.
    ///
    /// # Panics
    /// Panics if `sigma` is not strictly positive.
    pub fn with_sigma(sigma: f32) -> Self {
        assert!(sigma > 0.0, "sigma must be positive (got {sigma})");
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut weights = [[0.0f32; 5]; 5];
        let mut sum = 0.0f32;
        for (i, row) in weights.iter_mut().enumerate() {
            for (j, w) in row.iter_mut().enumerate() {
                let dy = i as f32 - GAUSSIAN_RADIUS as f32;
                let dx = j as f32 - GAUSSIAN_RADIUS as f32;
                *w = (-(dx * dx + dy * dy) / two_sigma_sq).exp();
                sum += *w;
            }
        }
        for row in weights.iter_mut() {
            for w in row.iter_mut() {
                *w /= sum;
            }
        }
        GaussianKernel { weights }
    }

    /// Weight at window offset `(i, j)`, each in `[-radius, radius]`.
    #[inline]
    pub fn weight(&self, i: isize, j: isize) -> f32 {
        self.weights[(i + GAUSSIAN_RADIUS) as usize][(j + GAUSSIAN_RADIUS) as usize]
    }

    /// The 25 weights, row-major, for upload to the GPU kernel binding.
    pub fn as_flat(&self) -> [f32; 25] {
        let mut flat = [0.0f32; 25];
        for i in 0..5 {
            flat[i * 5..i * 5 + 5].copy_from_slice(&self.weights[i]);
        }
        flat
    }
}

impl Default for GaussianKernel {
    fn default() -> Self {
        GaussianKernel::with_sigma(1.0)
    }
}

/// Convolve a luma plane with the 5×5 kernel, wrapping neighbor reads
/// around the image borders.
///
/// # Panics
/// Panics if `input` is not 1-channel.
pub fn gaussian_blur<E: Executor>(
    exec: &E,
    input: PixelBuffer,
    kernel: &GaussianKernel,
) -> PixelBuffer {
    assert_eq!(input.channels(), 1, "gaussian_blur expects a luma plane");
    let (w, h) = (input.width(), input.height());
    let src = input.as_slice();

    let blurred = exec.map_grid(w, h, |x, y| {
        let mut acc = 0.0f32;
        for i in -GAUSSIAN_RADIUS..=GAUSSIAN_RADIUS {
            for j in -GAUSSIAN_RADIUS..=GAUSSIAN_RADIUS {
                let idx = wrap_index(x as isize + j, y as isize + i, w, h);
                acc += kernel.weight(i, j) * src[idx];
            }
        }
        acc
    });

    PixelBuffer::from_vec(w, h, 1, blurred)
}
