// gradient.rs — Sobel gradient magnitude and quantized orientation.
//
// Both 3×3 Sobel kernels are evaluated in one window pass per pixel, with
// the same wrap-around neighbor rule as the Gaussian stage. The output is
// a 2-channel planar buffer: magnitude plane first, orientation plane
// second.
//
// Orientation is quantized to the four NMS buckets right here, not in the
// thinning stage: the orientation plane only ever holds one of
// {0, 45, 90, 135} degrees.

use crate::buffer::{wrap_index, PixelBuffer};
use crate::exec::Executor;

/// Sobel kernel radius: 3×3 window.
pub const SOBEL_RADIUS: isize = 1;

/// Horizontal derivative kernel. Positive response where intensity
/// increases to the right.
pub const SOBEL_X: [[f32; 3]; 3] = [
    [-1.0, 0.0, 1.0],
    [-2.0, 0.0, 2.0],
    [-1.0, 0.0, 1.0],
];

/// Vertical derivative kernel. Positive response where intensity
/// increases downward.
pub const SOBEL_Y: [[f32; 3]; 3] = [
    [-1.0, -2.0, -1.0],
    [0.0, 0.0, 0.0],
    [1.0, 2.0, 1.0],
];

/// Round an `atan2` angle in degrees to the nearest multiple of 45° and
/// fold it into [0, 180). 180 folds to 0, so the result is exactly one of
/// {0, 45, 90, 135}.
#[inline]
pub fn quantize_orientation(degrees: f32) -> f32 {
    ((degrees / 45.0).round() * 45.0).rem_euclid(180.0)
}

/// Compute the gradient of a smoothed luma plane.
///
/// Returns a 2-channel planar buffer: `sqrt(gx² + gy²)` magnitudes in the
/// first plane, quantized orientations in degrees in the second.
///
/// # Panics
/// Panics if `input` is not 1-channel.
pub fn sobel_gradient<E: Executor>(exec: &E, input: PixelBuffer) -> PixelBuffer {
    assert_eq!(input.channels(), 1, "sobel_gradient expects a luma plane");
    let (w, h) = (input.width(), input.height());
    let src = input.as_slice();

    let (magnitude, orientation) = exec.map_grid_pair(w, h, |x, y| {
        let mut gx = 0.0f32;
        let mut gy = 0.0f32;
        for i in -SOBEL_RADIUS..=SOBEL_RADIUS {
            for j in -SOBEL_RADIUS..=SOBEL_RADIUS {
                let idx = wrap_index(x as isize + j, y as isize + i, w, h);
                let v = src[idx];
                gx += SOBEL_X[(i + SOBEL_RADIUS) as usize][(j + SOBEL_RADIUS) as usize] * v;
                gy += SOBEL_Y[(i + SOBEL_RADIUS) as usize][(j + SOBEL_RADIUS) as usize] * v;
            }
        }
        let magnitude = (gx * gx + gy * gy).sqrt();
        let orientation = quantize_orientation(gy.atan2(gx).to_degrees());
        [magnitude, orientation]
    });

    let mut data = magnitude;
    data.extend_from_slice(&orientation);
    PixelBuffer::from_vec(w, h, 2, data)
}
