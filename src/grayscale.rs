// grayscale.rs — RGB to luma reduction.
//
// ITU-R BT.709 weights. Each output pixel depends on exactly one input
// pixel, so this stage needs no neighbor reads and no wrap handling.

use crate::buffer::PixelBuffer;
use crate::exec::Executor;

/// BT.709 luma weights for R, G, B.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Reduce a 3-channel RGB buffer to a single luma plane.
///
/// # Panics
/// Panics if `input` is not 3-channel.
pub fn grayscale<E: Executor>(exec: &E, input: PixelBuffer) -> PixelBuffer {
    assert_eq!(input.channels(), 3, "grayscale expects an RGB input buffer");
    let (w, h) = (input.width(), input.height());
    let rgb = input.as_slice();

    let gray = exec.map_grid(w, h, |x, y| {
        let p = (y * w + x) * 3;
        LUMA_WEIGHTS[0] * rgb[p] + LUMA_WEIGHTS[1] * rgb[p + 1] + LUMA_WEIGHTS[2] * rgb[p + 2]
    });

    PixelBuffer::from_vec(w, h, 1, gray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::SerialExecutor;

    #[test]
    fn test_pure_channels() {
        // One pixel each of pure red, green, blue.
        let input = PixelBuffer::from_vec(
            3, 1, 3,
            vec![
                1.0, 0.0, 0.0, // red
                0.0, 1.0, 0.0, // green
                0.0, 0.0, 1.0, // blue
            ],
        );
        let gray = grayscale(&SerialExecutor, input);
        assert_eq!(gray.channels(), 1);
        assert!((gray.sample(0, 0, 0) - 0.2126).abs() < 1e-6);
        assert!((gray.sample(1, 0, 0) - 0.7152).abs() < 1e-6);
        assert!((gray.sample(2, 0, 0) - 0.0722).abs() < 1e-6);
    }

    #[test]
    fn test_white_maps_to_one() {
        let input = PixelBuffer::from_vec(1, 1, 3, vec![1.0, 1.0, 1.0]);
        let gray = grayscale(&SerialExecutor, input);
        // Weights sum to exactly 1.0 in f32.
        assert!((gray.sample(0, 0, 0) - 1.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "RGB")]
    fn test_rejects_non_rgb_input() {
        grayscale(&SerialExecutor, PixelBuffer::new(2, 2, 1));
    }
}
