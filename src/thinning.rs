// thinning.rs — Non-maximum suppression along the quantized gradient.
//
// A pixel survives only if its magnitude is >= both neighbors along its
// gradient direction; otherwise it is zeroed. Survivors keep their exact
// magnitude — this stage never increases a value.
//
// The orientation plane is trusted to hold one of {0, 45, 90, 135}. If a
// measurement artifact ever lands outside those buckets, both comparison
// values fall back to a 255.0 sentinel, which suppresses the pixel unless
// its own magnitude reaches the sentinel. The fallback is part of the
// pipeline's observable behavior and is kept as-is.

use crate::buffer::{wrap_index, PixelBuffer};
use crate::exec::Executor;

/// Comparison value used when the orientation is outside the four
/// canonical buckets. Forces suppression for any realistic magnitude.
pub const SENTINEL_MAGNITUDE: f32 = 255.0;

/// Neighbor offsets `(dx, dy)` compared against for each orientation
/// bucket, in degrees.
#[inline]
fn direction_offsets(orientation: f32) -> Option<[(isize, isize); 2]> {
    if orientation == 0.0 {
        Some([(1, 0), (-1, 0)])
    } else if orientation == 45.0 {
        Some([(-1, 1), (1, -1)])
    } else if orientation == 90.0 {
        Some([(0, 1), (0, -1)])
    } else if orientation == 135.0 {
        Some([(-1, -1), (1, 1)])
    } else {
        None
    }
}

/// Suppress non-maximal gradient responses, collapsing ridges to
/// single-pixel width.
///
/// Input is the gradient stage's 2-channel magnitude/orientation buffer;
/// output is a 1-channel thinned magnitude plane.
///
/// # Panics
/// Panics if `input` is not 2-channel.
pub fn thin_edges<E: Executor>(exec: &E, input: PixelBuffer) -> PixelBuffer {
    assert_eq!(input.channels(), 2, "thin_edges expects magnitude + orientation planes");
    let (w, h) = (input.width(), input.height());
    let magnitude = input.plane(0);
    let orientation = input.plane(1);

    let thinned = exec.map_grid(w, h, |x, y| {
        let p = y * w + x;
        let own = magnitude[p];
        let (a, b) = match direction_offsets(orientation[p]) {
            Some([(dx0, dy0), (dx1, dy1)]) => (
                magnitude[wrap_index(x as isize + dx0, y as isize + dy0, w, h)],
                magnitude[wrap_index(x as isize + dx1, y as isize + dy1, w, h)],
            ),
            None => (SENTINEL_MAGNITUDE, SENTINEL_MAGNITUDE),
        };
        if own >= a && own >= b {
            own
        } else {
            0.0
        }
    });

    PixelBuffer::from_vec(w, h, 1, thinned)
}
