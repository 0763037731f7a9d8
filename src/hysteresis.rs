// hysteresis.rs — Single-pass edge tracking.
//
// A Weak pixel is promoted to Strong if any of its 8 wrap-around neighbors
// is Strong, otherwise it is Suppressed. Strong and Suppressed pixels pass
// through unchanged, so the output contains no Weak codes.
//
// This is exactly one relaxation pass, not the textbook transitive
// flood-fill: a Weak pixel whose only path to a Strong pixel runs through
// another Weak pixel is NOT promoted. Downstream consumers depend on the
// single-pass shape of the edge map; do not "fix" this to the multi-pass
// variant.

use crate::buffer::{wrap_index, PixelBuffer};
use crate::exec::Executor;
use crate::threshold::EdgeClass;

/// The 8-connected neighborhood offsets `(dx, dy)`.
const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Resolve every Weak pixel against its 8 wrap-around neighbors in one
/// pass.
///
/// # Panics
/// Panics if `input` is not 1-channel.
pub fn hysteresis<E: Executor>(exec: &E, input: PixelBuffer) -> PixelBuffer {
    assert_eq!(input.channels(), 1, "hysteresis expects an edge-class plane");
    let (w, h) = (input.width(), input.height());
    let classes = input.as_slice();
    let strong = EdgeClass::Strong.code();
    let weak = EdgeClass::Weak.code();

    let resolved = exec.map_grid(w, h, |x, y| {
        let own = classes[y * w + x];
        if own != weak {
            return own;
        }
        let promoted = NEIGHBORS_8.iter().any(|&(dx, dy)| {
            classes[wrap_index(x as isize + dx, y as isize + dy, w, h)] == strong
        });
        if promoted {
            strong
        } else {
            EdgeClass::Suppressed.code()
        }
    });

    PixelBuffer::from_vec(w, h, 1, resolved)
}
