// exec.rs — The execution surface the stages are written against.
//
// Every stage is a pure per-pixel (or per-pixel-pair) map plus, for the
// threshold stage, one global max-reduction. Expressing the stages in terms
// of these two primitives keeps the kernel arithmetic identical regardless
// of whether it runs on one thread, across a rayon pool, or — via the
// mirrored WGSL kernels in `gpu` — on a compute device.
//
// Within a stage every output element is written exactly once by exactly
// one worker, and workers only read the (fully materialized) input capture,
// so no locking is needed. The barrier between stages falls out of the call
// structure: `map_grid` returns a finished Vec before the next stage runs.
//
// `ThreadedExecutor` parallelizes over output rows: each worker owns a
// disjoint `&mut [f32]` row slice, which is exactly the aliasing guarantee
// `par_chunks_mut` provides.

use rayon::prelude::*;

/// Data-parallel execution surface: map a function over a 2D index domain,
/// plus a global max-reduction.
///
/// `reduce_max` assumes a non-negative field (gradient magnitudes) and
/// returns 0.0 for an empty buffer; the maximum is associative and
/// commutative, so the result is independent of worker count and order.
pub trait Executor: Sync {
    /// Fill a `width * height` plane, one element per `(x, y)`.
    fn map_grid<F>(&self, width: usize, height: usize, f: F) -> Vec<f32>
    where
        F: Fn(usize, usize) -> f32 + Sync;

    /// Fill two `width * height` planes in a single pass over the domain.
    /// Used by the gradient stage, which produces magnitude and orientation
    /// from one Sobel evaluation.
    fn map_grid_pair<F>(&self, width: usize, height: usize, f: F) -> (Vec<f32>, Vec<f32>)
    where
        F: Fn(usize, usize) -> [f32; 2] + Sync;

    /// Global maximum over a non-negative field; 0.0 if `values` is empty.
    fn reduce_max(&self, values: &[f32]) -> f32;
}

/// Single-threaded reference executor: plain nested loops.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialExecutor;

impl Executor for SerialExecutor {
    fn map_grid<F>(&self, width: usize, height: usize, f: F) -> Vec<f32>
    where
        F: Fn(usize, usize) -> f32 + Sync,
    {
        let mut out = vec![0.0f32; width * height];
        for y in 0..height {
            let row = &mut out[y * width..(y + 1) * width];
            for (x, slot) in row.iter_mut().enumerate() {
                *slot = f(x, y);
            }
        }
        out
    }

    fn map_grid_pair<F>(&self, width: usize, height: usize, f: F) -> (Vec<f32>, Vec<f32>)
    where
        F: Fn(usize, usize) -> [f32; 2] + Sync,
    {
        let mut a = vec![0.0f32; width * height];
        let mut b = vec![0.0f32; width * height];
        for y in 0..height {
            for x in 0..width {
                let [va, vb] = f(x, y);
                a[y * width + x] = va;
                b[y * width + x] = vb;
            }
        }
        (a, b)
    }

    fn reduce_max(&self, values: &[f32]) -> f32 {
        values.iter().copied().fold(0.0f32, f32::max)
    }
}

/// Thread-parallel executor backed by rayon's global pool.
///
/// Work is split by output row; each worker owns a disjoint row slice of
/// the output plane(s). The per-element arithmetic is byte-for-byte the
/// same closure the serial executor runs, so results are bitwise identical
/// across the two CPU backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadedExecutor;

impl Executor for ThreadedExecutor {
    fn map_grid<F>(&self, width: usize, height: usize, f: F) -> Vec<f32>
    where
        F: Fn(usize, usize) -> f32 + Sync,
    {
        let mut out = vec![0.0f32; width * height];
        out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            for (x, slot) in row.iter_mut().enumerate() {
                *slot = f(x, y);
            }
        });
        out
    }

    fn map_grid_pair<F>(&self, width: usize, height: usize, f: F) -> (Vec<f32>, Vec<f32>)
    where
        F: Fn(usize, usize) -> [f32; 2] + Sync,
    {
        let mut a = vec![0.0f32; width * height];
        let mut b = vec![0.0f32; width * height];
        a.par_chunks_mut(width)
            .zip(b.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, (row_a, row_b))| {
                for x in 0..width {
                    let [va, vb] = f(x, y);
                    row_a[x] = va;
                    row_b[x] = vb;
                }
            });
        (a, b)
    }

    fn reduce_max(&self, values: &[f32]) -> f32 {
        values.par_iter().copied().reduce(|| 0.0f32, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(x: usize, y: usize) -> f32 {
        ((x + y) % 2) as f32
    }

    #[test]
    fn test_serial_map_grid_fills_every_cell() {
        let out = SerialExecutor.map_grid(4, 3, checker);
        assert_eq!(out.len(), 12);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 1.0);
        assert_eq!(out[4], 1.0); // (0, 1)
    }

    #[test]
    fn test_threaded_matches_serial_exactly() {
        let f = |x: usize, y: usize| (x as f32 * 0.37 + y as f32 * 1.13).sin();
        let serial = SerialExecutor.map_grid(33, 17, f);
        let threaded = ThreadedExecutor.map_grid(33, 17, f);
        // Same closure, same per-element arithmetic: bitwise equal.
        assert_eq!(serial, threaded);
    }

    #[test]
    fn test_map_grid_pair_planes_line_up() {
        let f = |x: usize, y: usize| [(x + y) as f32, (x * y) as f32];
        for exec_result in [
            SerialExecutor.map_grid_pair(5, 4, f),
            ThreadedExecutor.map_grid_pair(5, 4, f),
        ] {
            let (a, b) = exec_result;
            assert_eq!(a[2 * 5 + 3], 5.0);
            assert_eq!(b[2 * 5 + 3], 6.0);
        }
    }

    #[test]
    fn test_reduce_max() {
        let values = vec![0.0, 3.5, 1.25, 3.4999];
        assert_eq!(SerialExecutor.reduce_max(&values), 3.5);
        assert_eq!(ThreadedExecutor.reduce_max(&values), 3.5);
    }

    #[test]
    fn test_reduce_max_empty_is_zero() {
        assert_eq!(SerialExecutor.reduce_max(&[]), 0.0);
        assert_eq!(ThreadedExecutor.reduce_max(&[]), 0.0);
    }

    #[test]
    fn test_reduce_max_flat_field_is_zero() {
        // Degenerate (uniform) image path: all magnitudes zero.
        let values = vec![0.0f32; 64];
        assert_eq!(ThreadedExecutor.reduce_max(&values), 0.0);
    }
}
